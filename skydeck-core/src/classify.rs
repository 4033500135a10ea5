//! Alert tier and category derivation.
//!
//! Both are ordered `(keywords, result)` tables matched case-insensitively
//! against the alert's event text. The first rule with any matching keyword
//! wins; the trailing default applies only when no rule matched.

use crate::model::{AlertCategory, AlertSeverity};

type Rule<T> = (&'static [&'static str], T);

const SEVERITY_RULES: &[Rule<AlertSeverity>] = &[
    (&["severe", "extreme", "warning"], AlertSeverity::Severe),
    (&["watch", "advisory"], AlertSeverity::Moderate),
];

const SEVERITY_DEFAULT: AlertSeverity = AlertSeverity::Minor;

const CATEGORY_RULES: &[Rule<AlertCategory>] = &[
    (&["storm", "thunder"], AlertCategory::Storm),
    (&["rain", "flood"], AlertCategory::Rain),
    (&["wind"], AlertCategory::Wind),
    (&["snow", "winter"], AlertCategory::Snow),
    (&["temperature", "heat", "cold"], AlertCategory::Temperature),
];

const CATEGORY_DEFAULT: AlertCategory = AlertCategory::Other;

fn first_match<T: Copy>(text: &str, rules: &[Rule<T>], default: T) -> T {
    let text = text.to_lowercase();
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(_, result)| *result)
        .unwrap_or(default)
}

pub fn severity(event: &str) -> AlertSeverity {
    first_match(event, SEVERITY_RULES, SEVERITY_DEFAULT)
}

pub fn category(event: &str) -> AlertCategory {
    first_match(event, CATEGORY_RULES, CATEGORY_DEFAULT)
}
