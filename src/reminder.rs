use chrono::{DateTime, Duration, Utc};

use crate::error::ReminderError;

/// A validated break interval. Invariant: at least one minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderConfig {
    interval_minutes: u32,
}

impl ReminderConfig {
    pub fn from_minutes(total: u32) -> Result<Self, ReminderError> {
        if total == 0 {
            return Err(ReminderError::InvalidInterval);
        }

        Ok(Self {
            interval_minutes: total,
        })
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    pub fn interval(&self) -> Duration {
        Duration::minutes(i64::from(self.interval_minutes))
    }
}

impl std::fmt::Display for ReminderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hours = self.interval_minutes / 60;
        let minutes = self.interval_minutes % 60;
        if hours > 0 {
            write!(f, "{hours} hr {minutes} min")
        } else {
            write!(f, "{minutes} min")
        }
    }
}

/// The raw hour/minute text entry, held exactly as the input widgets hold it:
/// digits only, at most two characters per field, empty meaning zero. No
/// locale-aware parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalFields {
    hours: String,
    minutes: String,
}

impl Default for IntervalFields {
    fn default() -> Self {
        Self {
            hours: "00".to_string(),
            minutes: "30".to_string(),
        }
    }
}

impl IntervalFields {
    /// Builds fields from initial contents, keeping the defaults for any
    /// entry that would not pass the edit filter.
    pub fn new(hours: &str, minutes: &str) -> Self {
        let mut fields = Self::default();
        fields.set_hours(hours);
        fields.set_minutes(minutes);
        fields
    }

    /// Accepts the edit only if it is all-digits and at most two characters.
    pub fn set_hours(&mut self, input: &str) -> bool {
        if !Self::accepts(input) {
            return false;
        }
        self.hours = input.to_string();
        true
    }

    pub fn set_minutes(&mut self, input: &str) -> bool {
        if !Self::accepts(input) {
            return false;
        }
        self.minutes = input.to_string();
        true
    }

    pub fn hours(&self) -> &str {
        &self.hours
    }

    pub fn minutes(&self) -> &str {
        &self.minutes
    }

    pub fn total_minutes(&self) -> u32 {
        parse_field(&self.hours) * 60 + parse_field(&self.minutes)
    }

    pub fn to_config(&self) -> Result<ReminderConfig, ReminderError> {
        ReminderConfig::from_minutes(self.total_minutes())
    }

    fn accepts(input: &str) -> bool {
        input.len() <= 2 && input.chars().all(|c| c.is_ascii_digit())
    }
}

fn parse_field(field: &str) -> u32 {
    field.parse().unwrap_or(0)
}

/// Live state of the single reminder. `pending_trigger_at` is owned
/// exclusively by the scheduler and recomputed on every firing; there is no
/// durable record of past firings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderSession {
    enabled: bool,
    pending_trigger_at: Option<DateTime<Utc>>,
}

impl ReminderSession {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn pending_trigger_at(&self) -> Option<DateTime<Utc>> {
        self.pending_trigger_at
    }

    pub(crate) fn armed(&mut self, trigger_at: DateTime<Utc>) {
        self.enabled = true;
        self.pending_trigger_at = Some(trigger_at);
    }

    pub(crate) fn fired(&mut self) {
        self.pending_trigger_at = None;
    }

    pub(crate) fn disarmed(&mut self) {
        self.enabled = false;
        self.pending_trigger_at = None;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_strategy::proptest;

    use super::*;
    use crate::error::ReminderError;

    #[test]
    fn hour_and_minute_fields_combine_into_total_minutes() {
        let fields = IntervalFields::new("1", "30");
        let config = fields.to_config().unwrap();

        assert_eq!(config.interval_minutes(), 90);
        assert_eq!(config.interval(), chrono::Duration::minutes(90));
    }

    #[test]
    fn zero_total_is_rejected() {
        let fields = IntervalFields::new("0", "00");

        assert!(matches!(
            fields.to_config(),
            Err(ReminderError::InvalidInterval)
        ));
    }

    #[test]
    fn empty_fields_count_as_zero() {
        let mut fields = IntervalFields::default();
        assert!(fields.set_hours(""));
        assert!(fields.set_minutes(""));

        assert_eq!(fields.total_minutes(), 0);
    }

    #[test]
    fn edit_filter_rejects_non_digits_and_overlong_input() {
        let mut fields = IntervalFields::default();

        assert!(!fields.set_minutes("3a"));
        assert!(!fields.set_minutes("120"));
        assert!(!fields.set_hours("-1"));
        // Rejected edits leave the previous contents in place.
        assert_eq!(fields.hours(), "00");
        assert_eq!(fields.minutes(), "30");

        assert!(fields.set_minutes("7"));
        assert!(fields.set_hours("07"));
    }

    #[test]
    fn config_displays_like_the_status_line() {
        assert_eq!(
            ReminderConfig::from_minutes(90).unwrap().to_string(),
            "1 hr 30 min"
        );
        assert_eq!(
            ReminderConfig::from_minutes(45).unwrap().to_string(),
            "45 min"
        );
    }

    #[proptest]
    fn any_positive_total_is_accepted(
        #[strategy(0u32..100)] hours: u32,
        #[strategy(0u32..100)] minutes: u32,
    ) {
        let fields = IntervalFields::new(&hours.to_string(), &minutes.to_string());
        let total = hours * 60 + minutes;

        match fields.to_config() {
            Ok(config) => prop_assert_eq!(config.interval_minutes(), total),
            Err(ReminderError::InvalidInterval) => prop_assert_eq!(total, 0),
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}
