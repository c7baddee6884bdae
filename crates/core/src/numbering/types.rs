//! Numbering domain types.
//!
//! This module defines the sequence configuration, the append-only audit
//! rows, and the values returned to callers by allocation, preview and reset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::{ActorId, DocumentId, HistoryEntryId, ResetAuditId, SequenceId};

use crate::numbering::error::NumberingError;
use crate::numbering::{format, policy};

/// Longest accepted document type key.
pub const MAX_DOCUMENT_TYPE_LEN: usize = 64;
/// Longest accepted prefix or suffix.
pub const MAX_AFFIX_LEN: usize = 32;
/// Longest accepted format template.
pub const MAX_TEMPLATE_LEN: usize = 128;
/// Widest zero-pad width. An `i64` has at most 19 digits.
pub const MAX_NUMBER_LENGTH: u32 = 18;
/// Longest formatted document number the history can hold.
pub const MAX_RENDERED_LEN: usize = 255;

/// Key identifying one numbering sequence (e.g. `invoice`, `claim_batch`).
///
/// Keys are ASCII letters, digits, `_` and `-`, at most 64 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentType(String);

impl DocumentType {
    /// Parses and validates a document type key.
    pub fn parse(value: &str) -> Result<Self, NumberingError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(NumberingError::InvalidConfig(
                "document type must not be empty".to_string(),
            ));
        }
        if value.len() > MAX_DOCUMENT_TYPE_LEN {
            return Err(NumberingError::InvalidConfig(format!(
                "document type must be at most {MAX_DOCUMENT_TYPE_LEN} characters"
            )));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(NumberingError::InvalidConfig(format!(
                "document type '{value}' may only contain letters, digits, '_' and '-'"
            )));
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentType {
    type Error = NumberingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentType> for String {
    fn from(value: DocumentType) -> Self {
        value.0
    }
}

/// How often a sequence's counter restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetFrequency {
    /// The counter never restarts on its own.
    #[default]
    Never,
    /// Restarts when the calendar year changes.
    Yearly,
    /// Restarts when the calendar month changes.
    Monthly,
    /// Restarts when the calendar date changes.
    Daily,
}

impl ResetFrequency {
    /// Returns the string representation of the frequency.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Yearly => "yearly",
            Self::Monthly => "monthly",
            Self::Daily => "daily",
        }
    }

    /// Parses a frequency from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "never" => Some(Self::Never),
            "yearly" => Some(Self::Yearly),
            "monthly" => Some(Self::Monthly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

impl fmt::Display for ResetFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a sequence stands relative to its reset boundary at a given instant.
///
/// Not persisted; recomputed from [`policy::reset_due`] on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencePhase {
    /// A reset boundary has been crossed; the next allocation restarts the counter.
    Fresh,
    /// Still allocating within the current period.
    ActivePeriod,
}

/// Per-document-type configuration plus its live counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSequence {
    /// Surrogate key, used by the admin reset route.
    pub id: SequenceId,
    /// Unique key of the sequence.
    pub document_type: DocumentType,
    /// Text placed before the number.
    pub prefix: String,
    /// Text placed after the number.
    pub suffix: String,
    /// Last number issued (or `start_number - 1` when nothing was issued yet).
    pub current_number: i64,
    /// First number issued after a time-based reset.
    pub start_number: i64,
    /// Zero-pad width of the numeric part.
    pub number_length: u32,
    /// Template using `{prefix}`, `{number}` and `{suffix}` placeholders.
    pub format_template: Option<String>,
    /// How often the counter restarts.
    pub reset_frequency: ResetFrequency,
    /// When the counter last restarted, if ever.
    pub last_reset_date: Option<DateTime<Utc>>,
    /// Inactive sequences refuse allocation.
    pub is_active: bool,
    /// When the sequence was provisioned.
    pub created_at: DateTime<Utc>,
    /// When the sequence was last written.
    pub updated_at: DateTime<Utc>,
}

impl DocumentSequence {
    /// Builds a fresh sequence from provisioning defaults.
    #[must_use]
    pub fn with_defaults(
        document_type: DocumentType,
        defaults: &SequenceDefaults,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SequenceId::new(),
            document_type,
            prefix: String::new(),
            suffix: String::new(),
            current_number: defaults.start_number - 1,
            start_number: defaults.start_number,
            number_length: defaults.number_length,
            format_template: None,
            reset_frequency: ResetFrequency::Never,
            last_reset_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds a sequence from a configuration edit.
    ///
    /// The counter starts at `current_number` when given, otherwise just
    /// below `start_number`.
    #[must_use]
    pub fn from_config(
        document_type: DocumentType,
        config: &SequenceConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let start_number = config.start_number.unwrap_or(1);
        Self {
            id: SequenceId::new(),
            document_type,
            prefix: config.prefix.clone(),
            suffix: config.suffix.clone(),
            current_number: config.current_number.unwrap_or(start_number - 1),
            start_number,
            number_length: config.number_length,
            format_template: config.format_template.clone(),
            reset_frequency: config.reset_frequency,
            last_reset_date: None,
            is_active: config.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a configuration edit in place. Not subject to compare-and-swap.
    pub fn apply_config(&mut self, config: &SequenceConfig, now: DateTime<Utc>) {
        self.prefix.clone_from(&config.prefix);
        self.suffix.clone_from(&config.suffix);
        self.number_length = config.number_length;
        self.format_template.clone_from(&config.format_template);
        self.reset_frequency = config.reset_frequency;
        self.is_active = config.is_active;
        if let Some(start_number) = config.start_number {
            self.start_number = start_number;
        }
        if let Some(current_number) = config.current_number {
            self.current_number = current_number;
        }
        self.updated_at = now;
    }

    /// Returns whether the next allocation at `now` restarts the counter.
    #[must_use]
    pub fn phase(&self, now: DateTime<Utc>) -> SequencePhase {
        if policy::reset_due(self.reset_frequency, self.last_reset_date, now) {
            SequencePhase::Fresh
        } else {
            SequencePhase::ActivePeriod
        }
    }
}

/// Values used when a sequence is provisioned lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceDefaults {
    /// Zero-pad width.
    pub number_length: u32,
    /// First number issued.
    pub start_number: i64,
}

impl SequenceDefaults {
    /// Validates the defaults against the same limits as a configuration edit.
    pub fn validate(&self) -> Result<(), NumberingError> {
        if self.number_length == 0 || self.number_length > MAX_NUMBER_LENGTH {
            return Err(NumberingError::InvalidConfig(format!(
                "default number_length must be between 1 and {MAX_NUMBER_LENGTH}"
            )));
        }
        if self.start_number < 1 {
            return Err(NumberingError::InvalidConfig(
                "default start_number must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SequenceDefaults {
    fn default() -> Self {
        Self {
            number_length: 6,
            start_number: 1,
        }
    }
}

/// A configuration-time edit of one sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Text placed before the number.
    #[serde(default)]
    pub prefix: String,
    /// Text placed after the number.
    #[serde(default)]
    pub suffix: String,
    /// Zero-pad width of the numeric part.
    pub number_length: u32,
    /// Optional template; absent means `{prefix}{number}{suffix}`.
    #[serde(default)]
    pub format_template: Option<String>,
    /// How often the counter restarts.
    #[serde(default)]
    pub reset_frequency: ResetFrequency,
    /// Whether the sequence accepts allocations.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// First number issued after a time-based reset.
    #[serde(default)]
    pub start_number: Option<i64>,
    /// Overwrites the live counter. Only safe before allocation traffic starts.
    #[serde(default)]
    pub current_number: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl SequenceConfig {
    /// Validates the edit against storage and formatting limits.
    pub fn validate(&self) -> Result<(), NumberingError> {
        if self.number_length == 0 || self.number_length > MAX_NUMBER_LENGTH {
            return Err(NumberingError::InvalidConfig(format!(
                "number_length must be between 1 and {MAX_NUMBER_LENGTH}"
            )));
        }
        if self.prefix.chars().count() > MAX_AFFIX_LEN
            || self.suffix.chars().count() > MAX_AFFIX_LEN
        {
            return Err(NumberingError::InvalidConfig(format!(
                "prefix and suffix must be at most {MAX_AFFIX_LEN} characters"
            )));
        }
        if let Some(template) = self.format_template.as_deref() {
            if template.chars().count() > MAX_TEMPLATE_LEN {
                return Err(NumberingError::InvalidConfig(format!(
                    "format_template must be at most {MAX_TEMPLATE_LEN} characters"
                )));
            }
            if !template.trim().is_empty() && !template.contains("{number}") {
                return Err(NumberingError::InvalidConfig(
                    "format_template must contain the {number} placeholder".to_string(),
                ));
            }
        }
        let widest = format::format(
            &self.prefix,
            i64::MAX,
            self.number_length,
            &self.suffix,
            self.format_template.as_deref(),
        );
        if widest.chars().count() > MAX_RENDERED_LEN {
            return Err(NumberingError::InvalidConfig(format!(
                "formatted numbers may exceed {MAX_RENDERED_LEN} characters"
            )));
        }
        if self.start_number.is_some_and(|n| n < 1) {
            return Err(NumberingError::InvalidConfig(
                "start_number must be at least 1".to_string(),
            ));
        }
        if self.current_number.is_some_and(|n| n < 0) {
            return Err(NumberingError::InvalidConfig(
                "current_number must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Compare-and-swap request against one sequence.
///
/// Both the counter and the reset date are compared, so a counter that
/// restarted and climbed back to the expected value is still detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasUpdate {
    /// Sequence key.
    pub document_type: DocumentType,
    /// Counter value read before computing the next number.
    pub expected_current_number: i64,
    /// Reset date read before computing the next number.
    pub expected_last_reset_date: Option<DateTime<Utc>>,
    /// Counter value to commit.
    pub new_current_number: i64,
    /// Reset date to commit.
    pub new_last_reset_date: Option<DateTime<Utc>>,
}

/// Result of a compare-and-swap attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The write committed.
    Committed,
    /// Another writer got there first.
    Mismatch {
        /// Counter value found in the store.
        current_number: i64,
    },
}

/// Append-only record of one issued number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNumberHistory {
    /// Row identifier.
    pub id: HistoryEntryId,
    /// Sequence the number was drawn from.
    pub document_type: DocumentType,
    /// Business record the number was issued for.
    pub document_id: Option<DocumentId>,
    /// Numeric part of the number.
    pub generated_number: i64,
    /// Formatted number handed to the caller.
    pub full_document_number: String,
    /// Operator who requested it; `None` means the system.
    pub generated_by: Option<ActorId>,
    /// When it was issued.
    pub generated_date: DateTime<Utc>,
}

/// Append-only record of one admin reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceResetAudit {
    /// Row identifier.
    pub id: ResetAuditId,
    /// Sequence that was reset.
    pub document_type: DocumentType,
    /// Counter value overwritten by the reset.
    pub previous_number: i64,
    /// Next number the sequence will issue.
    pub new_start_number: i64,
    /// Whether numbers already issued this period may be reissued.
    pub duplicate_risk: bool,
    /// Highest number issued this period at reset time.
    pub highest_in_period: Option<i64>,
    /// Operator who performed the reset.
    pub reset_by: Option<ActorId>,
    /// When the reset was committed.
    pub reset_at: DateTime<Utc>,
}

/// Non-fatal conditions reported alongside a successful operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum NumberingWarning {
    /// The number is wider than the configured pad width and was not truncated.
    NumberLengthExceeded {
        /// Sequence key.
        document_type: DocumentType,
        /// Configured pad width.
        number_length: u32,
        /// Actual digit count.
        digits: u32,
        /// The wide number.
        numeric_value: i64,
    },
    /// A reset may cause numbers already issued this period to be issued again.
    DuplicateRisk {
        /// Sequence key.
        document_type: DocumentType,
        /// Requested next number.
        new_start_number: i64,
        /// Highest number already issued this period.
        highest_in_period: i64,
    },
    /// The operation committed but its audit row could not be written.
    AuditGap {
        /// Sequence key.
        document_type: DocumentType,
        /// What was being recorded.
        detail: String,
    },
}

impl NumberingWarning {
    /// Returns the warning code for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NumberLengthExceeded { .. } => "number_length_exceeded",
            Self::DuplicateRisk { .. } => "duplicate_risk",
            Self::AuditGap { .. } => "audit_gap",
        }
    }
}

/// A request to draw the next number from a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    /// Sequence to draw from.
    pub document_type: DocumentType,
    /// Business record the number is for.
    pub document_id: Option<DocumentId>,
    /// Operator requesting it; `None` means the system.
    pub actor: Option<ActorId>,
}

impl AllocationRequest {
    /// Creates a system allocation with no linked document.
    #[must_use]
    pub fn new(document_type: DocumentType) -> Self {
        Self {
            document_type,
            document_id: None,
            actor: None,
        }
    }
}

/// A committed allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocatedNumber {
    /// Sequence key.
    pub document_type: DocumentType,
    /// Formatted number.
    pub full_document_number: String,
    /// Numeric part.
    pub numeric_value: i64,
    /// Whether this allocation restarted the counter.
    pub reset_applied: bool,
    /// Non-fatal conditions raised while allocating.
    pub warnings: Vec<NumberingWarning>,
}

/// Advisory projection of the next allocation. Never a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberPreview {
    /// Sequence key.
    pub document_type: DocumentType,
    /// What the next allocation would return right now.
    pub preview_number: String,
    /// Numeric part.
    pub numeric_value: i64,
    /// Whether the next allocation would restart the counter.
    pub reset_pending: bool,
    /// Non-fatal conditions the allocation would raise.
    pub warnings: Vec<NumberingWarning>,
}

/// A committed admin reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetOutcome {
    /// Sequence key.
    pub document_type: DocumentType,
    /// Counter value before the reset.
    pub previous_number: i64,
    /// Next number the sequence will issue.
    pub new_start_number: i64,
    /// Non-fatal conditions raised by the reset.
    pub warnings: Vec<NumberingWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn config() -> SequenceConfig {
        SequenceConfig {
            prefix: "INV-".to_string(),
            suffix: String::new(),
            number_length: 4,
            format_template: None,
            reset_frequency: ResetFrequency::Never,
            is_active: true,
            start_number: None,
            current_number: None,
        }
    }

    #[rstest]
    #[case("invoice")]
    #[case("claim_batch")]
    #[case("lab-order")]
    #[case("RX2")]
    fn test_document_type_accepts(#[case] input: &str) {
        assert_eq!(DocumentType::parse(input).unwrap().as_str(), input);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("claim batch")]
    #[case("invoice/1")]
    fn test_document_type_rejects(#[case] input: &str) {
        assert!(matches!(
            DocumentType::parse(input),
            Err(NumberingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_document_type_rejects_long_keys() {
        let key = "a".repeat(MAX_DOCUMENT_TYPE_LEN + 1);
        assert!(DocumentType::parse(&key).is_err());
    }

    #[test]
    fn test_reset_frequency_parse() {
        assert_eq!(ResetFrequency::parse("YEARLY"), Some(ResetFrequency::Yearly));
        assert_eq!(ResetFrequency::parse("daily"), Some(ResetFrequency::Daily));
        assert_eq!(ResetFrequency::parse("weekly"), None);
        assert_eq!(ResetFrequency::Monthly.to_string(), "monthly");
    }

    #[test]
    fn test_config_validation() {
        assert!(config().validate().is_ok());

        let mut bad = config();
        bad.number_length = 0;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.number_length = MAX_NUMBER_LENGTH + 1;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.format_template = Some("{prefix}-{suffix}".to_string());
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.start_number = Some(0);
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.current_number = Some(-1);
        assert!(bad.validate().is_err());

        let mut blank_template = config();
        blank_template.format_template = Some("  ".to_string());
        assert!(blank_template.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_rendered_length() {
        let mut cfg = config();
        cfg.prefix = "P".repeat(MAX_AFFIX_LEN);
        cfg.format_template = Some(format!("{}{{number}}", "{prefix}".repeat(14)));
        assert!(cfg.format_template.as_deref().unwrap().chars().count() <= MAX_TEMPLATE_LEN);
        assert!(cfg.validate().is_err());

        cfg.format_template = Some(format!("{}{{number}}", "{prefix}".repeat(5)));
        assert!(cfg.validate().is_ok());
    }

    #[rstest]
    #[case(SequenceDefaults { number_length: 6, start_number: 1 }, true)]
    #[case(SequenceDefaults { number_length: 0, start_number: 1 }, false)]
    #[case(SequenceDefaults { number_length: MAX_NUMBER_LENGTH + 1, start_number: 1 }, false)]
    #[case(SequenceDefaults { number_length: 6, start_number: 0 }, false)]
    fn test_defaults_validate(#[case] defaults: SequenceDefaults, #[case] valid: bool) {
        assert_eq!(defaults.validate().is_ok(), valid);
    }

    #[test]
    fn test_from_config_counter_defaults_below_start() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut cfg = config();
        cfg.start_number = Some(100);
        let seq = DocumentSequence::from_config(DocumentType::parse("invoice").unwrap(), &cfg, now);
        assert_eq!(seq.current_number, 99);

        cfg.current_number = Some(40);
        let seq = DocumentSequence::from_config(DocumentType::parse("invoice").unwrap(), &cfg, now);
        assert_eq!(seq.current_number, 40);
    }

    #[test]
    fn test_apply_config_keeps_counter_unless_given() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut seq = DocumentSequence::from_config(
            DocumentType::parse("invoice").unwrap(),
            &SequenceConfig {
                current_number: Some(41),
                ..config()
            },
            now,
        );

        let mut edit = config();
        edit.prefix = "BILL-".to_string();
        seq.apply_config(&edit, now);
        assert_eq!(seq.prefix, "BILL-");
        assert_eq!(seq.current_number, 41);

        edit.current_number = Some(7);
        seq.apply_config(&edit, now);
        assert_eq!(seq.current_number, 7);
    }

    #[test]
    fn test_phase() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let mut seq = DocumentSequence::with_defaults(
            DocumentType::parse("receipt").unwrap(),
            &SequenceDefaults::default(),
            now,
        );
        assert_eq!(seq.phase(now), SequencePhase::ActivePeriod);

        seq.reset_frequency = ResetFrequency::Yearly;
        assert_eq!(seq.phase(now), SequencePhase::Fresh);

        seq.last_reset_date = Some(now);
        assert_eq!(seq.phase(now), SequencePhase::ActivePeriod);
    }

    #[test]
    fn test_warning_serializes_with_code_tag() {
        let warning = NumberingWarning::DuplicateRisk {
            document_type: DocumentType::parse("invoice").unwrap(),
            new_start_number: 5,
            highest_in_period: 9,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["code"], "duplicate_risk");
        assert_eq!(json["document_type"], "invoice");
        assert_eq!(warning.code(), "duplicate_risk");
    }
}
