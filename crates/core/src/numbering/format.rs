//! Rendering of formatted document numbers.
//!
//! Allocation and preview both render through [`format`], so the two never
//! disagree for the same sequence state.

/// Placeholder replaced by the sequence prefix.
pub const PREFIX_PLACEHOLDER: &str = "{prefix}";
/// Placeholder replaced by the zero-padded number.
pub const NUMBER_PLACEHOLDER: &str = "{number}";
/// Placeholder replaced by the sequence suffix.
pub const SUFFIX_PLACEHOLDER: &str = "{suffix}";

/// Renders a document number.
///
/// `number` is zero-padded to `number_length` digits; a wider number keeps its
/// natural width and is never truncated. A missing or blank template renders
/// as `{prefix}{number}{suffix}`. Placeholders other than the three above are
/// left as written.
#[must_use]
pub fn format(
    prefix: &str,
    number: i64,
    number_length: u32,
    suffix: &str,
    template: Option<&str>,
) -> String {
    let padded = pad_number(number, number_length);

    match template.filter(|t| !t.trim().is_empty()) {
        Some(template) => template
            .replace(PREFIX_PLACEHOLDER, prefix)
            .replace(NUMBER_PLACEHOLDER, &padded)
            .replace(SUFFIX_PLACEHOLDER, suffix),
        None => format!("{prefix}{padded}{suffix}"),
    }
}

/// Zero-pads `number` to `width` digits without ever truncating.
#[must_use]
pub fn pad_number(number: i64, width: u32) -> String {
    let width = width as usize;
    if number < 0 {
        // The sign does not count towards the width.
        format!("-{:0>width$}", number.unsigned_abs())
    } else {
        format!("{number:0>width$}")
    }
}

/// Returns the count of decimal digits in `number`, ignoring sign.
#[must_use]
pub fn digit_count(number: i64) -> u32 {
    number.unsigned_abs().checked_ilog10().map_or(1, |d| d + 1)
}

/// Returns true if `number` does not fit in `number_length` digits.
#[must_use]
pub fn exceeds_length(number: i64, number_length: u32) -> bool {
    digit_count(number) > number_length
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("INV-", 41, 4, "", None, "INV-0041")]
    #[case("", 1, 3, "", None, "001")]
    #[case("", 10_000, 4, "", None, "10000")]
    #[case("RX", 7, 1, "/A", None, "RX7/A")]
    #[case("CB-", 12, 5, "-2026", Some("{prefix}{number}{suffix}"), "CB-00012-2026")]
    #[case("LAB", 3, 3, "X", Some("{suffix}.{number}.{prefix}"), "X.003.LAB")]
    #[case("P", 5, 2, "", Some("   "), "P05")]
    #[case("P", 5, 2, "", Some("{number}-{unknown}"), "05-{unknown}")]
    #[case("", 0, 3, "", None, "000")]
    fn test_format(
        #[case] prefix: &str,
        #[case] number: i64,
        #[case] length: u32,
        #[case] suffix: &str,
        #[case] template: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(format(prefix, number, length, suffix, template), expected);
    }

    #[test]
    fn test_repeated_placeholders_all_replaced() {
        assert_eq!(
            format("A", 9, 2, "", Some("{prefix}{number}/{number}")),
            "A09/09"
        );
    }

    #[rstest]
    #[case(0, 1)]
    #[case(9, 1)]
    #[case(10, 2)]
    #[case(9_999, 4)]
    #[case(10_000, 5)]
    #[case(-42, 2)]
    #[case(i64::MAX, 19)]
    #[case(i64::MIN, 19)]
    fn test_digit_count(#[case] number: i64, #[case] expected: u32) {
        assert_eq!(digit_count(number), expected);
    }

    #[test]
    fn test_exceeds_length() {
        assert!(!exceeds_length(9_999, 4));
        assert!(exceeds_length(10_000, 4));
    }

    #[test]
    fn test_pad_negative_keeps_sign_outside_width() {
        assert_eq!(pad_number(-7, 3), "-007");
    }
}
