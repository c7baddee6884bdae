//! Property-based tests for number formatting.

use proptest::prelude::*;

use crate::numbering::format::{digit_count, format};

fn arb_affix() -> impl Strategy<Value = String> {
    "[A-Z]{0,4}-?"
}

fn arb_template() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("{prefix}{number}{suffix}".to_string())),
        Just(Some("{suffix}/{number}/{prefix}".to_string())),
        Just(Some("   ".to_string())),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Identical inputs always render identically.
    #[test]
    fn prop_format_is_deterministic(
        prefix in arb_affix(),
        suffix in arb_affix(),
        number in 0i64..=i64::MAX,
        length in 1u32..=18,
        template in arb_template(),
    ) {
        let first = format(&prefix, number, length, &suffix, template.as_deref());
        let second = format(&prefix, number, length, &suffix, template.as_deref());
        prop_assert_eq!(first, second);
    }

    /// The numeric part is padded to at least the configured width and never truncated.
    #[test]
    fn prop_number_is_never_truncated(number in 0i64..=i64::MAX, length in 1u32..=18) {
        let rendered = format("", number, length, "", None);
        let width = digit_count(number).max(length) as usize;
        prop_assert_eq!(rendered.len(), width);
        prop_assert_eq!(rendered.trim_start_matches('0').parse::<i64>().unwrap_or(0), number);
    }

    /// Without a template the output is prefix, number, suffix in order.
    #[test]
    fn prop_default_layout(
        prefix in arb_affix(),
        suffix in arb_affix(),
        number in 0i64..1_000_000,
    ) {
        let rendered = format(&prefix, number, 6, &suffix, None);
        prop_assert!(rendered.starts_with(&prefix));
        prop_assert!(rendered.ends_with(&suffix));
        prop_assert_eq!(rendered.len(), prefix.len() + 6 + suffix.len());
    }

    /// Distinct numbers render to distinct strings under the same configuration.
    #[test]
    fn prop_distinct_numbers_distinct_output(
        a in 0i64..10_000_000,
        b in 0i64..10_000_000,
        length in 1u32..=8,
        template in arb_template(),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(
            format("INV-", a, length, "", template.as_deref()),
            format("INV-", b, length, "", template.as_deref())
        );
    }
}
