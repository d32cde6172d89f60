//! Property-Based Tests for the Identifier Grammar
//!
//! Every string matching `^[A-Za-z_][A-Za-z0-9_]*$` within 63 bytes is
//! accepted unchanged; every string outside the grammar is rejected with
//! `InvalidIdentifier` before it can reach generated SQL.

use proptest::prelude::*;
use tabula_core::{
    quote_ident, validate_column_name, validate_table_name, IdentifierKind, ValidationError,
    MAX_IDENTIFIER_LEN,
};

fn valid_identifier() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,62}"
}

/// Names with at least one character outside the grammar.
fn invalid_identifier() -> impl Strategy<Value = String> {
    prop_oneof![
        // Leading digit
        "[0-9][A-Za-z0-9_]{0,20}",
        // Forbidden character somewhere in the middle
        ("[A-Za-z_]{1,10}", "[-; .'\"()*/\\\\=]", "[A-Za-z0-9_]{0,10}")
            .prop_map(|(head, bad, tail)| format!("{}{}{}", head, bad, tail)),
        // Non-ASCII letters
        "[A-Za-z_]{0,5}[é漢ß][a-z]{0,5}",
        Just(String::new()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_valid_identifiers_accepted(name in valid_identifier()) {
        prop_assert!(name.len() <= MAX_IDENTIFIER_LEN);
        prop_assert_eq!(validate_table_name(&name), Ok(name.as_str()));
    }

    #[test]
    fn prop_invalid_identifiers_rejected(name in invalid_identifier()) {
        let result = validate_table_name(&name);
        prop_assert!(
            matches!(
                result,
                Err(ValidationError::InvalidIdentifier { kind: IdentifierKind::Table, .. })
            ),
            "accepted {:?}",
            name
        );
    }

    #[test]
    fn prop_overlong_identifiers_rejected(extra in 1usize..40) {
        let name = "a".repeat(MAX_IDENTIFIER_LEN + extra);
        prop_assert!(validate_column_name(&name).is_err());
    }

    #[test]
    fn prop_quoted_identifier_has_no_inner_quotes(name in valid_identifier()) {
        let quoted = quote_ident(&name);
        prop_assert_eq!(quoted.matches('"').count(), 2);
    }
}
