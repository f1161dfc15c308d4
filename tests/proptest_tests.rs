//! Property-based tests for the field tree encoder, the Steuernummer
//! conversion and the response queries.
//!
//! Run with: `cargo test --test proptest_tests`

use elster_transfer::core::{FieldId, FieldMap, FieldValue, Person};
use elster_transfer::est::mapping::{format_amount, format_full_euro};
use elster_transfer::est::{Bundesland, generate_electronic_steuernummer, is_valid_bufa};
use elster_transfer::xml::est_tree::{PERSON_A_FIELDS, PERSON_B_FIELDS};
use elster_transfer::xml::parse::{get_elements_text, get_transfer_ticket};
use elster_transfer::xml::{Element, encode_all, est_trees};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Plain ids of the declaration whose values are scalars.
const SCALAR_IDS: [&str; 14] = [
    "E0100001", "E0100013", "E0101201", "E0102102", "E0101601", "E0102402", "E0107601", "E0107602",
    "E0108105", "E0108701", "E0161304", "E0161305", "E0107606", "E2001803",
];

// ── Strategies ──────────────────────────────────────────────────────────────

fn arb_value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9äöüß ,.-]{1,20}"
}

fn arb_scalar_fields() -> impl Strategy<Value = FieldMap> {
    let ids: Vec<&'static str> = SCALAR_IDS
        .iter()
        .chain(PERSON_A_FIELDS.iter())
        .chain(PERSON_B_FIELDS.iter())
        .copied()
        .collect();
    prop::collection::btree_map(prop::sample::select(ids), arb_value(), 0..20).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, value)| (FieldId::plain(id), FieldValue::Single(value)))
            .collect()
    })
}

/// Scalar fields plus a household member list and optional disability data.
fn arb_fields() -> impl Strategy<Value = FieldMap> {
    (
        arb_scalar_fields(),
        prop::collection::vec(arb_value(), 0..4),
        prop::option::of(1u32..=100),
        any::<bool>(),
    )
        .prop_map(|(mut fields, members, beh_grad, person_b_blind)| {
            fields.insert(FieldId::plain("E0104706"), FieldValue::Repeated(members));
            if let Some(grad) = beh_grad {
                fields.insert(FieldId::person("E0109708", Person::PersonA), grad.to_string().into());
            }
            if person_b_blind {
                fields.insert(FieldId::person("E0109706", Person::PersonB), "1".into());
            }
            fields
        })
}

fn assert_no_empty_groups(element: &Element) {
    assert!(
        element.text.is_some() || !element.children.is_empty(),
        "empty element <{}>",
        element.name
    );
    for child in &element.children {
        assert_no_empty_groups(child);
    }
}

fn leaf_count(element: &Element) -> usize {
    if element.children.is_empty() {
        1
    } else {
        element.children.iter().map(leaf_count).sum()
    }
}

// ── Property Tests ──────────────────────────────────────────────────────────

proptest! {
    /// Encoding the same field map twice gives the same document.
    #[test]
    fn encoding_is_deterministic(fields in arb_fields()) {
        let first = encode_all(est_trees(), &fields).unwrap();
        let second = encode_all(est_trees(), &fields).unwrap();
        prop_assert_eq!(first, second);
    }

    /// No group is emitted without content.
    #[test]
    fn encoding_prunes_empty_groups(fields in arb_fields()) {
        for element in encode_all(est_trees(), &fields).unwrap() {
            assert_no_empty_groups(&element);
        }
    }

    /// Every scalar field referenced by the tree appears exactly once.
    #[test]
    fn scalar_fields_are_emitted_once(fields in arb_scalar_fields()) {
        let root = Element::new("E10").with_children(encode_all(est_trees(), &fields).unwrap());
        prop_assert_eq!(leaf_count(&root) - usize::from(root.children.is_empty()), fields.len());
        for (id, value) in &fields {
            let found = root.find_all(id.identifier());
            prop_assert_eq!(found.len(), 1);
            let FieldValue::Single(value) = value else { unreachable!() };
            prop_assert_eq!(found[0].text.as_deref(), Some(value.as_str()));
        }
    }

    /// One household member element per list entry.
    #[test]
    fn repeated_members(members in prop::collection::vec(arb_value(), 0..6)) {
        let mut fields = FieldMap::new();
        fields.insert(FieldId::plain("E0104706"), FieldValue::Repeated(members.clone()));
        let root = Element::new("E10").with_children(encode_all(est_trees(), &fields).unwrap());
        let texts: Vec<String> = root
            .find_all("E0104706")
            .iter()
            .filter_map(|e| e.text.clone())
            .collect();
        prop_assert_eq!(texts, members);
    }

    /// Bavarian tax numbers always map to a 13-digit number with a
    /// Bavarian BuFa and the inserted zero.
    #[test]
    fn bavarian_steuernummer(digits in "[0-9]{11}") {
        let stnr = generate_electronic_steuernummer(&digits, Bundesland::BY, true).unwrap();
        prop_assert_eq!(stnr.len(), 13);
        prop_assert!(stnr.starts_with('9'));
        prop_assert_eq!(&stnr[4..5], "0");
        prop_assert!(is_valid_bufa(&stnr[..4], true));
    }

    /// Hessian tax numbers drop their leading digit.
    #[test]
    fn hessian_steuernummer(digits in "0[0-9]{10}") {
        let stnr = generate_electronic_steuernummer(&digits, Bundesland::HE, true).unwrap();
        prop_assert_eq!(stnr.len(), 13);
        prop_assert_eq!(&stnr[..2], "26");
        prop_assert_eq!(&stnr[2..4], &digits[1..3]);
    }

    /// Non-digit input never converts.
    #[test]
    fn non_digit_steuernummer(stnr in "[0-9]{3}[a-z/ ][0-9]{6}") {
        prop_assert!(generate_electronic_steuernummer(&stnr, Bundesland::BE, true).is_err());
    }

    /// Full euro amounts carry neither separators nor cents.
    #[test]
    fn full_euro_amounts(cents in 0i64..100_000_000) {
        let formatted = format_full_euro(Decimal::new(cents, 2));
        prop_assert!(formatted.bytes().all(|b| b.is_ascii_digit()));
        prop_assert_eq!(formatted, (cents / 100).to_string());
    }

    /// Amounts use a decimal comma and at most three decimal places.
    #[test]
    fn amounts_use_decimal_comma(value in 0i64..1_000_000_000, scale in 0u32..6) {
        let formatted = format_amount(Decimal::new(value, scale));
        prop_assert!(!formatted.contains('.'));
        if let Some((_, decimals)) = formatted.split_once(',') {
            prop_assert!(decimals.len() <= 3);
        }
    }

    /// Queries on arbitrary input return a result or an error, never panic.
    #[test]
    fn queries_never_panic(xml in ".{0,200}") {
        let _ = get_transfer_ticket(&xml);
        let _ = get_elements_text(&xml, "Datenpaket");
    }
}
