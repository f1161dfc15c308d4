//! Field tree of the income tax declaration (ESt).

use std::sync::LazyLock;

use super::field_tree::FieldTreeNode as N;

pub const PERSON_A_FIELDS: [&str; 14] = [
    "E0100401", "E0100201", "E0100301", "E0100402", "E0101104", "E0101206", "E0101207", "E0101301",
    "E0100601", "E0100602", "E0100701", "E0100702", "E0100703", "E0100704",
];

pub const PERSON_B_FIELDS: [&str; 10] = [
    "E0101001", "E0100901", "E0100801", "E0101002", "E0102105", "E0102202", "E0102203", "E0102301",
    "E0101701", "E0101702",
];

static EST_TREES: LazyLock<Vec<N>> = LazyLock::new(|| vec![est1a(), sa(), agb(), ha_35a(), vor()]);

/// Top-level trees of the ESt declaration in emission order:
/// `ESt1A`, `SA`, `AgB`, `HA_35a`, `VOR`.
pub fn est_trees() -> &'static [N] {
    &EST_TREES
}

fn sum(ids: &[&str]) -> N {
    N::leaves("Sum", ids)
}

fn est1a() -> N {
    N::group(
        "ESt1A",
        vec![
            N::leaves("Art_Erkl", &["E0100001"]),
            N::leaves("Belege", &["E0100012", "E0100013"]),
            N::group(
                "Allg",
                vec![
                    N::leaves("A", &PERSON_A_FIELDS),
                    N::leaves("B", &PERSON_B_FIELDS),
                    N::leaves("Vlg_Art", &["E0101201"]),
                    N::leaves("BV", &["E0102102", "E0101601", "E0102402"]),
                ],
            ),
        ],
    )
}

fn sa() -> N {
    N::group(
        "SA",
        vec![
            N::group(
                "KiSt",
                vec![
                    N::group("Gezahlt", vec![sum(&["E0107601"])]),
                    N::leaves("Erstattet", &["E0107602"]),
                ],
            ),
            N::group(
                "Zuw",
                vec![N::group(
                    "Sp_MB",
                    vec![
                        N::group("Foerd_st_beg_Zw_Inl", vec![sum(&["E0108105"])]),
                        N::group("Polit_P", vec![sum(&["E0108701"])]),
                    ],
                )],
            ),
        ],
    )
}

fn agb() -> N {
    let and_aufw = [
        ("Krankh", ["E0161304", "E0161305"]),
        ("Pflege", ["E0161404", "E0161405"]),
        ("Beh_Aufw", ["E0161504", "E0161505"]),
        ("Beh_Kfz", ["E0161604", "E0161605"]),
        ("Bestatt", ["E0161704", "E0161705"]),
        ("Sonst", ["E0161804", "E0161805"]),
    ]
    .iter()
    .map(|(name, ids)| N::group(*name, vec![sum(ids)]))
    .collect();

    N::group(
        "AgB",
        vec![
            N::group(
                "Beh",
                vec![
                    N::leaves("Ausw_Rentb_Besch", &["E0109708"]),
                    N::leaves("Geh_Steh_Blind_Hilfl", &["E0109707", "E0109706"]),
                ],
            )
            .person_specific(2),
            N::group("And_Aufw", and_aufw),
        ],
    )
}

fn ha_35a() -> N {
    N::group(
        "HA_35a",
        vec![N::group(
            "St_Erm",
            vec![
                N::group(
                    "Hhn_BV_DL",
                    vec![N::leaves("Einz", &["E0107206", "E0107207"]), sum(&["E0107208"])],
                ),
                N::group(
                    "Handw_L",
                    vec![
                        N::leaves("Einz", &["E0111217", "E0170601", "E0111214"]).repeatable(),
                        sum(&["E0111215"]),
                    ],
                ),
                N::group(
                    "Alleinst",
                    vec![
                        N::leaf("E0107606"),
                        N::leaves("Pers_gem_HH", &["E0104706"]).repeatable(),
                    ],
                ),
            ],
        )],
    )
}

fn vor() -> N {
    N::group(
        "VOR",
        vec![N::group(
            "Weit_Sons_VorAW",
            vec![N::group(
                "A_B_LP",
                vec![N::group("U_HP_Ris_Vers", vec![sum(&["E2001803"])])],
            )],
        )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldId, FieldMap, Person};
    use crate::xml::field_tree::encode_all;

    #[test]
    fn top_level_order() {
        let names: Vec<_> = est_trees().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["ESt1A", "SA", "AgB", "HA_35a", "VOR"]);
    }

    #[test]
    fn disability_is_emitted_per_person() {
        let mut fields = FieldMap::new();
        fields.insert(FieldId::person("E0109708", Person::PersonA), "50".into());
        fields.insert(FieldId::person("E0109706", Person::PersonB), "1".into());
        let out = encode_all(est_trees(), &fields).unwrap();
        assert_eq!(out.len(), 1);
        let agb = &out[0];
        assert_eq!(agb.name, "AgB");
        let beh: Vec<_> = agb.children_named("Beh").collect();
        assert_eq!(beh.len(), 2);
        assert_eq!(beh[1].children[0].text.as_deref(), Some("PersonB"));
        assert_eq!(beh[1].children[1].name, "Geh_Steh_Blind_Hilfl");
    }

    #[test]
    fn craftsmen_entries_repeat() {
        let mut fields = FieldMap::new();
        fields.insert("E0111217".into(), vec!["Dach".to_string(), "Fenster".to_string()].into());
        fields.insert("E0111215".into(), "500".into());
        let out = encode_all(est_trees(), &fields).unwrap();
        let handw = out[0].find("Handw_L").unwrap();
        assert_eq!(handw.children_named("Einz").count(), 2);
        assert_eq!(handw.children.last().map(|e| e.name.as_str()), Some("Sum"));
    }
}
