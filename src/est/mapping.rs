//! Translation of declaration form data into ELSTER field values.
//!
//! Values are "elsterified" on the way: empty values are dropped, yes/no
//! fields become `1`, dates use `DD.MM.YYYY`, amounts use the German decimal
//! comma without grouping and are truncated to full euros where the form
//! asks for full euros.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::core::{ElsterError, FieldId, FieldMap, FieldValue, Person, ValidationError};

use super::input::{Familienstand, FormDataEst};

/// Marker value of the mandatory checkboxes set for every digital submission.
const CHECKED: &str = "X";

const RELIGION_CODES: [(&str, &str); 23] = [
    ("none", "11"),
    ("ak", "04"),
    ("rk", "03"),
    ("ev", "02"),
    ("er", "05"),
    ("erb", "20"),
    ("ers", "21"),
    ("fr", "07"),
    ("fra", "16"),
    ("flb", "13"),
    ("flp", "14"),
    ("fgm", "15"),
    ("fgo", "17"),
    ("irb", "25"),
    ("jgh", "19"),
    ("ikb", "26"),
    ("jgf", "18"),
    ("jkk", "27"),
    ("is", "28"),
    ("iw", "12"),
    ("inw", "29"),
    ("jh", "24"),
    ("other", "10"),
];

/// ELSTER enumeration value of a religion key.
pub fn religion_code(religion: &str) -> Option<&'static str> {
    RELIGION_CODES
        .iter()
        .find(|(key, _)| *key == religion)
        .map(|(_, code)| *code)
}

/// Format an amount the German way without thousands separators, with at
/// most three decimal places.
pub fn format_amount(value: Decimal) -> String {
    value.round_dp(3).normalize().to_string().replace('.', ",")
}

/// Full euros, truncating any cents.
pub fn format_full_euro(value: Decimal) -> String {
    value.trunc().normalize().to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

#[derive(Default)]
struct Entries {
    fields: FieldMap,
}

impl Entries {
    fn insert(&mut self, ids: &[&str], value: &str) {
        for id in ids {
            self.fields
                .insert(FieldId::plain(*id), FieldValue::Single(value.to_string()));
        }
    }

    fn text(&mut self, ids: &[&str], value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.insert(ids, value);
        }
    }

    fn date(&mut self, ids: &[&str], value: Option<NaiveDate>) {
        if let Some(date) = value {
            self.insert(ids, &format_date(date));
        }
    }

    fn full_euro(&mut self, ids: &[&str], value: Option<Decimal>) {
        if let Some(amount) = value.filter(|v| !v.is_zero()) {
            self.insert(ids, &format_full_euro(amount));
        }
    }

    fn count(&mut self, ids: &[&str], value: Option<u32>) {
        if let Some(n) = value.filter(|n| *n != 0) {
            self.insert(ids, &n.to_string());
        }
    }

    fn joined(&mut self, ids: &[&str], values: Option<&[String]>) {
        if let Some(values) = values.filter(|v| !v.is_empty()) {
            self.insert(ids, &values.join(", "));
        }
    }

    fn repeated(&mut self, id: &str, values: Option<&[String]>) {
        if let Some(values) = values.filter(|v| !v.is_empty()) {
            self.fields
                .insert(FieldId::plain(id), FieldValue::Repeated(values.to_vec()));
        }
    }

    fn religion(&mut self, field: &str, id: &str, value: Option<&str>) -> Result<(), ElsterError> {
        let Some(religion) = value.filter(|v| !v.is_empty()) else {
            return Ok(());
        };
        let code = religion_code(religion).ok_or_else(|| {
            ElsterError::InvalidInput(vec![ValidationError::new(
                field,
                format!("unknown religion '{religion}'"),
            )])
        })?;
        self.insert(&[id], code);
        Ok(())
    }

    fn disability(&mut self, person: Person, beh_grad: Option<u32>, blind: Option<bool>, gehbeh: Option<bool>) {
        if let Some(grad) = beh_grad.filter(|g| *g != 0) {
            self.fields.insert(
                FieldId::person("E0109708", person),
                FieldValue::Single(grad.to_string()),
            );
        }
        for (id, flag) in [("E0109706", blind), ("E0109707", gehbeh)] {
            if flag == Some(true) {
                self.fields
                    .insert(FieldId::person(id, person), FieldValue::Single("1".into()));
            }
        }
    }
}

/// Build the ELSTER field map of a declaration.
///
/// Adds the entries every digital submission carries (declaration and
/// signature markers, account holder, joint assessment, marital status
/// dates) and copies PersonA's address to PersonB when they share it.
pub fn check_and_generate_entries(form: &FormDataEst) -> Result<FieldMap, ElsterError> {
    let mut e = Entries::default();

    e.insert(&["E0100001"], CHECKED);
    e.insert(&["E0100013"], CHECKED);
    if form.is_person_a_account_holder {
        e.insert(&["E0101601"], CHECKED);
    } else {
        e.insert(&["E0102402"], CHECKED);
    }
    e.text(&["E0102102"], form.iban.as_deref());

    // Marital status
    let separated_since = if form.familienstand_married_lived_separated == Some(true) {
        form.familienstand_married_lived_separated_since
    } else if form.familienstand_widowed_lived_separated == Some(true) {
        form.familienstand_widowed_lived_separated_since
    } else {
        None
    };
    e.date(&["E0100704"], separated_since);
    match form.familienstand {
        Familienstand::Married => e.date(&["E0100701"], form.familienstand_date),
        Familienstand::Widowed => e.date(&["E0100702"], form.familienstand_date),
        Familienstand::Divorced => e.date(&["E0100703"], form.familienstand_date),
        Familienstand::Single => {}
    }

    // PersonA
    e.date(&["E0100401"], Some(form.person_a_dob));
    e.text(&["E0100201"], Some(form.person_a_last_name.as_str()));
    e.text(&["E0100301"], Some(form.person_a_first_name.as_str()));
    e.religion("person_a_religion", "E0100402", Some(form.person_a_religion.as_str()))?;
    e.text(&["E0101104"], Some(form.person_a_street.as_str()));
    e.text(&["E0101206"], Some(form.person_a_street_number.as_str()));
    e.text(&["E0101207"], form.person_a_street_number_ext.as_deref());
    e.text(&["E0101301"], form.person_a_address_ext.as_deref());
    e.text(&["E0100601"], Some(form.person_a_plz.as_str()));
    e.text(&["E0100602"], Some(form.person_a_town.as_str()));
    e.disability(
        Person::PersonA,
        form.person_a_beh_grad,
        Some(form.person_a_blind),
        form.person_a_gehbeh,
    );

    // PersonB
    if form.person_b_idnr.as_deref().is_some_and(|id| !id.is_empty()) {
        e.insert(&["E0101201"], CHECKED);
    }
    e.date(&["E0101001"], form.person_b_dob);
    e.text(&["E0100901"], form.person_b_last_name.as_deref());
    e.text(&["E0100801"], form.person_b_first_name.as_deref());
    e.religion("person_b_religion", "E0101002", form.person_b_religion.as_deref())?;
    if form.person_b_same_address == Some(true) {
        e.text(&["E0102105"], Some(form.person_a_street.as_str()));
        e.text(&["E0102202"], Some(form.person_a_street_number.as_str()));
        e.text(&["E0102203"], form.person_a_street_number_ext.as_deref());
        e.text(&["E0102301"], form.person_a_address_ext.as_deref());
        e.text(&["E0101701"], Some(form.person_a_plz.as_str()));
        e.text(&["E0101702"], Some(form.person_a_town.as_str()));
    } else {
        e.text(&["E0102105"], form.person_b_street.as_deref());
        e.text(&["E0102202"], form.person_b_street_number.as_deref());
        e.text(&["E0102203"], form.person_b_street_number_ext.as_deref());
        e.text(&["E0102301"], form.person_b_address_ext.as_deref());
        e.text(&["E0101701"], form.person_b_plz.as_deref());
        e.text(&["E0101702"], form.person_b_town.as_deref());
    }
    e.disability(
        Person::PersonB,
        form.person_b_beh_grad,
        form.person_b_blind,
        form.person_b_gehbeh,
    );

    // Household services and craftsmen
    e.joined(&["E0107206"], form.stmind_haushaltsnahe_entries.as_deref());
    e.full_euro(&["E0107207", "E0107208"], form.stmind_haushaltsnahe_summe);
    e.joined(&["E0111217"], form.stmind_handwerker_entries.as_deref());
    e.full_euro(&["E0170601"], form.stmind_handwerker_summe);
    e.full_euro(&["E0111214", "E0111215"], form.stmind_handwerker_lohn_etc_summe);
    e.count(&["E0107606"], form.stmind_gem_haushalt_count);
    e.repeated("E0104706", form.stmind_gem_haushalt_entries.as_deref());

    // Special expenses
    e.full_euro(&["E2001803"], form.stmind_vorsorge_summe);
    e.full_euro(&["E0108105"], form.stmind_spenden_inland);
    e.full_euro(&["E0108701"], form.stmind_spenden_inland_parteien);
    e.full_euro(&["E0107601"], form.stmind_religion_paid_summe);
    e.full_euro(&["E0107602"], form.stmind_religion_reimbursed_summe);

    // Extraordinary burdens
    for (ids, value) in [
        (["E0161304", "E0161305"], [form.stmind_krankheitskosten_summe, form.stmind_krankheitskosten_anspruch]),
        (["E0161404", "E0161405"], [form.stmind_pflegekosten_summe, form.stmind_pflegekosten_anspruch]),
        (["E0161504", "E0161505"], [form.stmind_beh_aufw_summe, form.stmind_beh_aufw_anspruch]),
        (["E0161604", "E0161605"], [form.stmind_beh_kfz_summe, form.stmind_beh_kfz_anspruch]),
        (["E0161704", "E0161705"], [form.stmind_bestattung_summe, form.stmind_bestattung_anspruch]),
        (
            ["E0161804", "E0161805"],
            [form.stmind_aussergbela_sonst_summe, form.stmind_aussergbela_sonst_anspruch],
        ),
    ] {
        e.full_euro(&[ids[0]], value[0]);
        e.full_euro(&[ids[1]], value[1]);
    }

    Ok(e.fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::est::test_support::form_data;
    use rust_decimal_macros::dec;

    fn single(fields: &FieldMap, id: &str) -> Option<String> {
        match fields.get(&FieldId::plain(id)) {
            Some(FieldValue::Single(v)) => Some(v.clone()),
            _ => None,
        }
    }

    #[test]
    fn amounts() {
        assert_eq!(format_amount(dec!(1234.50)), "1234,5");
        assert_eq!(format_amount(dec!(12.00)), "12");
        assert_eq!(format_full_euro(dec!(99.99)), "99");
        assert_eq!(format_full_euro(dec!(1000)), "1000");
    }

    #[test]
    fn religion_lookup() {
        assert_eq!(religion_code("rk"), Some("03"));
        assert_eq!(religion_code("none"), Some("11"));
        assert_eq!(religion_code("unknown"), None);
    }

    #[test]
    fn mandatory_markers_and_person_a() {
        let fields = check_and_generate_entries(&form_data()).unwrap();
        assert_eq!(single(&fields, "E0100001").as_deref(), Some("X"));
        assert_eq!(single(&fields, "E0100013").as_deref(), Some("X"));
        assert_eq!(single(&fields, "E0101601").as_deref(), Some("X"));
        assert_eq!(single(&fields, "E0100401").as_deref(), Some("16.08.1950"));
        assert_eq!(single(&fields, "E0100402").as_deref(), Some("11"));
        assert!(!fields.contains_key(&FieldId::plain("E0101201")));
        assert!(!fields.contains_key(&FieldId::person("E0109706", Person::PersonA)));
    }

    #[test]
    fn tuple_ids_receive_the_same_value() {
        let mut form = form_data();
        form.stmind_haushaltsnahe_summe = Some(dec!(500.75));
        let fields = check_and_generate_entries(&form).unwrap();
        assert_eq!(single(&fields, "E0107207").as_deref(), Some("500"));
        assert_eq!(single(&fields, "E0107208").as_deref(), Some("500"));
    }

    #[test]
    fn joint_assessment_copies_address() {
        let mut form = form_data();
        form.familienstand = Familienstand::Married;
        form.familienstand_date = NaiveDate::from_ymd_opt(1980, 9, 1);
        form.person_b_idnr = Some("02293417683".into());
        form.person_b_same_address = Some(true);
        form.person_b_blind = Some(true);
        let fields = check_and_generate_entries(&form).unwrap();
        assert_eq!(single(&fields, "E0101201").as_deref(), Some("X"));
        assert_eq!(single(&fields, "E0100701").as_deref(), Some("01.09.1980"));
        assert_eq!(single(&fields, "E0102105").as_deref(), Some("Steuerweg"));
        assert_eq!(single(&fields, "E0101702").as_deref(), Some("Hamburg"));
        assert_eq!(
            fields.get(&FieldId::person("E0109706", Person::PersonB)),
            Some(&FieldValue::Single("1".into()))
        );
    }

    #[test]
    fn shared_household_entries_stay_repeated() {
        let mut form = form_data();
        form.stmind_gem_haushalt_count = Some(2);
        form.stmind_gem_haushalt_entries = Some(vec!["Eva".into(), "Tom".into()]);
        form.stmind_handwerker_entries = Some(vec!["Dach".into(), "Fenster".into()]);
        let fields = check_and_generate_entries(&form).unwrap();
        assert_eq!(
            fields.get(&FieldId::plain("E0104706")),
            Some(&FieldValue::Repeated(vec!["Eva".into(), "Tom".into()]))
        );
        assert_eq!(single(&fields, "E0111217").as_deref(), Some("Dach, Fenster"));
        assert_eq!(single(&fields, "E0107606").as_deref(), Some("2"));
    }

    #[test]
    fn separation_date() {
        let mut form = form_data();
        form.familienstand = Familienstand::Married;
        form.familienstand_married_lived_separated = Some(true);
        form.familienstand_married_lived_separated_since = NaiveDate::from_ymd_opt(2019, 3, 1);
        let fields = check_and_generate_entries(&form).unwrap();
        assert_eq!(single(&fields, "E0100704").as_deref(), Some("01.03.2019"));
    }

    #[test]
    fn zero_amounts_are_dropped() {
        let mut form = form_data();
        form.stmind_spenden_inland = Some(dec!(0));
        let fields = check_and_generate_entries(&form).unwrap();
        assert!(!fields.contains_key(&FieldId::plain("E0108105")));
    }
}
