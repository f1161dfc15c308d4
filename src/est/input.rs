//! Request input models.
//!
//! These mirror the JSON bodies callers send for each request kind and are
//! deserialized with serde. Validation beyond the type level lives in
//! [`super::validate`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::steuernummer::Bundesland;
use crate::core::SubmitterIdentity;

/// Marital status as selected in the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Familienstand {
    Single,
    Married,
    Widowed,
    Divorced,
}

/// Form data of an income tax declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDataEst {
    pub steuernummer: Option<String>,
    pub submission_without_tax_nr: Option<bool>,
    pub bufa_nr: Option<String>,
    pub bundesland: Bundesland,
    pub iban: Option<String>,
    pub is_person_a_account_holder: bool,

    pub familienstand: Familienstand,
    pub familienstand_date: Option<NaiveDate>,
    pub familienstand_married_lived_separated: Option<bool>,
    pub familienstand_married_lived_separated_since: Option<NaiveDate>,
    pub familienstand_widowed_lived_separated: Option<bool>,
    pub familienstand_widowed_lived_separated_since: Option<NaiveDate>,

    pub person_a_idnr: String,
    pub person_a_dob: NaiveDate,
    pub person_a_last_name: String,
    pub person_a_first_name: String,
    pub person_a_religion: String,
    pub person_a_street: String,
    pub person_a_street_number: String,
    pub person_a_street_number_ext: Option<String>,
    pub person_a_address_ext: Option<String>,
    pub person_a_plz: String,
    pub person_a_town: String,
    pub person_a_beh_grad: Option<u32>,
    pub person_a_blind: bool,
    pub person_a_gehbeh: Option<bool>,

    pub person_b_same_address: Option<bool>,
    pub person_b_idnr: Option<String>,
    pub person_b_dob: Option<NaiveDate>,
    pub person_b_last_name: Option<String>,
    pub person_b_first_name: Option<String>,
    pub person_b_religion: Option<String>,
    pub person_b_street: Option<String>,
    pub person_b_street_number: Option<String>,
    pub person_b_street_number_ext: Option<String>,
    pub person_b_address_ext: Option<String>,
    pub person_b_plz: Option<String>,
    pub person_b_town: Option<String>,
    pub person_b_beh_grad: Option<u32>,
    pub person_b_blind: Option<bool>,
    pub person_b_gehbeh: Option<bool>,

    pub steuerminderung: bool,
    pub stmind_haushaltsnahe_entries: Option<Vec<String>>,
    pub stmind_haushaltsnahe_summe: Option<Decimal>,
    pub stmind_handwerker_entries: Option<Vec<String>>,
    pub stmind_handwerker_summe: Option<Decimal>,
    pub stmind_handwerker_lohn_etc_summe: Option<Decimal>,

    pub stmind_vorsorge_summe: Option<Decimal>,
    pub stmind_spenden_inland: Option<Decimal>,
    pub stmind_spenden_inland_parteien: Option<Decimal>,
    pub stmind_religion_paid_summe: Option<Decimal>,
    pub stmind_religion_reimbursed_summe: Option<Decimal>,

    pub stmind_krankheitskosten_summe: Option<Decimal>,
    pub stmind_krankheitskosten_anspruch: Option<Decimal>,
    pub stmind_pflegekosten_summe: Option<Decimal>,
    pub stmind_pflegekosten_anspruch: Option<Decimal>,
    pub stmind_beh_aufw_summe: Option<Decimal>,
    pub stmind_beh_aufw_anspruch: Option<Decimal>,
    pub stmind_beh_kfz_summe: Option<Decimal>,
    pub stmind_beh_kfz_anspruch: Option<Decimal>,
    pub stmind_bestattung_summe: Option<Decimal>,
    pub stmind_bestattung_anspruch: Option<Decimal>,
    pub stmind_aussergbela_sonst_summe: Option<Decimal>,
    pub stmind_aussergbela_sonst_anspruch: Option<Decimal>,

    pub stmind_gem_haushalt_count: Option<u32>,
    pub stmind_gem_haushalt_entries: Option<Vec<String>>,
}

/// Submission metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaDataEst {
    pub year: i32,
    pub is_digitally_signed: bool,
}

/// Body of a declaration (or declaration validation) request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstData {
    pub est_data: FormDataEst,
    pub meta_data: MetaDataEst,
}

impl EstData {
    /// Submitter identity for the Vorsatz, taken from PersonA.
    pub fn submitter_identity(&self) -> SubmitterIdentity {
        let form = &self.est_data;
        SubmitterIdentity {
            year: self.meta_data.year,
            person_a_idnr: form.person_a_idnr.clone(),
            person_b_idnr: form.person_b_idnr.clone().filter(|id| !id.is_empty()),
            first_name: form.person_a_first_name.clone(),
            last_name: form.person_a_last_name.clone(),
            street: form.person_a_street.clone(),
            street_number: form.person_a_street_number.clone(),
            plz: form.person_a_plz.clone(),
            town: form.person_a_town.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockCodeRequestData {
    pub idnr: String,
    pub dob: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockCodeActivationData {
    pub idnr: String,
    pub unlock_code: String,
    pub elster_request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockCodeRevocationData {
    pub idnr: String,
    pub elster_request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAddressData {
    pub idnr: String,
}
