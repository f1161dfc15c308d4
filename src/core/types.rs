use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the (at most two) taxpayers of a joint declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Person {
    PersonA,
    PersonB,
}

impl Person {
    /// Persons in the order their person-specific blocks are emitted.
    pub const ALL: [Person; 2] = [Person::PersonA, Person::PersonB];

    pub fn as_str(self) -> &'static str {
        match self {
            Person::PersonA => "PersonA",
            Person::PersonB => "PersonB",
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of an ELSTER field value.
///
/// Most fields are identified by their plain ELSTER id (e.g. `E0100201`).
/// Fields living below a person-specific block carry the person as well,
/// since the same id appears once per person.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldId {
    Plain(String),
    PersonSpecific(String, Person),
}

impl FieldId {
    pub fn plain(id: impl Into<String>) -> Self {
        FieldId::Plain(id.into())
    }

    pub fn person(id: impl Into<String>, person: Person) -> Self {
        FieldId::PersonSpecific(id.into(), person)
    }

    /// The ELSTER identifier without the person.
    pub fn identifier(&self) -> &str {
        match self {
            FieldId::Plain(id) | FieldId::PersonSpecific(id, _) => id,
        }
    }
}

impl From<&str> for FieldId {
    fn from(id: &str) -> Self {
        FieldId::Plain(id.to_string())
    }
}

/// Value bound to a [`FieldId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    /// Parallel-indexed values for leaves below a repeatable group.
    Repeated(Vec<String>),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Repeated(values)
    }
}

/// Elsterified form data: at most one value per field id.
pub type FieldMap = BTreeMap<FieldId, FieldValue>;

/// Identity of the submitter as needed for the Vorsatz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitterIdentity {
    pub year: i32,
    pub person_a_idnr: String,
    pub person_b_idnr: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub street_number: String,
    pub plz: String,
    pub town: String,
}

/// Preamble record identifying submitter, taxpayers and filing period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vorsatz {
    pub unterfallart: String,
    pub ord_nr_art: String,
    pub vorgang: String,
    /// Electronic Steuernummer; absent for a first-time filer.
    pub st_nr: Option<String>,
    pub id_person_a: String,
    pub id_person_b: Option<String>,
    pub zeitraum: String,
    pub abs_name: String,
    pub abs_str: String,
    pub abs_plz: String,
    pub abs_ort: String,
    pub copyright: String,
    pub bescheid: String,
}

impl Vorsatz {
    /// Vorsatz for a taxpayer already known to the tax office.
    pub fn with_tax_number(
        electronic_steuernummer: impl Into<String>,
        identity: &SubmitterIdentity,
        copyright: &str,
    ) -> Self {
        Self::build(Some(electronic_steuernummer.into()), "S", identity, copyright)
    }

    /// Vorsatz for a first-time filer without an assigned tax number.
    pub fn without_tax_number(identity: &SubmitterIdentity, copyright: &str) -> Self {
        Self::build(None, "O", identity, copyright)
    }

    fn build(
        st_nr: Option<String>,
        ord_nr_art: &str,
        identity: &SubmitterIdentity,
        copyright: &str,
    ) -> Self {
        Self {
            unterfallart: "10".into(),
            ord_nr_art: ord_nr_art.into(),
            vorgang: "04".into(),
            st_nr,
            id_person_a: identity.person_a_idnr.clone(),
            id_person_b: identity.person_b_idnr.clone(),
            zeitraum: identity.year.to_string(),
            abs_name: format!("{} {}", identity.first_name, identity.last_name),
            abs_str: format!("{} {}", identity.street, identity.street_number),
            abs_plz: identity.plz.clone(),
            abs_ort: identity.town.clone(),
            copyright: copyright.into(),
            bescheid: "2".into(),
        }
    }
}

/// Parameters ERiC needs to wrap a payload in its TransferHeader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferHeaderFields {
    pub datenart: String,
    pub verfahren: String,
    /// Empty when the submission is a real (non-test) case.
    pub testmerker: String,
    pub hersteller_id: String,
    pub daten_lieferant: String,
    pub vorgang: String,
    pub version_client: String,
}

/// Raw outcome of one ERiC process call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EricResponse {
    pub result_code: i32,
    pub eric_response: Vec<u8>,
    pub server_response: Vec<u8>,
    pub pdf: Option<Vec<u8>>,
}

/// Decoded outcome handed from the process controllers to the request layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessResponse {
    pub eric_response: String,
    pub server_response: String,
    pub pdf: Option<Vec<u8>>,
}

impl From<EricResponse> for ProcessResponse {
    fn from(response: EricResponse) -> Self {
        Self {
            eric_response: String::from_utf8_lossy(&response.eric_response).into_owned(),
            server_response: String::from_utf8_lossy(&response.server_response).into_owned(),
            pdf: response.pdf,
        }
    }
}

/// A federal state as listed by ERiC, with its state id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub name: String,
    pub id: String,
}

/// A tax office and its Bundesfinanzamt number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxOffice {
    pub name: String,
    pub bufa_nr: String,
}
