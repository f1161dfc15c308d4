//! Builds the data portion of every ELSTER request and has ERiC wrap it in a
//! TransferHeader.
//!
//! Each document has the same envelope:
//!
//! ```text
//! <Elster xmlns="http://www.elster.de/elsterxml/schema/v11">
//!     <DatenTeil>
//!         <Nutzdatenblock>
//!             <NutzdatenHeader version="11">...</NutzdatenHeader>
//!             <Nutzdaten>...</Nutzdaten>
//!         </Nutzdatenblock>
//!     </DatenTeil>
//! </Elster>
//! ```
//!
//! The body below `Nutzdaten` and its `version` attribute depend on the
//! [`RequestKind`].

use chrono::{Datelike, Days, Local, NaiveDate};
use tracing::debug;

use crate::core::{ElsterError, FieldMap, Settings, Vorsatz};
use crate::eric::{EricBindings, EricSession};

use super::element::Element;
use super::est_tree::est_trees;
use super::field_tree::encode_all;
use super::transfer_header::RequestKind;

pub const ELSTER_NAMESPACE: &str = "http://www.elster.de/elsterxml/schema/v11";
pub const NUTZDATEN_HEADER_VERSION: &str = "11";
/// Assessment year used for document retrieval and permission requests.
pub const DEFAULT_VERANLAGUNGSJAHR: i32 = 2020;
/// Minimum number of days a data retrieval permission must be valid.
pub const MIN_PERMISSION_DAYS: u64 = 130;

/// Namespace of the ESt declaration body for a given year.
pub fn e10_namespace(year: i32) -> String {
    format!("http://finkonsens.de/elster/elstererklaerung/est/e10/v{year}")
}

/// Inputs for one request document.
#[derive(Debug, Clone, Copy)]
pub enum RequestPayload<'a> {
    Est {
        fields: &'a FieldMap,
        vorsatz: &'a Vorsatz,
        year: i32,
        /// BuFa number of the receiving tax office.
        empfaenger: &'a str,
    },
    UnlockCodeRequest {
        idnr: &'a str,
        dob: NaiveDate,
    },
    UnlockCodeActivation {
        elster_request_id: &'a str,
        unlock_code: &'a str,
    },
    UnlockCodeRevocation {
        elster_request_id: &'a str,
    },
    PermitListing,
    BelegIdRequest {
        idnr: &'a str,
    },
    BelegRequest {
        idnr: &'a str,
        beleg_ids: &'a [String],
    },
    AbrufcodeRequest,
}

impl RequestPayload<'_> {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestPayload::Est { .. } => RequestKind::Est,
            RequestPayload::UnlockCodeRequest { .. } => RequestKind::UnlockCodeRequest,
            RequestPayload::UnlockCodeActivation { .. } => RequestKind::UnlockCodeActivation,
            RequestPayload::UnlockCodeRevocation { .. } => RequestKind::UnlockCodeRevocation,
            RequestPayload::PermitListing => RequestKind::PermitListing,
            RequestPayload::BelegIdRequest { .. } => RequestKind::BelegIdRequest,
            RequestPayload::BelegRequest { .. } => RequestKind::BelegRequest,
            RequestPayload::AbrufcodeRequest => RequestKind::AbrufcodeRequest,
        }
    }
}

/// Builds request documents from typed inputs.
pub struct DocumentAssembler<'a> {
    settings: &'a Settings,
    today: NaiveDate,
    veranlagungsjahr: i32,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            today: Local::now().date_naive(),
            veranlagungsjahr: DEFAULT_VERANLAGUNGSJAHR,
        }
    }

    /// Fix the date used for the permission validity period.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_veranlagungsjahr(mut self, year: i32) -> Self {
        self.veranlagungsjahr = year;
        self
    }

    /// Build the data portion (everything except the TransferHeader).
    pub fn build_data_document(&self, payload: &RequestPayload<'_>) -> Result<Element, ElsterError> {
        let blocks = match payload {
            RequestPayload::Est {
                fields,
                vorsatz,
                year,
                empfaenger,
            } => vec![est_block(fields, vorsatz, *year, empfaenger)?],
            RequestPayload::BelegRequest { idnr, beleg_ids } => beleg_ids
                .iter()
                .map(|id| vast_block(id, self.beleg_abholung(idnr, id)))
                .collect(),
            other => vec![vast_block("1", self.vast_body(other)?)],
        };

        Ok(Element::new("Elster")
            .with_attr("xmlns", ELSTER_NAMESPACE)
            .with_child(Element::new("DatenTeil").with_children(blocks)))
    }

    /// Pretty-printed data portion as handed to ERiC.
    pub fn data_xml(&self, payload: &RequestPayload<'_>) -> Result<String, ElsterError> {
        self.build_data_document(payload)?.to_pretty_string()
    }

    /// Build the full request: data portion plus the TransferHeader created
    /// by ERiC within `session`.
    pub fn assemble<B: EricBindings + ?Sized>(
        &self,
        session: &EricSession<'_, B>,
        payload: &RequestPayload<'_>,
        use_testmerker: bool,
    ) -> Result<String, ElsterError> {
        let kind = payload.kind();
        let xml = self.data_xml(payload)?;
        let th_fields = kind.th_fields(self.settings, use_testmerker);
        debug!(datenart = kind.datenart(), testmerker = %th_fields.testmerker, "creating transfer header");
        Ok(session.create_th(&xml, &th_fields)?)
    }

    fn vast_body(&self, payload: &RequestPayload<'_>) -> Result<Element, ElsterError> {
        let body = match payload {
            RequestPayload::UnlockCodeRequest { idnr, dob } => Element::new("SpezRechtAntrag")
                .with_attr("version", "3")
                .with_child(Element::text_element("DateninhaberIdNr", *idnr))
                .with_child(Element::text_element(
                    "DateninhaberGeburtstag",
                    dob.format("%Y-%m-%d").to_string(),
                ))
                .with_child(Element::text_element("Recht", "AbrufEBelege"))
                .with_child(Element::text_element(
                    "GueltigBis",
                    compute_valid_until_date(self.today).format("%Y-%m-%d").to_string(),
                ))
                .with_child(Element::text_element(
                    "DatenabruferMail",
                    self.settings.testing_email_address.as_str(),
                ))
                .with_child(
                    Element::new("Veranlagungszeitraum")
                        .with_child(Element::text_element("Unbeschraenkt", "false"))
                        .with_child(Element::new("Veranlagungsjahre").with_child(
                            Element::text_element("Jahr", self.veranlagungsjahr.to_string()),
                        )),
                ),
            RequestPayload::UnlockCodeActivation {
                elster_request_id,
                unlock_code,
            } => Element::new("SpezRechtFreischaltung")
                .with_attr("version", "1")
                .with_child(Element::text_element("AntragsID", *elster_request_id))
                .with_child(Element::text_element("Freischaltcode", *unlock_code)),
            RequestPayload::UnlockCodeRevocation { elster_request_id } => Element::new("SpezRechtStorno")
                .with_attr("version", "3")
                .with_child(Element::text_element("AntragsID", *elster_request_id)),
            RequestPayload::PermitListing => Element::new("SpezRechtListe").with_attr("version", "7"),
            RequestPayload::BelegIdRequest { idnr } => Element::new("Datenabholung")
                .with_attr("version", "10")
                .with_child(
                    Element::new("Anfrage")
                        .with_attr("idnr", *idnr)
                        .with_attr("veranlagungsjahr", self.veranlagungsjahr.to_string()),
                ),
            RequestPayload::AbrufcodeRequest => Element::new("AbrufcodeAntrag").with_child(
                Element::text_element("EMail", self.settings.testing_email_address.as_str()),
            ),
            RequestPayload::Est { .. } | RequestPayload::BelegRequest { .. } => {
                return Err(ElsterError::Encode(format!(
                    "{} documents do not use a single VaSt body",
                    payload.kind().datenart()
                )));
            }
        };
        Ok(body)
    }

    fn beleg_abholung(&self, idnr: &str, beleg_id: &str) -> Element {
        Element::new("Datenabholung").with_attr("version", "10").with_child(
            Element::new("Abholung")
                .with_attr("id", beleg_id)
                .with_attr("idnr", idnr)
                .with_attr("veranlagungsjahr", self.veranlagungsjahr.to_string()),
        )
    }
}

fn nutzdaten_header(ticket: &str, empfaenger_id: &str, empfaenger: &str) -> Element {
    Element::new("NutzdatenHeader")
        .with_attr("version", NUTZDATEN_HEADER_VERSION)
        .with_child(Element::text_element("NutzdatenTicket", ticket))
        .with_child(Element::text_element("Empfaenger", empfaenger).with_attr("id", empfaenger_id))
}

fn vast_block(ticket: &str, body: Element) -> Element {
    Element::new("Nutzdatenblock")
        .with_child(nutzdaten_header(ticket, "L", "CS"))
        .with_child(Element::new("Nutzdaten").with_child(body))
}

fn est_block(
    fields: &FieldMap,
    vorsatz: &Vorsatz,
    year: i32,
    empfaenger: &str,
) -> Result<Element, ElsterError> {
    let e10 = Element::new("E10")
        .with_attr("version", year.to_string())
        .with_attr("xmlns", e10_namespace(year))
        .with_children(encode_all(est_trees(), fields)?)
        .with_child(vorsatz_element(vorsatz));

    Ok(Element::new("Nutzdatenblock")
        .with_child(nutzdaten_header("1", "F", empfaenger))
        .with_child(Element::new("Nutzdaten").with_child(e10)))
}

fn vorsatz_element(vorsatz: &Vorsatz) -> Element {
    let mut el = Element::new("Vorsatz")
        .with_child(Element::text_element("Unterfallart", vorsatz.unterfallart.as_str()))
        .with_child(Element::text_element("Vorgang", vorsatz.vorgang.as_str()));
    if let Some(st_nr) = &vorsatz.st_nr {
        el.push(Element::text_element("StNr", st_nr.as_str()));
    }
    el.push(Element::text_element("ID", vorsatz.id_person_a.as_str()));
    if let Some(id_b) = &vorsatz.id_person_b {
        el.push(Element::text_element("IDEhefrau", id_b.as_str()));
    }
    el.with_child(Element::text_element("Zeitraum", vorsatz.zeitraum.as_str()))
        .with_child(Element::text_element("AbsName", vorsatz.abs_name.as_str()))
        .with_child(Element::text_element("AbsStr", vorsatz.abs_str.as_str()))
        .with_child(Element::text_element("AbsPlz", vorsatz.abs_plz.as_str()))
        .with_child(Element::text_element("AbsOrt", vorsatz.abs_ort.as_str()))
        .with_child(Element::text_element("Copyright", vorsatz.copyright.as_str()))
        .with_child(Element::text_element("OrdNrArt", vorsatz.ord_nr_art.as_str()))
        .with_child(
            Element::new("Rueckuebermittlung")
                .with_child(Element::text_element("Bescheid", vorsatz.bescheid.as_str())),
        )
}

/// End of the validity period requested for a data retrieval permission:
/// Dec 31 of the current year, unless that is less than 130 days away.
pub fn compute_valid_until_date(today: NaiveDate) -> NaiveDate {
    let end_of_year = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
    let minimum = today
        .checked_add_days(Days::new(MIN_PERMISSION_DAYS))
        .unwrap_or(end_of_year);
    end_of_year.max(minimum)
}

/// Wrap decrypted Belege under a single `<Belege>` root.
///
/// Each Beleg keeps its own default namespace declaration.
pub fn get_belege_xml(decrypted_belege: &[String]) -> Result<String, ElsterError> {
    let mut root = Element::new("Belege");
    for beleg in decrypted_belege {
        root.push(Element::parse(beleg)?);
    }
    root.to_xml_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn valid_until_date() {
        assert_eq!(compute_valid_until_date(date(2020, 5, 4)), date(2020, 12, 31));
        assert_eq!(compute_valid_until_date(date(2020, 8, 23)), date(2020, 12, 31));
        assert_eq!(compute_valid_until_date(date(2020, 8, 24)), date(2021, 1, 1));
    }

    #[test]
    fn permit_listing_document() {
        let settings = Settings::for_testing();
        let xml = DocumentAssembler::new(&settings)
            .data_xml(&RequestPayload::PermitListing)
            .unwrap();
        assert!(xml.starts_with(r#"<Elster xmlns="http://www.elster.de/elsterxml/schema/v11">"#));
        assert!(xml.contains(r#"<SpezRechtListe version="7"/>"#));
        assert!(xml.contains(r#"<Empfaenger id="L">CS</Empfaenger>"#));
        assert_eq!(xml.matches("xmlns=").count(), 1);
    }

    #[test]
    fn beleg_request_has_one_block_per_id() {
        let settings = Settings::for_testing();
        let ids = vec!["vg1".to_string(), "vg2".to_string()];
        let doc = DocumentAssembler::new(&settings)
            .build_data_document(&RequestPayload::BelegRequest {
                idnr: "04452397687",
                beleg_ids: &ids,
            })
            .unwrap();
        let tickets: Vec<_> = doc
            .find_all("NutzdatenTicket")
            .iter()
            .filter_map(|e| e.text.clone())
            .collect();
        assert_eq!(tickets, vec!["vg1", "vg2"]);
        let abholung = doc.find("Abholung").unwrap();
        assert_eq!(abholung.attr("id"), Some("vg1"));
        assert_eq!(abholung.attr("veranlagungsjahr"), Some("2020"));
    }

    #[test]
    fn belege_keep_their_namespaces() {
        let belege = vec![
            r#"<VaSt_Pers1 xmlns="http://www.elster.de/2002/XMLSchema"><AdrKette/></VaSt_Pers1>"#.to_string(),
        ];
        let xml = get_belege_xml(&belege).unwrap();
        assert_eq!(
            xml,
            r#"<Belege><VaSt_Pers1 xmlns="http://www.elster.de/2002/XMLSchema"><AdrKette/></VaSt_Pers1></Belege>"#
        );
    }
}
