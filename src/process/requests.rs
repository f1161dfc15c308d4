//! Request controllers.
//!
//! Each controller takes the typed input of one request kind, builds the
//! document, runs it through ERiC within a single session and returns a
//! serializable result. With `include_elster_responses` the raw ERiC and
//! server responses are added to the result.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use tracing::info;

use crate::core::{ElsterError, ProcessResponse, Settings, Vorsatz};
use crate::eric::{EricBindings, EricSession, with_session};
use crate::est::{
    EstData, GetAddressData, UnlockCodeActivationData, UnlockCodeRequestData, UnlockCodeRevocationData,
    check_and_generate_entries, generate_electronic_steuernummer, validate_est_data,
};
use crate::xml::parse::{get_address, get_antrag_id, get_element_text, get_elements_text, get_relevant_beleg_ids, get_transfer_ticket};
use crate::xml::{DocumentAssembler, RequestPayload, get_belege_xml};

use super::controller::{ProcessController, Verfahren, decrypt_belege};
use super::tax_offices::{TaxOfficeList, list_tax_offices};

/// Tax id used in automated tests; requests for it always carry the test marker.
pub const SPECIAL_TESTMERKER_IDNR: &str = "04452397687";

/// Beleg kind carrying the taxpayer's personal data.
pub const ADDRESS_BELEG_KIND: &str = "VaSt_Pers1";

pub fn is_testmerker_idnr(idnr: &str) -> bool {
    idnr == SPECIAL_TESTMERKER_IDNR
}

/// Raw responses, present only when requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElsterResponses {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eric_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_response: Option<String>,
}

impl ElsterResponses {
    fn new(response: &ProcessResponse, include: bool) -> Self {
        if !include {
            return Self::default();
        }
        Self {
            eric_response: Some(response.eric_response.clone()),
            server_response: Some(response.server_response.clone()),
        }
    }
}

/// A controller for one request kind.
pub trait RequestController {
    type Output: Serialize;

    fn process<B: EricBindings + ?Sized>(&self, bindings: &B) -> Result<Self::Output, ElsterError>;
}

fn transfer_ticket(response: &ProcessResponse) -> Result<Option<String>, ElsterError> {
    if response.server_response.is_empty() {
        return Ok(None);
    }
    get_transfer_ticket(&response.server_response)
}

/// Assemble `payload` and run it for `verfahren` within `session`.
fn run<B: EricBindings + ?Sized>(
    session: &EricSession<'_, B>,
    payload: &RequestPayload<'_>,
    verfahren: Verfahren,
    use_testmerker: bool,
) -> Result<ProcessResponse, ElsterError> {
    let xml = DocumentAssembler::new(session.settings()).assemble(session, payload, use_testmerker)?;
    let controller = ProcessController::new(verfahren, xml)?;
    Ok(controller.run_eric(session)?.into())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstResponse {
    pub transfer_ticket: Option<String>,
    /// Printed declaration, base64 encoded.
    pub pdf: String,
    #[serde(flatten)]
    pub responses: ElsterResponses,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstValidationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_ticket: Option<String>,
    #[serde(flatten)]
    pub responses: ElsterResponses,
}

/// Submits an income tax declaration.
pub struct EstRequestController<'a> {
    settings: &'a Settings,
    input: EstData,
    include_elster_responses: bool,
}

impl<'a> EstRequestController<'a> {
    pub fn new(settings: &'a Settings, input: EstData, include_elster_responses: bool) -> Self {
        Self {
            settings,
            input,
            include_elster_responses,
        }
    }
}

impl RequestController for EstRequestController<'_> {
    type Output = EstResponse;

    fn process<B: EricBindings + ?Sized>(&self, bindings: &B) -> Result<EstResponse, ElsterError> {
        let response = process_est(self.settings, bindings, &self.input, false)?;
        Ok(EstResponse {
            transfer_ticket: transfer_ticket(&response)?,
            pdf: BASE64.encode(response.pdf.as_deref().unwrap_or_default()),
            responses: ElsterResponses::new(&response, self.include_elster_responses),
        })
    }
}

/// Validates an income tax declaration without sending it.
pub struct EstValidationRequestController<'a> {
    settings: &'a Settings,
    input: EstData,
    include_elster_responses: bool,
}

impl<'a> EstValidationRequestController<'a> {
    pub fn new(settings: &'a Settings, input: EstData, include_elster_responses: bool) -> Self {
        Self {
            settings,
            input,
            include_elster_responses,
        }
    }
}

impl RequestController for EstValidationRequestController<'_> {
    type Output = EstValidationResponse;

    fn process<B: EricBindings + ?Sized>(&self, bindings: &B) -> Result<EstValidationResponse, ElsterError> {
        let response = process_est(self.settings, bindings, &self.input, true)?;
        Ok(EstValidationResponse {
            transfer_ticket: transfer_ticket(&response)?,
            responses: ElsterResponses::new(&response, self.include_elster_responses),
        })
    }
}

fn process_est<B: EricBindings + ?Sized>(
    settings: &Settings,
    bindings: &B,
    input: &EstData,
    validate_only: bool,
) -> Result<ProcessResponse, ElsterError> {
    let form = &input.est_data;
    let year = input.meta_data.year;
    let use_testmerker = is_testmerker_idnr(&form.person_a_idnr);
    let accept_test_bufa = settings.accept_test_bufa || use_testmerker;

    validate_est_data(input, accept_test_bufa)?;
    let fields = check_and_generate_entries(form)?;
    let identity = input.submitter_identity();

    let (vorsatz, empfaenger) = match form.steuernummer.as_deref().filter(|s| !s.is_empty()) {
        Some(steuernummer) if form.submission_without_tax_nr != Some(true) => {
            let electronic = generate_electronic_steuernummer(steuernummer, form.bundesland, accept_test_bufa)?;
            let empfaenger = electronic[..4].to_string();
            (
                Vorsatz::with_tax_number(electronic, &identity, &settings.copyright),
                empfaenger,
            )
        }
        _ => (
            Vorsatz::without_tax_number(&identity, &settings.copyright),
            form.bufa_nr.clone().unwrap_or_default(),
        ),
    };

    info!(year, validate_only, without_tax_nr = vorsatz.st_nr.is_none(), "processing ESt declaration");

    with_session(bindings, settings, |session| {
        let payload = RequestPayload::Est {
            fields: &fields,
            vorsatz: &vorsatz,
            year,
            empfaenger: &empfaenger,
        };
        let xml = DocumentAssembler::new(settings).assemble(session, &payload, use_testmerker)?;
        let mut controller = ProcessController::new(Verfahren::Est(year), xml)?;
        if validate_only {
            controller = controller.validate_only();
        }
        Ok(controller.run_eric(session)?.into())
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlockCodeResponse {
    pub elster_request_id: Option<String>,
    pub idnr: String,
    pub transfer_ticket: Option<String>,
    #[serde(flatten)]
    pub responses: ElsterResponses,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlockCodeRevocationResponse {
    pub elster_request_id: Option<String>,
    pub transfer_ticket: Option<String>,
    #[serde(flatten)]
    pub responses: ElsterResponses,
}

/// Requests an unlock code (Freischaltcode) for data retrieval.
pub struct UnlockCodeRequestController<'a> {
    settings: &'a Settings,
    input: UnlockCodeRequestData,
    include_elster_responses: bool,
}

impl<'a> UnlockCodeRequestController<'a> {
    pub fn new(settings: &'a Settings, input: UnlockCodeRequestData, include_elster_responses: bool) -> Self {
        Self {
            settings,
            input,
            include_elster_responses,
        }
    }
}

impl RequestController for UnlockCodeRequestController<'_> {
    type Output = UnlockCodeResponse;

    fn process<B: EricBindings + ?Sized>(&self, bindings: &B) -> Result<UnlockCodeResponse, ElsterError> {
        let payload = RequestPayload::UnlockCodeRequest {
            idnr: &self.input.idnr,
            dob: self.input.dob,
        };
        let use_testmerker = is_testmerker_idnr(&self.input.idnr);
        let response = with_session(bindings, self.settings, |session| {
            run(session, &payload, Verfahren::SpezRechtAntrag, use_testmerker)
        })?;

        Ok(UnlockCodeResponse {
            elster_request_id: get_antrag_id(&response.server_response)?,
            idnr: self.input.idnr.clone(),
            transfer_ticket: transfer_ticket(&response)?,
            responses: ElsterResponses::new(&response, self.include_elster_responses),
        })
    }
}

/// Activates a received unlock code.
pub struct UnlockCodeActivationRequestController<'a> {
    settings: &'a Settings,
    input: UnlockCodeActivationData,
    include_elster_responses: bool,
}

impl<'a> UnlockCodeActivationRequestController<'a> {
    pub fn new(settings: &'a Settings, input: UnlockCodeActivationData, include_elster_responses: bool) -> Self {
        Self {
            settings,
            input,
            include_elster_responses,
        }
    }
}

impl RequestController for UnlockCodeActivationRequestController<'_> {
    type Output = UnlockCodeResponse;

    fn process<B: EricBindings + ?Sized>(&self, bindings: &B) -> Result<UnlockCodeResponse, ElsterError> {
        let payload = RequestPayload::UnlockCodeActivation {
            elster_request_id: &self.input.elster_request_id,
            unlock_code: &self.input.unlock_code,
        };
        let use_testmerker = is_testmerker_idnr(&self.input.idnr);
        let response = with_session(bindings, self.settings, |session| {
            run(session, &payload, Verfahren::SpezRechtFreischaltung, use_testmerker)
        })?;

        Ok(UnlockCodeResponse {
            elster_request_id: get_antrag_id(&response.server_response)?,
            idnr: self.input.idnr.clone(),
            transfer_ticket: transfer_ticket(&response)?,
            responses: ElsterResponses::new(&response, self.include_elster_responses),
        })
    }
}

/// Revokes an unlock code or an open unlock code request.
pub struct UnlockCodeRevocationRequestController<'a> {
    settings: &'a Settings,
    input: UnlockCodeRevocationData,
    include_elster_responses: bool,
}

impl<'a> UnlockCodeRevocationRequestController<'a> {
    pub fn new(settings: &'a Settings, input: UnlockCodeRevocationData, include_elster_responses: bool) -> Self {
        Self {
            settings,
            input,
            include_elster_responses,
        }
    }
}

impl RequestController for UnlockCodeRevocationRequestController<'_> {
    type Output = UnlockCodeRevocationResponse;

    fn process<B: EricBindings + ?Sized>(&self, bindings: &B) -> Result<UnlockCodeRevocationResponse, ElsterError> {
        let payload = RequestPayload::UnlockCodeRevocation {
            elster_request_id: &self.input.elster_request_id,
        };
        let use_testmerker = is_testmerker_idnr(&self.input.idnr);
        let response = with_session(bindings, self.settings, |session| {
            run(session, &payload, Verfahren::SpezRechtStorno, use_testmerker)
        })?;

        Ok(UnlockCodeRevocationResponse {
            elster_request_id: get_antrag_id(&response.server_response)?,
            transfer_ticket: transfer_ticket(&response)?,
            responses: ElsterResponses::new(&response, self.include_elster_responses),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetAddressResponse {
    /// `AdrKette` of the taxpayer; absent when no personal data Beleg exists.
    pub address: Option<String>,
    #[serde(flatten)]
    pub responses: ElsterResponses,
}

/// Retrieves the taxpayer's address from the personal data Beleg.
///
/// Three steps share one session: list the Beleg ids, fetch the encrypted
/// Belege, decrypt them one by one.
pub struct GetAddressRequestController<'a> {
    settings: &'a Settings,
    input: GetAddressData,
    include_elster_responses: bool,
}

impl<'a> GetAddressRequestController<'a> {
    pub fn new(settings: &'a Settings, input: GetAddressData, include_elster_responses: bool) -> Self {
        Self {
            settings,
            input,
            include_elster_responses,
        }
    }
}

impl RequestController for GetAddressRequestController<'_> {
    type Output = GetAddressResponse;

    fn process<B: EricBindings + ?Sized>(&self, bindings: &B) -> Result<GetAddressResponse, ElsterError> {
        let idnr = self.input.idnr.as_str();
        let use_testmerker = is_testmerker_idnr(idnr);

        let belege_xml = with_session(bindings, self.settings, |session| {
            let ids_response = run(
                session,
                &RequestPayload::BelegIdRequest { idnr },
                Verfahren::ElsterVaStDaten,
                use_testmerker,
            )?;
            let beleg_ids = get_relevant_beleg_ids(&ids_response.server_response, &[ADDRESS_BELEG_KIND])?;
            if beleg_ids.is_empty() {
                info!("no personal data Beleg available");
                return Ok(None);
            }

            let belege_response = run(
                session,
                &RequestPayload::BelegRequest {
                    idnr,
                    beleg_ids: &beleg_ids,
                },
                Verfahren::ElsterVaStDaten,
                use_testmerker,
            )?;
            let encrypted = get_elements_text(&belege_response.server_response, "Datenpaket")?;
            let decrypted = decrypt_belege(session, &encrypted)?;
            get_belege_xml(&decrypted).map(Some)
        })?;

        let (address, server_response) = match belege_xml {
            Some(xml) => (get_address(&xml)?, xml),
            None => (None, String::new()),
        };
        let response = ProcessResponse {
            server_response,
            ..ProcessResponse::default()
        };
        Ok(GetAddressResponse {
            address,
            responses: ElsterResponses::new(&response, self.include_elster_responses),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermitListingResponse {
    /// `DatenTeil` of the server response listing the permissions.
    pub permits: Option<String>,
    pub transfer_ticket: Option<String>,
    #[serde(flatten)]
    pub responses: ElsterResponses,
}

/// Lists the data retrieval permissions granted to the data supplier.
pub struct PermitListingRequestController<'a> {
    settings: &'a Settings,
    include_elster_responses: bool,
}

impl<'a> PermitListingRequestController<'a> {
    pub fn new(settings: &'a Settings, include_elster_responses: bool) -> Self {
        Self {
            settings,
            include_elster_responses,
        }
    }
}

impl RequestController for PermitListingRequestController<'_> {
    type Output = PermitListingResponse;

    fn process<B: EricBindings + ?Sized>(&self, bindings: &B) -> Result<PermitListingResponse, ElsterError> {
        let response = with_session(bindings, self.settings, |session| {
            run(session, &RequestPayload::PermitListing, Verfahren::SpezRechtListe, false)
        })?;

        Ok(PermitListingResponse {
            permits: get_element_text(&response.server_response, "DatenTeil")?,
            transfer_ticket: transfer_ticket(&response)?,
            responses: ElsterResponses::new(&response, self.include_elster_responses),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbrufcodeResponse {
    pub abrufcode: Option<String>,
    pub transfer_ticket: Option<String>,
    #[serde(flatten)]
    pub responses: ElsterResponses,
}

/// Requests a new Abrufcode for the data supplier.
///
/// Every call issues a new code at the server; the previous one stops working.
pub struct AbrufcodeRequestController<'a> {
    settings: &'a Settings,
    include_elster_responses: bool,
}

impl<'a> AbrufcodeRequestController<'a> {
    pub fn new(settings: &'a Settings, include_elster_responses: bool) -> Self {
        Self {
            settings,
            include_elster_responses,
        }
    }
}

impl RequestController for AbrufcodeRequestController<'_> {
    type Output = AbrufcodeResponse;

    fn process<B: EricBindings + ?Sized>(&self, bindings: &B) -> Result<AbrufcodeResponse, ElsterError> {
        let response = with_session(bindings, self.settings, |session| {
            run(session, &RequestPayload::AbrufcodeRequest, Verfahren::AbrufcodeAntrag, false)
        })?;

        Ok(AbrufcodeResponse {
            abrufcode: get_element_text(&response.server_response, "abrufcode")?,
            transfer_ticket: transfer_ticket(&response)?,
            responses: ElsterResponses::new(&response, self.include_elster_responses),
        })
    }
}

/// Lists all tax offices, grouped by state.
pub struct TaxOfficesRequestController<'a> {
    settings: &'a Settings,
}

impl<'a> TaxOfficesRequestController<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }
}

impl RequestController for TaxOfficesRequestController<'_> {
    type Output = TaxOfficeList;

    fn process<B: EricBindings + ?Sized>(&self, bindings: &B) -> Result<TaxOfficeList, ElsterError> {
        with_session(bindings, self.settings, |session| list_tax_offices(session))
    }
}
