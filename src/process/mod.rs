//! Process and request controllers.
//!
//! A process controller runs one document for one Verfahren through an
//! open ERiC session. Request controllers sit on top: they validate typed
//! input, assemble the document and turn the responses into results.

pub mod controller;
pub mod requests;
pub mod tax_offices;

pub use controller::{ProcessController, Verfahren, decrypt_belege, get_decrypted_belege};
pub use requests::{
    AbrufcodeRequestController, AbrufcodeResponse, ElsterResponses, EstRequestController, EstResponse,
    EstValidationRequestController, EstValidationResponse, GetAddressRequestController, GetAddressResponse,
    PermitListingRequestController, PermitListingResponse, RequestController, SPECIAL_TESTMERKER_IDNR,
    TaxOfficesRequestController, UnlockCodeActivationRequestController, UnlockCodeRequestController,
    UnlockCodeResponse, UnlockCodeRevocationRequestController, UnlockCodeRevocationResponse,
    is_testmerker_idnr,
};
pub use tax_offices::{
    STATE_COUNT, StateTaxOffices, TaxOfficeList, get_tax_office_list, list_tax_offices, standardise_state_id_list,
    state_abbreviation,
};
