use std::ffi::NulError;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::codes::{ERIC_TRANSFER_ERR_XML_NHEADER, ResultCategory, result_code_name};
use crate::core::ErrorResponse;
use crate::xml::parse::{get_elements_text, server_error_contains_code};

/// NDH error code reported when an unlock code was already revoked.
pub const ALREADY_REVOKED_NDH_CODE: &str = "371015213";

const ALREADY_REQUESTED_MESSAGES: [&str; 2] = [
    "Es besteht bereits ein offener Antrag auf Erteilung einer Berechtigung zum Datenabruf",
    "Es besteht bereits eine Berechtigung mit der gleichen Gültigkeitsdauer",
];

const ANTRAG_NOT_FOUND_MESSAGE: &str = "Es ist kein Antrag auf Erteilung einer Berechtigung zum Datenabruf bzw. keine Berechtigung zum Widerruf vorhanden.";

/// Result code reported for an already open unlock code request.
pub const ALREADY_REQUESTED_RES_CODE: i32 = 3;
/// Result code reported for an unknown unlock code request id.
pub const ANTRAG_NOT_FOUND_RES_CODE: i32 = 5;

/// Error details ERiC extracts from a failed server response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ServerErrorMessage {
    #[serde(rename = "TH_RES_CODE")]
    pub th_res_code: String,
    #[serde(rename = "TH_ERR_MSG")]
    pub th_err_msg: String,
    /// Error block of the NutzdatenHeader, as XML.
    #[serde(rename = "NDH_ERR_XML")]
    pub ndh_err_xml: String,
}

/// A failed native process call with everything needed to diagnose it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessFailure {
    pub res_code: i32,
    pub eric_response: String,
    pub server_response: String,
    pub server_err_msg: Option<ServerErrorMessage>,
}

impl ProcessFailure {
    pub fn new(res_code: i32) -> Self {
        Self {
            res_code,
            ..Self::default()
        }
    }
}

/// Errors raised by the ERiC transport layer.
///
/// Native calls produce [`EricError::Process`]; [`EricError::classify`] turns it
/// into one of the specific variants by result code range and server response.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EricError {
    #[error("{}: {}", .0.res_code, result_code_name(.0.res_code))]
    Process(ProcessFailure),

    #[error("ERiC returned a null pointer")]
    NullReturned,

    #[error("ERiC returned invalid XML")]
    InvalidXmlReturned,

    #[error("argument passed to ERiC contains a NUL byte: {0}")]
    InteriorNul(#[from] NulError),

    #[error("ERiC workspace error: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("{res_code}: {}", code_name(.res_code))]
    GlobalValidation {
        res_code: i32,
        eric_response: String,
        validation_problems: Vec<String>,
    },

    #[error("{res_code}: {}", code_name(.res_code))]
    Global { res_code: i32 },

    #[error("{res_code}: {}", code_name(.res_code))]
    Initialisation { res_code: i32 },

    #[error("{}: {}; server_err_msg: {:?}", .0.res_code, result_code_name(.0.res_code), .0.server_err_msg)]
    Transfer(ProcessFailure),

    #[error("an unlock code request is already open")]
    AlreadyRequested(ProcessFailure),

    #[error("The identifier of the request does not have a representation in the stored data.")]
    AntragNotFound(ProcessFailure),

    #[error("The request for the request code has already been revoked")]
    AlreadyRevoked(ProcessFailure),

    #[error("{res_code}: {}", code_name(.res_code))]
    Crypt { res_code: i32 },

    #[error("{res_code}: {}", code_name(.res_code))]
    Io { res_code: i32 },

    #[error("{res_code}: {}", code_name(.res_code))]
    Print { res_code: i32 },

    #[error("{res_code}: {}", code_name(.res_code))]
    Unknown { res_code: i32 },
}

impl EricError {
    /// Result code carried by the error, if any.
    pub fn res_code(&self) -> Option<i32> {
        match self {
            Self::Process(f) | Self::Transfer(f) | Self::AlreadyRevoked(f) => Some(f.res_code),
            Self::AlreadyRequested(_) => Some(ALREADY_REQUESTED_RES_CODE),
            Self::AntragNotFound(_) => Some(ANTRAG_NOT_FOUND_RES_CODE),
            Self::GlobalValidation { res_code, .. }
            | Self::Global { res_code }
            | Self::Initialisation { res_code }
            | Self::Crypt { res_code }
            | Self::Io { res_code }
            | Self::Print { res_code }
            | Self::Unknown { res_code } => Some(*res_code),
            Self::NullReturned => Some(1),
            Self::InvalidXmlReturned | Self::InteriorNul(_) | Self::Workspace(_) => None,
        }
    }

    /// Public error code reported to callers.
    pub fn error_code(&self) -> i32 {
        match self {
            Self::Global { .. } => 1,
            Self::GlobalValidation { .. } => 2,
            Self::Initialisation { .. } => 3,
            Self::Transfer(_) => 4,
            Self::Crypt { .. } => 5,
            Self::Io { .. } => 6,
            Self::Print { .. } => 7,
            Self::NullReturned => 8,
            Self::AlreadyRequested(_) => 9,
            Self::AntragNotFound(_) => 10,
            Self::AlreadyRevoked(_) => 11,
            Self::Unknown { .. } => 100,
            Self::Process(_) | Self::InvalidXmlReturned | Self::InteriorNul(_) | Self::Workspace(_) => -1,
        }
    }

    /// Turn a raw process failure into its specific variant. Other errors
    /// are returned unchanged.
    pub fn classify(self) -> Self {
        let Self::Process(failure) = self else {
            return self;
        };
        let res_code = failure.res_code;
        match ResultCategory::of(res_code) {
            ResultCategory::GlobalValidation => Self::GlobalValidation {
                res_code,
                validation_problems: validation_problems(&failure.eric_response),
                eric_response: failure.eric_response,
            },
            ResultCategory::GlobalInitialisation => Self::Initialisation { res_code },
            ResultCategory::Global => Self::Global { res_code },
            ResultCategory::Transfer => classify_transfer(failure),
            ResultCategory::Crypt => Self::Crypt { res_code },
            ResultCategory::Io => Self::Io { res_code },
            ResultCategory::Print => Self::Print { res_code },
            ResultCategory::Success | ResultCategory::Unknown => Self::Unknown { res_code },
        }
    }

    /// JSON envelope describing this error to the caller.
    pub fn to_error_response(&self, include_responses: bool) -> ErrorResponse {
        let message = match self.res_code() {
            Some(code) => result_code_name(code).to_string(),
            None => self.to_string(),
        };
        let mut response = ErrorResponse::new(self.error_code(), message);

        match self {
            Self::GlobalValidation {
                eric_response,
                validation_problems,
                ..
            } => {
                if !eric_response.is_empty() {
                    response.validation_problems = Some(validation_problems.clone());
                }
                if include_responses {
                    response.eric_response = Some(eric_response.clone());
                }
            }
            Self::Transfer(f) | Self::AlreadyRequested(f) | Self::AntragNotFound(f) | Self::AlreadyRevoked(f) => {
                response.server_err_msg = f.server_err_msg.clone();
                if include_responses {
                    response.eric_response = Some(f.eric_response.clone());
                    response.server_response = Some(f.server_response.clone());
                }
            }
            _ => {}
        }
        response
    }
}

fn code_name(code: &i32) -> &'static str {
    result_code_name(*code)
}

fn validation_problems(eric_response: &str) -> Vec<String> {
    if eric_response.is_empty() {
        return Vec::new();
    }
    get_elements_text(eric_response, "Text").unwrap_or_else(|e| {
        debug!(error = %e, "could not read validation problems from ERiC response");
        Vec::new()
    })
}

fn classify_transfer(failure: ProcessFailure) -> EricError {
    if failure.res_code != ERIC_TRANSFER_ERR_XML_NHEADER {
        return EricError::Transfer(failure);
    }

    let revoked = failure.server_err_msg.as_ref().is_some_and(|msg| {
        !msg.ndh_err_xml.is_empty()
            && server_error_contains_code(&msg.ndh_err_xml, ALREADY_REVOKED_NDH_CODE).unwrap_or(false)
    });
    if revoked {
        return EricError::AlreadyRevoked(failure);
    }

    let server_response = failure.server_response.as_str();
    if ALREADY_REQUESTED_MESSAGES.iter().any(|m| server_response.contains(m)) {
        EricError::AlreadyRequested(failure)
    } else if server_response.contains(ANTRAG_NOT_FOUND_MESSAGE) {
        EricError::AntragNotFound(failure)
    } else {
        EricError::Transfer(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nheader_failure(server_response: &str) -> ProcessFailure {
        ProcessFailure {
            res_code: ERIC_TRANSFER_ERR_XML_NHEADER,
            eric_response: "<EricBearbeiteVorgang/>".into(),
            server_response: server_response.into(),
            server_err_msg: None,
        }
    }

    #[test]
    fn classifies_by_range() {
        let classify = |code| EricError::Process(ProcessFailure::new(code)).classify();
        assert!(matches!(classify(610001083), EricError::Initialisation { .. }));
        assert!(matches!(classify(610001038), EricError::Global { .. }));
        assert!(matches!(classify(610201106), EricError::Crypt { .. }));
        assert!(matches!(classify(610301006), EricError::Io { .. }));
        assert!(matches!(classify(610501002), EricError::Print { .. }));
        assert!(matches!(classify(610101271), EricError::Transfer(_)));
        assert!(matches!(classify(12345), EricError::Unknown { res_code: 12345 }));
    }

    #[test]
    fn global_validation_collects_texts() {
        let failure = ProcessFailure {
            res_code: 610001002,
            eric_response: "<EricBearbeiteVorgang><FehlerRegelpruefung><Text>Feld fehlt</Text></FehlerRegelpruefung><FehlerRegelpruefung><Text>Wert falsch</Text></FehlerRegelpruefung></EricBearbeiteVorgang>".into(),
            ..ProcessFailure::default()
        };
        let err = EricError::Process(failure).classify();
        assert_eq!(err.error_code(), 2);
        let response = err.to_error_response(false);
        assert_eq!(response.message, "ERIC_GLOBAL_PRUEF_FEHLER");
        assert_eq!(
            response.validation_problems,
            Some(vec!["Feld fehlt".to_string(), "Wert falsch".to_string()])
        );
        assert!(response.eric_response.is_none());
    }

    #[test]
    fn already_requested() {
        let err = EricError::Process(nheader_failure(
            "<Text>Es besteht bereits ein offener Antrag auf Erteilung einer Berechtigung zum Datenabruf</Text>",
        ))
        .classify();
        assert!(matches!(err, EricError::AlreadyRequested(_)));
        assert_eq!(err.error_code(), 9);
        assert_eq!(err.to_error_response(false).message, "ALREADY_OPEN_UNLOCK_CODE_REQUEST");
    }

    #[test]
    fn antrag_not_found() {
        let err = EricError::Process(nheader_failure(ANTRAG_NOT_FOUND_MESSAGE)).classify();
        assert!(matches!(err, EricError::AntragNotFound(_)));
        assert_eq!(err.error_code(), 10);
    }

    #[test]
    fn already_revoked_takes_precedence() {
        let mut failure = nheader_failure(ANTRAG_NOT_FOUND_MESSAGE);
        failure.server_err_msg = Some(ServerErrorMessage {
            th_res_code: "0".into(),
            th_err_msg: "".into(),
            ndh_err_xml: "<Fehler><Code>371015213</Code></Fehler>".into(),
        });
        let err = EricError::Process(failure).classify();
        assert!(matches!(err, EricError::AlreadyRevoked(_)));
        assert_eq!(err.error_code(), 11);
    }

    #[test]
    fn transfer_response_includes_server_details() {
        let mut failure = nheader_failure("<Elster/>");
        failure.server_err_msg = Some(ServerErrorMessage::default());
        let err = EricError::Process(failure).classify();
        let json = serde_json::to_value(err.to_error_response(true)).unwrap();
        assert_eq!(json["code"], 4);
        assert_eq!(json["server_response"], "<Elster/>");
        assert!(json["server_err_msg"].get("TH_RES_CODE").is_some());
    }

    #[test]
    fn classify_leaves_other_errors_alone() {
        assert!(matches!(EricError::NullReturned.classify(), EricError::NullReturned));
    }
}
