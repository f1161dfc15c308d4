//! Transfer header parameters per request kind.

use crate::core::{Settings, TransferHeaderFields};

/// Vorgang used for every authenticated submission.
pub const TH_VORGANG: &str = "send-Auth";
/// Client protocol version reported in the TransferHeader.
pub const TH_VERSION_CLIENT: &str = "1";

/// The kinds of documents the assembler can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Est,
    UnlockCodeRequest,
    UnlockCodeActivation,
    UnlockCodeRevocation,
    PermitListing,
    BelegIdRequest,
    BelegRequest,
    AbrufcodeRequest,
}

impl RequestKind {
    pub fn datenart(self) -> &'static str {
        match self {
            RequestKind::Est => "ESt",
            RequestKind::UnlockCodeRequest => "SpezRechtAntrag",
            RequestKind::UnlockCodeActivation => "SpezRechtFreischaltung",
            RequestKind::UnlockCodeRevocation => "SpezRechtStorno",
            RequestKind::PermitListing => "SpezRechtListe",
            RequestKind::BelegIdRequest | RequestKind::BelegRequest => "ElsterVaStDaten",
            RequestKind::AbrufcodeRequest => "AbrufcodeAntrag",
        }
    }

    /// Procedure named in the TransferHeader.
    pub fn th_verfahren(self) -> &'static str {
        match self {
            RequestKind::Est => "ElsterErklaerung",
            RequestKind::UnlockCodeRequest
            | RequestKind::UnlockCodeActivation
            | RequestKind::UnlockCodeRevocation
            | RequestKind::PermitListing => "ElsterBRM",
            RequestKind::BelegIdRequest | RequestKind::BelegRequest => "ElsterDatenabholung",
            RequestKind::AbrufcodeRequest => "ElsterSignatur",
        }
    }

    /// Build the header fields, applying the test marker when the settings
    /// ask for it or when `force_testmerker` is set.
    pub fn th_fields(self, settings: &Settings, force_testmerker: bool) -> TransferHeaderFields {
        let verfahren = self.th_verfahren();
        let testmerker = if settings.use_testmerker || force_testmerker {
            testmerker_for(verfahren).unwrap_or_default()
        } else {
            ""
        };
        TransferHeaderFields {
            datenart: self.datenart().to_string(),
            verfahren: verfahren.to_string(),
            testmerker: testmerker.to_string(),
            hersteller_id: settings.hersteller_id.clone(),
            daten_lieferant: settings.elster_datenlieferant.clone(),
            vorgang: TH_VORGANG.to_string(),
            version_client: TH_VERSION_CLIENT.to_string(),
        }
    }
}

/// Test marker value for a TransferHeader procedure.
pub fn testmerker_for(th_verfahren: &str) -> Option<&'static str> {
    match th_verfahren {
        "ElsterErklaerung" => Some("700000004"),
        "ElsterDatenabholung" | "ElsterBRM" => Some("370000001"),
        "ElsterSignatur" => Some("080000001"),
        _ => None,
    }
}
