//! Process controllers: which Verfahren runs with which ERiC flags.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::core::{ElsterError, EricResponse, ProcessResponse, Settings};
use crate::eric::{EricBindings, EricError, EricSession, with_session};
use crate::xml::Element;

/// Procedures ERiC is asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verfahren {
    /// Income tax declaration of the given year (`ESt_<year>`).
    Est(i32),
    SpezRechtAntrag,
    SpezRechtFreischaltung,
    SpezRechtStorno,
    SpezRechtListe,
    AbrufcodeAntrag,
    ElsterVaStDaten,
}

impl fmt::Display for Verfahren {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verfahren::Est(year) => write!(f, "ESt_{year}"),
            Verfahren::SpezRechtAntrag => f.write_str("SpezRechtAntrag"),
            Verfahren::SpezRechtFreischaltung => f.write_str("SpezRechtFreischaltung"),
            Verfahren::SpezRechtStorno => f.write_str("SpezRechtStorno"),
            Verfahren::SpezRechtListe => f.write_str("SpezRechtListe"),
            Verfahren::AbrufcodeAntrag => f.write_str("AbrufcodeAntrag"),
            Verfahren::ElsterVaStDaten => f.write_str("ElsterVaStDaten"),
        }
    }
}

impl FromStr for Verfahren {
    type Err = ElsterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let verfahren = match s {
            "SpezRechtAntrag" => Verfahren::SpezRechtAntrag,
            "SpezRechtFreischaltung" => Verfahren::SpezRechtFreischaltung,
            "SpezRechtStorno" => Verfahren::SpezRechtStorno,
            "SpezRechtListe" => Verfahren::SpezRechtListe,
            "AbrufcodeAntrag" => Verfahren::AbrufcodeAntrag,
            "ElsterVaStDaten" => Verfahren::ElsterVaStDaten,
            other => other
                .strip_prefix("ESt_")
                .and_then(|year| year.parse().ok())
                .map(Verfahren::Est)
                .ok_or_else(|| ElsterError::MalformedInput(format!("unsupported Verfahren '{other}'")))?,
        };
        Ok(verfahren)
    }
}

/// Runs one XML document through ERiC.
///
/// Construction checks the document is well-formed, so malformed input is
/// rejected before any native call.
#[derive(Debug, Clone)]
pub struct ProcessController {
    verfahren: Verfahren,
    xml: String,
    validate_only: bool,
}

impl ProcessController {
    /// Validate and send `xml` for `verfahren`.
    pub fn new(verfahren: Verfahren, xml: impl Into<String>) -> Result<Self, ElsterError> {
        let xml = xml.into();
        Element::parse(&xml)
            .map_err(|e| ElsterError::MalformedInput(format!("request XML does not parse: {e}")))?;
        Ok(Self {
            verfahren,
            xml,
            validate_only: false,
        })
    }

    /// Like [`ProcessController::new`] with the Verfahren given by name.
    pub fn for_name(verfahren: &str, xml: impl Into<String>) -> Result<Self, ElsterError> {
        Self::new(verfahren.parse()?, xml)
    }

    /// Only run ERiC's plausibility checks, do not send.
    pub fn validate_only(mut self) -> Self {
        self.validate_only = true;
        self
    }

    pub fn verfahren(&self) -> Verfahren {
        self.verfahren
    }

    /// Run the procedure within an open session.
    pub fn run_eric<B: EricBindings + ?Sized>(&self, session: &EricSession<'_, B>) -> Result<EricResponse, EricError> {
        let name = self.verfahren.to_string();
        debug!(verfahren = %name, validate_only = self.validate_only, "running ERiC procedure");

        if self.validate_only {
            return session.validate(&self.xml, &name);
        }
        match self.verfahren {
            Verfahren::Est(_) => session.validate_and_send(&self.xml, &name),
            Verfahren::ElsterVaStDaten => {
                let abruf_code = session.settings().abruf_code.clone();
                let mut transfer_handle = 0u32;
                session.process_verfahren(&self.xml, &name, Some(&abruf_code), Some(&mut transfer_handle))
            }
            _ => session.process_verfahren(&self.xml, &name, None, None),
        }
    }

    /// Open a session, run the procedure and decode the responses.
    pub fn get_eric_response<B: EricBindings + ?Sized>(
        &self,
        bindings: &B,
        settings: &Settings,
    ) -> Result<ProcessResponse, ElsterError> {
        with_session(bindings, settings, |session| Ok(self.run_eric(session)?.into()))
    }
}

/// Decrypt retrieved Belege one after another, in input order. The first
/// failure aborts the remaining items.
pub fn decrypt_belege<B: EricBindings + ?Sized>(
    session: &EricSession<'_, B>,
    encrypted_belege: &[String],
) -> Result<Vec<String>, EricError> {
    encrypted_belege
        .iter()
        .map(|beleg| session.decrypt_data(beleg))
        .collect()
}

/// [`decrypt_belege`] in a session of its own.
pub fn get_decrypted_belege<B: EricBindings + ?Sized>(
    bindings: &B,
    settings: &Settings,
    encrypted_belege: &[String],
) -> Result<Vec<String>, ElsterError> {
    with_session(bindings, settings, |session| Ok(decrypt_belege(session, encrypted_belege)?))
}
