//! Steuernummer and Bundesfinanzamt (BuFa) number handling.
//!
//! Taxpayers know their Steuernummer in the state-specific format printed on
//! their assessment (10 or 11 digits). ELSTER expects the 13-digit electronic
//! format: the state's BuFa prefix is prepended to obtain the federal scheme,
//! and a `0` is inserted after the four-digit BuFa number.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::ElsterError;

/// German federal states, using the abbreviations of the filing form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bundesland {
    BW,
    BY,
    BE,
    BB,
    HB,
    HH,
    HE,
    MV,
    ND,
    NW,
    RP,
    SL,
    SN,
    ST,
    SH,
    TH,
}

impl Bundesland {
    pub const ALL: [Bundesland; 16] = [
        Bundesland::BW,
        Bundesland::BY,
        Bundesland::BE,
        Bundesland::BB,
        Bundesland::HB,
        Bundesland::HH,
        Bundesland::HE,
        Bundesland::MV,
        Bundesland::ND,
        Bundesland::NW,
        Bundesland::RP,
        Bundesland::SL,
        Bundesland::SN,
        Bundesland::ST,
        Bundesland::SH,
        Bundesland::TH,
    ];

    pub fn abbreviation(self) -> &'static str {
        match self {
            Bundesland::BW => "BW",
            Bundesland::BY => "BY",
            Bundesland::BE => "BE",
            Bundesland::BB => "BB",
            Bundesland::HB => "HB",
            Bundesland::HH => "HH",
            Bundesland::HE => "HE",
            Bundesland::MV => "MV",
            Bundesland::ND => "ND",
            Bundesland::NW => "NW",
            Bundesland::RP => "RP",
            Bundesland::SL => "SL",
            Bundesland::SN => "SN",
            Bundesland::ST => "ST",
            Bundesland::SH => "SH",
            Bundesland::TH => "TH",
        }
    }

    /// Leading digits of every BuFa number in this state.
    pub fn bufa_prefix(self) -> &'static str {
        match self {
            Bundesland::BW => "28",
            Bundesland::BY => "9",
            Bundesland::BE => "11",
            Bundesland::BB => "30",
            Bundesland::HB => "24",
            Bundesland::HH => "22",
            Bundesland::HE => "26",
            Bundesland::MV => "40",
            Bundesland::ND => "23",
            Bundesland::NW => "5",
            Bundesland::RP => "27",
            Bundesland::SL => "10",
            Bundesland::SN => "32",
            Bundesland::ST => "31",
            Bundesland::SH => "21",
            Bundesland::TH => "41",
        }
    }

    /// States whose local format starts with a digit that is not part of
    /// the federal scheme.
    pub fn has_prepended_number(self) -> bool {
        matches!(
            self,
            Bundesland::BB
                | Bundesland::HE
                | Bundesland::MV
                | Bundesland::SL
                | Bundesland::SN
                | Bundesland::ST
                | Bundesland::TH
        )
    }
}

impl fmt::Display for Bundesland {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl FromStr for Bundesland {
    type Err = ElsterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bundesland::ALL
            .into_iter()
            .find(|b| b.abbreviation().eq_ignore_ascii_case(s))
            .ok_or_else(|| ElsterError::MalformedInput(format!("unknown Bundesland '{s}'")))
    }
}

/// Whether `bufa` is a four-digit number within a state's BuFa range.
fn is_known_bufa(bufa: &str) -> bool {
    bufa.len() == 4
        && bufa.bytes().all(|b| b.is_ascii_digit())
        && Bundesland::ALL.iter().any(|b| bufa.starts_with(b.bufa_prefix()))
}

/// Test tax offices occupy the numbers `xx98` and `xx99` of each state.
pub fn is_test_bufa(bufa: &str) -> bool {
    is_known_bufa(bufa) && (bufa.ends_with("98") || bufa.ends_with("99"))
}

/// Check a BuFa number. Test tax offices are only valid with `accept_test`.
pub fn is_valid_bufa(bufa: &str, accept_test: bool) -> bool {
    if !is_known_bufa(bufa) {
        return false;
    }
    accept_test || !is_test_bufa(bufa)
}

/// Convert a state-specific Steuernummer into the 13-digit electronic format.
///
/// Fails with [`ElsterError::InvalidBufaNumber`] if the resulting BuFa number
/// is not valid (see [`is_valid_bufa`]).
pub fn generate_electronic_steuernummer(
    steuernummer: &str,
    bundesland: Bundesland,
    accept_test_bufa: bool,
) -> Result<String, ElsterError> {
    if !steuernummer.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ElsterError::MalformedInput(format!(
            "Steuernummer '{steuernummer}' must only contain digits"
        )));
    }

    let raw = if bundesland.has_prepended_number() {
        steuernummer.get(1..).unwrap_or_default()
    } else {
        steuernummer
    };
    let bundesschema = format!("{}{raw}", bundesland.bufa_prefix());

    let (bufa, rest) = bundesschema.split_at(bundesschema.len().min(4));
    if !is_valid_bufa(bufa, accept_test_bufa) {
        return Err(ElsterError::InvalidBufaNumber(bufa.to_string()));
    }
    Ok(format!("{bufa}0{rest}"))
}
