//! Tax office listing.
//!
//! ERiC lists states by id; some states appear with several ids (e.g.
//! "Nordrhein-Westfalen (Rheinland)"). States are grouped by the first word
//! of their name and every id's tax offices are collected under the state.

use serde::Serialize;
use tracing::debug;

use crate::core::{ElsterError, Settings, StateEntry, TaxOffice};
use crate::eric::{EricBindings, EricSession, with_session};
use crate::est::is_valid_bufa;
use crate::xml::parse::{get_state_ids, get_tax_offices};

/// Number of federal states every listing must cover.
pub const STATE_COUNT: usize = 16;

const STATE_ABBREVIATIONS: [(&str, &str); STATE_COUNT] = [
    ("Baden-Württemberg", "bw"),
    ("Bayern", "by"),
    ("Berlin", "be"),
    ("Brandenburg", "bb"),
    ("Bremen", "hb"),
    ("Hamburg", "hh"),
    ("Hessen", "he"),
    ("Mecklenburg-Vorpommern", "mv"),
    ("Niedersachsen", "nd"),
    ("Nordrhein-Westfalen", "nw"),
    ("Rheinland-Pfalz", "rp"),
    ("Saarland", "sl"),
    ("Sachsen", "sn"),
    ("Sachsen-Anhalt", "st"),
    ("Schleswig-Holstein", "sh"),
    ("Thüringen", "th"),
];

pub fn state_abbreviation(state_name: &str) -> Option<&'static str> {
    STATE_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == state_name)
        .map(|(_, abbreviation)| *abbreviation)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTaxOffices {
    pub state_abbreviation: String,
    pub name: String,
    pub tax_offices: Vec<TaxOffice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxOfficeList {
    pub tax_offices: Vec<StateTaxOffices>,
}

/// Group state ids by the first word of the state name, keeping the order
/// of first appearance.
pub fn standardise_state_id_list(states: Vec<StateEntry>) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for state in states {
        let name = state.name.split(' ').next().unwrap_or_default().to_string();
        match grouped.iter_mut().find(|(n, _)| *n == name) {
            Some((_, ids)) => ids.push(state.id),
            None => grouped.push((name, vec![state.id])),
        }
    }
    grouped
}

/// Collect the tax offices of every state within one session.
pub fn list_tax_offices<B: EricBindings + ?Sized>(session: &EricSession<'_, B>) -> Result<TaxOfficeList, ElsterError> {
    let states = standardise_state_id_list(get_state_ids(&session.get_state_id_list()?)?);
    if states.len() != STATE_COUNT {
        return Err(ElsterError::Parse(format!(
            "expected {STATE_COUNT} states, ERiC listed {}",
            states.len()
        )));
    }

    let mut tax_offices = Vec::with_capacity(STATE_COUNT);
    for (name, state_ids) in states {
        let abbreviation = state_abbreviation(&name)
            .ok_or_else(|| ElsterError::Parse(format!("unknown state '{name}'")))?;

        let mut offices = Vec::new();
        for state_id in &state_ids {
            offices.extend(get_tax_offices(&session.get_tax_offices(state_id)?)?);
        }
        if let Some(office) = offices.iter().find(|o| !is_valid_bufa(&o.bufa_nr, true)) {
            return Err(ElsterError::InvalidBufaNumber(office.bufa_nr.clone()));
        }
        debug!(state = %name, offices = offices.len(), "tax offices listed");

        tax_offices.push(StateTaxOffices {
            state_abbreviation: abbreviation.to_string(),
            name,
            tax_offices: offices,
        });
    }
    Ok(TaxOfficeList { tax_offices })
}

/// [`list_tax_offices`] in a session of its own.
pub fn get_tax_office_list<B: EricBindings + ?Sized>(
    bindings: &B,
    settings: &Settings,
) -> Result<TaxOfficeList, ElsterError> {
    with_session(bindings, settings, |session| list_tax_offices(session))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, id: &str) -> StateEntry {
        StateEntry {
            name: name.into(),
            id: id.into(),
        }
    }

    #[test]
    fn groups_by_first_name_token() {
        let grouped = standardise_state_id_list(vec![
            entry("Bayern (Zuständigkeit LfSt - München)", "91"),
            entry("Berlin", "11"),
            entry("Bayern (Zuständigkeit LfSt - Nürnberg)", "92"),
        ]);
        assert_eq!(
            grouped,
            vec![
                ("Bayern".to_string(), vec!["91".to_string(), "92".to_string()]),
                ("Berlin".to_string(), vec!["11".to_string()]),
            ]
        );
    }

    #[test]
    fn abbreviations() {
        assert_eq!(state_abbreviation("Thüringen"), Some("th"));
        assert_eq!(state_abbreviation("Niedersachsen"), Some("nd"));
        assert_eq!(state_abbreviation("Atlantis"), None);
    }

    #[test]
    fn serializes_nested_listing() {
        let list = TaxOfficeList {
            tax_offices: vec![StateTaxOffices {
                state_abbreviation: "be".into(),
                name: "Berlin".into(),
                tax_offices: vec![TaxOffice {
                    name: "Finanzamt Charlottenburg".into(),
                    bufa_nr: "1127".into(),
                }],
            }],
        };
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["tax_offices"][0]["state_abbreviation"], "be");
        assert_eq!(json["tax_offices"][0]["tax_offices"][0]["bufa_nr"], "1127");
    }
}
