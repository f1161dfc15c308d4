//! Queries over ELSTER response documents.
//!
//! All lookups are namespace-agnostic: default namespace declarations are
//! stripped and elements are matched by local name anywhere in the tree,
//! the root included. A missing element yields an empty result; only a
//! document that is not well-formed is an error.

use crate::core::{ElsterError, StateEntry, TaxOffice};

use super::element::Element;

/// Parse `xml` and drop the prolog and every default namespace declaration.
pub fn remove_declaration_and_namespace(xml: &str) -> Result<Element, ElsterError> {
    let mut root = Element::parse(xml)?;
    root.strip_default_namespaces();
    Ok(root)
}

/// Text of every element named `name`, in document order. Elements without
/// text yield an empty string.
pub fn get_elements_text(xml: &str, name: &str) -> Result<Vec<String>, ElsterError> {
    let root = remove_declaration_and_namespace(xml)?;
    Ok(texts(&root, name))
}

/// Content of the first element named `name`: its text for a leaf, the
/// serialized subtree when it has child elements.
pub fn get_element_text(xml: &str, name: &str) -> Result<Option<String>, ElsterError> {
    let root = remove_declaration_and_namespace(xml)?;
    match root.find(name) {
        Some(el) if el.has_element_children() => el.to_xml_string().map(Some),
        Some(el) => Ok(el.text.clone()),
        None => Ok(None),
    }
}

/// Value of `attribute` on every element named `name` that carries it.
pub fn get_elements_attribute(
    xml: &str,
    name: &str,
    attribute: &str,
) -> Result<Vec<String>, ElsterError> {
    let root = remove_declaration_and_namespace(xml)?;
    Ok(root
        .find_all(name)
        .into_iter()
        .filter_map(|el| el.attr(attribute).map(str::to_string))
        .collect())
}

/// Id of an unlock code request (`AntragsID`).
pub fn get_antrag_id(xml: &str) -> Result<Option<String>, ElsterError> {
    get_element_text(xml, "AntragsID")
}

/// Tax id of the data owner (`DateninhaberIdNr`).
pub fn get_idnr(xml: &str) -> Result<Option<String>, ElsterError> {
    get_element_text(xml, "DateninhaberIdNr")
}

pub fn get_transfer_ticket(xml: &str) -> Result<Option<String>, ElsterError> {
    get_element_text(xml, "TransferTicket")
}

/// Postal address block (`AdrKette`), serialized with character references
/// resolved to plain UTF-8.
pub fn get_address(xml: &str) -> Result<Option<String>, ElsterError> {
    get_element_text(xml, "AdrKette")
}

/// Ids of all Belege whose `belegart` is one of `beleg_kinds`, in document order.
pub fn get_relevant_beleg_ids(xml: &str, beleg_kinds: &[&str]) -> Result<Vec<String>, ElsterError> {
    let root = remove_declaration_and_namespace(xml)?;
    Ok(root
        .find_all("Id")
        .into_iter()
        .filter(|el| el.attr("belegart").is_some_and(|kind| beleg_kinds.contains(&kind)))
        .map(|el| el.text.as_deref().unwrap_or_default().trim().to_string())
        .collect())
}

/// States listed in an ERiC state list (`FinanzamtLand` entries).
pub fn get_state_ids(xml: &str) -> Result<Vec<StateEntry>, ElsterError> {
    let root = remove_declaration_and_namespace(xml)?;
    root.find_all("FinanzamtLand")
        .into_iter()
        .map(|state| {
            Ok(StateEntry {
                name: required_text(state, "Name")?,
                id: required_text(state, "FinanzamtLandNummer")?,
            })
        })
        .collect()
}

/// Tax offices listed in an ERiC tax office list (`Finanzamt` entries).
pub fn get_tax_offices(xml: &str) -> Result<Vec<TaxOffice>, ElsterError> {
    let root = remove_declaration_and_namespace(xml)?;
    root.find_all("Finanzamt")
        .into_iter()
        .map(|office| {
            Ok(TaxOffice {
                name: required_text(office, "Name")?,
                bufa_nr: required_text(office, "BuFaNummer")?,
            })
        })
        .collect()
}

/// Whether a Nutzdaten error XML returned by the server carries `code`.
pub fn server_error_contains_code(ndh_err_xml: &str, code: &str) -> Result<bool, ElsterError> {
    let root = remove_declaration_and_namespace(ndh_err_xml)?;
    Ok(root
        .find_all("Fehler")
        .into_iter()
        .flat_map(|fehler| fehler.children_named("Code"))
        .any(|c| c.text.as_deref().map(str::trim) == Some(code)))
}

fn texts(root: &Element, name: &str) -> Vec<String> {
    root.find_all(name)
        .into_iter()
        .map(|el| el.text.clone().unwrap_or_default())
        .collect()
}

fn required_text(parent: &Element, name: &str) -> Result<String, ElsterError> {
    parent
        .children
        .iter()
        .find_map(|c| c.find(name))
        .map(|el| el.text.clone().unwrap_or_default())
        .ok_or_else(|| ElsterError::Parse(format!("<{}> without <{name}>", parent.name)))
}
