//! Declarative ELSTER field trees and their encoder.
//!
//! A field tree describes how ELSTER field ids nest inside the declaration
//! XML. Encoding walks the tree against a [`FieldMap`] and emits only the
//! branches that carry data.

use crate::core::{ElsterError, FieldId, FieldMap, FieldValue, Person};

use super::element::Element;

/// Name of the marker element opening every person-specific block.
pub const PERSON_MARKER: &str = "Person";

/// A node of a field tree: either a single field or a group of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTreeNode {
    Leaf(String),
    Group(FieldGroup),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGroup {
    pub name: String,
    pub children: Vec<FieldTreeNode>,
    /// Emit one sibling per element of the list-valued fields below.
    pub is_repeatable: bool,
    /// Emit one instance per person, each starting with a `<Person>` marker.
    pub is_person_specific: bool,
    /// Number of person instances (1 or 2).
    pub repetitions: usize,
}

impl FieldTreeNode {
    pub fn leaf(id: impl Into<String>) -> Self {
        FieldTreeNode::Leaf(id.into())
    }

    pub fn group(name: impl Into<String>, children: Vec<FieldTreeNode>) -> Self {
        FieldTreeNode::Group(FieldGroup {
            name: name.into(),
            children,
            is_repeatable: false,
            is_person_specific: false,
            repetitions: 1,
        })
    }

    /// Group whose children are all plain leaves.
    pub fn leaves(name: impl Into<String>, ids: &[&str]) -> Self {
        Self::group(name, ids.iter().map(|id| Self::leaf(*id)).collect())
    }

    /// Mark a group as repeatable. No effect on leaves.
    pub fn repeatable(mut self) -> Self {
        if let FieldTreeNode::Group(group) = &mut self {
            group.is_repeatable = true;
        }
        self
    }

    /// Mark a group as person-specific with the given number of persons.
    pub fn person_specific(mut self, repetitions: usize) -> Self {
        if let FieldTreeNode::Group(group) = &mut self {
            group.is_person_specific = true;
            group.repetitions = repetitions.clamp(1, Person::ALL.len());
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            FieldTreeNode::Leaf(id) => id,
            FieldTreeNode::Group(group) => &group.name,
        }
    }
}

impl From<&str> for FieldTreeNode {
    fn from(id: &str) -> Self {
        FieldTreeNode::leaf(id)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    person: Option<Person>,
    index: Option<usize>,
}

/// Encode a single tree. Returns the emitted top-level elements, which is
/// empty when no field of the tree is present and may hold several siblings
/// for repeatable or person-specific roots.
///
/// Field ids not referenced by the tree are ignored.
pub fn encode(node: &FieldTreeNode, fields: &FieldMap) -> Result<Vec<Element>, ElsterError> {
    let mut out = Vec::new();
    encode_node(node, fields, Scope::default(), &mut out)?;
    Ok(out)
}

/// Encode several trees in order, concatenating their output.
pub fn encode_all(nodes: &[FieldTreeNode], fields: &FieldMap) -> Result<Vec<Element>, ElsterError> {
    let mut out = Vec::new();
    for node in nodes {
        encode_node(node, fields, Scope::default(), &mut out)?;
    }
    Ok(out)
}

fn encode_node(
    node: &FieldTreeNode,
    fields: &FieldMap,
    scope: Scope,
    out: &mut Vec<Element>,
) -> Result<(), ElsterError> {
    match node {
        FieldTreeNode::Leaf(id) => {
            if let Some(text) = leaf_text(id, fields, scope)? {
                out.push(Element::text_element(id.as_str(), text));
            }
            Ok(())
        }
        FieldTreeNode::Group(group) if group.is_person_specific => {
            for person in Person::ALL.iter().take(group.repetitions) {
                let mut element = Element::new(group.name.as_str());
                element.push(Element::text_element(PERSON_MARKER, person.as_str()));
                let scope = Scope {
                    person: Some(*person),
                    ..scope
                };
                encode_children(group, fields, scope, &mut element)?;
                if element.children.iter().any(|c| c.name != PERSON_MARKER) {
                    out.push(element);
                }
            }
            Ok(())
        }
        FieldTreeNode::Group(group) if group.is_repeatable => {
            let count = repetition_count(group, fields, scope)?;
            for index in 0..count {
                let mut element = Element::new(group.name.as_str());
                let scope = Scope {
                    index: Some(index),
                    ..scope
                };
                encode_children(group, fields, scope, &mut element)?;
                if element.has_element_children() {
                    out.push(element);
                }
            }
            Ok(())
        }
        FieldTreeNode::Group(group) => {
            let mut element = Element::new(group.name.as_str());
            encode_children(group, fields, scope, &mut element)?;
            if element.has_element_children() {
                out.push(element);
            }
            Ok(())
        }
    }
}

fn encode_children(
    group: &FieldGroup,
    fields: &FieldMap,
    scope: Scope,
    element: &mut Element,
) -> Result<(), ElsterError> {
    let mut children = Vec::new();
    for child in &group.children {
        encode_node(child, fields, scope, &mut children)?;
    }
    element.children.extend(children);
    Ok(())
}

fn lookup<'a>(id: &str, fields: &'a FieldMap, scope: Scope) -> Option<&'a FieldValue> {
    let key = match scope.person {
        Some(person) => FieldId::person(id, person),
        None => FieldId::plain(id),
    };
    fields.get(&key)
}

fn leaf_text(id: &str, fields: &FieldMap, scope: Scope) -> Result<Option<String>, ElsterError> {
    match (lookup(id, fields, scope), scope.index) {
        (None, _) => Ok(None),
        (Some(FieldValue::Single(value)), _) => Ok(Some(value.clone())),
        (Some(FieldValue::Repeated(values)), Some(index)) => Ok(values.get(index).cloned()),
        (Some(FieldValue::Repeated(_)), None) => Err(ElsterError::Encode(format!(
            "field {id} carries a list but is not below a repeatable group"
        ))),
    }
}

/// Number of repetitions of a repeatable group: the common length of all
/// list-valued fields below it, or one when all of them are scalars.
fn repetition_count(group: &FieldGroup, fields: &FieldMap, scope: Scope) -> Result<usize, ElsterError> {
    let mut lengths = Vec::new();
    collect_list_lengths(group, fields, scope, &mut lengths);

    let Some(&(first_id, count)) = lengths.first() else {
        return Ok(1);
    };
    if let Some((other_id, other)) = lengths.iter().find(|(_, len)| *len != count) {
        return Err(ElsterError::Encode(format!(
            "repeatable group {} has lists of different lengths: {first_id} has {count}, {other_id} has {other}",
            group.name
        )));
    }
    Ok(count)
}

fn collect_list_lengths<'a>(
    group: &'a FieldGroup,
    fields: &FieldMap,
    scope: Scope,
    lengths: &mut Vec<(&'a str, usize)>,
) {
    for child in &group.children {
        match child {
            FieldTreeNode::Leaf(id) => {
                if let Some(FieldValue::Repeated(values)) = lookup(id, fields, scope) {
                    lengths.push((id.as_str(), values.len()));
                }
            }
            // nested repeatable groups count their own repetitions
            FieldTreeNode::Group(nested) if !nested.is_repeatable => {
                collect_list_lengths(nested, fields, scope, lengths);
            }
            FieldTreeNode::Group(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(entries: &[(FieldId, FieldValue)]) -> FieldMap {
        entries.iter().cloned().collect()
    }

    fn names(elements: &[Element]) -> Vec<&str> {
        elements.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn leaf_emitted_only_when_present() {
        let map = fields(&[("E0100201".into(), "Mustername".into())]);
        let out = encode(&"E0100201".into(), &map).unwrap();
        assert_eq!(out[0].text.as_deref(), Some("Mustername"));
        assert!(encode(&"E0100301".into(), &map).unwrap().is_empty());
    }

    #[test]
    fn empty_group_is_pruned() {
        let tree = FieldTreeNode::group("Allg", vec![FieldTreeNode::leaves("A", &["E0100201"])]);
        assert!(encode(&tree, &FieldMap::new()).unwrap().is_empty());
    }

    #[test]
    fn group_keeps_declared_order() {
        let tree = FieldTreeNode::leaves("BV", &["E0102102", "E0101601", "E0102402"]);
        let map = fields(&[
            ("E0102402".into(), "X".into()),
            ("E0102102".into(), "DE89370400440532013000".into()),
        ]);
        let out = encode(&tree, &map).unwrap();
        assert_eq!(names(&out[0].children), vec!["E0102102", "E0102402"]);
    }

    #[test]
    fn person_specific_group_emits_marker_per_present_person() {
        let tree = FieldTreeNode::group(
            "Beh",
            vec![FieldTreeNode::leaves("Ausw_Rentb_Besch", &["E0109708"])],
        )
        .person_specific(2);
        let map = fields(&[(FieldId::person("E0109708", Person::PersonA), "50".into())]);
        let out = encode(&tree, &map).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].children[0].name, PERSON_MARKER);
        assert_eq!(out[0].children[0].text.as_deref(), Some("PersonA"));
    }

    #[test]
    fn person_specific_group_ignores_plain_ids() {
        let tree = FieldTreeNode::leaves("Beh", &["E0109708"]).person_specific(2);
        let map = fields(&[("E0109708".into(), "50".into())]);
        assert!(encode(&tree, &map).unwrap().is_empty());
    }

    #[test]
    fn repeatable_group_emits_one_sibling_per_list_element() {
        let tree = FieldTreeNode::leaves("parent11", &["field_repeat_1"]).repeatable();
        let map = fields(&[(
            "field_repeat_1".into(),
            vec!["a".to_string(), "b".to_string()].into(),
        )]);
        let out = encode(&tree, &map).unwrap();
        assert_eq!(names(&out), vec!["parent11", "parent11"]);
        assert_eq!(out[0].children[0].text.as_deref(), Some("a"));
        assert_eq!(out[1].children[0].text.as_deref(), Some("b"));
    }

    #[test]
    fn scalar_inside_repeatable_group_is_repeated() {
        let tree = FieldTreeNode::leaves("Einz", &["list", "scalar"]).repeatable();
        let map = fields(&[
            ("list".into(), vec!["1".to_string(), "2".to_string()].into()),
            ("scalar".into(), "s".into()),
        ]);
        let out = encode(&tree, &map).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|e| e.children[1].text.as_deref() == Some("s")));
    }

    #[test]
    fn mismatched_list_lengths_are_rejected() {
        let tree = FieldTreeNode::leaves("Einz", &["a", "b"]).repeatable();
        let map = fields(&[
            ("a".into(), vec!["1".to_string(), "2".to_string()].into()),
            ("b".into(), vec!["1".to_string()].into()),
        ]);
        assert!(matches!(encode(&tree, &map), Err(ElsterError::Encode(_))));
    }

    #[test]
    fn list_outside_repeatable_group_is_rejected() {
        let tree = FieldTreeNode::leaves("Sum", &["a"]);
        let map = fields(&[("a".into(), vec!["1".to_string()].into())]);
        assert!(matches!(encode(&tree, &map), Err(ElsterError::Encode(_))));
    }

    #[test]
    fn empty_list_emits_nothing() {
        let tree = FieldTreeNode::leaves("Pers_gem_HH", &["E0104706"]).repeatable();
        let map = fields(&[("E0104706".into(), Vec::<String>::new().into())]);
        assert!(encode(&tree, &map).unwrap().is_empty());
    }
}
