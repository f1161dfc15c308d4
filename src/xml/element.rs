//! Minimal element tree used to build request documents and to query responses.
//!
//! ELSTER documents never mix text and child elements, so an element keeps
//! its (concatenated) text separately from its children.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::xml_utils::XmlWriter;
use crate::core::ElsterError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Leaf element carrying only text.
    pub fn text_element(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).with_text(text)
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Element name without a namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    pub fn has_element_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Direct children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.local_name() == name)
    }

    /// All elements with the given local name, this element included, in document order.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    /// First element with the given local name in document order.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.local_name() == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        if self.local_name() == name {
            found.push(self);
        }
        for child in &self.children {
            child.collect_named(name, found);
        }
    }

    /// Remove every default namespace declaration from this subtree.
    pub fn strip_default_namespaces(&mut self) {
        self.attributes.retain(|(k, _)| k != "xmlns");
        for child in &mut self.children {
            child.strip_default_namespaces();
        }
    }

    /// Serialize without any whitespace between elements.
    pub fn to_xml_string(&self) -> Result<String, ElsterError> {
        let mut w = XmlWriter::compact();
        self.write(&mut w)?;
        w.into_string()
    }

    /// Serialize with four-space indentation and no XML declaration.
    pub fn to_pretty_string(&self) -> Result<String, ElsterError> {
        let mut w = XmlWriter::pretty();
        self.write(&mut w)?;
        w.into_string()
    }

    pub fn write(&self, w: &mut XmlWriter) -> Result<(), ElsterError> {
        let attrs: Vec<(&str, &str)> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let text = self.text.as_deref().filter(|t| !t.is_empty());
        if text.is_none() && self.children.is_empty() {
            w.empty_element_with_attrs(&self.name, &attrs)?;
            return Ok(());
        }

        w.start_element_with_attrs(&self.name, &attrs)?;
        if let Some(text) = text {
            w.text(text)?;
        }
        for child in &self.children {
            child.write(w)?;
        }
        w.end_element(&self.name)?;
        Ok(())
    }

    /// Parse a complete XML document into its root element.
    ///
    /// The prolog, comments and processing instructions are dropped.
    /// Whitespace around text is trimmed.
    pub fn parse(xml: &str) -> Result<Element, ElsterError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    if stack.is_empty() && root.is_some() {
                        return Err(parse_error("more than one root element"));
                    }
                    stack.push(element_from_start(e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = element_from_start(e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| parse_error("closing tag without opening tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(ref e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| parse_error(&format!("invalid text content: {e}")))?;
                    append_text(&mut stack, &text)?;
                }
                Ok(Event::CData(e)) => {
                    let bytes = e.into_inner();
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|e| parse_error(&format!("invalid UTF-8 in CDATA: {e}")))?;
                    append_text(&mut stack, text)?;
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(ElsterError::Parse(format!(
                        "error at position {}: {e}",
                        reader.buffer_position()
                    )));
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(parse_error(&format!("unclosed element <{}>", open.name)));
        }
        root.ok_or_else(|| parse_error("document has no root element"))
    }
}

/// Name without a namespace prefix.
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn parse_error(msg: &str) -> ElsterError {
    ElsterError::Parse(msg.to_string())
}

fn element_from_start(e: &BytesStart<'_>) -> Result<Element, ElsterError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|e| parse_error(&format!("invalid UTF-8 in element name: {e}")))?
        .to_string();

    let mut element = Element::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| parse_error(&format!("invalid attribute: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| parse_error(&format!("invalid UTF-8 in attribute name: {e}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| parse_error(&format!("invalid attribute value: {e}")))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ElsterError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_some() {
        Err(parse_error("more than one root element"))
    } else {
        *root = Some(element);
        Ok(())
    }
}

fn append_text(stack: &mut [Element], text: &str) -> Result<(), ElsterError> {
    if text.is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(current) => {
            current.text.get_or_insert_with(String::new).push_str(text);
            Ok(())
        }
        None => Err(parse_error("text outside of the root element")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_document() {
        let root = Element::parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <Elster xmlns="http://www.elster.de/elsterxml/schema/v11">
                <TransferHeader version="11">
                    <Verfahren>ElsterErklaerung</Verfahren>
                    <Empty/>
                </TransferHeader>
            </Elster>"#,
        )
        .unwrap();
        assert_eq!(root.name, "Elster");
        assert_eq!(root.attr("xmlns"), Some("http://www.elster.de/elsterxml/schema/v11"));
        let th = &root.children[0];
        assert_eq!(th.attr("version"), Some("11"));
        assert_eq!(th.children[0].text.as_deref(), Some("ElsterErklaerung"));
        assert_eq!(th.children[1].name, "Empty");
    }

    #[test]
    fn decodes_entities() {
        let root = Element::parse("<Str>Stra&#223;e &amp; Weg</Str>").unwrap();
        assert_eq!(root.text.as_deref(), Some("Straße & Weg"));
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(Element::parse("<a><b></a>").is_err());
        assert!(Element::parse("<a>").is_err());
        assert!(Element::parse("").is_err());
        assert!(Element::parse("<a/><b/>").is_err());
        assert!(Element::parse("just text").is_err());
    }

    #[test]
    fn find_all_includes_root_and_keeps_document_order() {
        let root = Element::parse("<Text><Text>2</Text><x><Text>3</Text></x></Text>").unwrap();
        let texts: Vec<_> = root
            .find_all("Text")
            .iter()
            .map(|e| e.text.clone().unwrap_or_default())
            .collect();
        assert_eq!(texts, vec!["", "2", "3"]);
    }

    #[test]
    fn matches_prefixed_names() {
        let root = Element::parse(r#"<ns:Root xmlns:ns="urn:x"><ns:Id>7</ns:Id></ns:Root>"#).unwrap();
        assert_eq!(root.find("Id").and_then(|e| e.text.as_deref()), Some("7"));
    }

    #[test]
    fn pretty_printing() {
        let doc = Element::new("NutzdatenHeader")
            .with_attr("version", "11")
            .with_child(Element::text_element("NutzdatenTicket", "1"))
            .with_child(Element::text_element("Empfaenger", "CS").with_attr("id", "L"));
        assert_eq!(
            doc.to_pretty_string().unwrap(),
            "<NutzdatenHeader version=\"11\">\n    <NutzdatenTicket>1</NutzdatenTicket>\n    <Empfaenger id=\"L\">CS</Empfaenger>\n</NutzdatenHeader>"
        );
    }

    #[test]
    fn strip_removes_default_namespaces_only() {
        let mut root = Element::parse(
            r#"<Elster xmlns="urn:a" xmlns:x="urn:x"><E10 xmlns="urn:b" version="2020"/></Elster>"#,
        )
        .unwrap();
        root.strip_default_namespaces();
        let xml = root.to_xml_string().unwrap();
        assert_eq!(xml, r#"<Elster xmlns:x="urn:x"><E10 version="2020"/></Elster>"#);
    }
}
