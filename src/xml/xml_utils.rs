use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

use crate::core::ElsterError;

/// Indentation used for every pretty-printed ELSTER document.
pub const INDENT_SIZE: usize = 4;

fn xml_io(e: std::io::Error) -> ElsterError {
    ElsterError::Encode(format!("XML write error: {e}"))
}

pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    /// Writer producing a single line without whitespace between elements.
    pub fn compact() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    /// Writer indenting nested elements by [`INDENT_SIZE`] spaces.
    pub fn pretty() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', INDENT_SIZE),
        }
    }

    pub fn into_string(self) -> Result<String, ElsterError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| ElsterError::Encode(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, ElsterError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn empty_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, ElsterError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Empty(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text(&mut self, text: &str) -> Result<&mut Self, ElsterError> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, ElsterError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, ElsterError> {
        self.start_element_with_attrs(name, &[])?;
        self.text(text)?;
        self.end_element(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_writer_indents_four_spaces() {
        let mut w = XmlWriter::pretty();
        w.start_element_with_attrs("Nutzdaten", &[]).unwrap();
        w.text_element("NutzdatenTicket", "1").unwrap();
        w.end_element("Nutzdaten").unwrap();
        assert_eq!(
            w.into_string().unwrap(),
            "<Nutzdaten>\n    <NutzdatenTicket>1</NutzdatenTicket>\n</Nutzdaten>"
        );
    }

    #[test]
    fn text_is_escaped() {
        let mut w = XmlWriter::compact();
        w.text_element("AbsName", "Müller & Söhne").unwrap();
        assert_eq!(w.into_string().unwrap(), "<AbsName>Müller &amp; Söhne</AbsName>");
    }
}
