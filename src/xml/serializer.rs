//! Serialization of the owned tree back to XML bytes.
//!
//! No indentation is ever added: whitespace lives in the text nodes of the
//! tree, so untouched regions of a document re-serialize as they were read.
//! The one normalization applied is that childless elements are written
//! self-closing.

use std::io;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::tree::{Document, Element, Node};

/// Serialize a document to UTF-8 bytes.
pub fn write_document(doc: &Document) -> io::Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());

    if let Some(decl) = &doc.decl {
        writer.write_event(Event::Decl(BytesDecl::new(
            &decl.version,
            decl.encoding.as_deref(),
            decl.standalone.as_deref(),
        )))?;
    }
    for node in &doc.leading {
        write_node(node, &mut writer)?;
    }
    write_element(&doc.root, &mut writer)?;
    for node in &doc.trailing {
        write_node(node, &mut writer)?;
    }

    Ok(writer.into_inner())
}

fn write_node<W: io::Write>(node: &Node, writer: &mut Writer<W>) -> io::Result<()> {
    match node {
        Node::Element(elem) => write_element(elem, writer),
        // Escape only &, < and > so quote characters in prose stay as written
        Node::Text(text) => writer.write_event(Event::Text(BytesText::from_escaped(
            partial_escape(text.as_str()),
        ))),
        Node::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str()))),
        // Comments and doctypes carry raw markup that must not be re-escaped
        Node::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
        }
        Node::DocType(text) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(text.as_str())))
        }
        Node::ProcessingInstruction(text) => {
            writer.write_event(Event::PI(BytesPI::new(text.as_str())))
        }
    }
}

fn write_element<W: io::Write>(elem: &Element, writer: &mut Writer<W>) -> io::Result<()> {
    let mut start = BytesStart::new(elem.name.as_str());
    for (key, value) in &elem.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if elem.children.is_empty() {
        writer.write_event(Event::Empty(start))
    } else {
        writer.write_event(Event::Start(start))?;
        for child in &elem.children {
            write_node(child, writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(elem.name.as_str())))
    }
}
