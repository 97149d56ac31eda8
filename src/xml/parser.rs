//! XML parsing into the owned tree, with namespace resolution.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::Result;
use crate::{bail, ensure, error};

use super::tree::{Document, Element, Node, XmlDecl};

/// Parse a complete XML document from a string.
///
/// Element names are resolved against the namespace declarations in scope at
/// the point of use, so `<note>` under a default TEI namespace and
/// `<tei:note>` under a prefix binding compare equal through
/// [`Element::is_named`](super::tree::Element::is_named).
pub fn parse_str(xml: &str) -> Result<Document> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut decl: Option<XmlDecl> = None;
    let mut leading: Vec<Node> = Vec::new();
    let mut root: Option<Element> = None;
    let mut trailing: Vec<Node> = Vec::new();
    let mut open: Vec<Element> = Vec::new();
    let mut scopes = NsScopes::default();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => bail!(Parse, "{} at byte {}", e, reader.buffer_position()),
        };
        match event {
            Event::Decl(d) => {
                let version = decode_utf8(d.version().map_err(|e| error!(Parse, "{e}"))?.as_ref());
                let encoding = match d.encoding() {
                    Some(enc) => Some(decode_utf8(
                        enc.map_err(|e| error!(Parse, "{e}"))?.as_ref(),
                    )),
                    None => None,
                };
                let standalone = match d.standalone() {
                    Some(sa) => Some(decode_utf8(sa.map_err(|e| error!(Parse, "{e}"))?.as_ref())),
                    None => None,
                };
                decl = Some(XmlDecl {
                    version,
                    encoding,
                    standalone,
                });
            }
            Event::Start(e) => {
                ensure!(
                    !open.is_empty() || root.is_none(),
                    Parse,
                    "multiple root elements"
                );
                let elem = begin_element(&e, &mut scopes)?;
                open.push(elem);
            }
            Event::Empty(e) => {
                ensure!(
                    !open.is_empty() || root.is_none(),
                    Parse,
                    "multiple root elements"
                );
                let elem = begin_element(&e, &mut scopes)?;
                scopes.pop();
                if let Some(parent) = open.last_mut() {
                    parent.children.push(Node::Element(elem));
                } else {
                    root = Some(elem);
                }
            }
            Event::End(_) => {
                // Tag-name balance is checked by the reader itself.
                let elem = match open.pop() {
                    Some(elem) => elem,
                    None => bail!(Parse, "unexpected closing tag"),
                };
                scopes.pop();
                if let Some(parent) = open.last_mut() {
                    parent.children.push(Node::Element(elem));
                } else {
                    root = Some(elem);
                }
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|e| error!(Parse, "{e}"))?
                    .into_owned();
                attach_misc(Node::Text(text), &mut open, &root, &mut leading, &mut trailing);
            }
            Event::CData(e) => {
                let text = decode_utf8(&e);
                attach_misc(Node::CData(text), &mut open, &root, &mut leading, &mut trailing);
            }
            Event::Comment(e) => {
                let text = decode_utf8(&e);
                attach_misc(
                    Node::Comment(text),
                    &mut open,
                    &root,
                    &mut leading,
                    &mut trailing,
                );
            }
            Event::PI(e) => {
                let text = decode_utf8(&e);
                attach_misc(
                    Node::ProcessingInstruction(text),
                    &mut open,
                    &root,
                    &mut leading,
                    &mut trailing,
                );
            }
            Event::DocType(e) => {
                let text = decode_utf8(&e);
                attach_misc(
                    Node::DocType(text),
                    &mut open,
                    &root,
                    &mut leading,
                    &mut trailing,
                );
            }
            Event::Eof => break,
        }
    }

    ensure!(open.is_empty(), Parse, "unexpected end of document");
    match root {
        Some(root) => Ok(Document {
            decl,
            leading,
            root,
            trailing,
        }),
        None => bail!(Parse, "no root element"),
    }
}

/// Decode a start tag into an element and push its namespace scope.
fn begin_element(e: &BytesStart, scopes: &mut NsScopes) -> Result<Element> {
    let name = decode_utf8(e.name().as_ref());

    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| error!(Parse, "{e}"))?;
        let key = decode_utf8(attr.key.as_ref());
        let value = attr
            .unescape_value()
            .map_err(|e| error!(Parse, "{e}"))?
            .into_owned();
        attrs.push((key, value));
    }

    scopes.push_from(&attrs);
    let prefix = name.split_once(':').map(|(prefix, _)| prefix);
    let ns = scopes.resolve(prefix);

    Ok(Element {
        name,
        ns,
        attrs,
        children: Vec::new(),
    })
}

/// Attach non-element content inside the tree, or to the document prolog/epilog.
fn attach_misc(
    node: Node,
    open: &mut [Element],
    root: &Option<Element>,
    leading: &mut Vec<Node>,
    trailing: &mut Vec<Node>,
) {
    if let Some(parent) = open.last_mut() {
        parent.children.push(node);
    } else if root.is_none() {
        leading.push(node);
    } else {
        trailing.push(node);
    }
}

fn decode_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Stack of in-scope namespace declarations, one frame per open element.
#[derive(Debug, Default)]
struct NsScopes {
    stack: Vec<Vec<(String, String)>>,
}

impl NsScopes {
    /// Push a scope frame holding the `xmlns` declarations of one element.
    fn push_from(&mut self, attrs: &[(String, String)]) {
        let mut frame = Vec::new();
        for (key, value) in attrs {
            if key == "xmlns" {
                frame.push((String::new(), value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                frame.push((prefix.to_string(), value.clone()));
            }
        }
        self.stack.push(frame);
    }

    fn pop(&mut self) {
        self.stack.pop();
    }

    /// Resolve a prefix (or the default namespace) against the innermost binding.
    fn resolve(&self, prefix: Option<&str>) -> Option<String> {
        let wanted = prefix.unwrap_or("");
        for frame in self.stack.iter().rev() {
            for (bound, uri) in frame.iter().rev() {
                if bound == wanted {
                    if uri.is_empty() {
                        return None;
                    }
                    return Some(uri.clone());
                }
            }
        }
        None
    }
}
