//! Owned tree representation for namespaced XML documents.

/// XML declaration at the top of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDecl {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// A single node of mixed content.
///
/// Text is a first-class sibling of elements so that replacing one element
/// leaves the surrounding text nodes at their exact positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

/// An element with ordered attributes and ordered mixed-content children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written in the source, e.g. `note` or `tei:note`.
    pub name: String,
    /// Resolved namespace URI for this element, if any.
    pub ns: Option<String>,
    /// Attributes in document order, keys as written (including `xmlns` declarations).
    pub attrs: Vec<(String, String)>,
    /// Mixed content in document order.
    pub children: Vec<Node>,
}

/// A parsed document: prolog, one root element, trailing miscellaneous nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub decl: Option<XmlDecl>,
    /// Comments, processing instructions, doctype and whitespace before the root.
    pub leading: Vec<Node>,
    pub root: Element,
    /// Comments, processing instructions and whitespace after the root.
    pub trailing: Vec<Node>,
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// True for text nodes that contain only whitespace.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Node::Text(t) if t.trim().is_empty())
    }
}

impl Element {
    /// Create a new element with the given qualified name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the resolved namespace URI.
    pub fn with_ns(mut self, ns: impl Into<String>) -> Self {
        self.ns = Some(ns.into());
        self
    }

    /// Append an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Set children.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Append a text child.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Local part of the qualified name.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Namespace prefix of the qualified name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Namespace-qualified name test.
    pub fn is_named(&self, ns: &str, local: &str) -> bool {
        self.ns.as_deref() == Some(ns) && self.local_name() == local
    }

    /// Value of the attribute with the given key as written.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Direct element children.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Concatenated text content of this element and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// True when the element has no child nodes other than whitespace text.
    pub fn is_effectively_empty(&self) -> bool {
        self.children.iter().all(Node::is_whitespace)
    }
}

fn collect_text(elem: &Element, out: &mut String) {
    for child in &elem.children {
        match child {
            Node::Text(t) | Node::CData(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name_and_prefix() {
        let plain = Element::new("note");
        assert_eq!(plain.local_name(), "note");
        assert_eq!(plain.prefix(), None);

        let prefixed = Element::new("tei:note");
        assert_eq!(prefixed.local_name(), "note");
        assert_eq!(prefixed.prefix(), Some("tei"));
    }

    #[test]
    fn test_is_named_requires_namespace() {
        let ns = "http://www.tei-c.org/ns/1.0";
        let qualified = Element::new("note").with_ns(ns);
        assert!(qualified.is_named(ns, "note"));

        let unqualified = Element::new("note");
        assert!(!unqualified.is_named(ns, "note"));
    }

    #[test]
    fn test_attr_lookup() {
        let elem = Element::new("ref")
            .with_attr("target", "#N1")
            .with_attr("rend", "sup");
        assert_eq!(elem.attr("target"), Some("#N1"));
        assert_eq!(elem.attr("rend"), Some("sup"));
        assert_eq!(elem.attr("type"), None);
    }

    #[test]
    fn test_text_content_spans_descendants() {
        let hi = Element::new("hi").with_text("deep");
        let elem = Element::new("p").with_children(vec![
            Node::Text("Text ".to_string()),
            Node::Element(hi),
            Node::Text(" tail".to_string()),
        ]);
        assert_eq!(elem.text_content(), "Text deep tail");
    }

    #[test]
    fn test_clone_is_structurally_independent() {
        let original = Element::new("note").with_text("Content.");
        let mut copy = original.clone();
        if let Some(Node::Text(t)) = copy.children.first_mut() {
            t.push_str(" mutated");
        }
        assert_eq!(original.text_content(), "Content.");
        assert_eq!(copy.text_content(), "Content. mutated");
    }

    #[test]
    fn test_effectively_empty() {
        let mut back = Element::new("back");
        back.children.push(Node::Text("\n  ".to_string()));
        assert!(back.is_effectively_empty());

        back.children.push(Node::Element(Element::new("div")));
        assert!(!back.is_effectively_empty());
    }
}
