/*!
 * Namespace-aware XML handling: owned tree, parsing, serialization
 */

pub mod parser;
pub mod serializer;
pub mod tree;

pub use parser::parse_str;
pub use serializer::write_document;
pub use tree::{Document, Element, Node, XmlDecl};
