//! Node type definitions.
//!
//! The `NodeKind` enum represents every kind of node an element tree can
//! hold. Each variant carries the node-type-specific payload; navigation
//! links (parent, children, siblings) live in `NodeData`, not here.

use super::Attribute;

/// The kind of a tree node and its associated data.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document node -- there is exactly one per `Document`. It has no
    /// tag of its own; its children are the document's top-level nodes.
    Document,

    /// An element node, e.g., `<p:price currency="USD">`.
    Element {
        /// The element's local name (`price` in `p:price`).
        tag: String,
        /// Namespace prefix (`p` in `p:price`), if any.
        prefix: Option<String>,
        /// Attributes on this element, in document order.
        attributes: Vec<Attribute>,
    },

    /// Character data between markup.
    CharData {
        /// The text content (character references already resolved).
        content: String,
        /// True when the content is entirely whitespace. Set by the reader
        /// and by the indenter; `strip_indent` removes only flagged nodes.
        whitespace: bool,
        /// True when the data came from (and serializes back to) a
        /// `<![CDATA[...]]>` section.
        cdata: bool,
    },

    /// A comment node, e.g., `<!-- ... -->`.
    Comment {
        /// The comment text (without the `<!--` and `-->` delimiters).
        content: String,
    },

    /// A directive node, e.g., `<!DOCTYPE html>`. The content is kept
    /// verbatim, without the `<!` and `>` delimiters.
    Directive {
        /// The directive text.
        content: String,
    },

    /// A processing instruction, e.g., `<?xml-stylesheet href="a.xsl"?>`.
    /// The XML declaration itself is stored as a PI with target `xml`.
    ProcessingInstruction {
        /// The PI target (e.g., `"xml-stylesheet"`).
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },
}

impl NodeKind {
    /// Returns `true` for element nodes.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }
}
