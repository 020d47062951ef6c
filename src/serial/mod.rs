//! XML serialization.
//!
//! Serializes a [`Document`] tree back into XML text. Output details are
//! controlled by [`WriteSettings`]: canonical-XML end tags (`<a></a>`
//! instead of `<a/>`), canonical text and attribute-value escaping, and
//! the newline style used by the indenter.
//!
//! Indentation is a tree *mutation*, not a serialization option: calling
//! [`XmlWriter::indent`] inserts whitespace character-data nodes between
//! the document's children (and removes previously inserted ones first),
//! after which serialization is a plain walk.

use crate::tree::{Document, NodeId, NodeKind};

/// Escaping rule set applied to a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeMode {
    /// Escape all five predefined entities; keep control whitespace raw.
    Normal,
    /// Canonical-XML character data: `"` and `'` stay raw, `\r` becomes a
    /// character reference.
    CanonicalText,
    /// Canonical-XML attribute values: `>` and `'` stay raw; tab, LF, and
    /// CR become character references.
    CanonicalAttr,
}

/// Serialization settings.
#[derive(Debug, Clone, Default)]
pub struct WriteSettings {
    /// Write empty elements as `<a></a>` instead of `<a/>`.
    pub canonical_end_tags: bool,
    /// Use canonical-XML escaping for character data.
    pub canonical_text: bool,
    /// Use canonical-XML escaping for attribute values.
    pub canonical_attr_val: bool,
    /// Use `\r\n` instead of `\n` when indenting.
    pub use_crlf: bool,
}

/// A serializer carrying its [`WriteSettings`].
#[derive(Debug, Clone, Default)]
pub struct XmlWriter {
    /// The settings applied by this writer.
    pub settings: WriteSettings,
}

impl XmlWriter {
    /// Creates a writer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the document's children into a string.
    #[must_use]
    pub fn write_to_string(&self, doc: &Document) -> String {
        let mut out = String::new();
        for child in doc.children(doc.root()) {
            self.write_node(doc, child, &mut out);
        }
        out
    }

    /// Inserts indentation whitespace throughout the document, `spaces`
    /// spaces per nesting level. Any previously inserted indentation is
    /// removed first.
    pub fn indent(&self, doc: &mut Document, spaces: usize) {
        let unit = " ".repeat(spaces);
        self.indent_node(doc, doc.root(), 0, &unit);
    }

    /// Inserts indentation whitespace using one tab per nesting level.
    pub fn indent_tabs(&self, doc: &mut Document) {
        self.indent_node(doc, doc.root(), 0, "\t");
    }

    /// Builds the whitespace run preceding a node at the given depth.
    fn indent_text(&self, depth: usize, unit: &str) -> String {
        let newline = if self.settings.use_crlf { "\r\n" } else { "\n" };
        let mut text = String::from(newline);
        for _ in 0..depth {
            text.push_str(unit);
        }
        text
    }

    fn indent_node(&self, doc: &mut Document, id: NodeId, depth: usize, unit: &str) {
        strip_indent_node(doc, id);
        let children: Vec<NodeId> = doc.children(id).collect();
        if children.is_empty() {
            return;
        }

        let mut last_was_char_data = false;
        for (i, &child) in children.iter().enumerate() {
            last_was_char_data = matches!(doc.node(child).kind, NodeKind::CharData { .. });
            // Character data stays glued to its surroundings, and the very
            // first node of the document starts at column zero.
            if !last_was_char_data && !(i == 0 && depth == 0) {
                let ws = self.indent_text(depth, unit);
                let ws_node = doc.create_node(NodeKind::CharData {
                    content: ws,
                    whitespace: true,
                    cdata: false,
                });
                doc.insert_before(child, ws_node);
            }
            if doc.is_element(child) {
                self.indent_node(doc, child, depth + 1, unit);
            }
        }

        if !last_was_char_data {
            let ws = self.indent_text(depth.saturating_sub(1), unit);
            let ws_node = doc.create_node(NodeKind::CharData {
                content: ws,
                whitespace: true,
                cdata: false,
            });
            doc.append_child(id, ws_node);
        }
    }

    // --- Node serialization ---

    fn write_node(&self, doc: &Document, id: NodeId, out: &mut String) {
        match &doc.node(id).kind {
            NodeKind::Document => {}
            NodeKind::Element { attributes, .. } => {
                let full_tag = doc.full_tag(id);
                out.push('<');
                out.push_str(&full_tag);
                for attr in attributes {
                    out.push(' ');
                    out.push_str(&attr.full_name());
                    out.push_str("=\"");
                    let mode = if self.settings.canonical_attr_val {
                        EscapeMode::CanonicalAttr
                    } else {
                        EscapeMode::Normal
                    };
                    write_escaped(out, &attr.value, mode);
                    out.push('"');
                }

                if doc.first_child(id).is_some() {
                    out.push('>');
                    for child in doc.children(id) {
                        self.write_node(doc, child, out);
                    }
                    out.push_str("</");
                    out.push_str(&full_tag);
                    out.push('>');
                } else if self.settings.canonical_end_tags {
                    out.push_str("></");
                    out.push_str(&full_tag);
                    out.push('>');
                } else {
                    out.push_str("/>");
                }
            }
            NodeKind::CharData { content, cdata, .. } => {
                if *cdata {
                    out.push_str("<![CDATA[");
                    out.push_str(content);
                    out.push_str("]]>");
                } else {
                    let mode = if self.settings.canonical_text {
                        EscapeMode::CanonicalText
                    } else {
                        EscapeMode::Normal
                    };
                    write_escaped(out, content, mode);
                }
            }
            NodeKind::Comment { content } => {
                out.push_str("<!--");
                out.push_str(content);
                out.push_str("-->");
            }
            NodeKind::Directive { content } => {
                out.push_str("<!");
                out.push_str(content);
                out.push('>');
            }
            NodeKind::ProcessingInstruction { target, data } => {
                out.push_str("<?");
                out.push_str(target);
                if let Some(d) = data {
                    out.push(' ');
                    out.push_str(d);
                }
                out.push_str("?>");
            }
        }
    }
}

impl Document {
    /// Serializes the document with default settings.
    #[must_use]
    pub fn write_to_string(&self) -> String {
        XmlWriter::new().write_to_string(self)
    }

    /// Indents the document in place, `spaces` spaces per nesting level.
    pub fn indent(&mut self, spaces: usize) {
        XmlWriter::new().indent(self, spaces);
    }

    /// Indents the document in place, one tab per nesting level.
    pub fn indent_tabs(&mut self) {
        XmlWriter::new().indent_tabs(self);
    }

    /// Removes all whitespace nodes previously inserted by the indenter.
    pub fn strip_indent(&mut self) {
        strip_indent_recursive(self, self.root());
    }
}

/// Detaches the whitespace-flagged character-data children of one node.
fn strip_indent_node(doc: &mut Document, id: NodeId) {
    let to_remove: Vec<NodeId> = doc
        .children(id)
        .filter(|&c| {
            matches!(
                doc.node(c).kind,
                NodeKind::CharData {
                    whitespace: true,
                    ..
                }
            )
        })
        .collect();
    for node in to_remove {
        doc.detach(node);
    }
}

fn strip_indent_recursive(doc: &mut Document, id: NodeId) {
    strip_indent_node(doc, id);
    let elements: Vec<NodeId> = doc.child_elements(id).collect();
    for child in elements {
        strip_indent_recursive(doc, child);
    }
}

/// Appends `s` to `out`, escaping per the mode's rule table.
///
/// Characters outside the XML character range are replaced with U+FFFD.
fn write_escaped(out: &mut String, s: &str, mode: EscapeMode) {
    for c in s.chars() {
        let escape: &str = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' if mode != EscapeMode::CanonicalAttr => "&gt;",
            '\'' if mode == EscapeMode::Normal => "&apos;",
            '"' if mode != EscapeMode::CanonicalText => "&quot;",
            '\t' if mode == EscapeMode::CanonicalAttr => "&#x9;",
            '\n' if mode == EscapeMode::CanonicalAttr => "&#xA;",
            '\r' if mode != EscapeMode::Normal => "&#xD;",
            _ if !in_character_range(c) => "\u{FFFD}",
            _ => {
                out.push(c);
                continue;
            }
        };
        out.push_str(escape);
    }
}

/// Reports whether `c` is a legal XML 1.0 character.
fn in_character_range(c: char) -> bool {
    matches!(c,
        '\u{09}' | '\u{0A}' | '\u{0D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_write_round_trip() {
        let xml = "<store><book lang=\"en\"><title>1984</title></book><empty/></store>";
        let doc = Document::parse_str(xml).unwrap();
        assert_eq!(doc.write_to_string(), xml);
    }

    #[test]
    fn test_write_escapes_text_and_attributes() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(root, "e");
        doc.create_attr(e, "a", "x < \"y\" & z");
        doc.set_text(e, "a < b & 'c'");

        assert_eq!(
            doc.write_to_string(),
            "<e a=\"x &lt; &quot;y&quot; &amp; z\">a &lt; b &amp; &apos;c&apos;</e>"
        );
    }

    #[test]
    fn test_write_canonical_text_mode() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(root, "e");
        doc.set_text(e, "\"quoted\" & 'kept'\r");

        let writer = XmlWriter {
            settings: WriteSettings {
                canonical_text: true,
                ..WriteSettings::default()
            },
        };
        assert_eq!(
            writer.write_to_string(&doc),
            "<e>\"quoted\" &amp; 'kept'&#xD;</e>"
        );
    }

    #[test]
    fn test_write_canonical_attr_mode() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(root, "e");
        doc.create_attr(e, "a", ">\t\n'");

        let writer = XmlWriter {
            settings: WriteSettings {
                canonical_attr_val: true,
                ..WriteSettings::default()
            },
        };
        assert_eq!(writer.write_to_string(&doc), "<e a=\">&#x9;&#xA;'\"/>");
    }

    #[test]
    fn test_write_canonical_end_tags() {
        let doc = Document::parse_str("<r><a/></r>").unwrap();
        let writer = XmlWriter {
            settings: WriteSettings {
                canonical_end_tags: true,
                ..WriteSettings::default()
            },
        };
        assert_eq!(writer.write_to_string(&doc), "<r><a></a></r>");
    }

    #[test]
    fn test_write_cdata_and_directive_verbatim() {
        let xml = "<!DOCTYPE r><r><![CDATA[a < b]]><?pi data?><!--c--></r>";
        let doc = Document::parse_str(xml).unwrap();
        assert_eq!(doc.write_to_string(), xml);
    }

    #[test]
    fn test_write_replaces_illegal_characters() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(root, "e");
        doc.set_text(e, "ok\u{0}bad");

        assert_eq!(doc.write_to_string(), "<e>ok\u{FFFD}bad</e>");
    }

    #[test]
    fn test_indent_inserts_and_strips() {
        let mut doc = Document::parse_str("<r><a><b/></a></r>").unwrap();
        doc.indent(2);
        assert_eq!(
            doc.write_to_string(),
            "<r>\n  <a>\n    <b/>\n  </a>\n</r>\n"
        );

        // Re-indenting replaces rather than stacks.
        doc.indent(2);
        assert_eq!(
            doc.write_to_string(),
            "<r>\n  <a>\n    <b/>\n  </a>\n</r>\n"
        );

        doc.strip_indent();
        assert_eq!(doc.write_to_string(), "<r><a><b/></a></r>");
    }

    #[test]
    fn test_indent_tabs_with_crlf() {
        let mut doc = Document::parse_str("<r><a/></r>").unwrap();
        let writer = XmlWriter {
            settings: WriteSettings {
                use_crlf: true,
                ..WriteSettings::default()
            },
        };
        writer.indent_tabs(&mut doc);
        assert_eq!(doc.write_to_string(), "<r>\r\n\t<a/>\r\n</r>\r\n");
    }

    #[test]
    fn test_indent_leaves_text_elements_inline() {
        let mut doc = Document::parse_str("<r><a>text</a><b/></r>").unwrap();
        doc.indent(2);
        assert_eq!(
            doc.write_to_string(),
            "<r>\n  <a>text</a>\n  <b/>\n</r>\n"
        );
    }
}
