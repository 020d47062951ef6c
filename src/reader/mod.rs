//! Non-validating XML reader.
//!
//! A hand-rolled descent over the input bytes that builds a
//! [`Document`]. The reader preserves everything the tree can represent --
//! elements with prefixed names and attributes, character data (with
//! whitespace-only runs flagged for the indenter), CDATA sections,
//! comments, processing instructions, and `<!...>` directives kept
//! verbatim. The XML declaration, when present, is stored as an ordinary
//! leading processing instruction with target `xml`.
//!
//! No DTD or schema processing is performed, and namespaces are not
//! resolved at parse time: prefixes are recorded lexically and resolution
//! happens on demand via
//! [`Document::namespace_uri`](crate::Document::namespace_uri).

use crate::error::ParseError;
use crate::tree::{Document, NodeId};
use crate::util::qname::split_qname;

/// Parses an XML string into a [`Document`].
///
/// # Errors
///
/// Returns [`ParseError`] on ill-formed input: unterminated markup,
/// mismatched end tags, malformed attributes, or unknown entity
/// references.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    Reader::new(input).parse()
}

/// Streaming reader state over the input bytes.
struct Reader<'a> {
    input: &'a str,
    pos: usize,
    doc: Document,
    /// Open elements; the innermost is the current attach point.
    stack: Vec<NodeId>,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            doc: Document::new(),
            stack: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<Document, ParseError> {
        while self.pos < self.input.len() {
            if self.looking_at("<!--") {
                self.parse_comment()?;
            } else if self.looking_at("<![CDATA[") {
                self.parse_cdata()?;
            } else if self.looking_at("<!") {
                self.parse_directive()?;
            } else if self.looking_at("<?") {
                self.parse_proc_inst()?;
            } else if self.looking_at("</") {
                self.parse_end_tag()?;
            } else if self.peek() == Some(b'<') {
                self.parse_start_tag()?;
            } else {
                self.parse_char_data()?;
            }
        }

        if let Some(&open) = self.stack.last() {
            return Err(self.fatal(&format!(
                "unclosed element '{}'",
                self.doc.full_tag(open)
            )));
        }

        Ok(self.doc)
    }

    /// The node new children attach to: the innermost open element, or the
    /// document node outside all elements.
    fn parent(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.doc.root())
    }

    // --- Markup productions ---

    fn parse_comment(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 4; // consume "<!--"
        let Some(end) = self.input[self.pos..].find("-->") else {
            return Err(self.fatal_at("unterminated comment", start));
        };
        let content = &self.input[self.pos..self.pos + end];
        let parent = self.parent();
        self.doc.create_comment(parent, content);
        self.pos += end + 3;
        Ok(())
    }

    fn parse_cdata(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 9; // consume "<![CDATA["
        let Some(end) = self.input[self.pos..].find("]]>") else {
            return Err(self.fatal_at("unterminated CDATA section", start));
        };
        let content = &self.input[self.pos..self.pos + end];
        let parent = self.parent();
        self.doc.create_char_data_node(parent, content, false, true);
        self.pos += end + 3;
        Ok(())
    }

    /// Parses a `<!...>` directive (DOCTYPE and friends). The content is
    /// kept verbatim; `[` `]` pairs nest so a DOCTYPE internal subset does
    /// not end the directive early.
    fn parse_directive(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 2; // consume "<!"
        let content_start = self.pos;
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            match b {
                b'[' => depth += 1,
                b']' if depth > 0 => depth -= 1,
                b'>' if depth == 0 => {
                    let content = &self.input[content_start..self.pos];
                    let parent = self.parent();
                    self.doc.create_directive(parent, content);
                    self.pos += 1;
                    return Ok(());
                }
                _ => {}
            }
            self.pos += 1;
        }
        Err(self.fatal_at("unterminated directive", start))
    }

    fn parse_proc_inst(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 2; // consume "<?"
        let Some(end) = self.input[self.pos..].find("?>") else {
            return Err(self.fatal_at("unterminated processing instruction", start));
        };
        let body = &self.input[self.pos..self.pos + end];
        let (target, inst) = match body.find(|c: char| c.is_ascii_whitespace()) {
            Some(split) => (&body[..split], body[split..].trim_start()),
            None => (body, ""),
        };
        if target.is_empty() {
            return Err(self.fatal_at("processing instruction without target", start));
        }
        let parent = self.parent();
        self.doc.create_proc_inst(parent, target, inst);
        self.pos += end + 2;
        Ok(())
    }

    fn parse_start_tag(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1; // consume '<'
        let name = self.read_name()?;

        let parent = self.parent();
        let (space, tag) = split_qname(name);
        let (space, tag) = (space.to_string(), tag.to_string());
        let element = self.doc.create_element_full(parent, &space, &tag);

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'>') => {
                    self.pos += 1;
                    self.stack.push(element);
                    return Ok(());
                }
                Some(b'/') => {
                    self.pos += 1;
                    if self.peek() != Some(b'>') {
                        return Err(self.fatal("expected '>' after '/'"));
                    }
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.parse_attribute(element)?,
                None => return Err(self.fatal_at("unterminated start tag", start)),
            }
        }
    }

    fn parse_attribute(&mut self, element: NodeId) -> Result<(), ParseError> {
        let name = self.read_name()?;
        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            return Err(self.fatal("expected '=' after attribute name"));
        }
        self.pos += 1;
        self.skip_whitespace();

        let quote = match self.peek() {
            Some(q @ (b'\'' | b'"')) => q,
            _ => return Err(self.fatal("expected quoted attribute value")),
        };
        self.pos += 1;
        let value_start = self.pos;
        while let Some(b) = self.peek() {
            if b == quote {
                break;
            }
            self.pos += 1;
        }
        if self.peek() != Some(quote) {
            return Err(self.fatal_at("unterminated attribute value", value_start));
        }
        let raw = &self.input[value_start..self.pos];
        self.pos += 1;

        let value = decode_references(raw).map_err(|msg| self.fatal_at(&msg, value_start))?;
        let (space, key) = split_qname(name);
        let (space, key) = (space.to_string(), key.to_string());
        self.doc.create_attr_full(element, &space, &key, &value);
        Ok(())
    }

    fn parse_end_tag(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 2; // consume "</"
        let name = self.read_name()?;
        self.skip_whitespace();
        if self.peek() != Some(b'>') {
            return Err(self.fatal("expected '>' in end tag"));
        }
        self.pos += 1;

        let Some(open) = self.stack.pop() else {
            return Err(self.fatal_at(&format!("unexpected end tag '</{name}>'"), start));
        };
        let open_name = self.doc.full_tag(open);
        if open_name != name {
            return Err(self.fatal_at(
                &format!("end tag '</{name}>' does not match '<{open_name}>'"),
                start,
            ));
        }
        Ok(())
    }

    fn parse_char_data(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'<' {
                break;
            }
            self.pos += 1;
        }
        let raw = &self.input[start..self.pos];
        let content = decode_references(raw).map_err(|msg| self.fatal_at(&msg, start))?;
        let whitespace = is_whitespace(&content);
        let parent = self.parent();
        self.doc
            .create_char_data_node(parent, &content, whitespace, false);
        Ok(())
    }

    // --- Low-level helpers ---

    /// Reads an element or attribute name: everything up to whitespace,
    /// `=`, `/`, `>`, or end of input.
    fn read_name(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || matches!(b, b'=' | b'/' | b'>') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.fatal("expected a name"));
        }
        Ok(&self.input[start..self.pos])
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn looking_at(&self, prefix: &str) -> bool {
        self.input[self.pos..].starts_with(prefix)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn fatal(&self, message: &str) -> ParseError {
        self.fatal_at(message, self.pos)
    }

    fn fatal_at(&self, message: &str, offset: usize) -> ParseError {
        ParseError {
            message: message.to_string(),
            offset,
        }
    }
}

/// Returns `true` if the string contains only XML whitespace characters.
fn is_whitespace(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

/// Decodes entity and character references in text or attribute content.
///
/// The five predefined entities and decimal/hex character references are
/// supported; anything else is an error, as is a bare `&`.
fn decode_references(raw: &str) -> Result<String, String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else {
            return Err("'&' without matching ';'".to_string());
        };
        let entity = &rest[1..semi];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "apos" => out.push('\''),
            "quot" => out.push('"'),
            _ => {
                let code = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse));
                match code {
                    Some(Ok(n)) if char::from_u32(n).is_some() => {
                        out.push(char::from_u32(n).unwrap_or('\u{FFFD}'));
                    }
                    Some(_) => return Err(format!("invalid character reference '&{entity};'")),
                    None => return Err(format!("unknown entity '&{entity};'")),
                }
            }
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
