//! Arena-based XML element tree.
//!
//! This module implements the core tree representation using arena
//! allocation with typed indices. All nodes live in a contiguous
//! `Vec<NodeData>` owned by the [`Document`], and are referenced by
//! [`NodeId`] -- a newtype over `NonZeroU32`.
//!
//! This design provides O(1) node access, cache-friendly layout, and safe
//! parent back-references: child-to-parent links are plain indices, so the
//! cyclic element graph needs no reference counting and no unsafe code.
//! Dropping the `Document` frees everything at once.
//!
//! # Typed children
//!
//! An element's children are not limited to elements: character data,
//! comments, directives, and processing instructions are first-class nodes
//! (see [`NodeKind`]). Element-level accessors such as
//! [`child_elements`](Document::child_elements) and the path engine skip
//! the non-element kinds transparently.

mod node;

pub use node::NodeKind;

use std::num::NonZeroU32;

use crate::util::qname::split_qname;

/// A typed index into the document's node arena.
///
/// `NodeId` is a newtype over `NonZeroU32`, so `Option<NodeId>` is the same
/// size as `NodeId` (niche optimization). Two `NodeId`s compare equal only
/// when they refer to the same node of the same document, which makes the
/// id itself the element-identity key used by the path engine's
/// deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw arena index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    /// Returns the raw index as a `usize` for indexing into the arena.
    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Storage for a single node in the document arena.
///
/// Each node stores its kind (element, character data, comment, etc.) and
/// links to parent, children, and siblings for tree navigation.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node, if any. The document node has no parent.
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// A key-value attribute of an XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace prefix, if any (`p` in `p:currency="USD"`). Namespace
    /// declarations are ordinary attributes: `xmlns:p="..."` has prefix
    /// `xmlns` and name `p`, and a default `xmlns="..."` has no prefix.
    pub prefix: Option<String>,
    /// The attribute's local name.
    pub name: String,
    /// The attribute value.
    pub value: String,
}

impl Attribute {
    /// Returns the prefixed form `prefix:name`, or just `name` when the
    /// attribute has no prefix.
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Returns the attribute's namespace prefix, or `""` when it has none.
    #[must_use]
    pub fn namespace_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }
}

/// Reports whether the namespace prefix `query` in a path or selection
/// matches an element or attribute prefix `found`.
///
/// The default rule is lenient: `*` and the empty query prefix match any
/// prefix, anything else must match exactly. With the `strict-prefix`
/// feature enabled an empty query prefix matches only unprefixed names.
#[cfg(not(feature = "strict-prefix"))]
pub(crate) fn space_match(query: &str, found: &str) -> bool {
    query.is_empty() || query == "*" || query == found
}

/// Strict variant of the prefix matching rule (`strict-prefix` feature):
/// `*` still matches anything, but an empty query prefix matches only
/// unprefixed names.
#[cfg(feature = "strict-prefix")]
pub(crate) fn space_match(query: &str, found: &str) -> bool {
    query == "*" || query == found
}

/// An XML document.
///
/// The `Document` owns all nodes in an arena and provides methods for tree
/// navigation, construction, and queries. Navigation and path evaluation
/// take `&Document`; mutation takes `&mut Document`. Cloning a `Document`
/// clones the whole arena, producing a deep copy that shares nothing with
/// the original.
///
/// # Examples
///
/// ```
/// use elemtree::Document;
///
/// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(doc.tag(root), "root");
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    /// The document node id.
    root: NodeId,
}

impl Document {
    /// Creates a new empty document containing only the document node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Document));
        // Index 1: the document node
        nodes.push(NodeData::new(NodeKind::Document));
        let root = NodeId::from_index(1);
        Self { nodes, root }
    }

    /// Parses an XML string into a `Document`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`](crate::ParseError) if the input is not
    /// well-formed XML.
    ///
    /// # Examples
    ///
    /// ```
    /// use elemtree::Document;
    ///
    /// let doc = Document::parse_str("<root><child/></root>").unwrap();
    /// ```
    pub fn parse_str(input: &str) -> Result<Self, crate::ParseError> {
        crate::reader::parse_str(input)
    }

    /// Returns the document node id.
    ///
    /// The document node is a valid starting point for path evaluation;
    /// its element children are the document's top-level elements.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the root element of the document (the first top-level
    /// element), or `None` if the document has no element children.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| self.node(id).kind.is_element())
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a valid node of this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    /// Returns a mutable reference to the `NodeData` for the given node.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns `true` if `id` refers to an element node.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).kind.is_element()
    }

    // --- Element accessors ---

    /// Returns the element's local name, or `""` for non-element nodes
    /// (including the document node).
    #[must_use]
    pub fn tag(&self, id: NodeId) -> &str {
        match &self.node(id).kind {
            NodeKind::Element { tag, .. } => tag,
            _ => "",
        }
    }

    /// Returns the element's namespace prefix, or `""` when it has none.
    #[must_use]
    pub fn namespace_prefix(&self, id: NodeId) -> &str {
        match &self.node(id).kind {
            NodeKind::Element { prefix, .. } => prefix.as_deref().unwrap_or(""),
            _ => "",
        }
    }

    /// Returns the prefixed form `prefix:tag`, or just the tag when the
    /// element has no prefix.
    #[must_use]
    pub fn full_tag(&self, id: NodeId) -> String {
        match &self.node(id).kind {
            NodeKind::Element {
                tag,
                prefix: Some(p),
                ..
            } => format!("{p}:{tag}"),
            NodeKind::Element { tag, .. } => tag.clone(),
            _ => String::new(),
        }
    }

    /// Returns the namespace URI bound to the element's prefix in its
    /// scope, or `""` when the prefix is unbound.
    ///
    /// Resolution is purely lexical: the ancestor chain is searched for an
    /// `xmlns:prefix` declaration (or a default `xmlns` declaration when
    /// the element has no prefix).
    #[must_use]
    pub fn namespace_uri(&self, id: NodeId) -> &str {
        let prefix = self.namespace_prefix(id);
        for node in self.ancestors(id) {
            let found = if prefix.is_empty() {
                self.attributes(node)
                    .iter()
                    .find(|a| a.prefix.is_none() && a.name == "xmlns")
            } else {
                self.attributes(node)
                    .iter()
                    .find(|a| a.prefix.as_deref() == Some("xmlns") && a.name == prefix)
            };
            if let Some(attr) = found {
                return &attr.value;
            }
        }
        ""
    }

    /// Returns the characters immediately following the element's opening
    /// tag: the concatenation of its leading character-data children.
    /// Comments between them are skipped; any other node kind ends the run.
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            match &self.node(child).kind {
                NodeKind::CharData { content, .. } => out.push_str(content),
                NodeKind::Comment { .. } => {}
                _ => break,
            }
        }
        out
    }

    /// Replaces the element's leading character data with `text`.
    ///
    /// If the element's first child is a character-data node its content is
    /// replaced; otherwise a new character-data node is prepended.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(first) = self.first_child(id) {
            if let NodeKind::CharData {
                content,
                whitespace,
                cdata,
            } = &mut self.node_mut(first).kind
            {
                *content = text.to_string();
                *whitespace = false;
                *cdata = false;
                return;
            }
        }
        let cd = self.create_node(NodeKind::CharData {
            content: text.to_string(),
            whitespace: false,
            cdata: false,
        });
        self.prepend_child(id, cd);
    }

    // --- Attributes ---

    /// Returns the attributes of an element node, in document order.
    /// Returns an empty slice for non-element nodes.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    fn attributes_mut(&mut self, id: NodeId) -> Option<&mut Vec<Attribute>> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    /// Finds an attribute by qualified key (`key` or `prefix:key`).
    ///
    /// The prefix is matched with the same rule path queries use: an empty
    /// or `*` prefix matches any attribute prefix.
    #[must_use]
    pub fn select_attr(&self, id: NodeId, key: &str) -> Option<&Attribute> {
        let (space, name) = split_qname(key);
        self.attributes(id)
            .iter()
            .find(|a| space_match(space, a.namespace_prefix()) && a.name == name)
    }

    /// Finds an attribute by exact namespace prefix and local name.
    #[must_use]
    pub fn select_attr_full(&self, id: NodeId, space: &str, key: &str) -> Option<&Attribute> {
        self.attributes(id)
            .iter()
            .find(|a| a.namespace_prefix() == space && a.name == key)
    }

    /// Returns the value of the attribute with the given qualified key, or
    /// `default` if the element has no such attribute.
    #[must_use]
    pub fn select_attr_value<'a>(&'a self, id: NodeId, key: &str, default: &'a str) -> &'a str {
        self.select_attr(id, key)
            .map_or(default, |a| a.value.as_str())
    }

    /// Returns the value of the attribute with the given exact prefix and
    /// local name, or `default` if absent.
    #[must_use]
    pub fn select_attr_value_full<'a>(
        &'a self,
        id: NodeId,
        space: &str,
        key: &str,
        default: &'a str,
    ) -> &'a str {
        self.select_attr_full(id, space, key)
            .map_or(default, |a| a.value.as_str())
    }

    /// Creates or replaces an attribute given a qualified key
    /// (`key` or `prefix:key`).
    pub fn create_attr(&mut self, id: NodeId, key: &str, value: &str) {
        let (space, name) = split_qname(key);
        let (space, name) = (space.to_string(), name.to_string());
        self.create_attr_full(id, &space, &name, value);
    }

    /// Creates an attribute with an explicit namespace prefix (`""` for
    /// none). If an attribute with the same prefix and name already exists
    /// its value is replaced.
    pub fn create_attr_full(&mut self, id: NodeId, space: &str, key: &str, value: &str) {
        let Some(attrs) = self.attributes_mut(id) else {
            return;
        };
        if let Some(a) = attrs
            .iter_mut()
            .find(|a| a.namespace_prefix() == space && a.name == key)
        {
            a.value = value.to_string();
            return;
        }
        attrs.push(Attribute {
            prefix: (!space.is_empty()).then(|| space.to_string()),
            name: key.to_string(),
            value: value.to_string(),
        });
    }

    /// Removes and returns the attribute with the given qualified key.
    pub fn remove_attr(&mut self, id: NodeId, key: &str) -> Option<Attribute> {
        let (space, name) = split_qname(key);
        let (space, name) = (space.to_string(), name.to_string());
        self.remove_attr_full(id, &space, &name)
    }

    /// Removes and returns the attribute with the given exact prefix and
    /// local name.
    pub fn remove_attr_full(&mut self, id: NodeId, space: &str, key: &str) -> Option<Attribute> {
        let attrs = self.attributes_mut(id)?;
        let pos = attrs
            .iter()
            .position(|a| a.namespace_prefix() == space && a.name == key)?;
        Some(attrs.remove(pos))
    }

    // --- Child selection ---

    /// Returns the first child element matching the qualified tag
    /// (`tag` or `prefix:tag`), using the lenient prefix rule.
    #[must_use]
    pub fn select_element(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let (space, name) = split_qname(tag);
        self.child_elements(id)
            .find(|&c| space_match(space, self.namespace_prefix(c)) && self.tag(c) == name)
    }

    /// Returns the first child element with the exact namespace prefix and
    /// local name.
    #[must_use]
    pub fn select_element_full(&self, id: NodeId, space: &str, tag: &str) -> Option<NodeId> {
        self.child_elements(id)
            .find(|&c| self.namespace_prefix(c) == space && self.tag(c) == tag)
    }

    /// Returns all child elements matching the qualified tag, using the
    /// lenient prefix rule.
    #[must_use]
    pub fn select_elements(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        let (space, name) = split_qname(tag);
        self.child_elements(id)
            .filter(|&c| space_match(space, self.namespace_prefix(c)) && self.tag(c) == name)
            .collect()
    }

    /// Returns all child elements with the exact namespace prefix and
    /// local name.
    #[must_use]
    pub fn select_elements_full(&self, id: NodeId, space: &str, tag: &str) -> Vec<NodeId> {
        self.child_elements(id)
            .filter(|&c| self.namespace_prefix(c) == space && self.tag(c) == tag)
            .collect()
    }

    // --- Construction ---

    /// Allocates a new node in the arena and returns its `NodeId`.
    ///
    /// The node starts detached; link it with
    /// [`append_child`](Document::append_child) or a related method.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    /// Creates a child element with the given qualified tag
    /// (`tag` or `prefix:tag`) and appends it to `parent`.
    pub fn create_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let (space, name) = split_qname(tag);
        let (space, name) = (space.to_string(), name.to_string());
        self.create_element_full(parent, &space, &name)
    }

    /// Creates a child element with an explicit namespace prefix (`""` for
    /// none) and appends it to `parent`.
    pub fn create_element_full(&mut self, parent: NodeId, space: &str, tag: &str) -> NodeId {
        let id = self.create_node(NodeKind::Element {
            tag: tag.to_string(),
            prefix: (!space.is_empty()).then(|| space.to_string()),
            attributes: Vec::new(),
        });
        self.append_child(parent, id);
        id
    }

    /// Creates a character-data child of `parent`.
    pub fn create_char_data(&mut self, parent: NodeId, data: &str) -> NodeId {
        self.create_char_data_node(parent, data, false, false)
    }

    /// Creates a CDATA-section child of `parent`.
    pub fn create_cdata(&mut self, parent: NodeId, data: &str) -> NodeId {
        self.create_char_data_node(parent, data, false, true)
    }

    pub(crate) fn create_char_data_node(
        &mut self,
        parent: NodeId,
        data: &str,
        whitespace: bool,
        cdata: bool,
    ) -> NodeId {
        let id = self.create_node(NodeKind::CharData {
            content: data.to_string(),
            whitespace,
            cdata,
        });
        self.append_child(parent, id);
        id
    }

    /// Creates a comment child of `parent`.
    pub fn create_comment(&mut self, parent: NodeId, comment: &str) -> NodeId {
        let id = self.create_node(NodeKind::Comment {
            content: comment.to_string(),
        });
        self.append_child(parent, id);
        id
    }

    /// Creates a directive child of `parent`. The data is serialized
    /// verbatim between `<!` and `>`.
    pub fn create_directive(&mut self, parent: NodeId, data: &str) -> NodeId {
        let id = self.create_node(NodeKind::Directive {
            content: data.to_string(),
        });
        self.append_child(parent, id);
        id
    }

    /// Creates a processing-instruction child of `parent`.
    pub fn create_proc_inst(&mut self, parent: NodeId, target: &str, inst: &str) -> NodeId {
        let id = self.create_node(NodeKind::ProcessingInstruction {
            target: target.to_string(),
            data: (!inst.is_empty()).then(|| inst.to_string()),
        });
        self.append_child(parent, id);
        id
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns an iterator over the children of a node, in document order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over the element-typed children of a node,
    /// skipping character data, comments, directives, and PIs.
    pub fn child_elements(&self, id: NodeId) -> ChildElements<'_> {
        ChildElements {
            inner: self.children(id),
        }
    }

    /// Returns an iterator over a node and its ancestors (walking up to
    /// the document node).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns an iterator over all descendants of a node in document
    /// order (depth-first), excluding the node itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    // --- Mutation ---

    /// Appends a child node to the end of a parent's child list.
    ///
    /// # Panics
    ///
    /// Debug-panics if `child` already has a parent; detach it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "child already has a parent; detach it first"
        );

        self.node_mut(child).parent = Some(parent);

        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }

    /// Inserts `new_child` before `reference` in the parent's child list.
    ///
    /// # Panics
    ///
    /// Panics if `reference` has no parent; debug-panics if `new_child`
    /// already has a parent.
    #[allow(clippy::expect_used)]
    pub fn insert_before(&mut self, reference: NodeId, new_child: NodeId) {
        debug_assert!(
            self.node(new_child).parent.is_none(),
            "new_child already has a parent; detach it first"
        );

        let parent = self
            .node(reference)
            .parent
            .expect("reference has no parent");
        self.node_mut(new_child).parent = Some(parent);

        if let Some(prev) = self.node(reference).prev_sibling {
            self.node_mut(prev).next_sibling = Some(new_child);
            self.node_mut(new_child).prev_sibling = Some(prev);
        } else {
            self.node_mut(parent).first_child = Some(new_child);
        }

        self.node_mut(new_child).next_sibling = Some(reference);
        self.node_mut(reference).prev_sibling = Some(new_child);
    }

    /// Prepends a child node as the first child of a parent.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(first) = self.first_child(parent) {
            self.insert_before(first, child);
        } else {
            self.append_child(parent, child);
        }
    }

    /// Detaches a node from its parent. The node (and its subtree) remains
    /// allocated in the arena but is unreachable from the document node.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };

        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }

        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        self.node_mut(id).parent = None;
        self.node_mut(id).prev_sibling = None;
        self.node_mut(id).next_sibling = None;
    }

    /// Returns the total number of nodes in the arena (excluding the
    /// placeholder), including detached ones.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over the element-typed children of a node.
pub struct ChildElements<'a> {
    inner: Children<'a>,
}

impl Iterator for ChildElements<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let doc = self.inner.doc;
        self.inner
            .by_ref()
            .find(|&id| doc.node(id).kind.is_element())
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        // Try to go deeper first
        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        // Try next sibling
        if let Some(sibling) = self.doc.next_sibling(current) {
            self.next = Some(sibling);
            return Some(current);
        }

        // Walk up to find an ancestor with a next sibling
        let mut ancestor = self.doc.parent(current);
        while let Some(anc) = ancestor {
            if anc == self.root {
                break;
            }
            if let Some(sibling) = self.doc.next_sibling(anc) {
                self.next = Some(sibling);
                return Some(current);
            }
            ancestor = self.doc.parent(anc);
        }

        self.next = None;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_has_document_node() {
        let doc = Document::new();
        assert!(matches!(doc.node(doc.root()).kind, NodeKind::Document));
        assert_eq!(doc.node_count(), 1);
        assert!(doc.root_element().is_none());
    }

    #[test]
    fn test_create_and_append_element() {
        let mut doc = Document::new();
        let root = doc.root();
        let elem = doc.create_element(root, "div");

        assert_eq!(doc.first_child(root), Some(elem));
        assert_eq!(doc.last_child(root), Some(elem));
        assert_eq!(doc.parent(elem), Some(root));
        assert_eq!(doc.tag(elem), "div");
        assert_eq!(doc.root_element(), Some(elem));
    }

    #[test]
    fn test_qualified_element_names() {
        let mut doc = Document::new();
        let root = doc.root();
        let price = doc.create_element(root, "p:price");

        assert_eq!(doc.tag(price), "price");
        assert_eq!(doc.namespace_prefix(price), "p");
        assert_eq!(doc.full_tag(price), "p:price");

        let plain = doc.create_element(root, "price");
        assert_eq!(doc.namespace_prefix(plain), "");
        assert_eq!(doc.full_tag(plain), "price");
    }

    #[test]
    fn test_children_iterator_in_document_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element(root, "a");
        let b = doc.create_element(root, "b");
        let c = doc.create_element(root, "c");

        let children: Vec<NodeId> = doc.children(root).collect();
        assert_eq!(children, vec![a, b, c]);
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.next_sibling(c), None);
    }

    #[test]
    fn test_child_elements_skips_non_elements() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(root, "e");
        doc.create_char_data(e, "text");
        let inner = doc.create_element(e, "inner");
        doc.create_comment(e, "note");
        let other = doc.create_element(e, "other");
        doc.create_proc_inst(e, "pi", "data");

        let elems: Vec<NodeId> = doc.child_elements(e).collect();
        assert_eq!(elems, vec![inner, other]);
    }

    #[test]
    fn test_text_concatenates_leading_char_data() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(root, "e");
        doc.create_char_data(e, "Hello, ");
        doc.create_comment(e, "skipped");
        doc.create_cdata(e, "world");
        doc.create_element(e, "stop");
        doc.create_char_data(e, "not included");

        assert_eq!(doc.text(e), "Hello, world");
    }

    #[test]
    fn test_set_text_replaces_leading_char_data() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(root, "e");
        doc.set_text(e, "first");
        assert_eq!(doc.text(e), "first");

        doc.set_text(e, "second");
        assert_eq!(doc.text(e), "second");
        // Replacement reuses the existing node rather than stacking a new one.
        assert_eq!(doc.children(e).count(), 1);
    }

    #[test]
    fn test_set_text_prepends_before_elements() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(root, "e");
        doc.create_element(e, "child");
        doc.set_text(e, "lead");

        assert_eq!(doc.text(e), "lead");
        assert_eq!(doc.children(e).count(), 2);
    }

    #[test]
    fn test_create_attr_replaces_existing() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(root, "e");
        doc.create_attr_full(e, "", "lang", "fr");
        doc.create_attr(e, "lang", "en");

        assert_eq!(doc.attributes(e).len(), 1);
        assert_eq!(doc.select_attr_value(e, "lang", "?"), "en");
    }

    #[test]
    fn test_select_attr_lenient_vs_full() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(root, "e");
        doc.create_attr(e, "p:sku", "150");

        assert!(doc.select_attr(e, "sku").is_some());
        assert!(doc.select_attr(e, "p:sku").is_some());
        assert!(doc.select_attr_full(e, "p", "sku").is_some());
        assert!(doc.select_attr_full(e, "", "sku").is_none());
        assert_eq!(doc.select_attr_value_full(e, "q", "sku", "none"), "none");
    }

    #[test]
    fn test_remove_attr() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(root, "e");
        doc.create_attr(e, "lang", "de");

        let removed = doc.remove_attr(e, "lang").unwrap();
        assert_eq!(removed.value, "de");
        assert!(doc.select_attr(e, "lang").is_none());
        assert!(doc.remove_attr(e, "lang").is_none());
    }

    #[test]
    fn test_select_element_lenient_vs_full() {
        let mut doc = Document::new();
        let root = doc.root();
        let book = doc.create_element(root, "book");
        let title = doc.create_element_full(book, "t", "title");

        assert_eq!(doc.select_element(book, "title"), Some(title));
        assert_eq!(doc.select_element(book, "t:title"), Some(title));
        assert_eq!(doc.select_element_full(book, "t", "title"), Some(title));
        assert_eq!(doc.select_element_full(book, "", "title"), None);
        assert_eq!(doc.select_elements(book, "title"), vec![title]);
        assert!(doc.select_elements_full(book, "", "title").is_empty());
    }

    #[test]
    fn test_namespace_uri_resolution() {
        let mut doc = Document::new();
        let root = doc.root();
        let store = doc.create_element(root, "store");
        doc.create_attr(store, "xmlns:p", "urn:prices");
        doc.create_attr(store, "xmlns", "urn:default");
        let book = doc.create_element(store, "book");
        let price = doc.create_element_full(book, "p", "price");

        assert_eq!(doc.namespace_uri(price), "urn:prices");
        assert_eq!(doc.namespace_uri(book), "urn:default");

        let orphan = doc.create_element_full(book, "q", "x");
        assert_eq!(doc.namespace_uri(orphan), "");
    }

    #[test]
    fn test_insert_before_and_prepend() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element(root, "a");
        let c = doc.create_element(root, "c");
        let b = doc.create_node(NodeKind::Element {
            tag: "b".to_string(),
            prefix: None,
            attributes: Vec::new(),
        });
        doc.insert_before(c, b);

        let children: Vec<NodeId> = doc.children(root).collect();
        assert_eq!(children, vec![a, b, c]);
    }

    #[test]
    fn test_detach() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element(root, "a");
        let b = doc.create_element(root, "b");
        let c = doc.create_element(root, "c");

        doc.detach(b);

        let children: Vec<NodeId> = doc.children(root).collect();
        assert_eq!(children, vec![a, c]);
        assert_eq!(doc.parent(b), None);
        assert_eq!(doc.next_sibling(a), Some(c));
    }

    #[test]
    fn test_descendants_document_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let top = doc.create_element(root, "top");
        let a = doc.create_element(top, "a");
        let a1 = doc.create_element(a, "a1");
        let b = doc.create_element(top, "b");

        let descendants: Vec<NodeId> = doc.descendants(top).collect();
        assert_eq!(descendants, vec![a, a1, b]);
    }

    #[test]
    fn test_ancestors_walk_to_document_node() {
        let mut doc = Document::new();
        let root = doc.root();
        let top = doc.create_element(root, "top");
        let mid = doc.create_element(top, "mid");
        let leaf = doc.create_element(mid, "leaf");

        let chain: Vec<NodeId> = doc.ancestors(leaf).collect();
        assert_eq!(chain, vec![leaf, mid, top, root]);
    }

    #[test]
    fn test_clone_is_deep_copy() {
        let mut doc = Document::new();
        let root = doc.root();
        let e = doc.create_element(root, "e");
        doc.set_text(e, "original");

        let copy = doc.clone();
        doc.set_text(e, "changed");

        let copy_e = copy.root_element().unwrap();
        assert_eq!(copy.text(copy_e), "original");
    }

    #[cfg(not(feature = "strict-prefix"))]
    #[test]
    fn test_space_match_lenient() {
        assert!(space_match("", "p"));
        assert!(space_match("", ""));
        assert!(space_match("*", "p"));
        assert!(space_match("p", "p"));
        assert!(!space_match("p", ""));
        assert!(!space_match("p", "q"));
    }

    #[cfg(feature = "strict-prefix")]
    #[test]
    fn test_space_match_strict() {
        assert!(!space_match("", "p"));
        assert!(space_match("", ""));
        assert!(space_match("*", "p"));
        assert!(space_match("p", "p"));
        assert!(!space_match("p", ""));
    }
}
