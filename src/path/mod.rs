//! XPath-like path queries over the element tree.
//!
//! A path string is compiled once into a [`Path`] -- an immutable pipeline
//! of segments -- and can then be evaluated any number of times against any
//! element. Compilation is the only fallible step; evaluation of a
//! compiled path always succeeds, returning an ordered, deduplicated list
//! of matching elements.
//!
//! # Path strings
//!
//! Recognized selectors: `.` (self), `..` (parent), `*` (all element
//! children), `tag` and `prefix:tag` (children by tag), a leading `/`
//! (root), and `//` (descendants). Filters in `[...]` narrow a selector's
//! candidates: `[@attr]`, `[@attr='val']`, `[tag]`, `[tag='val']`, `[n]`
//! (1-based position, negative counts from the end), and the function
//! forms `[local-name()]`, `[name()]`, `[namespace-prefix()]`,
//! `[namespace-uri()]`, `[text()]`, each optionally compared with
//! `='val'`. Unions with `|` and grouping parentheses are legal between
//! segment expressions and between filter expressions.
//!
//! # Quick Start
//!
//! ```
//! use elemtree::{Document, Path};
//!
//! let doc = Document::parse_str(
//!     "<library><book id='1'/><book id='2'/></library>",
//! ).unwrap();
//!
//! let path = Path::compile("./library/book[@id='2']").unwrap();
//! let found = doc.find_elements_path(doc.root(), &path);
//! assert_eq!(found.len(), 1);
//! assert_eq!(doc.select_attr_value(found[0], "id", ""), "2");
//! ```

mod candidates;
mod eval;
mod lexer;
mod parser;

use crate::error::PathError;
use crate::tree::{Document, NodeId};

use parser::Segment;

/// A compiled path expression.
///
/// A `Path` is deeply immutable once compiled: it holds no references to
/// any element tree, shares no mutable state, and may be evaluated
/// concurrently against any number of documents from any number of
/// threads.
///
/// # Examples
///
/// ```
/// use elemtree::{Document, Path};
///
/// let path = Path::compile("//title").unwrap();
/// let doc = Document::parse_str("<a><title/><b><title/></b></a>").unwrap();
/// assert_eq!(doc.find_elements_path(doc.root(), &path).len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Path {
    pub(crate) segments: Vec<Segment>,
}

impl Path {
    /// Compiles a path string into a reusable `Path`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if the string violates the path grammar: an
    /// illegal character, malformed number, or unterminated string in the
    /// tokenizer; a missing bracket or parenthesis, unknown function name,
    /// empty path, or misplaced token in the parser.
    pub fn compile(path: &str) -> Result<Self, PathError> {
        Ok(Self {
            segments: parser::parse(path)?,
        })
    }

    /// Compiles a path string, panicking if it is invalid.
    ///
    /// Intended for statically known paths only; use
    /// [`compile`](Path::compile) for anything built at runtime.
    ///
    /// # Panics
    ///
    /// Panics with the underlying [`PathError`] message if `path` does not
    /// compile.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn must_compile(path: &str) -> Self {
        Self::compile(path).expect("path failed to compile")
    }
}

impl Document {
    /// Returns all elements matched by evaluating the path string at
    /// `start`, in breadth-first first-arrival order without duplicates.
    ///
    /// Equivalent to [`Path::compile`] followed by
    /// [`find_elements_path`](Document::find_elements_path).
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if the path string does not compile.
    /// Evaluation itself cannot fail -- a path that matches nothing yields
    /// an empty vector.
    pub fn find_elements(&self, start: NodeId, path: &str) -> Result<Vec<NodeId>, PathError> {
        Ok(self.find_elements_path(start, &Path::compile(path)?))
    }

    /// Returns the first element matched by evaluating the path string at
    /// `start`, or `None` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if the path string does not compile.
    pub fn find_element(&self, start: NodeId, path: &str) -> Result<Option<NodeId>, PathError> {
        Ok(self.find_element_path(start, &Path::compile(path)?))
    }

    /// Returns all elements matched by evaluating a compiled path at
    /// `start`.
    #[must_use]
    pub fn find_elements_path(&self, start: NodeId, path: &Path) -> Vec<NodeId> {
        eval::evaluate(self, start, &path.segments)
    }

    /// Returns the first element matched by evaluating a compiled path at
    /// `start`, or `None` when nothing matches.
    #[must_use]
    pub fn find_element_path(&self, start: NodeId, path: &Path) -> Option<NodeId> {
        self.find_elements_path(start, path).into_iter().next()
    }
}
