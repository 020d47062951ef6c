//! # elemtree
//!
//! An XML element-tree library with a compiled, XPath-like path query
//! engine. Documents are arena-allocated trees of typed nodes (elements,
//! character data, comments, directives, processing instructions);
//! queries are compiled once into an immutable [`Path`] and evaluated any
//! number of times against any tree.
//!
//! ## Quick Start
//!
//! ```
//! use elemtree::Document;
//!
//! let doc = Document::parse_str(
//!     "<library><book genre='fiction'><title>1984</title></book></library>",
//! ).unwrap();
//!
//! let title = doc
//!     .find_element(doc.root(), "./library/book[@genre='fiction']/title")
//!     .unwrap()
//!     .expect("no match");
//! assert_eq!(doc.text(title), "1984");
//! ```

pub mod error;
pub mod path;
pub mod reader;
pub mod serial;
pub mod tree;
pub mod util;

// Re-export primary types at the crate root for convenience.
pub use error::{ParseError, PathError};
pub use path::Path;
pub use serial::{WriteSettings, XmlWriter};
pub use tree::{Attribute, Document, NodeId, NodeKind};
