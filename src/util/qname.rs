//! Qualified-name handling.
//!
//! A qualified name has the form `prefix:localname` or just `localname`.
//! Path expressions, element tags, and attribute keys all use this shape;
//! an absent prefix is represented as the empty string throughout the
//! crate.

/// Splits a qualified name into its namespace-prefix and local-name parts.
///
/// Returns `("", name)` when the name contains no colon. Only the first
/// colon splits; anything after it belongs to the local name.
///
/// # Examples
///
/// ```
/// use elemtree::util::qname::split_qname;
///
/// assert_eq!(split_qname("p:price"), ("p", "price"));
/// assert_eq!(split_qname("price"), ("", "price"));
/// ```
#[must_use]
pub fn split_qname(qname: &str) -> (&str, &str) {
    match qname.find(':') {
        Some(pos) => (&qname[..pos], &qname[pos + 1..]),
        None => ("", qname),
    }
}
