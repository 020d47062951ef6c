//! Path expression compiler.
//!
//! A recursive descent parser over the token stream produced by
//! [`super::lexer`]. The grammar:
//!
//! ```text
//! path        ::= sep? (segment sep)* segment?
//! sep         ::= '/' | '//'
//! segment     ::= segmentExpr ('|' segmentExpr)*
//! segmentExpr ::= selector filterWrap* | '(' segment ')'
//! filterWrap  ::= '[' filter ']'
//! filter      ::= filterExpr ('|' filterExpr)*
//! filterExpr  ::= number
//!               | '@' name ( '=' string )?
//!               | name ( '=' string )?
//!               | name '(' ')' ( '=' string )?
//!               | '(' filter ')'
//! name        ::= ident (':' ident)?
//! ```
//!
//! The output is the compiled form evaluated by [`super::eval`]: a list of
//! [`Segment`]s, each a union of [`SegmentExpr`]s, each of which pairs a
//! [`Selector`] with an ordered list of [`Filter`]s. Selectors and filter
//! expressions are closed tagged unions -- the variant set is fixed by the
//! grammar, so the evaluator matches exhaustively with no dynamic dispatch.
//! Parentheses group without adding semantics: their expressions are
//! spliced flat into the enclosing union list.

use crate::error::PathError;

use super::lexer::{tokenize, Token, TokenKind};

/// One portion of a compiled path between separators: a union of segment
/// expressions, evaluated against an element by merging each expression's
/// candidates in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub(crate) exprs: Vec<SegmentExpr>,
}

impl Segment {
    /// A single-selector segment with no filters, used for the implicit
    /// segments absolute paths and `//` separators introduce.
    fn implicit(selector: Selector) -> Self {
        Self {
            exprs: vec![SegmentExpr {
                selector,
                filters: Vec::new(),
            }],
        }
    }
}

/// A selector with the filters that narrow its candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SegmentExpr {
    pub(crate) selector: Selector,
    pub(crate) filters: Vec<Filter>,
}

/// Produces a segment expression's initial candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selector {
    /// The topmost element reachable from the context element (implicit
    /// leading segment of absolute paths).
    Root,
    /// The context element itself (`.`).
    Current,
    /// The context element's parent (`..`).
    Parent,
    /// All element-typed children (`*`).
    AllChildren,
    /// Element children matching a (possibly prefixed) tag.
    ChildrenByTag { space: String, tag: String },
    /// The context element and all its element descendants, self first
    /// (implicit segment introduced by `//`).
    Descendants,
}

/// A bracketed predicate: a union of filter expressions applied to an
/// incoming candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Filter {
    pub(crate) exprs: Vec<FilterExpr>,
}

/// One alternative inside a `[...]` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FilterExpr {
    /// Positional selection. Non-negative values are 0-based from the
    /// front (the source syntax is 1-based; `[0]` selects the first
    /// candidate just like `[1]`); negative values count from the end.
    Index(isize),
    /// `[@attr]` -- keeps elements carrying the attribute.
    HasAttr { space: String, key: String },
    /// `[@attr='val']` -- keeps elements whose attribute has the value.
    AttrEquals {
        space: String,
        key: String,
        value: String,
    },
    /// `[tag]` -- keeps elements with a matching child element.
    HasChildTag { space: String, tag: String },
    /// `[tag='val']` -- keeps elements with a matching child element whose
    /// text equals the value.
    ChildTagTextEquals {
        space: String,
        tag: String,
        value: String,
    },
    /// `[fn()]` -- keeps elements whose accessor returns a non-empty string.
    FuncExists(QueryFn),
    /// `[fn()='val']` -- keeps elements whose accessor returns the value.
    FuncEquals(QueryFn, String),
}

/// The element-to-string accessors usable in function filters.
///
/// The set is fixed; unknown function names are rejected at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryFn {
    /// `local-name()` -- the element's unprefixed tag.
    LocalName,
    /// `name()` -- the prefixed form `prefix:tag`.
    FullName,
    /// `namespace-prefix()` -- the element's prefix.
    NamespacePrefix,
    /// `namespace-uri()` -- the URI bound to the element's prefix.
    NamespaceUri,
    /// `text()` -- the element's leading character data.
    Text,
}

/// Resolves a function-filter name against the fixed accessor table.
fn lookup_query_fn(name: &str) -> Option<QueryFn> {
    match name {
        "local-name" => Some(QueryFn::LocalName),
        "name" => Some(QueryFn::FullName),
        "namespace-prefix" => Some(QueryFn::NamespacePrefix),
        "namespace-uri" => Some(QueryFn::NamespaceUri),
        "text" => Some(QueryFn::Text),
        _ => None,
    }
}

/// Compiles a path string into its segment list.
///
/// # Errors
///
/// Returns [`PathError`] on any lexical or grammatical violation.
pub(crate) fn parse(input: &str) -> Result<Vec<Segment>, PathError> {
    let tokens = tokenize(input)?;
    Parser::new(tokens).parse_path()
}

/// Recursive descent parser over the path token stream.
struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token<'a>>) -> Self {
        Self { tokens, pos: 0 }
    }

    // -----------------------------------------------------------------------
    // Token access helpers
    // -----------------------------------------------------------------------

    /// Returns the current token. The stream always ends with `Eof`, so
    /// there is always a current token.
    fn peek(&self) -> Token<'a> {
        self.peek_at(0)
    }

    /// Returns the token `offset` positions ahead, clamping to `Eof`.
    fn peek_at(&self, offset: usize) -> Token<'a> {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[index]
    }

    /// Returns `true` if the current token has the given kind.
    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consumes the current token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes and returns the current token if it has the given kind, or
    /// errors out.
    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token<'a>, PathError> {
        let token = self.peek();
        if token.kind == kind {
            self.pos += 1;
            Ok(token)
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    /// Creates an error at the current token.
    fn error(&self, message: &str) -> PathError {
        PathError::new(message, self.peek().pos)
    }

    // -----------------------------------------------------------------------
    // Grammar productions
    // -----------------------------------------------------------------------

    /// Parses the whole path.
    ///
    /// A leading `/` makes the path absolute: an implicit root segment is
    /// prepended. A leading `//` prepends both the root segment and a
    /// descendants segment. Between segments `/` merely advances, while
    /// `//` inserts a descendants segment before the next one.
    fn parse_path(&mut self) -> Result<Vec<Segment>, PathError> {
        let mut segments = Vec::new();

        if self.eat(TokenKind::Sep) {
            segments.push(Segment::implicit(Selector::Root));
        } else if self.eat(TokenKind::SepRecurse) {
            segments.push(Segment::implicit(Selector::Root));
            segments.push(Segment::implicit(Selector::Descendants));
        }

        if self.check(TokenKind::Eof) {
            return Err(self.error("empty path"));
        }

        loop {
            segments.push(self.parse_segment()?);

            if self.eat(TokenKind::Sep) {
                // A trailing '/' is inert.
                if self.check(TokenKind::Eof) {
                    break;
                }
            } else if self.eat(TokenKind::SepRecurse) {
                segments.push(Segment::implicit(Selector::Descendants));
                if self.check(TokenKind::Eof) {
                    break;
                }
            } else if self.check(TokenKind::Eof) {
                break;
            } else {
                return Err(self.error("expected '/' between segments"));
            }
        }

        Ok(segments)
    }

    /// Parses a `|`-joined union of segment expressions.
    fn parse_segment(&mut self) -> Result<Segment, PathError> {
        let mut exprs = Vec::new();
        self.parse_segment_expr(&mut exprs)?;
        while self.eat(TokenKind::Union) {
            self.parse_segment_expr(&mut exprs)?;
        }
        Ok(Segment { exprs })
    }

    /// Parses one segment expression into `exprs`. A parenthesized
    /// sub-segment splices its expressions flat into the enclosing union.
    fn parse_segment_expr(&mut self, exprs: &mut Vec<SegmentExpr>) -> Result<(), PathError> {
        if self.eat(TokenKind::LParen) {
            let inner = self.parse_segment()?;
            self.expect(TokenKind::RParen, "')'")?;
            exprs.extend(inner.exprs);
            return Ok(());
        }

        let selector = self.parse_selector()?;
        let mut filters = Vec::new();
        while self.check(TokenKind::LBracket) {
            filters.push(self.parse_filter_wrap()?);
        }
        exprs.push(SegmentExpr { selector, filters });
        Ok(())
    }

    /// Parses the selector at the start of a segment expression.
    fn parse_selector(&mut self) -> Result<Selector, PathError> {
        if self.eat(TokenKind::Dot) {
            return Ok(Selector::Current);
        }
        if self.eat(TokenKind::DotDot) {
            return Ok(Selector::Parent);
        }
        // A bare `*` selects all children; `*:tag` is a qualified name with
        // a wildcard prefix and is handled by parse_name below.
        if self.check(TokenKind::Star) && self.peek_at(1).kind != TokenKind::Colon {
            self.pos += 1;
            return Ok(Selector::AllChildren);
        }
        if self.check(TokenKind::Ident) || self.check(TokenKind::Star) {
            let (space, tag) = self.parse_name()?;
            return Ok(Selector::ChildrenByTag { space, tag });
        }
        Err(self.error("expected selector"))
    }

    /// Parses a bracketed filter.
    fn parse_filter_wrap(&mut self) -> Result<Filter, PathError> {
        self.expect(TokenKind::LBracket, "'['")?;
        let filter = self.parse_filter()?;
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(filter)
    }

    /// Parses a `|`-joined union of filter expressions.
    fn parse_filter(&mut self) -> Result<Filter, PathError> {
        let mut exprs = Vec::new();
        self.parse_filter_expr(&mut exprs)?;
        while self.eat(TokenKind::Union) {
            self.parse_filter_expr(&mut exprs)?;
        }
        Ok(Filter { exprs })
    }

    /// Parses one filter expression into `exprs`. A parenthesized
    /// sub-filter splices its expressions flat into the enclosing union.
    fn parse_filter_expr(&mut self, exprs: &mut Vec<FilterExpr>) -> Result<(), PathError> {
        if self.eat(TokenKind::LParen) {
            let inner = self.parse_filter()?;
            self.expect(TokenKind::RParen, "')'")?;
            exprs.extend(inner.exprs);
            return Ok(());
        }

        if self.check(TokenKind::Number) {
            exprs.push(self.parse_index()?);
            return Ok(());
        }

        if self.eat(TokenKind::At) {
            let (space, key) = self.parse_name()?;
            if self.eat(TokenKind::Equal) {
                let value = self.expect(TokenKind::String, "quoted string after '='")?;
                exprs.push(FilterExpr::AttrEquals {
                    space,
                    key,
                    value: value.lexeme.to_string(),
                });
            } else {
                exprs.push(FilterExpr::HasAttr { space, key });
            }
            return Ok(());
        }

        if self.check(TokenKind::Ident) {
            let name_pos = self.peek().pos;
            let (space, name) = self.parse_name()?;

            if self.eat(TokenKind::LParen) {
                self.expect(TokenKind::RParen, "')'")?;
                let func = if space.is_empty() {
                    lookup_query_fn(&name)
                } else {
                    None
                };
                let Some(func) = func else {
                    return Err(PathError::new(
                        format!("unknown function '{name}'"),
                        name_pos,
                    ));
                };
                if self.eat(TokenKind::Equal) {
                    let value = self.expect(TokenKind::String, "quoted string after '='")?;
                    exprs.push(FilterExpr::FuncEquals(func, value.lexeme.to_string()));
                } else {
                    exprs.push(FilterExpr::FuncExists(func));
                }
                return Ok(());
            }

            if self.eat(TokenKind::Equal) {
                let value = self.expect(TokenKind::String, "quoted string after '='")?;
                exprs.push(FilterExpr::ChildTagTextEquals {
                    space,
                    tag: name,
                    value: value.lexeme.to_string(),
                });
            } else {
                exprs.push(FilterExpr::HasChildTag { space, tag: name });
            }
            return Ok(());
        }

        Err(self.error("expected filter expression"))
    }

    /// Parses a positional filter, normalizing the index as stored:
    /// positive `n` becomes `n - 1`, `0` selects the first candidate, and
    /// negative values are kept as offsets from the end.
    fn parse_index(&mut self) -> Result<FilterExpr, PathError> {
        let token = self.expect(TokenKind::Number, "number")?;
        let n: isize = token
            .lexeme
            .parse()
            .map_err(|_| PathError::new("number out of range", token.pos))?;
        let index = if n > 0 { n - 1 } else { n };
        Ok(FilterExpr::Index(index))
    }

    /// Parses a possibly qualified name: `ident (':' ident)?`, where the
    /// prefix part may also be the wildcard `*`. Returns the
    /// `(namespace_prefix, local_name)` pair with an empty prefix when the
    /// name is unqualified.
    fn parse_name(&mut self) -> Result<(String, String), PathError> {
        let first = if self.check(TokenKind::Star) && self.peek_at(1).kind == TokenKind::Colon {
            let token = self.peek();
            self.pos += 1;
            token
        } else {
            self.expect(TokenKind::Ident, "name")?
        };
        if self.eat(TokenKind::Colon) {
            let second = self.expect(TokenKind::Ident, "name after ':'")?;
            Ok((first.lexeme.to_string(), second.lexeme.to_string()))
        } else {
            Ok((String::new(), first.lexeme.to_string()))
        }
    }
}
