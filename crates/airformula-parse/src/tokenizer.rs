use std::fmt;

use airformula_common::Registry;
use smallvec::SmallVec;

use crate::error::TokenizeError;
use crate::node::{Enclosure, Group, Node, NodeKind, Token};

/// Deepest run of open parentheses, quotes and braces a formula may have.
/// Reduction and conversion recurse once per level.
pub const MAX_NESTING_DEPTH: usize = 64;

/// The token tree returned by [`tokenize`]: the root group of a formula.
pub type TokenTree = Group;

/// An enclosing context the tokenizer can be inside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Root,
    Parenthesized,
    DoubleQuoted,
    SingleQuoted,
    Braced,
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Context::Root => "formula",
            Context::Parenthesized => "parenthesized group",
            Context::DoubleQuoted => "double-quoted string",
            Context::SingleQuoted => "single-quoted string",
            Context::Braced => "braced reference",
        };
        f.write_str(name)
    }
}

impl Context {
    /// Patterns legal in this context, in match priority order.
    pub fn patterns(self) -> &'static [Pattern] {
        use Pattern::*;
        const GROUP: &[Pattern] = &[
            OpenDoubleQuote,
            OpenSingleQuote,
            OpenParenthesis,
            OpenBrace,
            CloseParenthesis,
            Number,
            ArgumentSeparator,
            Operator,
            Reference,
            Space,
        ];
        match self {
            Context::Root | Context::Parenthesized => GROUP,
            Context::DoubleQuoted => &[CloseDoubleQuote, EscapedBackslash, EscapedQuote, TextRun],
            Context::SingleQuoted => &[CloseSingleQuote, EscapedBackslash, EscapedQuote, TextRun],
            Context::Braced => &[CloseBrace, ReferenceRun],
        }
    }

    fn quote(self) -> Option<u8> {
        match self {
            Context::DoubleQuoted => Some(b'"'),
            Context::SingleQuoted => Some(b'\''),
            _ => None,
        }
    }
}

/// One kind of text the tokenizer can match at an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    OpenDoubleQuote,
    OpenSingleQuote,
    OpenParenthesis,
    OpenBrace,
    CloseDoubleQuote,
    CloseSingleQuote,
    CloseParenthesis,
    CloseBrace,
    /// An even run of backslashes inside a quoted string.
    EscapedBackslash,
    /// A backslash followed by the enclosing quote character.
    EscapedQuote,
    Number,
    ArgumentSeparator,
    Operator,
    Reference,
    Space,
    /// Literal text inside a quoted string.
    TextRun,
    /// The name inside `{...}`.
    ReferenceRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Open(Context),
    Close,
    Member(NodeKind),
    /// Absorbed into the enclosing string or braced reference.
    Content,
}

impl Pattern {
    pub(crate) fn role(self) -> Role {
        match self {
            Pattern::OpenDoubleQuote => Role::Open(Context::DoubleQuoted),
            Pattern::OpenSingleQuote => Role::Open(Context::SingleQuoted),
            Pattern::OpenParenthesis => Role::Open(Context::Parenthesized),
            Pattern::OpenBrace => Role::Open(Context::Braced),
            Pattern::CloseDoubleQuote
            | Pattern::CloseSingleQuote
            | Pattern::CloseParenthesis
            | Pattern::CloseBrace => Role::Close,
            Pattern::Number => Role::Member(NodeKind::Number),
            Pattern::ArgumentSeparator => Role::Member(NodeKind::ArgumentSeparator),
            Pattern::Operator => Role::Member(NodeKind::Operator),
            Pattern::Reference => Role::Member(NodeKind::Reference),
            Pattern::Space => Role::Member(NodeKind::Space),
            Pattern::EscapedBackslash
            | Pattern::EscapedQuote
            | Pattern::TextRun
            | Pattern::ReferenceRun => Role::Content,
        }
    }

    /// Kind of the token a delimiter pattern produces.
    fn delimiter_kind(self) -> NodeKind {
        match self {
            Pattern::OpenDoubleQuote
            | Pattern::OpenSingleQuote
            | Pattern::CloseDoubleQuote
            | Pattern::CloseSingleQuote => NodeKind::QuoteMark,
            Pattern::OpenParenthesis => NodeKind::OpenParenthesis,
            Pattern::CloseParenthesis => NodeKind::CloseParenthesis,
            Pattern::OpenBrace => NodeKind::OpenBrace,
            Pattern::CloseBrace => NodeKind::CloseBrace,
            _ => NodeKind::Group,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Pattern::OpenDoubleQuote => "opening double quote",
            Pattern::OpenSingleQuote => "opening single quote",
            Pattern::OpenParenthesis => "opening parenthesis",
            Pattern::OpenBrace => "opening brace",
            Pattern::CloseDoubleQuote => "closing double quote",
            Pattern::CloseSingleQuote => "closing single quote",
            Pattern::CloseParenthesis => "closing parenthesis",
            Pattern::CloseBrace => "closing brace",
            Pattern::EscapedBackslash => "escaped backslash",
            Pattern::EscapedQuote => "escaped quote",
            Pattern::Number => "number",
            Pattern::ArgumentSeparator => "argument separator",
            Pattern::Operator => "operator",
            Pattern::Reference => "reference",
            Pattern::Space => "space",
            Pattern::TextRun => "text",
            Pattern::ReferenceRun => "reference name",
        }
    }

    /// Length in bytes of this pattern's match at the very start of `rest`.
    fn match_len(self, rest: &str, context: Context, registry: &Registry) -> Option<usize> {
        let bytes = rest.as_bytes();
        let single = |b: u8| (bytes.first() == Some(&b)).then_some(1);
        let len = match self {
            Pattern::OpenDoubleQuote | Pattern::CloseDoubleQuote => return single(b'"'),
            Pattern::OpenSingleQuote | Pattern::CloseSingleQuote => return single(b'\''),
            Pattern::OpenParenthesis => return single(b'('),
            Pattern::CloseParenthesis => return single(b')'),
            Pattern::OpenBrace => return single(b'{'),
            Pattern::CloseBrace => return single(b'}'),
            Pattern::ArgumentSeparator => return single(b','),
            Pattern::Operator => return registry.match_operator(rest).map(str::len),
            Pattern::EscapedBackslash => {
                let run = bytes.iter().take_while(|&&b| b == b'\\').count();
                run - run % 2
            }
            Pattern::EscapedQuote => match (bytes, context.quote()) {
                ([b'\\', next, ..], Some(quote)) if *next == quote => 2,
                _ => 0,
            },
            Pattern::Number => number_len(bytes),
            Pattern::Reference => {
                if bytes.first().is_some_and(u8::is_ascii_alphabetic) {
                    bytes
                        .iter()
                        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                        .count()
                } else {
                    0
                }
            }
            Pattern::Space => rest
                .char_indices()
                .find(|(_, c)| !c.is_whitespace())
                .map_or(rest.len(), |(idx, _)| idx),
            Pattern::TextRun => match context.quote() {
                Some(quote) => text_run_len(bytes, quote),
                None => 0,
            },
            Pattern::ReferenceRun => bytes
                .iter()
                .take_while(|&&b| b != b'{' && b != b'}')
                .count(),
        };
        (len > 0).then_some(len)
    }
}

/// `\d+(\.\d+)?`
fn number_len(bytes: &[u8]) -> usize {
    let int = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if int == 0 {
        return 0;
    }
    match bytes.get(int) {
        Some(b'.') => {
            let frac = bytes[int + 1..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            if frac > 0 { int + 1 + frac } else { int }
        }
        _ => int,
    }
}

/// Literal string content up to the closing quote or the next escape. A
/// backslash that does not start an escape is ordinary text.
fn text_run_len(bytes: &[u8], quote: u8) -> usize {
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b if b == quote => break,
            b'\\' if matches!(bytes.get(idx + 1), Some(&next) if next == quote || next == b'\\') => {
                break;
            }
            _ => idx += 1,
        }
    }
    idx
}

/// Accumulation for one open context.
struct Frame {
    context: Context,
    opener: Option<Token>,
    members: Vec<Node>,
    /// Raw content of a string or braced reference.
    text: String,
}

impl Frame {
    fn new(context: Context, opener: Option<Token>) -> Self {
        Frame {
            context,
            opener,
            members: Vec::new(),
            text: String::new(),
        }
    }

    fn close(self, closer: Token) -> Result<Node, TokenizeError> {
        let Some(opener) = self.opener else {
            return Err(TokenizeError::UnexpectedClosing {
                token: closer.value,
                position: closer.start,
            });
        };
        let node = match self.context {
            Context::Parenthesized => Node::Group(Group::wrapped(
                self.members,
                Box::new(Enclosure { opener, closer }),
            )),
            Context::DoubleQuoted | Context::SingleQuoted => {
                Node::Token(Token::enclosed(NodeKind::String, self.text, opener, closer))
            }
            Context::Braced => {
                Node::Token(Token::enclosed(NodeKind::Reference, self.text, opener, closer))
            }
            Context::Root => {
                return Err(TokenizeError::UnexpectedClosing {
                    token: closer.value,
                    position: closer.start,
                });
            }
        };
        Ok(node)
    }
}

/// Splits formula text into a tree of tokens, one nesting level per open
/// parenthesis, quote or brace.
pub struct Tokenizer<'a> {
    source: &'a str,
    registry: &'a Registry,
    offset: usize,
    stack: Vec<Frame>,
    current: Frame,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str, registry: &'a Registry) -> Self {
        Tokenizer {
            source,
            registry,
            offset: 0,
            stack: Vec::with_capacity(8),
            current: Frame::new(Context::Root, None),
        }
    }

    pub fn tokenize(mut self) -> Result<TokenTree, TokenizeError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("tokenize", len = self.source.len()).entered();

        let source = self.source;
        while self.offset < source.len() {
            let rest = &source[self.offset..];
            let context = self.current.context;
            let (pattern, len) = context
                .patterns()
                .iter()
                .find_map(|&pattern| {
                    pattern
                        .match_len(rest, context, self.registry)
                        .map(|len| (pattern, len))
                })
                .ok_or_else(|| self.unexpected_character(rest))?;

            let start = self.offset;
            let end = start + len;
            let text = &source[start..end];
            match pattern.role() {
                Role::Open(inner) => {
                    if self.stack.len() >= MAX_NESTING_DEPTH {
                        return Err(TokenizeError::TooDeep {
                            position: start,
                            limit: MAX_NESTING_DEPTH,
                        });
                    }
                    let opener = Token::new(pattern.delimiter_kind(), start, end, text);
                    let parent =
                        std::mem::replace(&mut self.current, Frame::new(inner, Some(opener)));
                    self.stack.push(parent);
                }
                Role::Close => {
                    let closer = Token::new(pattern.delimiter_kind(), start, end, text);
                    self.close(closer)?;
                }
                Role::Member(kind) => {
                    self.current
                        .members
                        .push(Node::Token(Token::new(kind, start, end, text)));
                }
                Role::Content => self.current.text.push_str(text),
            }
            self.offset = end;
        }

        self.finish()
    }

    fn close(&mut self, closer: Token) -> Result<(), TokenizeError> {
        let Some(parent) = self.stack.pop() else {
            return Err(TokenizeError::UnexpectedClosing {
                token: closer.value,
                position: closer.start,
            });
        };
        let frame = std::mem::replace(&mut self.current, parent);
        let node = frame.close(closer)?;
        self.current.members.push(node);
        Ok(())
    }

    fn finish(self) -> Result<TokenTree, TokenizeError> {
        if !self.stack.is_empty() {
            let (opener, position) = self
                .current
                .opener
                .map_or((String::new(), self.offset), |t| (t.value, t.start));
            return Err(TokenizeError::Unclosed {
                context: self.current.context,
                opener,
                position,
            });
        }
        Ok(Group::root(self.source.len(), self.current.members))
    }

    fn unexpected_character(&self, rest: &str) -> TokenizeError {
        let context = self.current.context;
        TokenizeError::UnexpectedCharacter {
            position: self.offset,
            found: rest.chars().next().unwrap_or_default(),
            context,
            expected: context.patterns().iter().copied().collect::<SmallVec<_>>(),
        }
    }
}

/// Tokenize with the default Airtable registry.
pub fn tokenize(text: &str) -> Result<TokenTree, TokenizeError> {
    Tokenizer::new(text, Registry::airtable()).tokenize()
}
