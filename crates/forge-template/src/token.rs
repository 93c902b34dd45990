//! Tokenizer for `{{…}}` directives.
//!
//! The tokenizer splits a template into literal text and directive tokens in
//! a single left-to-right pass. It never fails: anything that does not look
//! like a directive comes back as [`Token::Text`].
//!
//! # Recognized Forms
//!
//! | Form | Token |
//! |------|-------|
//! | `{{NAME}}`, `{{ NAME }}`, `{{A.B.0}}` | [`Token::Variable`] |
//! | `{{#IF NAME}}`, `{{#IF !NAME}}` | [`Token::If`] |
//! | `{{#ELSE}}` | [`Token::Else`] |
//! | `{{/IF}}` | [`Token::EndIf`] |
//! | `{{#FOREACH NAME}}` | [`Token::Foreach`] |
//! | `{{/FOREACH}}` | [`Token::EndForeach`] |
//!
//! Keywords are case-sensitive. Names start with an ASCII letter or `_`,
//! continue with ASCII alphanumerics or `_`, and may contain `.` between
//! non-empty segments.

/// A token produced by the [`Tokenizer`].
///
/// Every directive token carries its `raw` spelling so the parser can turn
/// unmatched directives back into literal text byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// Literal content.
    Text(&'a str),
    /// Variable substitution.
    Variable { raw: &'a str, name: &'a str },
    /// Conditional block opener.
    If {
        raw: &'a str,
        name: &'a str,
        negated: bool,
    },
    /// Alternative branch of the enclosing conditional.
    Else { raw: &'a str },
    /// Conditional block closer.
    EndIf { raw: &'a str },
    /// Iteration block opener.
    Foreach { raw: &'a str, name: &'a str },
    /// Iteration block closer.
    EndForeach { raw: &'a str },
}

impl<'a> Token<'a> {
    /// Returns the exact source text of this token.
    pub(crate) fn raw(&self) -> &'a str {
        match self {
            Token::Text(text) => *text,
            Token::Variable { raw, .. }
            | Token::If { raw, .. }
            | Token::Else { raw }
            | Token::EndIf { raw }
            | Token::Foreach { raw, .. }
            | Token::EndForeach { raw } => *raw,
        }
    }
}

/// A token together with its byte offset in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Spanned<'a> {
    pub token: Token<'a>,
    pub offset: usize,
}

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Iterator over the tokens of a template.
pub(crate) struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// A directive found while scanning for text, emitted on the next call.
    pending: Option<Spanned<'a>>,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            pending: None,
        }
    }

    /// Checks if `s` is a valid (possibly dotted) variable name.
    pub(crate) fn is_valid_name(s: &str) -> bool {
        let starts_with_name = s
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        starts_with_name && s.split('.').all(Self::is_valid_segment)
    }

    fn is_valid_segment(segment: &str) -> bool {
        let mut chars = segment.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
            // Index segments after the first (`ITEMS.0`)
            Some(first) if first.is_ascii_digit() => {
                return chars.all(|c| c.is_ascii_digit());
            }
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Classifies the text between `{{` and `}}`.
    fn classify(raw: &'a str, inner: &'a str) -> Option<Token<'a>> {
        let inner = inner.trim();

        match inner {
            "#ELSE" => return Some(Token::Else { raw }),
            "/IF" => return Some(Token::EndIf { raw }),
            "/FOREACH" => return Some(Token::EndForeach { raw }),
            _ => {}
        }

        if let Some(rest) = keyword_argument(inner, "#IF") {
            let (negated, name) = match rest.strip_prefix('!') {
                Some(name) => (true, name.trim_start()),
                None => (false, rest),
            };
            return Self::is_valid_name(name).then_some(Token::If { raw, name, negated });
        }

        if let Some(name) = keyword_argument(inner, "#FOREACH") {
            return Self::is_valid_name(name).then_some(Token::Foreach { raw, name });
        }

        Self::is_valid_name(inner).then_some(Token::Variable { raw, name: inner })
    }

    /// Tries to read a directive starting exactly at byte `start`.
    ///
    /// No directive contains `{`, so the closing `}}` is only searched for
    /// up to the next `{`. Each byte is then scanned a bounded number of
    /// times and tokenizing stays linear.
    fn directive_at(&self, start: usize) -> Option<Token<'a>> {
        let after_open = start + OPEN.len();
        let rest = &self.input[after_open..];
        let candidate = &rest[..rest.find('{').unwrap_or(rest.len())];
        let close = candidate.find(CLOSE)? + after_open;
        let raw = &self.input[start..close + CLOSE.len()];
        Self::classify(raw, &self.input[after_open..close])
    }
}

/// Returns the argument following `keyword` and at least one whitespace char.
fn keyword_argument<'s>(inner: &'s str, keyword: &str) -> Option<&'s str> {
    let rest = inner.strip_prefix(keyword)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Spanned<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            self.pos = pending.offset + pending.token.raw().len();
            return Some(pending);
        }

        if self.pos >= self.input.len() {
            return None;
        }

        let text_start = self.pos;
        let mut search = self.pos;

        while let Some(found) = self.input[search..].find(OPEN) {
            let mut start = search + found;

            // `{{{NAME}}}`: leading extra braces are literal
            while self.input[start + OPEN.len()..].starts_with('{') {
                start += 1;
            }

            if let Some(token) = self.directive_at(start) {
                let spanned = Spanned {
                    token,
                    offset: start,
                };
                if start == text_start {
                    self.pos = start + spanned.token.raw().len();
                    return Some(spanned);
                }
                self.pending = Some(spanned);
                self.pos = start;
                return Some(Spanned {
                    token: Token::Text(&self.input[text_start..start]),
                    offset: text_start,
                });
            }

            // Not a directive: keep the braces as text and resume after them
            search = start + OPEN.len();
        }

        self.pos = self.input.len();
        Some(Spanned {
            token: Token::Text(&self.input[text_start..]),
            offset: text_start,
        })
    }
}
