//! Variable templates
//!
//! A token is `${name}`, optionally followed by a default written either as
//! `:{default}` or `:default}`.

use crate::variable::METHOD_PREFIX;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^:}]+)\}(?::\{([^}]*)\}|:([^{}]*)\})?").expect("token pattern is valid")
});

/// One `${...}` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Variable name between the braces
    pub name: String,
    /// Default value, if one was written
    pub default: Option<String>,
    /// Byte range of the whole token, default included
    pub span: Range<usize>,
}

/// A parsed configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableTemplate {
    source: String,
    tokens: Vec<Token>,
}

impl VariableTemplate {
    /// Scan `source` for tokens, left to right
    pub fn parse(source: &str) -> Self {
        let tokens = TOKEN
            .captures_iter(source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?.as_str().to_string();
                let default = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str().to_string());
                Some(Token {
                    name,
                    default,
                    span: whole.range(),
                })
            })
            .collect();

        Self {
            source: source.to_string(),
            tokens,
        }
    }

    /// Original text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Tokens in order of appearance
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Whether the template contains at least one token
    pub fn has_variables(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Whether any token refers to a `method.` variable
    pub fn references_member_scope(&self) -> bool {
        self.tokens.iter().any(|t| t.name.starts_with(METHOD_PREFIX))
    }

    /// Replace everything from the first token's start to the last token's
    /// end with `value`; text outside that span is kept
    pub fn expand(&self, value: &str) -> String {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => {
                let mut out = String::with_capacity(self.source.len() + value.len());
                out.push_str(&self.source[..first.span.start]);
                out.push_str(value);
                out.push_str(&self.source[last.span.end..]);
                out
            }
            _ => self.source.clone(),
        }
    }
}
