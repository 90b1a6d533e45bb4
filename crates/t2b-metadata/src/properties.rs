//! `.properties` text and JVM-style system properties

use crate::error::ConfigError;
use std::collections::BTreeMap;

/// Parse `.properties` text into key/value pairs in file order
///
/// Follows `java.util.Properties::load`: `#`/`!` comment lines, `=`, `:` or
/// whitespace separators, backslash line continuation and the `\t \n \r \f
/// \uXXXX` escapes. A later duplicate key overrides an earlier one when the
/// pairs are collected into a map.
pub fn parse_properties(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = String::from(trimmed);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        pairs.push(split_entry(&logical));
    }

    pairs
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
    let chars: Vec<char> = line.chars().collect();
    let mut pos = 0;
    let mut key_end = chars.len();

    while pos < chars.len() {
        match chars[pos] {
            '\\' => pos += 2,
            '=' | ':' => {
                key_end = pos;
                pos += 1;
                break;
            }
            c if c.is_whitespace() => {
                key_end = pos;
                while pos < chars.len() && chars[pos].is_whitespace() {
                    pos += 1;
                }
                if pos < chars.len() && (chars[pos] == '=' || chars[pos] == ':') {
                    pos += 1;
                }
                break;
            }
            _ => pos += 1,
        }
    }

    let key_end = key_end.min(chars.len());
    let pos = pos.min(chars.len());
    let value_start = chars[pos..]
        .iter()
        .position(|c| !c.is_whitespace())
        .map(|offset| pos + offset)
        .unwrap_or(chars.len());

    (unescape(&chars[..key_end]), unescape(&chars[value_start..]))
}

fn unescape(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' || i + 1 >= chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let escaped = chars[i + 1];
        i += 2;
        match escaped {
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            'f' => out.push('\u{000C}'),
            'u' => {
                let hex: String = chars[i..(i + 4).min(chars.len())].iter().collect();
                match u32::from_str_radix(&hex, 16).ok().filter(|_| hex.len() == 4) {
                    Some(code) => {
                        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                        i += 4;
                    }
                    None => out.push('u'),
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// JVM-style system properties (`-Dkey=value`)
///
/// Passed explicitly to everything that reads properties; nothing consults a
/// process-wide table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemProperties {
    values: BTreeMap<String, String>,
}

impl SystemProperties {
    /// Empty property set
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a property
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a property, returning the previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Builder-style [`SystemProperties::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Parse `key=value` assignments; a bare `key` maps to the empty string
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut properties = Self::new();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (key, value) = assignment.split_once('=').unwrap_or((assignment, ""));
            if key.trim().is_empty() {
                return Err(ConfigError::InvalidAssignment(assignment.to_string()));
            }
            properties.set(key.trim(), value);
        }
        Ok(properties)
    }

    /// Iterate in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
