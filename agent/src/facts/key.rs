//! Canonical key encoding and parsing.

use super::{FactKind, PrivilegeFact, CONNECT};
use std::fmt;
use thiserror::Error;

const SEP: char = ':';
const ESC: char = '\\';

/// Canonical, collision-free string form of a [`PrivilegeFact`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrivilegeKey(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("unknown kind tag: {0:?}")]
    UnknownKind(String),

    #[error("{kind} key has {found} fields, expected {expected}")]
    FieldCount {
        kind: FactKind,
        expected: usize,
        found: usize,
    },

    #[error("database key privilege must be CONNECT, got {0:?}")]
    NotConnect(String),

    #[error("dangling escape at end of key")]
    DanglingEscape,
}

fn escape_into(out: &mut String, field: &str) {
    for c in field.chars() {
        if c == SEP || c == ESC {
            out.push(ESC);
        }
        out.push(c);
    }
}

/// Split on unescaped separators, unescaping each part.
fn split_unescaped(raw: &str) -> Result<Vec<String>, KeyParseError> {
    let mut parts = Vec::new();
    let mut cur = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            ESC => match chars.next() {
                Some(next) => cur.push(next),
                None => return Err(KeyParseError::DanglingEscape),
            },
            SEP => parts.push(std::mem::take(&mut cur)),
            _ => cur.push(c),
        }
    }
    parts.push(cur);
    Ok(parts)
}

impl PrivilegeKey {
    pub(super) fn encode(kind: FactKind, fields: &[&str]) -> Self {
        let mut out = String::from(kind.tag());
        for f in fields {
            out.push(SEP);
            escape_into(&mut out, f);
        }
        Self(out)
    }

    /// Wrap a key read back from persisted state. No validation: unknown keys
    /// still take part in set comparison.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the key back into the fact it was built from.
    pub fn parse(&self) -> Result<PrivilegeFact, KeyParseError> {
        let mut parts = split_unescaped(&self.0)?.into_iter();
        let tag = parts.next().unwrap_or_default();
        let kind = FactKind::from_tag(&tag).ok_or(KeyParseError::UnknownKind(tag))?;
        let fields: Vec<String> = parts.collect();

        let expected = match kind {
            FactKind::Table => 4,
            FactKind::Schema | FactKind::Database => 3,
        };
        if fields.len() != expected {
            return Err(KeyParseError::FieldCount {
                kind,
                expected,
                found: fields.len(),
            });
        }

        let mut f = fields.into_iter();
        let mut next = || f.next().unwrap_or_default();
        Ok(match kind {
            FactKind::Table => PrivilegeFact::table(next(), next(), next(), next()),
            FactKind::Schema => PrivilegeFact::schema(next(), next(), next()),
            FactKind::Database => {
                let role = next();
                let privilege = next();
                if privilege != CONNECT {
                    return Err(KeyParseError::NotConnect(privilege));
                }
                PrivilegeFact::database(role, next())
            }
        })
    }
}

impl fmt::Display for PrivilegeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_separator_and_escape() {
        let key = PrivilegeKey::encode(FactKind::Schema, &["a:b", "c\\d", "e"]);
        assert_eq!(key.as_str(), "SCHEMA:a\\:b:c\\\\d:e");
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert_eq!(
            PrivilegeKey::from_raw("VIEW:a:b").parse(),
            Err(KeyParseError::UnknownKind("VIEW".into()))
        );
        assert_eq!(
            PrivilegeKey::from_raw("TABLE:a:b").parse(),
            Err(KeyParseError::FieldCount {
                kind: FactKind::Table,
                expected: 4,
                found: 2
            })
        );
        assert_eq!(
            PrivilegeKey::from_raw("DATABASE:r:TEMP:db").parse(),
            Err(KeyParseError::NotConnect("TEMP".into()))
        );
        assert_eq!(
            PrivilegeKey::from_raw("SCHEMA:a:b:c\\").parse(),
            Err(KeyParseError::DanglingEscape)
        );
    }
}
