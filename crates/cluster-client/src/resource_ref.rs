//! Resource identifier parsing.
//!
//! Turns the compact `kind[.version][.group]` form typed on the command line
//! into a [`ResourceRef`]. The split is a heuristic, not a grammar: the token
//! after the kind is treated as a version only when it looks like `vN...`.
//! A group whose first label happens to match that pattern (for example
//! `widget.v2.example.com` meant as group `v2.example.com`) is read as a
//! version. This is a known ambiguity and is kept for compatibility.

use std::fmt;

/// A (group, version, kind) triple naming a resource type.
///
/// `group` and `version` may be empty, meaning "unspecified, let discovery
/// decide".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl ResourceRef {
    /// Parses `kind`, `kind.group`, `kind.version` or `kind.version.group`.
    ///
    /// Never fails: any string parses to at least `{kind: <whole string>}`.
    #[must_use]
    pub fn parse(identifier: &str) -> Self {
        let Some((kind, rest)) = identifier.split_once('.') else {
            return Self::new("", "", identifier);
        };

        match rest.split_once('.') {
            None => Self::new(rest, "", kind),
            Some((first, group)) if looks_like_version(first) => Self::new(group, first, kind),
            // doesn't look like a version; the whole remainder is the group
            Some(_) => Self::new(rest, "", kind),
        }
    }

    fn new(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind)?;
        if !self.version.is_empty() {
            write!(f, ".{}", self.version)?;
        }
        if !self.group.is_empty() {
            write!(f, ".{}", self.group)?;
        }
        Ok(())
    }
}

/// Matches `^v[0-9]+`, i.e. `v1`, `v2beta1`, `v10alpha3`.
fn looks_like_version(token: &str) -> bool {
    token
        .strip_prefix('v')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}
