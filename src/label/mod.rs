//! Label file line model.
//!
//! A label file holds one annotation per line: a class identifier token
//! followed by box parameters. Only the class token is interpreted here; the
//! remaining tokens are carried through untouched.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// File extension of label files.
pub const LABEL_EXTENSION: &str = "txt";

/// An opaque class identifier.
///
/// Ids are compared as strings for equality. Ordering puts integer-looking ids
/// first in numeric order, then every other id lexically, so reports list
/// `2` before `10`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ClassId(String);

impl ClassId {
    /// Creates a new ClassId from its token.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the token as written in label files.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for ClassId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ClassId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ClassId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Serialize for ClassId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// One well-formed annotation line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelLine<'a> {
    pub class_id: &'a str,
    /// Box parameters, passed through unexamined.
    pub params: Vec<&'a str>,
}

impl LabelLine<'_> {
    /// Render the line with a (possibly different) class token.
    pub fn render_with(&self, class_id: &str) -> String {
        let mut out = String::from(class_id);
        for token in &self.params {
            out.push(' ');
            out.push_str(token);
        }
        out
    }
}

/// Parse a label line.
///
/// Returns `None` for lines with no whitespace-separated tokens. Those lines
/// carry no annotation and are skipped by every consumer.
pub fn parse_label_line(line: &str) -> Option<LabelLine<'_>> {
    let mut tokens = line.split_whitespace();
    let class_id = tokens.next()?;
    Some(LabelLine {
        class_id,
        params: tokens.collect(),
    })
}

/// Returns true if label text holds no annotation at all.
pub fn is_null_label(text: &str) -> bool {
    text.trim().is_empty()
}

/// Fuzz-only entrypoint for label line parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> usize {
    input
        .lines()
        .filter_map(parse_label_line)
        .map(|line| line.render_with(line.class_id).len())
        .sum()
}
