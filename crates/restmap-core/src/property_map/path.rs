//! Key-path parser
//!
//! A key path is a dot-separated list of segments. Each segment is a plain
//! name (`Account`) or a name followed by a bracketed list index
//! (`list[2]`). An empty index (`list[]`) is the append marker.
//!
//! ```text
//! path    := segment ( '.' segment )*
//! segment := name ( '[' index? ']' )?
//! name    := any characters except '.', '[' and ']' (non-empty)
//! index   := digit+
//! ```

use crate::error::{Error, Result};
use std::fmt;

/// Index part of a bracketed segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListIndex {
    /// `name[n]`
    At(usize),
    /// `name[]`: append on write, first element on read
    Append,
}

impl ListIndex {
    /// Position used when reading through this index
    pub fn read_position(self) -> usize {
        match self {
            ListIndex::At(n) => n,
            ListIndex::Append => 0,
        }
    }
}

/// A single segment of a key path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    name: String,
    index: Option<ListIndex>,
}

impl Segment {
    /// Plain name segment
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    /// Bracketed segment
    pub fn indexed(name: impl Into<String>, index: ListIndex) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> Option<ListIndex> {
        self.index
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            None => write!(f, "{}", self.name),
            Some(ListIndex::At(n)) => write!(f, "{}[{}]", self.name, n),
            Some(ListIndex::Append) => write!(f, "{}[]", self.name),
        }
    }
}

/// A parsed key path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<Segment>,
}

impl KeyPath {
    /// Parse a key path such as `"Account.Listed"` or `"list[2].field"`
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(Error::invalid_key_path(input, "empty key path"));
        }

        let segments = input
            .split('.')
            .enumerate()
            .map(|(position, raw)| parse_segment(input, position, raw))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Split into the intermediate segments and the final one
    pub fn split_last(&self) -> (&[Segment], &Segment) {
        // parse() never produces an empty segment list
        let (last, rest) = self
            .segments
            .split_last()
            .unwrap_or_else(|| unreachable!("key path without segments"));
        (rest, last)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for KeyPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_segment(path: &str, position: usize, raw: &str) -> Result<Segment> {
    if raw.is_empty() {
        return Err(Error::invalid_key_path(
            path,
            format!("segment {} is empty", position + 1),
        ));
    }

    let Some(open) = raw.find('[') else {
        if raw.contains(']') {
            return Err(Error::invalid_key_path(
                path,
                format!("unbalanced ']' in segment '{}'", raw),
            ));
        }
        return Ok(Segment::plain(raw));
    };

    let name = &raw[..open];
    if name.is_empty() {
        return Err(Error::invalid_key_path(
            path,
            format!("segment '{}' has an index but no name", raw),
        ));
    }
    if name.contains(']') {
        return Err(Error::invalid_key_path(
            path,
            format!("unbalanced ']' in segment '{}'", raw),
        ));
    }

    let Some(inner) = raw[open + 1..].strip_suffix(']') else {
        return Err(Error::invalid_key_path(
            path,
            format!("segment '{}' must end with ']'", raw),
        ));
    };

    if inner.is_empty() {
        return Ok(Segment::indexed(name, ListIndex::Append));
    }

    if !inner.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_key_path(
            path,
            format!("index '{}' in segment '{}' is not a number", inner, raw),
        ));
    }

    let index = inner.parse::<usize>().map_err(|_| {
        Error::invalid_key_path(path, format!("index '{}' is out of range", inner))
    })?;

    Ok(Segment::indexed(name, ListIndex::At(index)))
}
