//! Path addressing into configuration trees.
//!
//! Paths use dot notation for mapping keys and bracket notation for
//! sequence indexes, e.g. `api.hosts[0].port`. A bracket may also hold a
//! quoted key (`labels["app.kubernetes.io/name"]`) so keys containing dots
//! stay addressable.

use crate::error::PathError;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Most null elements a single write may append to a sequence.
pub const MAX_PADDING: usize = 1024;

/// One step of a [`ConfigPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Mapping key.
    Key(String),
    /// Sequence index, written `[n]`.
    Index(usize),
}

impl Segment {
    /// Index this segment addresses when applied to a sequence.
    ///
    /// Digit-only keys index sequences too, so `hosts.0` and `hosts[0]`
    /// read the same element.
    fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => Some(*i),
            Segment::Key(k) if !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()) => {
                k.parse().ok()
            }
            Segment::Key(_) => None,
        }
    }

    /// Key this segment addresses when applied to a mapping.
    fn as_key(&self) -> String {
        match self {
            Segment::Key(k) => k.clone(),
            Segment::Index(i) => i.to_string(),
        }
    }

    /// Empty container implied by this segment's syntax.
    fn empty_container(&self) -> Value {
        match self {
            Segment::Index(_) => Value::Array(Vec::new()),
            Segment::Key(_) => Value::Object(Map::new()),
        }
    }
}

/// A parsed configuration path.
///
/// Parsing never fails: unterminated brackets are read as literal key text,
/// the way loose path strings are usually forgiven by config accessors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ConfigPath {
    segments: Vec<Segment>,
}

impl ConfigPath {
    /// Parse a path string such as `a.b[0].c`.
    pub fn parse(input: &str) -> Self {
        let mut segments = Vec::new();
        let mut key = String::new();
        // True once the current segment has produced something, so `a..b`
        // keeps an empty key between the dots but `a[0].b` does not.
        let mut pending = false;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if pending || !key.is_empty() || segments.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    pending = true;
                }
                '[' => {
                    let mut inner = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        inner.push(c);
                    }
                    if !closed {
                        key.push('[');
                        key.push_str(&inner);
                        continue;
                    }
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    segments.push(bracket_segment(&inner));
                    pending = false;
                }
                c => {
                    key.push(c);
                    pending = true;
                }
            }
        }

        if pending || !key.is_empty() || (segments.is_empty() && !input.is_empty()) {
            segments.push(Segment::Key(key));
        }

        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resolve this path against `tree`.
    pub fn get<'a>(&self, tree: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(tree, |node, segment| step(node, segment))
    }

    /// Assign `value` at this path, or remove the entry when `value` is null.
    pub fn set(&self, tree: &mut Value, value: Value) -> Result<(), PathError> {
        if value.is_null() {
            self.unset(tree);
            Ok(())
        } else {
            self.assign(tree, value)
        }
    }

    /// Assign `value` at this path, creating intermediate containers.
    ///
    /// Unlike [`ConfigPath::set`], a null value is stored rather than
    /// treated as a removal. The empty path is rejected, as is an index more
    /// than [`MAX_PADDING`] past the end of a sequence. On error `tree` may
    /// already hold the intermediate containers created along the way.
    pub fn assign(&self, tree: &mut Value, value: Value) -> Result<(), PathError> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Err(PathError::Root);
        };

        let mut node = tree;
        for (i, segment) in parents.iter().enumerate() {
            let next = &self.segments[i + 1];
            node = child_or_insert(node, segment, next)?;
        }
        *slot(node, last)? = value;
        Ok(())
    }

    /// Remove the entry at this path, returning it.
    ///
    /// Only the leaf is removed; siblings stay in place. Removing a sequence
    /// element shifts the following elements down by one.
    pub fn unset(&self, tree: &mut Value) -> Option<Value> {
        let (last, parents) = self.segments.split_last()?;

        let mut node = tree;
        for segment in parents {
            node = step_mut(node, segment)?;
        }

        match node {
            Value::Object(map) => map.shift_remove(&last.as_key()),
            Value::Array(items) => {
                let index = last.as_index()?;
                (index < items.len()).then(|| items.remove(index))
            }
            _ => None,
        }
    }
}

fn bracket_segment(inner: &str) -> Segment {
    let trimmed = inner.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return Segment::Key(trimmed[1..trimmed.len() - 1].to_string());
        }
    }
    match trimmed.parse::<usize>() {
        Ok(index) => Segment::Index(index),
        Err(_) => Segment::Key(inner.to_string()),
    }
}

fn step<'a>(node: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(&segment.as_key()),
        Value::Array(items) => items.get(segment.as_index()?),
        _ => None,
    }
}

fn step_mut<'a>(node: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(&segment.as_key()),
        Value::Array(items) => items.get_mut(segment.as_index()?),
        _ => None,
    }
}

/// Child at `segment`, creating it as the container `next` implies when it
/// is missing or is a scalar.
fn child_or_insert<'a>(
    node: &'a mut Value,
    segment: &Segment,
    next: &Segment,
) -> Result<&'a mut Value, PathError> {
    let child = slot(node, segment)?;
    if !child.is_object() && !child.is_array() {
        *child = next.empty_container();
    }
    Ok(child)
}

/// Mutable slot for `segment` inside `node`.
///
/// A scalar (or a sequence addressed by a non-numeric key) is replaced by
/// the container the segment implies. Writing past the end of a sequence
/// pads it with nulls, up to [`MAX_PADDING`] of them.
fn slot<'a>(node: &'a mut Value, segment: &Segment) -> Result<&'a mut Value, PathError> {
    let fits = match node {
        Value::Object(_) => true,
        Value::Array(_) => segment.as_index().is_some(),
        _ => false,
    };
    if !fits {
        *node = segment.empty_container();
    }

    match node {
        Value::Array(items) => {
            let index = segment.as_index().unwrap_or_default();
            if index >= items.len() {
                if index - items.len() > MAX_PADDING {
                    return Err(PathError::IndexTooFar {
                        index,
                        len: items.len(),
                    });
                }
                items.resize(index + 1, Value::Null);
            }
            Ok(&mut items[index])
        }
        Value::Object(map) => Ok(map.entry(segment.as_key()).or_insert(Value::Null)),
        _ => unreachable!("slot container was just normalized"),
    }
}

impl FromStr for ConfigPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for ConfigPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<&String> for ConfigPath {
    fn from(s: &String) -> Self {
        Self::parse(s)
    }
}

impl From<String> for ConfigPath {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Vec<Segment>> for ConfigPath {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Index(index) => write!(f, "[{}]", index)?,
                Segment::Key(key) if key.contains(['.', '[', ']']) => write!(f, "[{:?}]", key)?,
                Segment::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
            }
        }
        Ok(())
    }
}

/// Read the value at `path`.
pub fn get<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    ConfigPath::parse(path).get(tree)
}

/// Write `value` at `path`; a null value removes the entry.
pub fn set(tree: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
    ConfigPath::parse(path).set(tree, value)
}

/// Remove the entry at `path`.
pub fn unset(tree: &mut Value, path: &str) -> Option<Value> {
    ConfigPath::parse(path).unset(tree)
}
