//! Dotted paths into tree values, parsed once and cached process-wide.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        OnceLock,
    },
};

use crate::{
    dynamic::Dynamic,
    error::Error,
    ops::Ops,
};

/// One step of a [`Path`].
///
/// Integer segments are context-sensitive: they index when the current
/// value is a list and act as field names otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A field name.
    Name(String),
    /// A list index (or a numeric field name in map context).
    Index(usize),
}

/// A parsed dot-separated path. The empty path addresses the value itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    raw: String,
    segments: Arc<[Segment]>,
}

static CACHE: OnceLock<Mutex<HashMap<String, Path>>> = OnceLock::new();

impl Path {
    /// Parses a path, consulting the process-wide cache first.
    ///
    /// # Errors
    /// - [`Error::PathParse`] on empty segments or unrepresentable
    ///   indices.
    pub fn parse(path: &str) -> Result<Self, Error> {
        let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));

        if let Ok(cache) = cache.lock() {
            if let Some(hit) = cache.get(path) {
                return Ok(hit.clone());
            }
        }

        let parsed = Self::parse_uncached(path)?;

        if let Ok(mut cache) = cache.lock() {
            cache.insert(path.to_owned(), parsed.clone());
        }

        Ok(parsed)
    }

    fn parse_uncached(path: &str) -> Result<Self, Error> {
        let mut segments = Vec::new();

        if !path.is_empty() {
            let mut start = 0;
            let mut current = String::new();

            for (position, c) in path.char_indices() {
                if c == '.' {
                    segments.push(Self::segment(path, start, &current)?);
                    current.clear();
                    start = position + 1;
                } else {
                    current.push(c);
                }
            }

            segments.push(Self::segment(path, start, &current)?);
        }

        Ok(Self {
            raw: path.to_owned(),
            segments: segments.into(),
        })
    }

    fn segment(path: &str, position: usize, text: &str) -> Result<Segment, Error> {
        if text.is_empty() {
            return Err(Error::PathParse {
                path: path.to_owned(),
                position,
                message: "empty segment".to_owned(),
            });
        }

        if text.bytes().all(|b| b.is_ascii_digit()) {
            return text.parse().map(Segment::Index).map_err(|_| Error::PathParse {
                path: path.to_owned(),
                position,
                message: format!("index `{text}` out of range"),
            });
        }

        Ok(Segment::Name(text.to_owned()))
    }

    /// The path text as given.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns `true` for the empty path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resolves the value at this path, if every segment matches.
    pub fn get_in<O: Ops>(&self, input: &Dynamic<O>) -> Option<Dynamic<O>> {
        let mut current = input.clone();
        for segment in self.segments.iter() {
            current = step(segment, &current)?;
        }
        Some(current)
    }

    /// Applies `f` to the value at this path, rebuilding the spine. A path
    /// miss returns the input unchanged.
    pub fn update_in<O: Ops>(
        &self,
        input: &Dynamic<O>,
        f: impl FnOnce(Dynamic<O>) -> Dynamic<O>,
    ) -> Dynamic<O> {
        update_segments(&self.segments, input, f)
    }

    /// Writes `value` at this path, creating missing intermediate maps.
    /// List indices must already exist; a missing index is a no-op.
    pub fn set_in<O: Ops>(&self, input: &Dynamic<O>, value: Dynamic<O>) -> Dynamic<O> {
        set_segments(&self.segments, input, value)
    }

    /// Splits off the final segment, rendered as a field name. Returns
    /// `None` for the empty path.
    pub(crate) fn split_last(&self) -> Option<(Self, String)> {
        let (last, rest) = self.segments.split_last()?;
        let name = match last {
            Segment::Name(name) => name.clone(),
            Segment::Index(index) => index.to_string(),
        };
        let raw = self
            .raw
            .rsplit_once('.')
            .map_or(String::new(), |(prefix, _)| prefix.to_owned());
        Some((
            Self {
                raw,
                segments: rest.to_vec().into(),
            },
            name,
        ))
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn step<O: Ops>(segment: &Segment, current: &Dynamic<O>) -> Option<Dynamic<O>> {
    match segment {
        Segment::Index(index) if current.is_list() => current
            .as_list()
            .value()
            .and_then(|items| items.into_iter().nth(*index)),
        Segment::Index(index) => current.try_get(&index.to_string()),
        Segment::Name(name) => current.try_get(name),
    }
}

fn write_back<O: Ops>(segment: &Segment, input: &Dynamic<O>, rebuilt: Dynamic<O>) -> Dynamic<O> {
    match segment {
        Segment::Index(index) if input.is_list() => match input.as_list().value() {
            Some(mut items) => {
                items[*index] = rebuilt;
                input.create_list(items)
            }
            None => input.clone(),
        },
        Segment::Index(index) => input.set(&index.to_string(), rebuilt),
        Segment::Name(name) => input.set(name, rebuilt),
    }
}

fn update_segments<O: Ops>(
    segments: &[Segment],
    input: &Dynamic<O>,
    f: impl FnOnce(Dynamic<O>) -> Dynamic<O>,
) -> Dynamic<O> {
    let Some((head, tail)) = segments.split_first() else {
        return f(input.clone());
    };

    let Some(child) = step(head, input) else {
        return input.clone();
    };

    let rebuilt = update_segments(tail, &child, f);
    write_back(head, input, rebuilt)
}

fn set_segments<O: Ops>(
    segments: &[Segment],
    input: &Dynamic<O>,
    value: Dynamic<O>,
) -> Dynamic<O> {
    let Some((head, tail)) = segments.split_first() else {
        return value;
    };

    if input.is_list() {
        let Segment::Index(index) = head else {
            return input.clone();
        };
        return match input.as_list().value() {
            Some(mut items) if *index < items.len() => {
                items[*index] = set_segments(tail, &items[*index].clone(), value);
                input.create_list(items)
            }
            _ => input.clone(),
        };
    }

    let name = match head {
        Segment::Name(name) => name.clone(),
        Segment::Index(index) => index.to_string(),
    };
    let child = input
        .try_get(&name)
        .unwrap_or_else(|| Dynamic::empty_map(input.ops()));
    input.set(&name, set_segments(tail, &child, value))
}
