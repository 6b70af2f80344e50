//! Path element and path types.

use super::parser::{self, PathError, DEFAULT_SEPARATOR, RESERVED_SEPARATORS};
use std::fmt;

/// PathElement represents one level of path navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    /// Key of a mapping entry.
    Field(String),
    /// Position in a sequence. Negative values count from the end.
    Index(i64),
}

impl PathElement {
    /// Creates a new field path element.
    pub fn field(name: impl Into<String>) -> Self {
        PathElement::Field(name.into())
    }

    /// Creates a new index path element.
    pub fn index(i: i64) -> Self {
        PathElement::Index(i)
    }

    /// Returns true if this is a field element.
    pub fn is_field(&self) -> bool {
        matches!(self, PathElement::Field(_))
    }

    /// Returns true if this is an index element.
    pub fn is_index(&self) -> bool {
        matches!(self, PathElement::Index(_))
    }

    /// Returns the field name if this is a field element.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            PathElement::Field(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the raw index if this is an index element.
    pub fn as_index(&self) -> Option<i64> {
        match self {
            PathElement::Index(i) => Some(*i),
            _ => None,
        }
    }
}

/// Maps a possibly negative index onto a sequence of `len` elements.
///
/// Returns `None` when the index falls outside the sequence; sequences are
/// never extended by indexing.
pub fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { len + index } else { index };
    if (0..len).contains(&resolved) {
        usize::try_from(resolved).ok()
    } else {
        None
    }
}

/// Path represents an ordered list of steps into a nested document.
/// The empty path addresses the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    elements: Vec<PathElement>,
}

impl Path {
    /// Creates a new empty path.
    pub fn new() -> Self {
        Path {
            elements: Vec::new(),
        }
    }

    /// Creates a path from a vector of elements.
    pub fn from_elements(elements: Vec<PathElement>) -> Self {
        Path { elements }
    }

    /// Parses a path expression such as `spec.ports[0].name`.
    pub fn parse(key: &str, separator: char) -> Result<Self, PathError> {
        parser::parse(key, separator)
    }

    /// Returns the number of elements in the path.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns an iterator over the path elements.
    pub fn iter(&self) -> impl Iterator<Item = &PathElement> {
        self.elements.iter()
    }

    /// Appends a path element.
    pub fn push(&mut self, element: PathElement) {
        self.elements.push(element);
    }

    /// Returns the last path element.
    pub fn last(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    /// Splits the path into its terminal element and the parent steps.
    pub fn split_last(&self) -> Option<(&PathElement, &[PathElement])> {
        self.elements.split_last()
    }

    /// Creates a new path with the given element appended.
    pub fn with(&self, element: PathElement) -> Self {
        let mut new_path = self.clone();
        new_path.push(element);
        new_path
    }

    /// Returns a slice of the path elements.
    pub fn as_slice(&self) -> &[PathElement] {
        &self.elements
    }

    /// Renders the path back into expression form using `separator`,
    /// escaping reserved characters inside field names.
    pub fn to_key(&self, separator: char) -> String {
        let mut out = String::new();
        for (i, element) in self.elements.iter().enumerate() {
            match element {
                PathElement::Field(name) => {
                    if i > 0 {
                        out.push(separator);
                    }
                    for c in name.chars() {
                        if RESERVED_SEPARATORS.contains(&c) {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                }
                PathElement::Index(idx) => {
                    out.push_str(&format!("[{}]", idx));
                }
            }
        }
        out
    }
}

impl FromIterator<PathElement> for Path {
    fn from_iter<T: IntoIterator<Item = PathElement>>(iter: T) -> Self {
        Path {
            elements: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Path {
    type Item = PathElement;
    type IntoIter = std::vec::IntoIter<PathElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathElement;
    type IntoIter = std::slice::Iter<'a, PathElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Field(name) => write!(f, "{}", name),
            PathElement::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key(DEFAULT_SEPARATOR))
    }
}
