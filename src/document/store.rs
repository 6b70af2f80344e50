//! Yedit: a document plus an optional backing file, edited by path.

use std::fmt;
use std::fs;
use std::path::{Path as FsPath, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{Result, YeditError};
use super::navigate::{add_path, get_entry, get_path, get_path_mut, remove_entry};
use crate::fieldpath::{resolve_index, Path, DEFAULT_SEPARATOR, RESERVED_SEPARATORS};
use crate::value::{self, Map, Value};

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Yaml,
    Json,
}

impl ContentType {
    /// Parses `text` into a document.
    pub fn parse(self, text: &str) -> Result<Value> {
        match self {
            ContentType::Yaml => {
                value::from_yaml(text).map_err(|e| YeditError::document_parse(self, e.to_string()))
            }
            ContentType::Json => {
                value::from_json(text).map_err(|e| YeditError::document_parse(self, e.to_string()))
            }
        }
    }

    /// Renders a document, block style for YAML and indented for JSON.
    pub fn render(self, document: &Value) -> Result<String> {
        match self {
            ContentType::Yaml => value::to_yaml(document).map_err(|e| {
                YeditError::invalid_value(format!("failed to serialize yaml: {}", e))
            }),
            ContentType::Json => value::to_json_pretty(document)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| YeditError::invalid_value(format!("failed to serialize json: {}", e))),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Yaml => write!(f, "yaml"),
            ContentType::Json => write!(f, "json"),
        }
    }
}

/// Outcome of an editing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Changed,
    Unchanged,
}

impl Edit {
    /// Returns true if the document was modified.
    pub fn is_changed(self) -> bool {
        self == Edit::Changed
    }
}

impl From<bool> for Edit {
    fn from(changed: bool) -> Self {
        if changed {
            Edit::Changed
        } else {
            Edit::Unchanged
        }
    }
}

/// In-memory content supplied instead of (or in addition to) a backing file.
#[derive(Debug, Clone)]
pub enum Content {
    /// Serialized text, parsed with the configured content type.
    Text(String),
    /// An already parsed document.
    Document(Value),
}

/// YeditBuilder configures and loads a [`Yedit`].
#[derive(Debug, Default)]
pub struct YeditBuilder {
    filename: Option<PathBuf>,
    content: Option<Content>,
    content_type: ContentType,
    separator: Option<char>,
    backup: bool,
}

impl YeditBuilder {
    /// Creates a new YeditBuilder.
    pub fn new() -> Self {
        YeditBuilder::default()
    }

    /// Sets the backing file.
    pub fn filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Supplies content that takes precedence over the backing file.
    pub fn content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    /// Sets the format used to parse and write the document.
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Sets the path separator.
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Keeps a `<file>.orig` copy of the previous file on write.
    pub fn backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Builds the store and loads its document. A missing or empty document
    /// starts out as an empty mapping.
    pub fn build(self) -> Result<Yedit> {
        let separator = self.separator.unwrap_or(DEFAULT_SEPARATOR);
        if !RESERVED_SEPARATORS.contains(&separator) {
            return Err(YeditError::invalid_path(
                "",
                format!("unsupported separator {:?}", separator),
            ));
        }

        let mut yedit = Yedit {
            filename: self.filename,
            content: self.content,
            content_type: self.content_type,
            separator,
            backup: self.backup,
            document: Value::Null,
        };
        yedit.load(yedit.content_type)?;
        if yedit.document.is_null() {
            yedit.document = Value::Map(Map::new());
        }
        Ok(yedit)
    }
}

/// Yedit owns a document and applies path-addressed edits to it.
///
/// Edits that can fail halfway are applied to a clone which replaces the
/// held document only on success.
#[derive(Debug, Clone)]
pub struct Yedit {
    filename: Option<PathBuf>,
    content: Option<Content>,
    content_type: ContentType,
    separator: char,
    backup: bool,
    document: Value,
}

impl Yedit {
    /// Creates a new YeditBuilder.
    pub fn builder() -> YeditBuilder {
        YeditBuilder::new()
    }

    /// Wraps an in-memory document with the default separator and no file.
    pub fn from_document(document: Value) -> Self {
        let document = if document.is_null() {
            Value::Map(Map::new())
        } else {
            document
        };
        Yedit {
            filename: None,
            content: None,
            content_type: ContentType::Yaml,
            separator: DEFAULT_SEPARATOR,
            backup: false,
            document,
        }
    }

    /// Returns the held document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Replaces the held document.
    pub fn set_document(&mut self, document: Value) {
        self.document = document;
    }

    /// Consumes the store, returning its document.
    pub fn into_document(self) -> Value {
        self.document
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn filename(&self) -> Option<&FsPath> {
        self.filename.as_deref()
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Returns whether the backing file exists on disk.
    pub fn file_exists(&self) -> bool {
        self.filename.as_ref().is_some_and(|f| f.exists())
    }

    /// Reads the backing file, if configured and present.
    pub fn read(&self) -> Result<Option<String>> {
        match &self.filename {
            Some(filename) if filename.exists() => fs::read_to_string(filename)
                .map(Some)
                .map_err(|e| YeditError::io(filename, e)),
            _ => Ok(None),
        }
    }

    /// Loads the document from the supplied content, falling back to the
    /// backing file. Leaves the held document untouched and returns `None`
    /// when neither has anything to offer.
    pub fn load(&mut self, content_type: ContentType) -> Result<Option<&Value>> {
        let contents = match &self.content {
            Some(Content::Document(document)) => {
                self.document = document.clone();
                return Ok(Some(&self.document));
            }
            Some(Content::Text(text)) if !text.is_empty() => Some(text.clone()),
            _ => self.read()?,
        };

        let Some(contents) = contents.filter(|c| !c.trim().is_empty()) else {
            return Ok(None);
        };

        self.document = content_type.parse(&contents)?;
        Ok(Some(&self.document))
    }

    /// Returns the value at `key`. Malformed keys, misses and explicit nulls
    /// all read as `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        get_entry(&self.document, key, self.separator).filter(|v| !v.is_null())
    }

    /// Sets `key` to `value`, creating intermediate mappings.
    ///
    /// Returns `Unchanged` when the value is already present or when the
    /// path does not fit the document shape.
    pub fn put(&mut self, key: &str, value: Value) -> Result<Edit> {
        let path = Path::parse(key, self.separator)?;
        let current_matches = match get_path(&self.document, &path) {
            Some(current) => *current == value,
            None => value.is_null(),
        };
        if current_matches {
            return Ok(Edit::Unchanged);
        }
        Ok(self.commit(key, &path, value))
    }

    /// Like [`Yedit::put`], but only while the backing file does not exist yet.
    pub fn create(&mut self, key: &str, value: Value) -> Result<Edit> {
        if self.file_exists() {
            return Ok(Edit::Unchanged);
        }
        let path = Path::parse(key, self.separator)?;
        Ok(self.commit(key, &path, value))
    }

    fn commit(&mut self, key: &str, path: &Path, value: Value) -> Edit {
        let mut candidate = self.document.clone();
        match add_path(&mut candidate, path, value) {
            Ok(()) => {
                self.document = candidate;
                debug!(key, "document updated");
                Edit::Changed
            }
            Err(reason) => {
                debug!(key, %reason, "edit does not fit document shape");
                Edit::Unchanged
            }
        }
    }

    /// Appends `value` to the list at `key`, creating the list if absent.
    pub fn append(&mut self, key: &str, value: Value) -> Result<Edit> {
        if self.get(key).is_none() {
            self.put(key, Value::List(Vec::new()))?;
        }
        let path = Path::parse(key, self.separator)?;
        match get_path_mut(&mut self.document, path.as_slice()) {
            Some(Value::List(list)) => {
                list.push(value);
                Ok(Edit::Changed)
            }
            _ => Ok(Edit::Unchanged),
        }
    }

    /// Updates the container at `key`.
    ///
    /// A mapping is merged with `value`, which must itself be a mapping. In a
    /// list the slot holding `curr_value` (or else `index`) is overwritten
    /// when it differs from `value`; otherwise `value` is appended unless the
    /// list already contains it.
    pub fn update(
        &mut self,
        key: &str,
        value: Value,
        index: Option<i64>,
        curr_value: Option<&Value>,
    ) -> Result<Edit> {
        let path = Path::parse(key, self.separator)?;
        let Some(entry) = get_path_mut(&mut self.document, path.as_slice()) else {
            return Ok(Edit::Unchanged);
        };

        match entry {
            Value::Map(map) => {
                let Value::Map(incoming) = &value else {
                    return Err(YeditError::type_mismatch(key, "map", value.type_name()));
                };
                map.merge(incoming);
                Ok(Edit::Changed)
            }
            Value::List(list) => {
                let slot = match curr_value.filter(|v| v.is_truthy()) {
                    Some(current) => match list.iter().position(|v| v == current) {
                        Some(pos) => Some(pos),
                        None => return Ok(Edit::Unchanged),
                    },
                    None => index.and_then(|i| resolve_index(i, list.len())),
                };

                if let Some(idx) = slot {
                    if list[idx] != value {
                        list[idx] = value;
                        return Ok(Edit::Changed);
                    }
                }

                if list.contains(&value) {
                    Ok(Edit::Unchanged)
                } else {
                    list.push(value);
                    Ok(Edit::Changed)
                }
            }
            _ => Ok(Edit::Unchanged),
        }
    }

    /// Removes `key_or_item` from the container at `key`: a mapping key, or
    /// the first equal element of a list.
    pub fn pop(&mut self, key: &str, key_or_item: &Value) -> Edit {
        let Ok(path) = Path::parse(key, self.separator) else {
            return Edit::Unchanged;
        };
        match get_path_mut(&mut self.document, path.as_slice()) {
            Some(Value::Map(map)) => match key_or_item {
                Value::String(k) => map.delete(k).is_some().into(),
                _ => Edit::Unchanged,
            },
            Some(Value::List(list)) => match list.iter().position(|v| v == key_or_item) {
                Some(pos) => {
                    list.remove(pos);
                    Edit::Changed
                }
                None => Edit::Unchanged,
            },
            _ => Edit::Unchanged,
        }
    }

    /// Removes the node at `key`. The empty path clears the document, which
    /// is a no-op once it is an empty mapping.
    pub fn delete(&mut self, key: &str) -> Edit {
        match self.get(key) {
            None => return Edit::Unchanged,
            Some(Value::Map(map)) if key.is_empty() && map.is_empty() => return Edit::Unchanged,
            Some(_) => {}
        }
        remove_entry(&mut self.document, key, self.separator).into()
    }

    /// Checks whether `value` is present at `key`.
    ///
    /// Lists test membership, mappings require every entry of a mapping
    /// `value` to match (an empty mapping matches anything), scalars compare
    /// for equality. A scalar probed against a mapping never matches.
    pub fn exists(&self, key: &str, value: &Value) -> bool {
        match self.get(key) {
            Some(Value::List(list)) => list.contains(value),
            Some(Value::Map(entry)) => match value {
                Value::Map(wanted) => wanted.iter().all(|(k, v)| entry.get(k) == Some(v)),
                _ => false,
            },
            Some(scalar) => scalar == value,
            None => false,
        }
    }

    /// Writes the document to the backing file through a `<file>.yedit`
    /// temporary that is renamed into place, keeping `<file>.orig` first when
    /// backups are enabled.
    pub fn write(&self) -> Result<&Value> {
        let filename = self.filename.as_ref().ok_or(YeditError::MissingFilename)?;

        if self.backup && self.file_exists() {
            let backup = with_suffix(filename, ".orig");
            fs::copy(filename, &backup).map_err(|e| YeditError::io(&backup, e))?;
        }

        let rendered = self.content_type.render(&self.document)?;
        let tmp = with_suffix(filename, ".yedit");
        fs::write(&tmp, rendered).map_err(|e| YeditError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, filename) {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                warn!(file = %tmp.display(), error = %cleanup, "failed to remove temporary file");
            }
            return Err(YeditError::io(filename, e));
        }

        debug!(file = %filename.display(), "document written");
        Ok(&self.document)
    }
}

fn with_suffix(path: &FsPath, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::from_yaml;
    use pretty_assertions::assert_eq;

    fn store(yaml: &str) -> Yedit {
        Yedit::from_document(from_yaml(yaml).unwrap())
    }

    #[test]
    fn test_get_treats_null_as_missing() {
        let y = store("a: null\nb: 1\n");
        assert_eq!(y.get("a"), None);
        assert_eq!(y.get("b"), Some(&Value::Int(1)));
        assert_eq!(y.get("not valid"), None);
    }

    #[test]
    fn test_put_is_idempotent() {
        let mut y = store("{}");
        assert_eq!(y.put("spec.host", "a.example.com".into()).unwrap(), Edit::Changed);
        let after_first = y.document().clone();
        assert_eq!(y.put("spec.host", "a.example.com".into()).unwrap(), Edit::Unchanged);
        assert_eq!(y.document(), &after_first);
    }

    #[test]
    fn test_put_shape_failure_leaves_document_intact() {
        let mut y = store("a:\n  b: [1]\n");
        let before = y.document().clone();
        assert_eq!(y.put("a.b[3]", Value::Int(9)).unwrap(), Edit::Unchanged);
        assert_eq!(y.put("a.b.c", Value::Int(9)).unwrap(), Edit::Unchanged);
        assert_eq!(y.document(), &before);
    }

    #[test]
    fn test_put_invalid_path_is_error() {
        let mut y = store("{}");
        assert!(matches!(
            y.put("a..b", Value::Int(1)),
            Err(YeditError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_append_materializes_list() {
        let mut y = store("spec: {}\n");
        assert_eq!(y.append("spec.items", "x".into()).unwrap(), Edit::Changed);
        assert_eq!(y.get("spec.items"), Some(&from_yaml("[x]").unwrap()));
        assert_eq!(y.append("spec.items", "y".into()).unwrap(), Edit::Changed);
        assert_eq!(y.get("spec.items"), Some(&from_yaml("[x, y]").unwrap()));
    }

    #[test]
    fn test_append_to_non_list_fails() {
        let mut y = store("spec:\n  items: text\n");
        assert_eq!(y.append("spec.items", "x".into()).unwrap(), Edit::Unchanged);
    }

    #[test]
    fn test_update_list_by_index() {
        let mut y = store("entry: [a, b]\n");
        assert_eq!(y.update("entry", "b".into(), Some(0), None).unwrap(), Edit::Changed);
        assert_eq!(y.get("entry"), Some(&from_yaml("[b, b]").unwrap()));
        assert_eq!(y.update("entry", "b".into(), Some(0), None).unwrap(), Edit::Unchanged);
    }

    #[test]
    fn test_update_list_by_current_value() {
        let mut y = store("entry: [a, b, c]\n");
        let current = Value::from("b");
        assert_eq!(
            y.update("entry", "z".into(), None, Some(&current)).unwrap(),
            Edit::Changed
        );
        assert_eq!(y.get("entry"), Some(&from_yaml("[a, z, c]").unwrap()));

        let missing = Value::from("q");
        assert_eq!(
            y.update("entry", "w".into(), None, Some(&missing)).unwrap(),
            Edit::Unchanged
        );
    }

    #[test]
    fn test_update_list_appends_new_value() {
        let mut y = store("entry: [a]\n");
        assert_eq!(y.update("entry", "b".into(), None, None).unwrap(), Edit::Changed);
        assert_eq!(y.update("entry", "b".into(), None, None).unwrap(), Edit::Unchanged);
        assert_eq!(y.update("entry", "c".into(), Some(7), None).unwrap(), Edit::Changed);
        assert_eq!(y.get("entry"), Some(&from_yaml("[a, b, c]").unwrap()));
    }

    #[test]
    fn test_update_map_merges() {
        let mut y = store("labels:\n  app: web\n");
        let incoming = from_yaml("tier: front\napp: api\n").unwrap();
        assert_eq!(y.update("labels", incoming, None, None).unwrap(), Edit::Changed);
        assert_eq!(y.get("labels"), Some(&from_yaml("app: api\ntier: front\n").unwrap()));

        let err = y.update("labels", "scalar".into(), None, None).unwrap_err();
        assert!(matches!(err, YeditError::TypeMismatch { .. }));
    }

    #[test]
    fn test_pop() {
        let mut y = store("labels:\n  app: web\nitems: [a, b, a]\n");
        assert_eq!(y.pop("labels", &"app".into()), Edit::Changed);
        assert_eq!(y.pop("labels", &"app".into()), Edit::Unchanged);
        assert_eq!(y.pop("items", &"a".into()), Edit::Changed);
        assert_eq!(y.get("items"), Some(&from_yaml("[b, a]").unwrap()));
        assert_eq!(y.pop("missing", &"a".into()), Edit::Unchanged);
    }

    #[test]
    fn test_delete() {
        let mut y = store("a:\n  b: 1\n");
        assert_eq!(y.delete("a.b"), Edit::Changed);
        assert_eq!(y.delete("a.b"), Edit::Unchanged);
    }

    #[test]
    fn test_exists() {
        let y = store("items: [a, b]\nlabels:\n  app: web\n  tier: front\nhost: x\n");
        assert!(y.exists("items", &"a".into()));
        assert!(!y.exists("items", &"c".into()));
        assert!(y.exists("labels", &from_yaml("app: web").unwrap()));
        assert!(!y.exists("labels", &from_yaml("app: api").unwrap()));
        assert!(!y.exists("labels", &from_yaml("other: web").unwrap()));
        assert!(y.exists("labels", &Value::Map(Map::new())));
        assert!(!y.exists("labels", &"app".into()));
        assert!(y.exists("host", &"x".into()));
        assert!(!y.exists("nothing", &"x".into()));
    }

    #[test]
    fn test_write_without_filename() {
        let y = store("a: 1\n");
        assert!(matches!(y.write(), Err(YeditError::MissingFilename)));
    }

    #[test]
    fn test_builder_rejects_unknown_separator() {
        assert!(Yedit::builder().separator('/').build().is_err());
    }
}
