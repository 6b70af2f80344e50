//! Edit driver: path-addressed changes to a YAML/JSON file or inline content.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use super::result::ModuleResult;
use super::state::DesiredState;
use crate::document::{decode_value, parse_value, ContentType, Edit, Result, ValueFormat, Yedit, YeditError};
use crate::fieldpath::DEFAULT_SEPARATOR;
use crate::value::{Map, Value};

/// Parameters of the edit module.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditParams {
    /// Backing file.
    pub src: Option<PathBuf>,
    pub backup: bool,
    pub separator: char,
    pub state: DesiredState,
    /// Whole-document content; text is parsed with `content_type`.
    pub content: Option<Value>,
    pub content_type: ContentType,
    pub key: String,
    pub value: Option<Value>,
    /// `str` keeps `value` as text, `bool` requires a boolean spelling.
    pub value_type: String,
    pub update: bool,
    pub append: bool,
    pub index: Option<i64>,
    pub curr_value: Option<String>,
    pub curr_value_format: ValueFormat,
}

impl Default for EditParams {
    fn default() -> Self {
        EditParams {
            src: None,
            backup: true,
            separator: DEFAULT_SEPARATOR,
            state: DesiredState::Present,
            content: None,
            content_type: ContentType::Yaml,
            key: String::new(),
            value: None,
            value_type: String::new(),
            update: false,
            append: false,
            index: None,
            curr_value: None,
            curr_value_format: ValueFormat::Yaml,
        }
    }
}

impl EditParams {
    /// Checks argument combinations that cannot be expressed in the types.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.src.is_none() && self.content.is_none() {
            return Err("one of the following is required: src, content".to_string());
        }
        if self.curr_value.is_some() && self.index.is_some() {
            return Err("parameters are mutually exclusive: curr_value|index".to_string());
        }
        if self.update && self.append {
            return Err("parameters are mutually exclusive: update|append".to_string());
        }
        Ok(())
    }

    fn content(&self) -> Result<Option<Value>> {
        match self.content.as_ref().filter(|c| c.is_truthy()) {
            Some(Value::String(text)) => self.content_type.parse(text).map(Some),
            Some(other) => Ok(Some(other.clone())),
            None => Ok(None),
        }
    }

    fn value(&self) -> Result<Option<Value>> {
        match self.value.as_ref() {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => parse_value(raw, &self.value_type).map(Some),
            Some(Value::Bool(b)) if self.value_type.contains("str") => {
                Ok(Some(Value::String(if *b { "True" } else { "False" }.to_string())))
            }
            Some(other) => Ok(Some(other.clone())),
        }
    }

    fn curr_value(&self) -> Result<Option<Value>> {
        self.curr_value
            .as_deref()
            .map(|raw| decode_value(raw, self.curr_value_format))
            .transpose()
    }
}

/// Runs the edit module. In check mode the edit is computed but the file is
/// left untouched.
pub fn run_edit(params: &EditParams, check_mode: bool) -> ModuleResult {
    if let Err(msg) = params.validate() {
        return ModuleResult::failed(msg);
    }
    match edit(params, check_mode) {
        Ok(result) => result,
        Err(e) => ModuleResult::failed(e.to_string()),
    }
}

fn open_failure(params: &EditParams) -> ModuleResult {
    let src = params
        .src
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    ModuleResult::failed(format!(
        "Error opening file [{}]. Verify that the file exists, that it is has correct permissions, and is valid yaml.",
        src
    ))
}

fn check_mode_result(document: Value, state: DesiredState) -> ModuleResult {
    ModuleResult::changed()
        .with_results(document)
        .with_state(state)
        .with_msg(format!("CHECK_MODE: Would have performed an edit. state={}", state))
}

fn edit(params: &EditParams, check_mode: bool) -> Result<ModuleResult> {
    let mut builder = Yedit::builder()
        .separator(params.separator)
        .backup(params.backup)
        .content_type(params.content_type);
    if let Some(src) = &params.src {
        builder = builder.filename(src);
    }

    let mut store = match builder.build() {
        Ok(store) => store,
        Err(YeditError::DocumentParse { .. }) if params.state != DesiredState::Present => {
            return Ok(open_failure(params));
        }
        Err(e) => return Err(e),
    };
    if params.src.is_some() && !store.file_exists() && params.state != DesiredState::Present {
        return Ok(open_failure(params));
    }

    let content = params.content()?;
    let value = params.value()?;
    let persist = |store: &Yedit, edit: Edit| -> Result<()> {
        if edit.is_changed() && params.src.is_some() {
            store.write()?;
        }
        Ok(())
    };

    match params.state {
        DesiredState::List => {
            if let Some(content) = content {
                store.set_document(content);
            }
            let results = if params.key.is_empty() {
                store.document().clone()
            } else {
                store
                    .get(&params.key)
                    .cloned()
                    .unwrap_or_else(|| Value::Map(Map::new()))
            };
            Ok(ModuleResult::unchanged()
                .with_results(results)
                .with_state(DesiredState::List))
        }

        DesiredState::Absent => {
            if let Some(content) = content {
                store.set_document(content);
            }
            let edit = if params.update {
                store.pop(&params.key, value.as_ref().unwrap_or(&Value::Null))
            } else {
                store.delete(&params.key)
            };
            debug!(key = %params.key, changed = edit.is_changed(), "removed entry");
            if check_mode && edit.is_changed() {
                return Ok(check_mode_result(store.into_document(), DesiredState::Absent));
            }
            persist(&store, edit)?;
            Ok(ModuleResult::new(edit.is_changed())
                .with_results(store.into_document())
                .with_state(DesiredState::Absent))
        }

        DesiredState::Present => {
            let mut content_changed = false;
            if let Some(content) = content {
                if *store.document() == content && value.is_none() {
                    return Ok(ModuleResult::unchanged()
                        .with_results(content)
                        .with_state(DesiredState::Present));
                }
                content_changed = *store.document() != content;
                store.set_document(content);
            }

            if let Some(value) = value {
                let key = params.key.as_str();
                let edit = if params.update {
                    let curr_value = params.curr_value()?;
                    store.update(key, value, params.index, curr_value.as_ref())?
                } else if params.append {
                    store.append(key, value)?
                } else {
                    store.put(key, value)?
                };
                debug!(key, changed = edit.is_changed(), "applied edit");
                if check_mode && edit.is_changed() {
                    return Ok(check_mode_result(store.into_document(), DesiredState::Present));
                }
                persist(&store, edit)?;
                return Ok(ModuleResult::new(edit.is_changed())
                    .with_results(store.into_document())
                    .with_state(DesiredState::Present));
            }

            if check_mode {
                if content_changed {
                    return Ok(check_mode_result(store.into_document(), DesiredState::Present));
                }
            } else if params.src.is_some() {
                store.write()?;
            }
            Ok(ModuleResult::new(content_changed)
                .with_results(store.into_document())
                .with_state(DesiredState::Present))
        }
    }
}
