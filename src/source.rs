//! The select control that an editable select replaces.
//!
//! A source is normally a TOML document:
//!
//! ```toml
//! name = "fruit"
//! attributes = { title = "Pick a fruit" }
//!
//! [config]
//! create = false
//!
//! [[option]]
//! text = "Apple"
//! selected = true
//!
//! [[option]]
//! text = "Durian"
//! disabled = true
//! data = { smell = "strong" }
//! ```
//!
//! Any other file is read as one option per non-blank line.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::RawConfig;
use crate::error::SourceError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectSource {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Per-source configuration, layered under explicit configuration.
    #[serde(default)]
    pub config: RawConfig,
    #[serde(default, rename = "option")]
    pub options: Vec<SourceOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceOption {
    pub text: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
}

impl SourceOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Attributes as the widget stores them; `disabled` becomes an attribute.
    pub(crate) fn effective_attributes(&self) -> BTreeMap<String, String> {
        let mut attributes = self.attributes.clone();
        if self.disabled {
            attributes.entry("disabled".to_string()).or_default();
        }
        attributes
    }
}

impl SelectSource {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: texts.into_iter().map(SourceOption::new).collect(),
            ..Default::default()
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn from_lines(text: &str) -> Self {
        Self::from_texts(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut source = if path.extension().is_some_and(|ext| ext == "toml") {
            Self::from_toml(&text).map_err(|source| SourceError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::from_lines(&text)
        };

        if source.name.is_none() {
            source.name = path.file_stem().map(|stem| stem.to_string_lossy().into_owned());
        }
        tracing::info!(path = %path.display(), options = source.options.len(), "loaded select source");
        Ok(source)
    }
}
