//! Widget configuration.
//!
//! Options arrive as loosely typed [`RawConfig`] layers (the source's own
//! `[config]` table, a config file, command-line flags). Each key is checked
//! against its allowed values when the layers are normalized into a
//! [`WidgetConfig`]; anything unrecognized falls back to the default.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use toml::Value;

use crate::error::ConfigError;
use crate::promoter::AddTemplate;

pub const DEFAULT_PLACEHOLDER: &str = "Type here...";
pub const DEFAULT_MAX_ROWS: usize = 8;

/// What opens the list panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trigger {
    /// Focusing the input opens the panel, losing focus closes it.
    #[default]
    Focus,
    /// Only navigation, typing and explicit calls open the panel.
    Manual,
}

impl Trigger {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "focus" => Some(Self::Focus),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Transition used when the panel opens or closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effect {
    /// No animation; completes on the next tick.
    #[default]
    Default,
    Fade,
    Slide,
}

impl Effect {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Self::Default),
            "fade" => Some(Self::Fade),
            "slide" => Some(Self::Slide),
            _ => None,
        }
    }
}

/// Length of a panel transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionDuration {
    #[default]
    Fast,
    Slow,
    Millis(u64),
}

impl TransitionDuration {
    pub fn as_duration(self) -> Duration {
        match self {
            Self::Fast => Duration::from_millis(200),
            Self::Slow => Duration::from_millis(600),
            Self::Millis(ms) => Duration::from_millis(ms),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(ms) => u64::try_from(*ms).ok().map(Self::Millis),
            Value::Float(ms) if ms.is_finite() && *ms >= 0.0 => Some(Self::Millis(*ms as u64)),
            Value::String(s) => match s.trim() {
                "fast" => Some(Self::Fast),
                "slow" => Some(Self::Slow),
                other => other.parse::<u64>().ok().map(Self::Millis),
            },
            _ => None,
        }
    }
}

/// Where the list panel is placed relative to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelAnchor {
    /// Directly beneath the input.
    #[default]
    Input,
    /// Docked at the bottom of the screen, above the help bar.
    Footer,
}

impl PanelAnchor {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "input" => Some(Self::Input),
            "footer" => Some(Self::Footer),
            _ => None,
        }
    }
}

/// Normalized, immutable widget configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub filter: bool,
    pub effects: Effect,
    pub duration: TransitionDuration,
    pub trigger: Trigger,
    pub create: bool,
    pub placeholder: String,
    pub add_text: AddTemplate,
    pub append_to: PanelAnchor,
    /// Height of the list viewport in rows.
    pub max_rows: usize,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            filter: true,
            effects: Effect::Default,
            duration: TransitionDuration::Fast,
            trigger: Trigger::Focus,
            create: true,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            add_text: AddTemplate::default(),
            append_to: PanelAnchor::Input,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

/// One layer of unvalidated configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    pub filter: Option<Value>,
    pub effects: Option<Value>,
    pub duration: Option<Value>,
    pub trigger: Option<Value>,
    pub create: Option<Value>,
    pub placeholder: Option<Value>,
    #[serde(alias = "add_text", alias = "add-text")]
    pub add_text: Option<Value>,
    #[serde(alias = "append_to", alias = "append-to")]
    pub append_to: Option<Value>,
    #[serde(alias = "max_rows", alias = "max-rows")]
    pub max_rows: Option<Value>,
}

impl RawConfig {
    /// Load a configuration layer from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Stack `over` on top of `self`; keys set in `over` win.
    pub fn merge(self, over: RawConfig) -> RawConfig {
        RawConfig {
            filter: over.filter.or(self.filter),
            effects: over.effects.or(self.effects),
            duration: over.duration.or(self.duration),
            trigger: over.trigger.or(self.trigger),
            create: over.create.or(self.create),
            placeholder: over.placeholder.or(self.placeholder),
            add_text: over.add_text.or(self.add_text),
            append_to: over.append_to.or(self.append_to),
            max_rows: over.max_rows.or(self.max_rows),
        }
    }

    /// Validate every key, substituting the default for anything invalid.
    pub fn normalize(&self) -> WidgetConfig {
        let defaults = WidgetConfig::default();
        WidgetConfig {
            filter: checked("filter", self.filter.as_ref(), as_bool).unwrap_or(defaults.filter),
            effects: checked("effects", self.effects.as_ref(), |v| {
                v.as_str().and_then(Effect::parse)
            })
            .unwrap_or(defaults.effects),
            duration: checked("duration", self.duration.as_ref(), TransitionDuration::from_value)
                .unwrap_or(defaults.duration),
            trigger: checked("trigger", self.trigger.as_ref(), |v| {
                v.as_str().and_then(Trigger::parse)
            })
            .unwrap_or(defaults.trigger),
            create: checked("create", self.create.as_ref(), as_bool).unwrap_or(defaults.create),
            placeholder: checked("placeholder", self.placeholder.as_ref(), |v| {
                v.as_str().map(str::to_string)
            })
            .unwrap_or(defaults.placeholder),
            add_text: checked("addText", self.add_text.as_ref(), |v| {
                v.as_str().and_then(AddTemplate::parse)
            })
            .unwrap_or(defaults.add_text),
            append_to: checked("appendTo", self.append_to.as_ref(), |v| {
                v.as_str().and_then(PanelAnchor::parse)
            })
            .unwrap_or(defaults.append_to),
            max_rows: checked("maxRows", self.max_rows.as_ref(), as_rows).unwrap_or(defaults.max_rows),
        }
    }
}

fn checked<T>(key: &str, value: Option<&Value>, parse: impl FnOnce(&Value) -> Option<T>) -> Option<T> {
    let value = value?;
    let parsed = parse(value);
    if parsed.is_none() {
        tracing::warn!(key, %value, "invalid configuration value, using default");
    }
    parsed
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_rows(value: &Value) -> Option<usize> {
    let rows = match value {
        Value::Integer(n) => usize::try_from(*n).ok()?,
        Value::String(s) => s.trim().parse::<usize>().ok()?,
        _ => return None,
    };
    (rows > 0).then_some(rows)
}
