//! Editable select for the terminal.
//!
//! An [`EditableSelect`] replaces a [`SelectSource`] with a text input and a
//! filterable dropdown list. Typing filters the list, the arrow keys move a
//! wrapping highlight, and Enter/Tab commit it. When creation is enabled,
//! text that matches nothing can be committed as a brand new option.

pub mod config;
pub mod error;
pub mod events;
pub mod source;
pub mod widget;

mod filter;
mod navigation;
mod promoter;
mod store;
mod visibility;

pub use config::{Effect, PanelAnchor, RawConfig, TransitionDuration, Trigger, WidgetConfig};
pub use error::{ConfigError, SourceError};
pub use events::{EventBus, EventKind, SelectedOption, SubscriptionId, WidgetEvent, WidgetId};
pub use promoter::AddTemplate;
pub use source::{SelectSource, SourceOption};
pub use store::{EntryKind, OptionEntry, OptionId};
pub use visibility::PanelState;
pub use widget::{EditableSelect, KeyResponse};
