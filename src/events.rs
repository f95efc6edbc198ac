//! Typed notifications for code embedding the widget.
//!
//! Every state change the widget reports goes through one [`EventBus`] with
//! one subscriber list.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::store::{OptionEntry, OptionId};

static NEXT_WIDGET_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the widget instance an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WidgetId(u64);

impl WidgetId {
    pub(crate) fn next() -> Self {
        Self(NEXT_WIDGET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "editsel-{}", self.0)
    }
}

/// Snapshot of an option at the moment it was selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedOption {
    #[serde(skip)]
    pub id: OptionId,
    pub index: usize,
    pub text: String,
    pub value: String,
    pub attributes: BTreeMap<String, String>,
    pub data: BTreeMap<String, serde_json::Value>,
}

impl SelectedOption {
    pub(crate) fn capture(index: usize, entry: &OptionEntry) -> Self {
        Self {
            id: entry.id(),
            index,
            text: entry.text().to_string(),
            value: entry.value().to_string(),
            attributes: entry.attributes().clone(),
            data: entry.data().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Created,
    Show,
    Shown,
    Hide,
    Hidden,
    Select(SelectedOption),
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Show => "show",
            Self::Shown => "shown",
            Self::Hide => "hide",
            Self::Hidden => "hidden",
            Self::Select(_) => "select",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetEvent {
    pub widget: WidgetId,
    pub kind: EventKind,
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&WidgetEvent)>;

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&WidgetEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.listeners.clear();
    }

    pub(crate) fn emit(&mut self, event: WidgetEvent) {
        tracing::debug!(widget = %event.widget, event = event.kind.name(), "emit");
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
