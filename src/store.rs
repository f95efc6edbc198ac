//! The ordered option list backing the dropdown.

use std::collections::BTreeMap;
use std::ops::Range;

use serde_json::Value;

/// Stable identity of an option within one widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionId(u64);

/// Whether an entry is a real option or the synthesized "add" entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Ordinary,
    /// Mirrors typed text that can be committed as a new option.
    Transient { value: String },
}

/// One selectable entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionEntry {
    pub(crate) id: OptionId,
    pub(crate) text: String,
    pub(crate) emphasis: Option<Range<usize>>,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) data: BTreeMap<String, Value>,
    pub(crate) disabled: bool,
    pub(crate) kind: EntryKind,
    pub(crate) visible: bool,
    pub(crate) selected: bool,
}

impl OptionEntry {
    pub fn id(&self) -> OptionId {
        self.id
    }

    /// Display text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte range of `text` rendered with emphasis, if any.
    pub fn emphasis(&self) -> Option<Range<usize>> {
        self.emphasis.clone()
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    pub fn is_transient(&self) -> bool {
        matches!(self.kind, EntryKind::Transient { .. })
    }

    /// Whether the last filter run left this entry visible.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Value submitted for this entry: the `value` attribute, else the text.
    pub fn value(&self) -> &str {
        self.attributes
            .get("value")
            .map(String::as_str)
            .unwrap_or(&self.text)
    }

    /// Visible and not disabled.
    pub(crate) fn is_selectable(&self) -> bool {
        self.visible && !self.disabled
    }
}

#[derive(Debug, Default)]
pub(crate) struct OptionStore {
    entries: Vec<OptionEntry>,
    next_id: u64,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut store = Self::new();
        for text in texts {
            store.insert(
                None,
                text.to_string(),
                BTreeMap::new(),
                BTreeMap::new(),
                EntryKind::Ordinary,
                None,
            );
        }
        store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&OptionEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut OptionEntry> {
        self.entries.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptionEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, OptionEntry> {
        self.entries.iter_mut()
    }

    pub fn entries(&self) -> &[OptionEntry] {
        &self.entries
    }

    pub fn position(&self, id: OptionId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn by_id(&self, id: OptionId) -> Option<&OptionEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn transient_position(&self) -> Option<usize> {
        self.entries.iter().position(OptionEntry::is_transient)
    }

    /// Clamp an insertion index into `[0, len]`; `None` appends.
    pub fn insert_index(&self, index: Option<usize>) -> usize {
        index.map_or(self.len(), |i| i.min(self.len()))
    }

    /// Clamp a removal index into `[0, len - 1]`; `None` picks the last entry.
    pub fn remove_index(&self, index: Option<usize>) -> Option<usize> {
        let last = self.len().checked_sub(1)?;
        Some(index.map_or(last, |i| i.min(last)))
    }

    /// Insert a new entry and return its id. New entries start visible.
    pub fn insert(
        &mut self,
        index: Option<usize>,
        text: String,
        attributes: BTreeMap<String, String>,
        data: BTreeMap<String, Value>,
        kind: EntryKind,
        emphasis: Option<Range<usize>>,
    ) -> OptionId {
        let at = self.insert_index(index);
        let id = OptionId(self.next_id);
        self.next_id += 1;

        let disabled = attributes.contains_key("disabled");
        self.entries.insert(
            at,
            OptionEntry {
                id,
                text,
                emphasis,
                attributes,
                data,
                disabled,
                kind,
                visible: true,
                selected: false,
            },
        );
        id
    }

    pub fn remove(&mut self, index: Option<usize>) -> Option<OptionEntry> {
        let at = self.remove_index(index)?;
        Some(self.entries.remove(at))
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    pub fn clear_selection(&mut self) {
        for entry in &mut self.entries {
            entry.selected = false;
        }
    }
}
