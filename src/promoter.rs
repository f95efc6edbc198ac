//! Free-text promotion: the transient "add new" entry that mirrors whatever
//! the user has typed.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::store::{EntryKind, OptionStore};

/// Text of the transient entry, with a `%%%` token standing in for the
/// typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTemplate(String);

impl AddTemplate {
    pub const TOKEN: &'static str = "%%%";

    /// Accepts a template only if it contains the token.
    pub fn parse(template: &str) -> Option<Self> {
        template
            .contains(Self::TOKEN)
            .then(|| Self(template.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute `value` for the first token. Returns the label and the byte
    /// range the value occupies in it.
    pub fn render(&self, value: &str) -> (String, Range<usize>) {
        // parse() guarantees the token is present
        let at = self.0.find(Self::TOKEN).unwrap_or(0);
        let text = self.0.replacen(Self::TOKEN, value, 1);
        (text, at..at + value.len())
    }
}

impl Default for AddTemplate {
    fn default() -> Self {
        Self(Self::TOKEN.to_string())
    }
}

/// Replace the transient entry so it reflects `value`.
///
/// Returns `true` when a transient entry now sits at index 0.
pub(crate) fn promote(store: &mut OptionStore, template: &AddTemplate, value: &str) -> bool {
    if let Some(index) = store.transient_position() {
        store.remove(Some(index));
    }
    if value.is_empty() {
        return false;
    }

    let (text, emphasis) = template.render(value);
    let mut attributes = BTreeMap::new();
    attributes.insert("value".to_string(), value.to_string());
    store.insert(
        Some(0),
        text,
        attributes,
        BTreeMap::new(),
        EntryKind::Transient {
            value: value.to_string(),
        },
        Some(emphasis),
    );
    tracing::debug!(value, "transient entry updated");
    true
}
