use std::collections::BTreeMap;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui_interact::components::InputState;
use serde_json::Value;

use crate::config::{RawConfig, Trigger, WidgetConfig};
use crate::events::{EventBus, EventKind, SelectedOption, WidgetEvent, WidgetId};
use crate::filter::FilterEngine;
use crate::navigation::{self, HighlightTarget, Viewport};
use crate::promoter;
use crate::source::SelectSource;
use crate::store::{EntryKind, OptionEntry, OptionId, OptionStore};
use crate::visibility::{PanelSignal, PanelState, VisibilityController};

/// Whether a key was consumed by the widget or should fall through to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResponse {
    Handled,
    Ignored,
}

/// A text input with a filterable, keyboard-navigable dropdown list.
///
/// Highlight changes and panel transitions are deferred: they take effect on
/// the next [`tick`](Self::tick), which the host calls once per loop
/// iteration. Pending highlight changes are also settled before every key.
pub struct EditableSelect {
    id: WidgetId,
    config: WidgetConfig,
    source: SelectSource,
    store: OptionStore,
    filter: FilterEngine,
    input: InputState,
    panel: VisibilityController,
    highlight: Option<OptionId>,
    pending: Option<HighlightTarget>,
    viewport: Viewport,
    events: EventBus,
    focused: bool,
    pointer_over_list: bool,
}

impl EditableSelect {
    /// Replace `source` with an editable select. `config` is layered over
    /// the source's own configuration.
    pub fn create(source: SelectSource, config: RawConfig) -> Self {
        Self::create_with_events(source, config, EventBus::new())
    }

    /// Like [`create`](Self::create), with listeners already attached so they
    /// observe the `created` event.
    pub fn create_with_events(source: SelectSource, config: RawConfig, events: EventBus) -> Self {
        let config = source.config.clone().merge(config).normalize();
        let mut widget = Self {
            id: WidgetId::next(),
            filter: FilterEngine::new(config.filter),
            panel: VisibilityController::new(config.effects, config.duration.as_duration()),
            viewport: Viewport::new(config.max_rows),
            config,
            source,
            store: OptionStore::new(),
            input: InputState::empty(),
            highlight: None,
            pending: None,
            events,
            focused: false,
            pointer_over_list: false,
        };

        for (index, option) in widget.source.options.iter().enumerate() {
            let id = widget.store.insert(
                Some(index),
                option.text.clone(),
                option.effective_attributes(),
                option.data.clone(),
                EntryKind::Ordinary,
                None,
            );
            if option.selected {
                widget.store.clear_selection();
                if let Some(entry) = widget.store.get_mut(index) {
                    entry.selected = true;
                }
                widget.input.set_text(option.text.clone());
                tracing::debug!(?id, text = %option.text, "initial selection");
            }
        }
        widget.filter();

        tracing::info!(
            widget = %widget.id,
            options = widget.store.len(),
            config = ?widget.config,
            "editable select created"
        );
        widget.emit(EventKind::Created);
        widget
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Name of the source this widget replaced, if it had one.
    pub fn name(&self) -> Option<&str> {
        self.source.name.as_deref()
    }

    /// Attributes of the source, carried over onto the input.
    pub fn input_attributes(&self) -> &BTreeMap<String, String> {
        &self.source.attributes
    }

    /// Label for the input: its `title` attribute, else the source name.
    pub fn label(&self) -> Option<&str> {
        self.source
            .attributes
            .get("title")
            .map(String::as_str)
            .or_else(|| self.name())
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn input_text(&self) -> &str {
        &self.input.text
    }

    /// Cursor position in the input, in characters.
    pub fn input_cursor(&self) -> usize {
        self.input.cursor_pos
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// All entries in display order, visible or not.
    pub fn entries(&self) -> &[OptionEntry] {
        self.store.entries()
    }

    pub fn entry(&self, id: OptionId) -> Option<&OptionEntry> {
        self.store.by_id(id)
    }

    pub fn visible_entries(&self) -> impl Iterator<Item = &OptionEntry> {
        self.store.iter().filter(|e| e.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_entries().count()
    }

    pub fn highlighted(&self) -> Option<OptionId> {
        self.highlight
    }

    /// Position of the highlight among the visible, enabled entries.
    pub fn highlighted_index(&self) -> Option<usize> {
        let id = self.highlight?;
        self.store
            .iter()
            .filter(|e| e.is_selectable())
            .position(|e| e.id == id)
    }

    pub fn selected(&self) -> Option<&OptionEntry> {
        self.store.iter().find(|e| e.selected)
    }

    pub fn transient(&self) -> Option<&OptionEntry> {
        self.store.iter().find(|e| e.is_transient())
    }

    pub fn panel_state(&self) -> PanelState {
        self.panel.state()
    }

    pub fn is_open(&self) -> bool {
        self.panel.is_open()
    }

    /// Fraction of the panel revealed at `now`, for animated rendering.
    pub fn panel_progress(&self, now: Instant) -> f32 {
        self.panel.progress(now)
    }

    /// First visible row of the list viewport.
    pub fn scroll_offset(&self) -> usize {
        self.viewport.offset
    }

    /// Character indices of `text` matched by the current input.
    pub fn match_indices(&self, text: &str) -> Vec<u32> {
        self.filter.match_indices(text, &self.input.text)
    }

    // ── Public operations ──────────────────────────────────────────────

    /// Re-run the filter against the current input.
    pub fn filter(&mut self) {
        let outcome = self.filter.apply(&mut self.store, &self.input.text);

        if let Some(id) = self.highlight {
            if !self.store.by_id(id).is_some_and(OptionEntry::is_selectable) {
                self.highlight = None;
            }
        }
        self.viewport.clamp(outcome.visible.len());

        if outcome.exhausted && !self.config.create {
            self.hide();
        }
    }

    pub fn show(&mut self) {
        let has_visible = self.store.iter().any(|e| e.visible);
        if let Some(signal) = self.panel.show(Instant::now(), has_visible) {
            self.emit_panel(signal);
        }
    }

    pub fn hide(&mut self) {
        if let Some(signal) = self.panel.hide(Instant::now()) {
            self.emit_panel(signal);
        }
    }

    /// Commit `id` as the selected option.
    ///
    /// Ignored unless the entry exists, is visible and is enabled. Committing
    /// the transient entry first turns its value into a permanent option.
    pub fn select(&mut self, id: OptionId) {
        let Some(index) = self.store.position(id) else {
            return;
        };
        let Some(entry) = self.store.get(index) else {
            return;
        };
        if !entry.is_selectable() {
            return;
        }

        if let EntryKind::Transient { value } = entry.kind.clone() {
            let created = self.add(value.clone(), None, BTreeMap::new(), BTreeMap::new());
            self.drop_transient();
            tracing::info!(widget = %self.id, value, "promoted typed text to option");
            self.select(created);
            return;
        }

        if entry.selected {
            self.hide();
            return;
        }

        let text = entry.text.clone();
        self.store.clear_selection();
        if let Some(entry) = self.store.get_mut(index) {
            entry.selected = true;
        }
        self.input.set_text(text);
        if self.config.filter {
            self.hide();
        }
        self.filter();

        let snapshot = self
            .store
            .position(id)
            .and_then(|index| self.store.get(index).map(|e| SelectedOption::capture(index, e)));
        if let Some(snapshot) = snapshot {
            self.emit(EventKind::Select(snapshot));
        }
    }

    /// Insert an option. `index` defaults to the end and is clamped.
    pub fn add(
        &mut self,
        text: impl Into<String>,
        index: Option<usize>,
        attributes: BTreeMap<String, String>,
        data: BTreeMap<String, Value>,
    ) -> OptionId {
        let id = self
            .store
            .insert(index, text.into(), attributes, data, EntryKind::Ordinary, None);
        tracing::debug!(?id, ?index, "option added");
        self.filter();
        id
    }

    /// Remove the option at `index` (default: the last one), clamped.
    pub fn remove(&mut self, index: Option<usize>) -> Option<OptionEntry> {
        let removed = self.store.remove(index);
        if let Some(entry) = &removed {
            tracing::debug!(id = ?entry.id, ?index, "option removed");
        }
        self.filter();
        removed
    }

    pub fn clear(&mut self) {
        let removed = self.store.clear();
        tracing::debug!(removed, "options cleared");
        self.filter();
    }

    /// Empty the input, dropping the transient entry and the selection mark.
    pub fn clear_input(&mut self) {
        if let Some(index) = self.store.transient_position() {
            self.store.remove(Some(index));
        }
        self.store.clear_selection();
        self.input.clear();
        self.filter();
    }

    /// Tear the widget down and hand back the source it replaced.
    pub fn destroy(mut self) -> SelectSource {
        self.events.clear();
        tracing::info!(widget = %self.id, "editable select destroyed");
        self.source
    }

    // ── Navigation ─────────────────────────────────────────────────────

    /// Move the highlight by `delta`, wrapping at both ends.
    pub fn move_highlight(&mut self, delta: isize) {
        self.request_highlight(HighlightTarget::Step(delta));
    }

    /// Jump the highlight to `index` among the visible, enabled entries.
    pub fn highlight_index(&mut self, index: usize) {
        self.request_highlight(HighlightTarget::At(index as isize));
    }

    fn request_highlight(&mut self, target: HighlightTarget) {
        self.show();
        self.pending = Some(target);
    }

    fn settle_highlight(&mut self) {
        let Some(target) = self.pending.take() else {
            return;
        };
        let selectable: Vec<OptionId> = self
            .store
            .iter()
            .filter(|e| e.is_selectable())
            .map(|e| e.id)
            .collect();
        let current = self
            .highlight
            .and_then(|id| selectable.iter().position(|s| *s == id));
        let Some(index) = navigation::resolve(target, current, selectable.len()) else {
            return;
        };

        let id = selectable[index];
        let old_row = self.highlight.and_then(|old| self.visible_row(old));
        self.highlight = Some(id);
        if let Some(row) = self.visible_row(id) {
            self.viewport.reveal(old_row, row);
        }
    }

    fn visible_row(&self, id: OptionId) -> Option<usize> {
        self.store
            .iter()
            .filter(|e| e.visible)
            .position(|e| e.id == id)
    }

    /// Apply deferred work: pending highlight moves and finished transitions.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        self.settle_highlight();
        if let Some(signal) = self.panel.tick(now) {
            self.emit_panel(signal);
        }
    }

    // ── Input handling ─────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyResponse {
        self.settle_highlight();

        match key.code {
            KeyCode::Up => {
                self.move_highlight(-1);
                KeyResponse::Handled
            }
            KeyCode::Down => {
                self.move_highlight(1);
                KeyResponse::Handled
            }
            KeyCode::Tab | KeyCode::Enter => {
                if !self.panel.is_open() {
                    return KeyResponse::Ignored;
                }
                if let Some(id) = self.highlight {
                    self.select(id);
                }
                KeyResponse::Handled
            }
            KeyCode::Esc => {
                let was_open = self.panel.is_open();
                self.hide();
                if was_open {
                    KeyResponse::Handled
                } else {
                    KeyResponse::Ignored
                }
            }
            KeyCode::Left => {
                self.input.move_left();
                KeyResponse::Handled
            }
            KeyCode::Right => {
                self.input.move_right();
                KeyResponse::Handled
            }
            KeyCode::Home => {
                self.input.move_home();
                KeyResponse::Handled
            }
            KeyCode::End => {
                self.input.move_end();
                KeyResponse::Handled
            }
            KeyCode::Backspace => {
                self.input.delete_char_backward();
                self.after_edit();
                KeyResponse::Handled
            }
            KeyCode::Delete => {
                self.input.delete_char_forward();
                self.after_edit();
                KeyResponse::Handled
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.input.insert_char(c);
                self.after_edit();
                KeyResponse::Handled
            }
            _ => KeyResponse::Ignored,
        }
    }

    fn after_edit(&mut self) {
        if self.config.create {
            let value = self.input.text.clone();
            let promoted = promoter::promote(&mut self.store, &self.config.add_text, &value);
            self.filter();
            // Index 0 is the transient entry, so the first real match is 1.
            self.highlight_index(if promoted { 1 } else { 0 });
        } else {
            self.filter();
            self.highlight_index(0);
        }
    }

    fn drop_transient(&mut self) {
        if let Some(index) = self.store.transient_position() {
            self.remove(Some(index));
        }
    }

    /// The input gained focus.
    pub fn focus(&mut self) {
        self.focused = true;
        if self.config.trigger == Trigger::Focus {
            for entry in self.store.iter_mut() {
                entry.visible = true;
            }
            self.show();
        }
    }

    /// The input lost focus.
    pub fn blur(&mut self) {
        self.focused = false;
        if self.config.trigger == Trigger::Focus && !self.pointer_over_list {
            self.hide();
        }
    }

    /// Record whether the pointer is over the list panel.
    pub fn set_pointer_over_list(&mut self, over: bool) {
        self.pointer_over_list = over;
    }

    /// Pointer moved over an entry; enabled entries take the highlight.
    pub fn hover(&mut self, id: OptionId) {
        if self.store.by_id(id).is_some_and(OptionEntry::is_selectable) {
            self.pending = None;
            self.highlight = Some(id);
        }
    }

    /// Pointer pressed on an entry.
    pub fn press(&mut self, id: OptionId) {
        match self.store.by_id(id) {
            Some(entry) if !entry.disabled => self.select(id),
            _ => {}
        }
    }

    /// Pointer released over the list.
    pub fn release(&mut self) {
        self.highlight = None;
    }

    fn emit_panel(&mut self, signal: PanelSignal) {
        let kind = match signal {
            PanelSignal::Show => EventKind::Show,
            PanelSignal::Shown => EventKind::Shown,
            PanelSignal::Hide => EventKind::Hide,
            PanelSignal::Hidden => EventKind::Hidden,
        };
        self.emit(kind);
    }

    fn emit(&mut self, kind: EventKind) {
        self.events.emit(WidgetEvent {
            widget: self.id,
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceOption;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn fruit() -> SelectSource {
        SelectSource::from_texts(["Apple", "Banana", "Cherry"])
    }

    fn config(toml_text: &str) -> RawConfig {
        toml::from_str(toml_text).expect("valid config")
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(widget: &mut EditableSelect, text: &str) {
        for c in text.chars() {
            widget.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn texts(widget: &EditableSelect) -> Vec<String> {
        widget.entries().iter().map(|e| e.text().to_string()).collect()
    }

    fn visible_texts(widget: &EditableSelect) -> Vec<String> {
        widget.visible_entries().map(|e| e.text().to_string()).collect()
    }

    fn highlighted_text(widget: &EditableSelect) -> Option<String> {
        widget
            .highlighted()
            .and_then(|id| widget.entry(id))
            .map(|e| e.text().to_string())
    }

    /// Widget whose events are appended to the returned log by name.
    fn recorded(source: SelectSource, raw: RawConfig) -> (EditableSelect, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let mut events = EventBus::new();
        events.subscribe(move |event| {
            let line = match &event.kind {
                EventKind::Select(option) => format!("select {}", option.text),
                other => other.name().to_string(),
            };
            sink.borrow_mut().push(line);
        });
        (EditableSelect::create_with_events(source, raw, events), log)
    }

    fn open(widget: &mut EditableSelect) {
        widget.focus();
        widget.tick();
        assert_eq!(widget.panel_state(), PanelState::Shown);
    }

    #[test]
    fn test_created_event_and_initial_state() {
        let (widget, log) = recorded(fruit(), RawConfig::default());
        assert_eq!(*log.borrow(), vec!["created"]);
        assert_eq!(texts(&widget), vec!["Apple", "Banana", "Cherry"]);
        assert_eq!(widget.visible_count(), 3);
        assert_eq!(widget.panel_state(), PanelState::Hidden);
        assert!(widget.input_text().is_empty());
    }

    #[test]
    fn test_source_config_is_layered_under_caller_config() {
        let mut source = fruit();
        source.config = config(r#"
            create = false
            trigger = "manual"
        "#);
        let widget = EditableSelect::create(source, config("create = true"));
        assert!(widget.config().create);
        assert_eq!(widget.config().trigger, Trigger::Manual);
    }

    #[test]
    fn test_preselected_option_fills_input() {
        let mut source = fruit();
        source.options[1].selected = true;
        let widget = EditableSelect::create(source, RawConfig::default());

        assert_eq!(widget.input_text(), "Banana");
        assert_eq!(widget.selected().map(|e| e.text()), Some("Banana"));
        assert_eq!(visible_texts(&widget), vec!["Banana"]);
    }

    #[test]
    fn test_focus_shows_then_shown_on_tick() {
        let (mut widget, log) = recorded(fruit(), RawConfig::default());
        widget.focus();
        assert_eq!(widget.panel_state(), PanelState::Showing);
        assert_eq!(*log.borrow(), vec!["created", "show"]);

        widget.tick();
        assert_eq!(widget.panel_state(), PanelState::Shown);
        insta::assert_snapshot!(log.borrow().join("\n"), @r"
        created
        show
        shown
        ");
    }

    #[test]
    fn test_focus_reveals_entries_hidden_by_filter() {
        let mut source = fruit();
        source.options[0].selected = true;
        let mut widget = EditableSelect::create(source, RawConfig::default());
        assert_eq!(widget.visible_count(), 1);

        widget.focus();
        assert_eq!(widget.visible_count(), 3);
    }

    #[test]
    fn test_manual_trigger_ignores_focus() {
        let mut widget = EditableSelect::create(fruit(), config(r#"trigger = "manual""#));
        widget.focus();
        widget.tick();
        assert_eq!(widget.panel_state(), PanelState::Hidden);

        // navigation still opens the panel
        widget.handle_key(key(KeyCode::Down));
        assert!(widget.is_open());
    }

    #[test]
    fn test_no_match_without_create_hides_panel() {
        let (mut widget, log) = recorded(fruit(), config("create = false"));
        open(&mut widget);

        type_text(&mut widget, "z");
        assert_eq!(widget.visible_count(), 0);
        assert_eq!(widget.panel_state(), PanelState::Hiding);
        widget.tick();
        assert_eq!(widget.panel_state(), PanelState::Hidden);
        assert!(widget.transient().is_none());

        insta::assert_snapshot!(log.borrow().join("\n"), @r"
        created
        show
        shown
        hide
        hidden
        ");
    }

    #[test]
    fn test_create_disabled_highlights_first_match() {
        let mut widget = EditableSelect::create(fruit(), config("create = false"));
        open(&mut widget);

        type_text(&mut widget, "an");
        widget.tick();
        assert_eq!(visible_texts(&widget), vec!["Banana"]);
        assert_eq!(highlighted_text(&widget).as_deref(), Some("Banana"));
    }

    #[test]
    fn test_typing_unknown_text_creates_transient_entry() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        open(&mut widget);

        type_text(&mut widget, "Kiwi");
        widget.tick();

        let transient = widget.transient().expect("transient entry");
        assert_eq!(widget.entries()[0].id(), transient.id());
        assert!(transient.text().contains("Kiwi"));
        assert_eq!(transient.emphasis(), Some(0..4));
        assert_eq!(visible_texts(&widget), vec!["Kiwi"]);
        // with a single selectable entry, index 1 wraps onto the transient
        assert_eq!(widget.highlighted(), Some(transient.id()));
    }

    #[test]
    fn test_committing_transient_adds_and_selects() {
        let (mut widget, log) = recorded(fruit(), config(r#"addText = "Add %%%""#));
        open(&mut widget);
        type_text(&mut widget, "Kiwi");
        widget.tick();
        assert_eq!(widget.transient().map(|e| e.text()), Some("Add Kiwi"));

        assert_eq!(widget.handle_key(key(KeyCode::Enter)), KeyResponse::Handled);

        assert_eq!(texts(&widget), vec!["Apple", "Banana", "Cherry", "Kiwi"]);
        assert!(widget.transient().is_none());
        assert_eq!(widget.input_text(), "Kiwi");
        let selected = widget.selected().expect("selection");
        assert_eq!(selected.text(), "Kiwi");
        assert!(!selected.is_transient());
        assert_eq!(log.borrow().last().map(String::as_str), Some("select Kiwi"));
    }

    #[test]
    fn test_transient_highlight_skips_to_first_real_match() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        open(&mut widget);

        type_text(&mut widget, "an");
        widget.tick();
        assert_eq!(visible_texts(&widget), vec!["an", "Banana"]);
        assert_eq!(highlighted_text(&widget).as_deref(), Some("Banana"));
    }

    #[test]
    fn test_at_most_one_transient_while_editing() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        open(&mut widget);

        for step in ["c", "h", "e"] {
            type_text(&mut widget, step);
            let count = widget.entries().iter().filter(|e| e.is_transient()).count();
            assert_eq!(count, 1);
        }
        for _ in 0..3 {
            widget.handle_key(key(KeyCode::Backspace));
            let count = widget.entries().iter().filter(|e| e.is_transient()).count();
            assert!(count <= 1);
        }
        assert!(widget.input_text().is_empty());
        assert!(widget.transient().is_none());
        widget.tick();
        assert_eq!(widget.highlighted_index(), Some(0));
    }

    #[test]
    fn test_up_from_first_wraps_to_last() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        open(&mut widget);

        widget.highlight_index(0);
        widget.tick();
        assert_eq!(highlighted_text(&widget).as_deref(), Some("Apple"));

        widget.handle_key(key(KeyCode::Up));
        widget.tick();
        assert_eq!(highlighted_text(&widget).as_deref(), Some("Cherry"));

        widget.handle_key(key(KeyCode::Down));
        widget.tick();
        assert_eq!(highlighted_text(&widget).as_deref(), Some("Apple"));
    }

    #[test]
    fn test_navigation_skips_disabled_entries() {
        let mut source = fruit();
        source.options[1].disabled = true;
        let mut widget = EditableSelect::create(source, RawConfig::default());
        open(&mut widget);

        widget.handle_key(key(KeyCode::Down));
        widget.handle_key(key(KeyCode::Down));
        widget.tick();
        assert_eq!(highlighted_text(&widget).as_deref(), Some("Cherry"));
    }

    #[test]
    fn test_latest_highlight_request_wins() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        open(&mut widget);

        widget.move_highlight(1);
        widget.move_highlight(-1);
        widget.tick();
        // only the last request applies: -1 from nothing lands on the last entry
        assert_eq!(highlighted_text(&widget).as_deref(), Some("Cherry"));
    }

    #[test]
    fn test_enter_commits_latest_highlight_without_tick() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        open(&mut widget);

        widget.handle_key(key(KeyCode::Down));
        widget.handle_key(key(KeyCode::Down));
        widget.handle_key(key(KeyCode::Enter));
        assert_eq!(widget.input_text(), "Banana");
    }

    #[test]
    fn test_enter_ignored_when_panel_hidden() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        assert_eq!(widget.handle_key(key(KeyCode::Enter)), KeyResponse::Ignored);
        assert_eq!(widget.handle_key(key(KeyCode::Tab)), KeyResponse::Ignored);
        assert_eq!(widget.handle_key(key(KeyCode::Esc)), KeyResponse::Ignored);
    }

    #[test]
    fn test_escape_hides_panel() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        open(&mut widget);
        assert_eq!(widget.handle_key(key(KeyCode::Esc)), KeyResponse::Handled);
        widget.tick();
        assert_eq!(widget.panel_state(), PanelState::Hidden);
    }

    #[test]
    fn test_select_emits_and_filters() {
        let (mut widget, log) = recorded(fruit(), RawConfig::default());
        open(&mut widget);
        let cherry = widget.entries()[2].id();

        widget.select(cherry);

        assert_eq!(widget.input_text(), "Cherry");
        assert_eq!(visible_texts(&widget), vec!["Cherry"]);
        assert_eq!(widget.panel_state(), PanelState::Hiding);
        assert_eq!(
            *log.borrow(),
            vec!["created", "show", "shown", "hide", "select Cherry"]
        );
    }

    #[test]
    fn test_select_event_carries_option_details() {
        let mut source = SelectSource::default();
        let mut option = SourceOption::new("Apple");
        option.attributes.insert("value".into(), "apple".into());
        option.data.insert("color".into(), serde_json::json!("red"));
        source.options.push(option);

        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let mut events = EventBus::new();
        events.subscribe(move |event| {
            if let EventKind::Select(option) = &event.kind {
                *sink.borrow_mut() = Some((event.widget, option.clone()));
            }
        });
        let mut widget = EditableSelect::create_with_events(source, RawConfig::default(), events);
        let apple = widget.entries()[0].id();
        widget.select(apple);

        let (from, option) = seen.borrow().clone().expect("select event");
        assert_eq!(from, widget.id());
        assert_eq!(option.index, 0);
        assert_eq!(option.value, "apple");
        assert_eq!(option.data["color"], serde_json::json!("red"));
    }

    #[test]
    fn test_selecting_selected_entry_only_hides() {
        let (mut widget, log) = recorded(fruit(), config("filter = false"));
        open(&mut widget);
        let apple = widget.entries()[0].id();

        widget.select(apple);
        assert!(widget.is_open(), "filter off keeps the panel open");
        widget.select(apple);
        assert_eq!(widget.panel_state(), PanelState::Hiding);

        let selects = log.borrow().iter().filter(|l| l.starts_with("select")).count();
        assert_eq!(selects, 1);
    }

    #[test]
    fn test_select_disabled_is_noop() {
        let mut source = fruit();
        source.options[0].disabled = true;
        let (mut widget, log) = recorded(source, RawConfig::default());
        open(&mut widget);
        widget.highlight_index(0);
        widget.tick();
        let highlight = widget.highlighted();
        let before = widget.entries().to_vec();

        let apple = widget.entries()[0].id();
        widget.select(apple);
        widget.press(apple);

        assert_eq!(widget.entries(), before.as_slice());
        assert_eq!(widget.highlighted(), highlight);
        assert!(widget.input_text().is_empty());
        assert!(!log.borrow().iter().any(|l| l.starts_with("select")));
    }

    #[test]
    fn test_select_invisible_is_noop() {
        let (mut widget, log) = recorded(fruit(), config("create = false"));
        open(&mut widget);
        type_text(&mut widget, "ch");
        widget.tick();
        let apple = widget.entries()[0].id();
        assert!(!widget.entries()[0].is_visible());

        widget.select(apple);
        assert_eq!(widget.input_text(), "ch");
        assert!(!log.borrow().iter().any(|l| l.starts_with("select")));
    }

    #[test]
    fn test_add_remove_clear_refilter() {
        let mut widget = EditableSelect::create(fruit(), config("create = false"));
        type_text(&mut widget, "an");
        assert_eq!(visible_texts(&widget), vec!["Banana"]);

        widget.add("Mango", Some(0), BTreeMap::new(), BTreeMap::new());
        widget.add("Fig", Some(99), BTreeMap::new(), BTreeMap::new());
        assert_eq!(texts(&widget), vec!["Mango", "Apple", "Banana", "Cherry", "Fig"]);
        assert_eq!(visible_texts(&widget), vec!["Mango", "Banana"]);

        let removed = widget.remove(None).expect("removed");
        assert_eq!(removed.text(), "Fig");
        widget.remove(Some(0));
        assert_eq!(visible_texts(&widget), vec!["Banana"]);

        widget.clear();
        assert!(widget.entries().is_empty());
        assert!(widget.remove(None).is_none());
    }

    #[test]
    fn test_add_then_remove_restores_options() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        let before = texts(&widget);
        widget.add("Date", Some(1), BTreeMap::new(), BTreeMap::new());
        widget.remove(Some(1));
        assert_eq!(texts(&widget), before);
    }

    #[test]
    fn test_removing_highlighted_entry_clears_highlight() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        open(&mut widget);
        widget.highlight_index(2);
        widget.tick();
        assert_eq!(highlighted_text(&widget).as_deref(), Some("Cherry"));

        widget.remove(None);
        assert_eq!(widget.highlighted(), None);
    }

    #[test]
    fn test_clear_input_drops_transient_and_selection() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        let banana = widget.entries()[1].id();
        widget.select(banana);
        type_text(&mut widget, "x");
        assert!(widget.transient().is_some());

        widget.clear_input();
        assert!(widget.input_text().is_empty());
        assert!(widget.transient().is_none());
        assert!(widget.selected().is_none());
        assert_eq!(widget.visible_count(), 3);
    }

    #[test]
    fn test_blur_hides_unless_pointer_over_list() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        open(&mut widget);

        widget.set_pointer_over_list(true);
        widget.blur();
        assert_eq!(widget.panel_state(), PanelState::Shown);

        widget.set_pointer_over_list(false);
        widget.blur();
        assert_eq!(widget.panel_state(), PanelState::Hiding);
        assert!(!widget.is_focused());
    }

    #[test]
    fn test_pointer_hover_press_release() {
        let mut source = fruit();
        source.options[2].disabled = true;
        let mut widget = EditableSelect::create(source, RawConfig::default());
        open(&mut widget);
        let banana = widget.entries()[1].id();
        let cherry = widget.entries()[2].id();

        widget.hover(cherry);
        assert_eq!(widget.highlighted(), None);
        widget.hover(banana);
        assert_eq!(widget.highlighted(), Some(banana));

        widget.press(banana);
        assert_eq!(widget.input_text(), "Banana");
        widget.release();
        assert_eq!(widget.highlighted(), None);
    }

    #[test]
    fn test_viewport_follows_highlight() {
        let source = SelectSource::from_texts((0..10).map(|i| format!("item {i}")));
        let mut widget = EditableSelect::create(source, config("maxRows = 3"));
        open(&mut widget);

        for _ in 0..4 {
            widget.handle_key(key(KeyCode::Down));
        }
        widget.tick();
        assert_eq!(widget.highlighted_index(), Some(3));
        assert_eq!(widget.scroll_offset(), 1);

        // wrap backwards from the first entry to the last
        widget.highlight_index(0);
        widget.tick();
        assert_eq!(widget.scroll_offset(), 0);
        widget.handle_key(key(KeyCode::Up));
        widget.tick();
        assert_eq!(widget.highlighted_index(), Some(9));
        assert_eq!(widget.scroll_offset(), 7);
    }

    #[test]
    fn test_highlight_cycle_returns_to_start() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        open(&mut widget);
        widget.highlight_index(1);
        widget.tick();

        for _ in 0..widget.visible_count() {
            widget.move_highlight(1);
            widget.tick();
        }
        assert_eq!(widget.highlighted_index(), Some(1));
    }

    #[test]
    fn test_fade_completes_after_duration() {
        let (mut widget, log) = recorded(fruit(), config(r#"
            effects = "fade"
            duration = 100
        "#));
        widget.focus();
        let start = Instant::now();
        widget.tick_at(start);
        assert_eq!(widget.panel_state(), PanelState::Showing);

        widget.tick_at(start + Duration::from_secs(1));
        assert_eq!(widget.panel_state(), PanelState::Shown);
        assert_eq!(log.borrow().last().map(String::as_str), Some("shown"));
    }

    #[test]
    fn test_control_chars_fall_through() {
        let mut widget = EditableSelect::create(fruit(), RawConfig::default());
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(widget.handle_key(ctrl_c), KeyResponse::Ignored);
        assert!(widget.input_text().is_empty());
    }

    #[test]
    fn test_destroy_returns_source() {
        let mut source = fruit();
        source.name = Some("fruit".into());
        let (mut widget, log) = recorded(source, RawConfig::default());
        widget.add("Kiwi", None, BTreeMap::new(), BTreeMap::new());

        let restored = widget.destroy();
        assert_eq!(restored.name.as_deref(), Some("fruit"));
        let restored_texts: Vec<&str> = restored.options.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(restored_texts, vec!["Apple", "Banana", "Cherry"]);
        assert_eq!(*log.borrow(), vec!["created"]);
    }

    #[test]
    fn test_source_attributes_label_the_input() {
        let mut source = fruit();
        source.name = Some("fruit".into());
        assert_eq!(EditableSelect::create(source.clone(), RawConfig::default()).label(), Some("fruit"));

        source.attributes.insert("title".into(), "Pick a fruit".into());
        source.attributes.insert("required".into(), String::new());
        let widget = EditableSelect::create(source, RawConfig::default());
        assert_eq!(widget.label(), Some("Pick a fruit"));
        assert!(widget.input_attributes().contains_key("required"));
    }

    #[test]
    fn test_typed_text_with_combining_mark_can_be_committed() {
        let mut widget = EditableSelect::create(
            SelectSource::from_texts(["Apple"]),
            RawConfig::default(),
        );
        open(&mut widget);

        type_text(&mut widget, "Cafe\u{301}");
        widget.tick();
        let transient = widget.transient().map(|e| e.id());
        assert!(transient.is_some());
        assert_eq!(widget.highlighted(), transient);

        widget.handle_key(key(KeyCode::Enter));
        assert_eq!(texts(&widget), vec!["Apple", "Cafe\u{301}"]);
        assert_eq!(widget.selected().map(|e| e.text()), Some("Cafe\u{301}"));
    }

    #[test]
    fn test_filter_matches_combining_marks_without_create() {
        let mut widget = EditableSelect::create(
            SelectSource::from_texts(["Cafe\u{301}", "Cafe"]),
            config("create = false"),
        );
        open(&mut widget);

        type_text(&mut widget, "e\u{301}");
        widget.tick();
        assert_eq!(visible_texts(&widget), vec!["Cafe\u{301}"]);
        assert_eq!(highlighted_text(&widget).as_deref(), Some("Cafe\u{301}"));
        assert!(widget.is_open());
    }

    #[test]
    fn test_filter_folds_unicode_case() {
        let mut widget = EditableSelect::create(
            SelectSource::from_texts(["Éclair", "Œuvre", "Apple"]),
            config("create = false"),
        );
        open(&mut widget);

        type_text(&mut widget, "ÉCL");
        assert_eq!(visible_texts(&widget), vec!["Éclair"]);

        widget.clear_input();
        type_text(&mut widget, "œu");
        assert_eq!(visible_texts(&widget), vec!["Œuvre"]);
    }

    #[test]
    fn test_filter_keeps_inner_whitespace() {
        let mut widget = EditableSelect::create(
            SelectSource::from_texts(["Pecan apple", "Banana", "Pecan"]),
            config("create = false"),
        );
        open(&mut widget);

        type_text(&mut widget, "an a");
        assert_eq!(visible_texts(&widget), vec!["Pecan apple"]);
    }

    #[test]
    fn test_navigation_does_not_reopen_closing_panel() {
        let (mut widget, log) = recorded(fruit(), RawConfig::default());
        open(&mut widget);
        let apple = widget.entries()[0].id();
        widget.select(apple);
        assert_eq!(widget.panel_state(), PanelState::Hiding);

        widget.handle_key(key(KeyCode::Down));
        assert_eq!(widget.panel_state(), PanelState::Hiding);
        widget.tick();
        assert_eq!(widget.panel_state(), PanelState::Hidden);

        // a fresh request after the panel closed opens it again
        widget.handle_key(key(KeyCode::Down));
        assert_eq!(widget.panel_state(), PanelState::Showing);
        insta::assert_snapshot!(log.borrow().join("\n"), @r"
        created
        show
        shown
        hide
        select Apple
        hidden
        show
        ");
    }
}
