use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use editsel::{EditableSelect, EventKind, KeyResponse, OptionId, SelectSource, SelectedOption};
use ratatui::layout::{Position, Rect};
use ratatui_interact::traits::ClickRegionRegistry;
use ratatui_themes::{ThemeName, ThemePalette};

use crate::ui;

/// How many recent widget events the status bar remembers.
const EVENT_LOG_LEN: usize = 5;

/// Actions that the event loop should take after handling input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Accept,
}

/// Screen regions that respond to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Input,
    List,
    Entry(OptionId),
}

impl Region {
    /// Entries sit on top of the list they belong to.
    fn depth(self) -> u8 {
        match self {
            Region::Input | Region::List => 0,
            Region::Entry(_) => 1,
        }
    }
}

/// Terminal host around one editable select.
pub struct App {
    pub widget: EditableSelect,

    /// Current color theme.
    pub theme_name: ThemeName,

    /// Click region registry for mouse hit-testing, rebuilt every frame.
    pub click_regions: ClickRegionRegistry<Region>,

    /// Names of the most recent widget events, newest last.
    pub event_log: Rc<RefCell<VecDeque<String>>>,

    /// The option carried by the last `select` event.
    pub last_selection: Rc<RefCell<Option<SelectedOption>>>,
}

impl App {
    pub fn new(widget: EditableSelect) -> Self {
        Self::with_theme(widget, ThemeName::default())
    }

    pub fn with_theme(mut widget: EditableSelect, theme_name: ThemeName) -> Self {
        let event_log = Rc::new(RefCell::new(VecDeque::with_capacity(EVENT_LOG_LEN)));
        let last_selection = Rc::new(RefCell::new(None));

        let log = Rc::clone(&event_log);
        let selection = Rc::clone(&last_selection);
        widget.events_mut().subscribe(move |event| {
            let mut log = log.borrow_mut();
            if log.len() == EVENT_LOG_LEN {
                log.pop_front();
            }
            log.push_back(event.kind.name().to_string());
            if let EventKind::Select(option) = &event.kind {
                *selection.borrow_mut() = Some(option.clone());
            }
        });

        let mut app = Self {
            widget,
            theme_name,
            click_regions: ClickRegionRegistry::new(),
            event_log,
            last_selection,
        };
        app.widget.focus();
        app
    }

    /// Get the current theme palette.
    pub fn palette(&self) -> ThemePalette {
        self.theme_name.palette()
    }

    /// Cycle to the next theme.
    pub fn next_theme(&mut self) {
        self.theme_name = self.theme_name.next();
    }

    /// Cycle to the previous theme.
    pub fn prev_theme(&mut self) {
        self.theme_name = self.theme_name.prev();
    }

    /// Most recent widget event, if any.
    pub fn last_event(&self) -> Option<String> {
        self.event_log.borrow().back().cloned()
    }

    /// Run deferred widget work; called once per loop iteration.
    pub fn tick(&mut self) {
        self.widget.tick();
    }

    /// Re-register click regions for the layout of `area`.
    pub fn sync_layout(&mut self, area: Rect) {
        let layout = ui::compute_layout(area, self);
        self.click_regions.clear();
        self.click_regions.register(layout.input, Region::Input);
        if let Some(list) = layout.list {
            self.click_regions.register(list, Region::List);
            for (row, id) in ui::visible_rows(self, layout.list_rows).into_iter().enumerate() {
                let y = list.y + 1 + row as u16;
                if y + 1 >= list.y + list.height {
                    break;
                }
                self.click_regions
                    .register(Rect::new(list.x + 1, y, list.width.saturating_sub(2), 1), Region::Entry(id));
            }
        }
    }

    /// The most specific region under the pointer.
    fn region_at(&self, column: u16, row: u16) -> Option<Region> {
        let position = Position::new(column, row);
        self.click_regions
            .regions()
            .iter()
            .filter(|r| r.area.contains(position))
            .map(|r| r.data)
            .max_by_key(|region| region.depth())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::F(2) => {
                self.next_theme();
                return Action::None;
            }
            KeyCode::F(3) => {
                self.prev_theme();
                return Action::None;
            }
            _ => {}
        }

        if !self.widget.is_focused() {
            return match key.code {
                KeyCode::Tab | KeyCode::BackTab => {
                    self.widget.focus();
                    Action::None
                }
                KeyCode::Enter => Action::Accept,
                KeyCode::Esc | KeyCode::Char('q') => Action::Quit,
                _ => Action::None,
            };
        }

        match self.widget.handle_key(key) {
            KeyResponse::Handled => Action::None,
            KeyResponse::Ignored => match key.code {
                KeyCode::Enter => Action::Accept,
                KeyCode::Esc => Action::Quit,
                // Tab with the panel closed moves focus away from the input
                KeyCode::Tab | KeyCode::BackTab => {
                    self.widget.blur();
                    Action::None
                }
                _ => Action::None,
            },
        }
    }

    /// Handle a mouse event and return the resulting Action.
    pub fn handle_mouse(&mut self, event: MouseEvent) -> Action {
        let region = self.region_at(event.column, event.row);
        let over_list = matches!(region, Some(Region::List | Region::Entry(_)));

        match event.kind {
            MouseEventKind::Moved => {
                self.widget.set_pointer_over_list(over_list);
                if let Some(Region::Entry(id)) = region {
                    self.widget.hover(id);
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.widget.set_pointer_over_list(over_list);
                match region {
                    Some(Region::Entry(id)) => self.widget.press(id),
                    Some(Region::Input) => {
                        if !self.widget.is_focused() {
                            self.widget.focus();
                        }
                    }
                    Some(Region::List) => {}
                    None => {
                        if self.widget.is_focused() {
                            self.widget.blur();
                        }
                    }
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if over_list {
                    self.widget.release();
                }
            }
            MouseEventKind::ScrollUp => self.widget.move_highlight(-1),
            MouseEventKind::ScrollDown => self.widget.move_highlight(1),
            _ => {}
        }
        Action::None
    }

    /// What to print when the user accepts: the committed option as JSON, or
    /// the input text.
    pub fn output(&self, json: bool) -> String {
        let text = self.widget.input_text().to_string();
        if !json {
            return text;
        }
        let selection = self.last_selection.borrow();
        match selection.as_ref() {
            Some(option) if option.text == text => {
                serde_json::to_string(option).unwrap_or(text)
            }
            _ => serde_json::json!({ "text": text, "value": text }).to_string(),
        }
    }

    /// Tear the widget down, handing back the source it replaced.
    pub fn finish(self) -> SelectSource {
        self.widget.destroy()
    }
}
