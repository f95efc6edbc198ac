//! Open/close state of the list panel and its transitions.

use std::time::{Duration, Instant};

use crate::config::Effect;

/// Lifecycle of the list panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Hidden,
    Showing,
    Shown,
    Hiding,
}

/// Notifications produced by the panel, forwarded to the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PanelSignal {
    Show,
    Shown,
    Hide,
    Hidden,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    started: Instant,
}

#[derive(Debug)]
pub(crate) struct VisibilityController {
    state: PanelState,
    effect: Effect,
    duration: Duration,
    transition: Option<Transition>,
}

impl VisibilityController {
    pub fn new(effect: Effect, duration: Duration) -> Self {
        Self {
            state: PanelState::Hidden,
            effect,
            duration,
            transition: None,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    /// The panel occupies screen space (shown or mid-transition).
    pub fn is_open(&self) -> bool {
        self.state != PanelState::Hidden
    }

    /// Begin opening. Only proceeds from `Hidden` and when there is something
    /// to show; a closing panel finishes closing first.
    pub fn show(&mut self, now: Instant, has_visible: bool) -> Option<PanelSignal> {
        if !has_visible || self.state != PanelState::Hidden {
            return None;
        }
        self.begin(PanelState::Showing, now);
        Some(PanelSignal::Show)
    }

    /// Begin closing from any non-hidden state.
    pub fn hide(&mut self, now: Instant) -> Option<PanelSignal> {
        if self.state == PanelState::Hidden {
            return None;
        }
        self.begin(PanelState::Hiding, now);
        Some(PanelSignal::Hide)
    }

    fn begin(&mut self, state: PanelState, now: Instant) {
        // Replacing the transition cancels whatever was in flight.
        self.transition = Some(Transition { started: now });
        tracing::debug!(from = ?self.state, to = ?state, "panel transition");
        self.state = state;
    }

    /// Complete a transition whose time is up. Never completes on the call
    /// that started it because callers tick on a later loop iteration.
    pub fn tick(&mut self, now: Instant) -> Option<PanelSignal> {
        let transition = self.transition?;
        if self.effect != Effect::Default
            && now.saturating_duration_since(transition.started) < self.duration
        {
            return None;
        }
        self.transition = None;
        match self.state {
            PanelState::Showing => {
                self.state = PanelState::Shown;
                Some(PanelSignal::Shown)
            }
            PanelState::Hiding => {
                self.state = PanelState::Hidden;
                Some(PanelSignal::Hidden)
            }
            PanelState::Hidden | PanelState::Shown => None,
        }
    }

    /// How much of the panel is revealed, from 0.0 to 1.0.
    pub fn progress(&self, now: Instant) -> f32 {
        let fraction = match (self.transition, self.effect) {
            (Some(t), Effect::Fade | Effect::Slide) if !self.duration.is_zero() => {
                (now.saturating_duration_since(t.started).as_secs_f32()
                    / self.duration.as_secs_f32())
                .min(1.0)
            }
            _ => 1.0,
        };
        match self.state {
            PanelState::Hidden => 0.0,
            PanelState::Shown => 1.0,
            PanelState::Showing => fraction,
            PanelState::Hiding => 1.0 - fraction,
        }
    }
}
