//! Highlight movement and the list viewport.

/// A requested highlight change, resolved when it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HighlightTarget {
    /// Move relative to the current highlight.
    Step(isize),
    /// Jump to an index of the selectable entries.
    At(isize),
}

/// Resolve `target` against `count` selectable entries. Both forms wrap.
pub(crate) fn resolve(target: HighlightTarget, current: Option<usize>, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let count = count as isize;
    let index = match (target, current) {
        (HighlightTarget::Step(delta), Some(current)) => current as isize + delta,
        (HighlightTarget::Step(delta), None) if delta < 0 => count - 1,
        (HighlightTarget::Step(_), None) => 0,
        (HighlightTarget::At(index), _) => index,
    };
    Some(index.rem_euclid(count) as usize)
}

/// Scroll window over the rows of the visible list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Viewport {
    pub offset: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            offset: 0,
            height: height.max(1),
        }
    }

    /// Scroll just enough to bring `row` into view, but only in the
    /// direction the highlight travelled.
    pub fn reveal(&mut self, old_row: Option<usize>, row: usize) {
        let moved_up = old_row.is_some_and(|old| row < old);
        let moved_down = old_row.map_or(true, |old| row > old);

        if moved_up && row < self.offset {
            self.offset = row;
        }
        if moved_down && row >= self.offset + self.height {
            self.offset = row + 1 - self.height;
        }
    }

    /// Keep the window inside a list of `rows` rows.
    pub fn clamp(&mut self, rows: usize) {
        self.offset = self.offset.min(rows.saturating_sub(self.height));
    }
}
