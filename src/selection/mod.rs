// Area selection interaction state machine
//
// Classifies a pointer drag into either an accepted screen rectangle or a
// cancellation. Pure geometry and state bookkeeping: no I/O, no platform
// calls. The caller (the recorder controller) activates the selector when the
// user picks "area" capture mode and forwards pointer/keyboard events to it.

use serde::{Deserialize, Serialize};

/// Minimum selection dimension in pixels. Drags where either side does not
/// strictly exceed this are treated as accidental clicks and cancelled.
pub const MIN_SELECTION_PX: u32 = 10;

/// A pointer position in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned selection rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl SelectionRect {
    /// Build the rectangle spanned by two corner points, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: a.x.abs_diff(b.x),
            height: a.y.abs_diff(b.y),
        }
    }

    /// Whether both dimensions strictly exceed the minimum threshold.
    pub fn meets_minimum(&self) -> bool {
        self.width > MIN_SELECTION_PX && self.height > MIN_SELECTION_PX
    }
}

/// Current phase of the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorPhase {
    /// Not accepting input.
    Inactive,
    /// Activated, waiting for a pointer-down.
    Armed,
    /// A drag is in progress.
    Dragging,
}

/// Result of a completed or aborted selection interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "rect")]
pub enum SelectionOutcome {
    /// The drag produced a rectangle above the minimum size.
    Accepted(SelectionRect),
    /// The interaction was abandoned: sub-threshold drag, escape, or an
    /// explicit cancel from the caller.
    Cancelled,
}

/// Drag-to-select state machine.
///
/// Emits exactly one outcome per interaction, on pointer-up or cancel, then
/// returns to `Inactive`. Deactivation from outside discards in-progress drag
/// state without emitting anything.
#[derive(Debug, Default)]
pub struct AreaSelector {
    phase: SelectorPhase,
    anchor: Option<Point>,
    current: Option<Point>,
}

impl Default for SelectorPhase {
    fn default() -> Self {
        Self::Inactive
    }
}

impl AreaSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SelectorPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != SelectorPhase::Inactive
    }

    /// Arm the selector. Clears any drag state left over from a previous
    /// interaction.
    pub fn activate(&mut self) {
        self.reset();
        self.phase = SelectorPhase::Armed;
    }

    /// Deactivate from outside. Discards in-progress drag state; emits
    /// nothing.
    pub fn deactivate(&mut self) {
        self.reset();
    }

    /// Pointer pressed: anchor the drag.
    pub fn pointer_down(&mut self, point: Point) {
        if self.phase != SelectorPhase::Armed {
            return;
        }
        self.anchor = Some(point);
        self.current = Some(point);
        self.phase = SelectorPhase::Dragging;
    }

    /// Pointer moved: update the drag endpoint. Ignored unless dragging.
    pub fn pointer_move(&mut self, point: Point) {
        if self.phase != SelectorPhase::Dragging {
            return;
        }
        self.current = Some(point);
    }

    /// Pointer released: classify the drag and return to `Inactive`.
    pub fn pointer_up(&mut self) -> Option<SelectionOutcome> {
        if self.phase != SelectorPhase::Dragging {
            return None;
        }
        let outcome = match (self.anchor, self.current) {
            (Some(a), Some(b)) => {
                let rect = SelectionRect::from_corners(a, b);
                if rect.meets_minimum() {
                    SelectionOutcome::Accepted(rect)
                } else {
                    SelectionOutcome::Cancelled
                }
            }
            _ => SelectionOutcome::Cancelled,
        };
        self.reset();
        Some(outcome)
    }

    /// Cancel signal (e.g. escape). Emits a cancellation if an interaction
    /// was active, without computing a rectangle.
    pub fn cancel(&mut self) -> Option<SelectionOutcome> {
        if self.phase == SelectorPhase::Inactive {
            return None;
        }
        self.reset();
        Some(SelectionOutcome::Cancelled)
    }

    /// The rectangle spanned by the drag so far, for overlay rendering.
    pub fn current_rect(&self) -> Option<SelectionRect> {
        match (self.anchor, self.current) {
            (Some(a), Some(b)) => Some(SelectionRect::from_corners(a, b)),
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.phase = SelectorPhase::Inactive;
        self.anchor = None;
        self.current = None;
    }
}
