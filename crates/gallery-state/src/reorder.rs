//! Drag-to-reorder gesture handling for pointer and touch input.
//!
//! Both modalities feed one state machine:
//!
//! ```text
//!            pointer_down                     pointer_drop / touch_end
//!   Idle ──────────────────────> Dragging ─────────────────────────────> Idle
//!    │                              ^
//!    │ touch_start (hit)            │ hold elapsed
//!    └──────────────> Pressed ──────┘
//!                        │ moved > threshold before hold
//!                        └──────────────────> Idle (Scroll)
//! ```
//!
//! Timestamps are passed in by the caller, so the controller never reads a
//! clock and can be driven deterministically.

use std::time::{Duration, Instant};

use tracing::debug;

use gallery_core::{defaults, Result};

use crate::gallery::GalleryOrderEngine;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance_to(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Bounding box of one rendered gallery item.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open containment: the right and bottom edges belong to the
    /// neighbouring cell.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Pointer,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    /// Touch is down on an item; waiting for the hold to elapse.
    Pressed {
        source: usize,
        origin: Point,
        deadline: Instant,
    },
    Dragging {
        source: usize,
        hover: Option<usize>,
        modality: Modality,
    },
}

/// How a gesture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Move the item at `from` to `to`.
    Reorder { from: usize, to: usize },
    /// Ended without a move.
    Cancelled,
    /// The touch moved before the hold elapsed and belongs to scrolling.
    Scroll,
}

/// Gesture state machine plus the most recent item layout.
#[derive(Debug, Clone)]
pub struct ReorderController {
    state: GestureState,
    layout: Vec<Rect>,
    hold: Duration,
    move_threshold: f32,
}

impl Default for ReorderController {
    fn default() -> Self {
        Self::new()
    }
}

impl ReorderController {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
            layout: Vec::new(),
            hold: Duration::from_millis(defaults::TOUCH_HOLD_MS),
            move_threshold: defaults::TOUCH_MOVE_THRESHOLD_PX,
        }
    }

    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub fn with_move_threshold(mut self, px: f32) -> Self {
        self.move_threshold = px;
        self
    }

    /// Replace the item rectangles; index `i` is the item at position `i`.
    pub fn set_layout(&mut self, rects: Vec<Rect>) {
        self.layout = rects;
    }

    /// Index of the item under `point`.
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        self.layout.iter().position(|r| r.contains(point))
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    /// Item being dragged (or pressed).
    pub fn source(&self) -> Option<usize> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Pressed { source, .. } | GestureState::Dragging { source, .. } => {
                Some(source)
            }
        }
    }

    /// Current drop target, if any.
    pub fn hover(&self) -> Option<usize> {
        match self.state {
            GestureState::Dragging { hover, .. } => hover,
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Pointer
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, index: usize) {
        self.state = GestureState::Dragging {
            source: index,
            hover: None,
            modality: Modality::Pointer,
        };
    }

    pub fn pointer_over(&mut self, index: usize) {
        if let GestureState::Dragging {
            hover,
            modality: Modality::Pointer,
            ..
        } = &mut self.state
        {
            *hover = Some(index);
        }
    }

    pub fn pointer_leave(&mut self) {
        if let GestureState::Dragging {
            hover,
            modality: Modality::Pointer,
            ..
        } = &mut self.state
        {
            *hover = None;
        }
    }

    pub fn pointer_drop(&mut self) -> GestureOutcome {
        self.finish()
    }

    // ------------------------------------------------------------------
    // Touch
    // ------------------------------------------------------------------

    /// Start a touch. Returns `false` (and stays idle) when no item is
    /// under `point`.
    pub fn touch_start(&mut self, point: Point, now: Instant) -> bool {
        match self.hit_test(point) {
            Some(source) => {
                self.state = GestureState::Pressed {
                    source,
                    origin: point,
                    deadline: now + self.hold,
                };
                true
            }
            None => {
                self.state = GestureState::Idle;
                false
            }
        }
    }

    /// Promote a held touch to a drag once the hold has elapsed. Returns
    /// `true` if the drag started on this call.
    pub fn poll_hold(&mut self, now: Instant) -> bool {
        if let GestureState::Pressed {
            source, deadline, ..
        } = self.state
        {
            if now >= deadline {
                debug!(source, "Touch hold started drag");
                self.state = GestureState::Dragging {
                    source,
                    hover: None,
                    modality: Modality::Touch,
                };
                return true;
            }
        }
        false
    }

    /// Track a touch move. Returns `Some(Scroll)` when the move cancels a
    /// pending hold.
    pub fn touch_move(&mut self, point: Point, now: Instant) -> Option<GestureOutcome> {
        self.poll_hold(now);

        match &mut self.state {
            GestureState::Pressed { origin, .. } => {
                if origin.distance_to(point) > self.move_threshold {
                    self.state = GestureState::Idle;
                    return Some(GestureOutcome::Scroll);
                }
                None
            }
            GestureState::Dragging {
                hover,
                modality: Modality::Touch,
                ..
            } => {
                *hover = self.layout.iter().position(|r| r.contains(point));
                None
            }
            _ => None,
        }
    }

    pub fn touch_end(&mut self, now: Instant) -> GestureOutcome {
        self.poll_hold(now);
        self.finish()
    }

    /// Abandon the gesture without reordering.
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }

    fn finish(&mut self) -> GestureOutcome {
        let outcome = match self.state {
            GestureState::Dragging {
                source,
                hover: Some(target),
                ..
            } if target != source => GestureOutcome::Reorder {
                from: source,
                to: target,
            },
            _ => GestureOutcome::Cancelled,
        };
        self.state = GestureState::Idle;
        outcome
    }

    /// Apply a finished gesture to `engine`. Returns whether the order moved.
    pub fn apply(&self, outcome: GestureOutcome, engine: &GalleryOrderEngine) -> Result<bool> {
        match outcome {
            GestureOutcome::Reorder { from, to } => {
                engine.reorder(from, to)?;
                Ok(true)
            }
            GestureOutcome::Cancelled | GestureOutcome::Scroll => Ok(false),
        }
    }
}
