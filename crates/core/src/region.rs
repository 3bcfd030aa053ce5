//! Screen regions and the drag-to-select state machine.
//!
//! The selector is decoupled from any rendering surface: the overlay turns
//! toolkit input into [`PointerEvent`]s and feeds them to [`DragState::next`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// A point in screen-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A normalized screen-pixel rectangle (`x1 <= x2`, `y1 <= y2`).
///
/// Fields are private so the ordering invariant cannot be broken after
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl Rectangle {
    /// Builds a rectangle from any two opposite corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    /// Builds a rectangle from raw coordinates, normalizing their order.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::from_corners(Point::new(x1, y1), Point::new(x2, y2))
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    pub fn x2(&self) -> i32 {
        self.x2
    }

    pub fn y2(&self) -> i32 {
        self.y2
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.x2.abs_diff(self.x1)
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.y2.abs_diff(self.y1)
    }

    /// A rectangle with no area cannot be captured.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// The four coordinates as `(x1, y1, x2, y2)`.
    pub fn as_tuple(&self) -> (i32, i32, i32, i32) {
        (self.x1, self.y1, self.x2, self.y2)
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Parses `X1,Y1,X2,Y2` (as passed on the command line).
impl FromStr for Rectangle {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|part| part.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::config(format!("Invalid region '{}': {}", s, e)))?;

        match parts.as_slice() {
            &[x1, y1, x2, y2] => Ok(Self::new(x1, y1, x2, y2)),
            _ => Err(AppError::config(format!(
                "Invalid region '{}': expected X1,Y1,X2,Y2",
                s
            ))),
        }
    }
}

/// Pointer input relevant to the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    /// Primary button pressed.
    Down(Point),
    /// Pointer moved while the button is held.
    Move(Point),
    /// Primary button released.
    Up(Point),
    /// The overlay was closed (Escape, window closed).
    Dismiss,
}

/// State of an interactive selection.
///
/// `Idle` -> `Dragging` -> `Committed`, or `Dismissed` at any point before
/// the release. Both final states absorb every further event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        anchor: Point,
        current: Point,
    },
    Committed(Rectangle),
    Dismissed,
}

impl DragState {
    /// Applies one pointer event and returns the next state.
    pub fn next(self, event: PointerEvent) -> Self {
        match (self, event) {
            (Self::Committed(_) | Self::Dismissed, _) => self,
            (_, PointerEvent::Dismiss) => Self::Dismissed,
            (Self::Idle | Self::Dragging { .. }, PointerEvent::Down(p)) => Self::Dragging {
                anchor: p,
                current: p,
            },
            (Self::Dragging { anchor, .. }, PointerEvent::Move(p)) => Self::Dragging {
                anchor,
                current: p,
            },
            (Self::Dragging { anchor, .. }, PointerEvent::Up(p)) => {
                Self::Committed(Rectangle::from_corners(anchor, p))
            }
            (Self::Idle, PointerEvent::Move(_) | PointerEvent::Up(_)) => self,
        }
    }

    /// The live rectangle to draw while dragging, or the committed one.
    pub fn preview(&self) -> Option<Rectangle> {
        match *self {
            Self::Dragging { anchor, current } => Some(Rectangle::from_corners(anchor, current)),
            Self::Committed(rect) => Some(rect),
            Self::Idle | Self::Dismissed => None,
        }
    }

    /// Whether the selection has ended, with or without a rectangle.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Committed(_) | Self::Dismissed)
    }

    /// The committed rectangle, if the selection ended with a release.
    pub fn committed(&self) -> Option<Rectangle> {
        match *self {
            Self::Committed(rect) => Some(rect),
            _ => None,
        }
    }
}
