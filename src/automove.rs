//! Auto-move routes: stepping the scan window across the sample.
//!
//! A move script is a string of direction letters such as `"RULLDDRR"`.
//! Each letter shifts the scan center by a fixed distance along the frame's
//! own axes, so "right" follows the scan's fast direction even when the frame
//! is rotated.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{CitsError, CitsResult};
use crate::frame::{rotate, ScanFrame};

/// One step of a move script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    /// `R`: along +X of the frame.
    Right,
    /// `L`: along -X of the frame.
    Left,
    /// `U`: along +Y of the frame.
    Up,
    /// `D`: along -Y of the frame.
    Down,
}

impl Direction {
    /// Parse a single script letter (case-insensitive).
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'R' => Some(Direction::Right),
            'L' => Some(Direction::Left),
            'U' => Some(Direction::Up),
            'D' => Some(Direction::Down),
            _ => None,
        }
    }

    /// Script letter for this direction.
    pub fn as_char(self) -> char {
        match self {
            Direction::Right => 'R',
            Direction::Left => 'L',
            Direction::Up => 'U',
            Direction::Down => 'D',
        }
    }

    /// Stage displacement for a step of `distance` in a frame rotated by
    /// `angle_deg`.
    pub fn vector(self, distance: f64, angle_deg: f64) -> (f64, f64) {
        let (ux, uy) = match self {
            Direction::Right => (1.0, 0.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Up => (0.0, 1.0),
            Direction::Down => (0.0, -1.0),
        };
        rotate(ux * distance, uy * distance, angle_deg)
    }
}

/// A parsed move script.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AutoMoveScript {
    moves: Vec<Direction>,
}

impl AutoMoveScript {
    /// Parse `script`. Whitespace is ignored; any other unknown character is
    /// an error reporting its position in the original string.
    pub fn parse(script: &str) -> CitsResult<Self> {
        let moves = script
            .chars()
            .enumerate()
            .filter(|(_, c)| !c.is_whitespace())
            .map(|(position, c)| {
                Direction::from_char(c).ok_or(CitsError::InvalidMoveScript { position, found: c })
            })
            .collect::<CitsResult<Vec<_>>>()?;
        Ok(Self { moves })
    }

    /// Steps in order.
    pub fn moves(&self) -> &[Direction] {
        &self.moves
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// True if the script has no steps.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl FromStr for AutoMoveScript {
    type Err = CitsError;

    fn from_str(s: &str) -> CitsResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AutoMoveScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.moves.iter().try_for_each(|m| write!(f, "{}", m.as_char()))
    }
}

/// Scan centers visited by a move script, starting at the frame center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoMoveRoute {
    /// Step distance (nm).
    pub distance: f64,
    /// Frame angle the steps were aligned to.
    pub angle: f64,
    /// `moves + 1` scan centers, first is the starting center.
    pub centers: Vec<(f64, f64)>,
}

/// Walk `script` from the frame center in steps of `distance`.
pub fn route(frame: &ScanFrame, script: &AutoMoveScript, distance: f64) -> CitsResult<AutoMoveRoute> {
    if !(distance.is_finite() && distance > 0.0) {
        return Err(CitsError::InvalidMoveDistance(distance));
    }

    let mut position = (frame.center_x, frame.center_y);
    let mut centers = Vec::with_capacity(script.len() + 1);
    centers.push(position);
    for step in script.moves() {
        let (dx, dy) = step.vector(distance, frame.angle);
        position = (position.0 + dx, position.1 + dy);
        centers.push(position);
    }

    tracing::debug!(steps = script.len(), distance, "Computed auto-move route");
    Ok(AutoMoveRoute {
        distance,
        angle: frame.angle,
        centers,
    })
}
