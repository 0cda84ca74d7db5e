//! Local measurement areas.
//!
//! Operator input arrives as loosely-checked [`AreaParams`]. The only way to
//! obtain an [`AreaSpec`] is through [`AreaSpec::new`] (or `TryFrom`), which
//! runs the [validator](crate::validation::validate); past that point an
//! area's geometry is known to be usable and its fields cannot be changed.

use serde::{Deserialize, Serialize};

use crate::error::{CitsError, CitsResult};
use crate::validation;

/// Which way the serpentine starts along the secondary (`j`) axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum StartDirection {
    /// Column 0 walks `j` upwards.
    #[default]
    Up,
    /// Column 0 walks `j` downwards.
    Down,
}

impl StartDirection {
    /// Wire value: `+1` for `Up`, `-1` for `Down`.
    pub fn as_i32(self) -> i32 {
        match self {
            StartDirection::Up => 1,
            StartDirection::Down => -1,
        }
    }

    /// Whether column `i` walks `j` in increasing order.
    pub fn ascending_at(self, i: u32) -> bool {
        let even = i % 2 == 0;
        match self {
            StartDirection::Up => even,
            StartDirection::Down => !even,
        }
    }
}

impl TryFrom<i32> for StartDirection {
    type Error = CitsError;

    fn try_from(value: i32) -> CitsResult<Self> {
        match value {
            1 => Ok(StartDirection::Up),
            -1 => Ok(StartDirection::Down),
            other => Err(CitsError::InvalidArea {
                field: "start_direction",
                value: other.to_string(),
                constraint: "start_direction in {+1, -1}",
            }),
        }
    }
}

impl From<StartDirection> for i32 {
    fn from(direction: StartDirection) -> Self {
        direction.as_i32()
    }
}

/// Raw, unvalidated area descriptor as entered by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaParams {
    /// X offset of the start corner from the scan center (nm).
    pub x_dev: f64,
    /// Y offset of the start corner from the scan center (nm).
    pub y_dev: f64,
    /// Step along X (nm).
    pub dx: f64,
    /// Step along Y (nm).
    pub dy: f64,
    /// Points along X.
    pub nx: u32,
    /// Points along Y.
    pub ny: u32,
    /// `+1` or `-1`; see [`StartDirection`].
    #[serde(default = "default_start_direction", alias = "startpoint_direction")]
    pub start_direction: i32,
}

fn default_start_direction() -> i32 {
    1
}

impl AreaParams {
    /// Parameters with `start_direction = +1`.
    pub fn new(x_dev: f64, y_dev: f64, dx: f64, dy: f64, nx: u32, ny: u32) -> Self {
        Self {
            x_dev,
            y_dev,
            dx,
            dy,
            nx,
            ny,
            start_direction: default_start_direction(),
        }
    }

    /// Set the start direction wire value.
    pub fn with_start_direction(mut self, start_direction: i32) -> Self {
        self.start_direction = start_direction;
        self
    }
}

/// A validated local measurement area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AreaParams", into = "AreaParams")]
pub struct AreaSpec {
    x_dev: f64,
    y_dev: f64,
    dx: f64,
    dy: f64,
    nx: u32,
    ny: u32,
    start_direction: StartDirection,
}

impl AreaSpec {
    /// Validate `params` and build the area.
    pub fn new(params: AreaParams) -> CitsResult<Self> {
        validation::validate(&params)?;
        Ok(Self {
            x_dev: params.x_dev,
            y_dev: params.y_dev,
            dx: params.dx,
            dy: params.dy,
            nx: params.nx,
            ny: params.ny,
            start_direction: StartDirection::try_from(params.start_direction)?,
        })
    }

    /// X offset of the `(0, 0)` point from the scan center.
    pub fn x_dev(&self) -> f64 {
        self.x_dev
    }

    /// Y offset of the `(0, 0)` point from the scan center.
    pub fn y_dev(&self) -> f64 {
        self.y_dev
    }

    /// Step along X, always positive.
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Step along Y, always positive.
    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Points along X, in `[1, 512]`.
    pub fn nx(&self) -> u32 {
        self.nx
    }

    /// Points along Y, in `[1, 512]`.
    pub fn ny(&self) -> u32 {
        self.ny
    }

    /// Serpentine start direction.
    pub fn start_direction(&self) -> StartDirection {
        self.start_direction
    }

    /// `nx * ny`.
    pub fn point_count(&self) -> usize {
        self.nx as usize * self.ny as usize
    }

    /// Local (frame-relative) coordinates of grid index `(i, j)`.
    pub fn local_position(&self, i: u32, j: u32) -> (f64, f64) {
        (
            self.x_dev + f64::from(i) * self.dx,
            self.y_dev + f64::from(j) * self.dy,
        )
    }

    /// Local coordinates of the four area corners: `(0,0)`, `(nx-1,0)`,
    /// `(nx-1,ny-1)`, `(0,ny-1)`.
    pub fn local_corners(&self) -> [(f64, f64); 4] {
        let (last_i, last_j) = (self.nx - 1, self.ny - 1);
        [
            self.local_position(0, 0),
            self.local_position(last_i, 0),
            self.local_position(last_i, last_j),
            self.local_position(0, last_j),
        ]
    }

    /// Back to the raw descriptor.
    pub fn params(&self) -> AreaParams {
        AreaParams {
            x_dev: self.x_dev,
            y_dev: self.y_dev,
            dx: self.dx,
            dy: self.dy,
            nx: self.nx,
            ny: self.ny,
            start_direction: self.start_direction.as_i32(),
        }
    }
}

impl TryFrom<AreaParams> for AreaSpec {
    type Error = CitsError;

    fn try_from(params: AreaParams) -> CitsResult<Self> {
        AreaSpec::new(params)
    }
}

impl From<AreaSpec> for AreaParams {
    fn from(area: AreaSpec) -> Self {
        area.params()
    }
}
