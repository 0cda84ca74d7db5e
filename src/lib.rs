//! Grid-point geometry for CITS (current imaging tunneling spectroscopy)
//! runs on a scanning-probe microscope.
//!
//! Given the instrument's scan frame (center, range, rotation) and one or
//! more local areas (offset, pitch, point count, start direction), this crate
//! produces the absolute stage coordinates of every spectroscopy point in
//! serpentine order, plus plot-ready preview geometry. Everything here is
//! pure and synchronous; hardware is reached only through the
//! [`runner::PointAction`] seam.
//!
//! Pipeline: [`validation`] → [`grid`] → [`frame`] → [`plan`], and separately
//! [`preview`] for display.

pub mod area;
pub mod automove;
pub mod config;
pub mod error;
pub mod frame;
pub mod grid;
pub mod plan;
pub mod preview;
pub mod runner;
pub mod scanlines;
pub mod validation;

pub use area::{AreaParams, AreaSpec, StartDirection};
pub use error::{CitsError, CitsResult};
pub use frame::{to_absolute, to_relative, ScanFrame};
pub use grid::{generate, LocalPoint};
pub use plan::{compose, GridPoint, MeasurementPlan};
pub use preview::{project, PreviewGeometry};
pub use validation::validate;
