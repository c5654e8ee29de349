//! Steady hydraulic solver.
//!
//! # Submodules
//!
//! - [`backwater`]: Heun integration of the gradually-varied flow equation
//!   between critical- or normal-depth boundaries

pub mod backwater;

pub use backwater::{
    BackwaterError, BoundaryCondition, DepthProfile, MIN_DENOMINATOR, UnknownBoundaryCondition,
    compute_depth, critical_depth, normal_depth,
};
