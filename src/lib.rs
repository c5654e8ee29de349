//! # evofond
//!
//! One-dimensional hydraulics and bed evolution of steep channels during a
//! flood event.
//!
//! This crate provides:
//! - Cross-section geometry and hydraulics (rectangular, trapezoidal, irregular)
//! - A longitudinal profile with orientation normalisation and refinement
//! - A backwater solver (Heun integration, critical/normal depth boundaries)
//! - Eight empirical bedload transport laws
//! - A transient event loop coupling hydraulics and Exner bed updates
//! - Hydrogram generation, data files, configuration and result writers

pub mod analysis;
pub mod boundary;
pub mod config;
pub mod constants;
pub mod io;
pub mod mesh;
pub mod sediment;
pub mod simulation;
pub mod solver;
pub mod source;
pub mod time;

// Re-export main types for convenience
pub use analysis::{Envelope, Performance};
pub use boundary::{Hydrogram, LavabreParams};
pub use config::ProjectConfig;
pub use mesh::{BedUpdate, Profile, Section, SectionKind, SectionShape};
pub use sediment::{Granulometry, TransportLaw, TransportLawKind};
pub use simulation::Project;
pub use solver::{BoundaryCondition, DepthProfile, compute_depth, critical_depth, normal_depth};
pub use source::FrictionLaw;
pub use time::{EventConfig, EventResult, compute_event};
