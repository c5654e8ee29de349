//! Physical and numerical constants shared by the hydraulic and sediment code.

/// Gravitational acceleration (m/s²)
pub const G: f64 = 9.81;

/// Sediment to water density ratio (quartz, ρs/ρ)
pub const RELATIVE_DENSITY: f64 = 2.65;

/// Bed porosity used by the Exner mass balance
pub const POROSITY: f64 = 0.35;

/// Smallest depth the solver will work with (m)
pub const Y_MIN: f64 = 1e-4;

/// Maximum admissible depth when none is given (m)
pub const Y_MAX_DEFAULT: f64 = 1000.0;
