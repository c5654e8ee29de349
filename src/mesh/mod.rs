//! Channel geometry.
//!
//! Provides the data structures of a longitudinal profile:
//! - Cross-sections (rectangular, trapezoidal, irregular) and their hydraulics
//! - Wet-polygon clipping for irregular sections
//! - The ordered profile with orientation normalisation and refinement

mod polygon;
mod profile;
mod section;

pub use polygon::{WetProperties, bank_height, wet_polygon, wet_properties};
pub use profile::{Profile, ProfileError};
pub use section::{
    BedUpdate, Section, SectionError, SectionKind, SectionShape, UnknownSectionKind,
};
