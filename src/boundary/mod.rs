//! Upstream boundary forcing.
//!
//! - Hydrogram: synthetic Lavabre flood or measured `t Q` series
//! - Sedimentogram: solid supply computed from the hydrogram

mod hydrogram;

pub use hydrogram::{Hydrogram, HydrogramError, LavabreParams};
