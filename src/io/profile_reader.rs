//! Reader for longitudinal profile and granulometry files.
//!
//! # Profile File Format
//!
//! ```text
//! x z b zmin ymax granulometry manning
//! 0.0 102.5 4.0 101.0 3.0 1 0.045
//! 10.0 101.9 4.2 100.4 3.0 1 0.045
//! ```
//!
//! `x z b` are required, `s` too for trapezoidal sections. Missing optional
//! columns fall back to defaults with a warning:
//!
//! - `zmin`: the initial bed elevation (no erosion below it)
//! - `ymax`: 1000 m
//! - `granulometry`: 1, the first granulometry (indices are 1-based)
//! - `manning`: d90^{1/6} / 26 from the section granulometry
//!
//! # Granulometry File Format
//!
//! ```text
//! {"dm": 0.05, "d30": 0.02, "d50": 0.04, "d90": 0.15,
//!  "d84tb": 0.09, "d84bs": 0.2, "Gr": 2.5}
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use super::datafile::{DataFileError, DataTable};
use crate::mesh::{Section, SectionError, SectionKind};
use crate::sediment::{Granulometry, GranulometryError};

/// Error type for profile file reading.
#[derive(Debug, Error)]
pub enum ProfileFileError {
    #[error(transparent)]
    DataFile(#[from] DataFileError),

    #[error("at least one granulometry is required")]
    NoGranulometry,

    #[error("row {row}: granulometry index {index} out of range 1..={available}")]
    GranulometryIndex {
        row: usize,
        index: f64,
        available: usize,
    },

    #[error("row {row}: {source}")]
    Section {
        row: usize,
        #[source]
        source: SectionError,
    },
}

/// Error type for granulometry file reading.
#[derive(Debug, Error)]
pub enum GranulometryFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid granulometry JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] GranulometryError),
}

/// Read a granulometry JSON file.
pub fn read_granulometry<P: AsRef<Path>>(path: P) -> Result<Granulometry, GranulometryFileError> {
    let text = fs::read_to_string(path.as_ref())?;
    let granulometry: Granulometry = serde_json::from_str(&text)?;
    granulometry.validate()?;
    Ok(granulometry)
}

/// Read profile sections from a file.
pub fn read_profile<P: AsRef<Path>>(
    path: P,
    kind: SectionKind,
    granulometries: &[Arc<Granulometry>],
) -> Result<Vec<Section>, ProfileFileError> {
    let table = DataTable::read(path)?;
    sections_from_table(&table, kind, granulometries)
}

/// Build sections from a parsed profile table.
pub fn sections_from_table(
    table: &DataTable,
    kind: SectionKind,
    granulometries: &[Arc<Granulometry>],
) -> Result<Vec<Section>, ProfileFileError> {
    if granulometries.is_empty() {
        return Err(ProfileFileError::NoGranulometry);
    }

    let x = table.column("x")?;
    let z = table.column("z")?;
    let b = table.column("b")?;
    let s = match kind {
        SectionKind::Trapezoidal => Some(table.column("s")?),
        SectionKind::Rectangular => None,
    };

    let z_min = table.optional_column("zmin");
    if z_min.is_none() {
        log::warn!("no 'zmin' column: floor elevation set equal to z");
    }
    let y_max = table.optional_column("ymax");
    if y_max.is_none() {
        log::warn!("no 'ymax' column: maximum depth set to its default value");
    }
    let granulometry_index = table.optional_column("granulometry");
    if granulometry_index.is_none() {
        log::warn!("no 'granulometry' column: first granulometry used everywhere");
    }
    let manning = table.optional_column("manning");
    if manning.is_none() {
        log::warn!("no 'manning' column: roughness computed from the granulometry");
    }

    let mut sections = Vec::with_capacity(table.n_rows());
    for row in 0..table.n_rows() {
        let granulometry = match granulometry_index {
            Some(index) => {
                let value = index[row];
                let i = value.round() as i64 - 1;
                if value.fract() != 0.0 || i < 0 || i as usize >= granulometries.len() {
                    return Err(ProfileFileError::GranulometryIndex {
                        row: row + 1,
                        index: value,
                        available: granulometries.len(),
                    });
                }
                Arc::clone(&granulometries[i as usize])
            }
            None => Arc::clone(&granulometries[0]),
        };

        let section = build_section(
            kind,
            x[row],
            z[row],
            b[row],
            s.map(|s| s[row]),
            granulometry,
            z_min.map(|c| c[row]),
            y_max.map(|c| c[row]),
            manning.map(|c| c[row]),
        )
        .map_err(|source| ProfileFileError::Section {
            row: row + 1,
            source,
        })?;
        sections.push(section);
    }
    Ok(sections)
}

#[allow(clippy::too_many_arguments)]
fn build_section(
    kind: SectionKind,
    x: f64,
    z: f64,
    b: f64,
    s: Option<f64>,
    granulometry: Arc<Granulometry>,
    z_min: Option<f64>,
    y_max: Option<f64>,
    manning: Option<f64>,
) -> Result<Section, SectionError> {
    let mut section = match (kind, s) {
        (SectionKind::Trapezoidal, Some(s)) => Section::trapezoidal(x, z, b, s, granulometry)?,
        _ => Section::rectangular(x, z, b, granulometry)?,
    };
    if let Some(z_min) = z_min {
        section = section.with_z_min(z_min)?;
    }
    if let Some(y_max) = y_max {
        section = section.with_y_max(y_max);
    }
    if let Some(manning) = manning {
        section = section.with_manning(manning)?;
    }
    Ok(section)
}
