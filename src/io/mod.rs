//! I/O utilities for reading and writing data files.
//!
//! This module provides:
//! - **Data tables**: whitespace-delimited numeric columns with a header row
//! - **Profiles**: cross-sections built from a profile table
//! - **Granulometry**: JSON grain-size records
//! - **Results**: raw arrays, snapshots and envelopes of an event
//!
//! # Example
//!
//! ```ignore
//! use evofond::io::{DataTable, read_profile};
//! use evofond::mesh::SectionKind;
//!
//! let table = DataTable::read("profile.txt")?;
//! let z = table.column("z")?;
//! let sections = read_profile("profile.txt", SectionKind::Rectangular, &granulometries)?;
//! ```

mod datafile;
mod profile_reader;
mod results;

pub use datafile::{DataFileError, DataTable};
pub use profile_reader::{
    GranulometryFileError, ProfileFileError, read_granulometry, read_profile, sections_from_table,
};
pub use results::{
    ARRAY_DIR, ResultsError, TABLE_DIR, snapshot_indices, write_config_reminder, write_results,
};
