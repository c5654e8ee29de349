//! Writers for event results.
//!
//! # Output Layout
//!
//! ```text
//! <dir>/
//!   conf_reminder.json      configuration of the run
//!   np_files/x_list.txt     abscissa, one value per line
//!   np_files/t_list.txt     recorded times
//!   np_files/y_matrix.txt   depth, one row per time
//!   np_files/z_matrix.txt   bed elevation
//!   np_files/h_matrix.txt   energy head
//!   txt_files/<t>.txt       snapshot `x h z H` every backup time step
//!   txt_files/depth_max.txt      `x hmax tmax`
//!   txt_files/elevation_max.txt  `x zmax tmax`
//!   txt_files/head_max.txt       `x Hmax tmax`
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use super::datafile::{DataFileError, DataTable};
use crate::analysis::Envelope;
use crate::time::EventResult;

/// Error type for result writing.
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    DataFile(#[from] DataFileError),

    #[error("cannot serialise configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backup time step must be positive, got {0}")]
    InvalidBackupStep(f64),
}

/// Raw arrays directory.
pub const ARRAY_DIR: &str = "np_files";
/// Text tables directory.
pub const TABLE_DIR: &str = "txt_files";

/// Transpose a `[time][section]` matrix into per-section columns.
fn matrix_table(matrix: &[Vec<f64>]) -> Result<DataTable, DataFileError> {
    let n = matrix.first().map_or(0, Vec::len);
    let columns = (0..n).map(|i| matrix.iter().map(|row| row[i]).collect()).collect();
    DataTable::without_header(columns)
}

fn envelope_table(envelope: &Envelope, name: &str) -> Result<DataTable, DataFileError> {
    DataTable::new(
        ["x", name, "tmax"],
        vec![
            envelope.abscissa.clone(),
            envelope.max.clone(),
            envelope.time_of_max.clone(),
        ],
    )
}

/// Indices of the recorded times written as snapshots.
///
/// A time is kept once it reaches the next backup time, which then
/// advances by one backup step.
pub fn snapshot_indices(time: &[f64], backup_time_step: f64) -> Vec<usize> {
    let mut next = 0.0;
    let mut indices = Vec::new();
    for (k, &t) in time.iter().enumerate() {
        if t >= next {
            next += backup_time_step;
            indices.push(k);
        }
    }
    indices
}

/// Write every result file under `dir`, returning the snapshot paths.
pub fn write_results<P: AsRef<Path>>(
    dir: P,
    result: &EventResult,
    backup_time_step: f64,
) -> Result<Vec<PathBuf>, ResultsError> {
    if !(backup_time_step > 0.0) {
        return Err(ResultsError::InvalidBackupStep(backup_time_step));
    }
    let dir = dir.as_ref();
    let arrays = dir.join(ARRAY_DIR);
    let tables = dir.join(TABLE_DIR);
    fs::create_dir_all(&arrays)?;
    fs::create_dir_all(&tables)?;

    DataTable::without_header(vec![result.abscissa.clone()])?.write(arrays.join("x_list.txt"))?;
    DataTable::without_header(vec![result.time.clone()])?.write(arrays.join("t_list.txt"))?;
    matrix_table(&result.depth)?.write(arrays.join("y_matrix.txt"))?;
    matrix_table(&result.bed)?.write(arrays.join("z_matrix.txt"))?;
    matrix_table(&result.energy)?.write(arrays.join("h_matrix.txt"))?;

    let mut snapshots = Vec::new();
    for k in snapshot_indices(&result.time, backup_time_step) {
        let path = tables.join(format!("{:.0}.txt", result.time[k]));
        DataTable::new(
            ["x", "h", "z", "H"],
            vec![
                result.abscissa.clone(),
                result.depth[k].clone(),
                result.bed[k].clone(),
                result.energy[k].clone(),
            ],
        )?
        .write(&path)?;
        snapshots.push(path);
    }

    envelope_table(&Envelope::depth(result), "hmax")?.write(tables.join("depth_max.txt"))?;
    envelope_table(&Envelope::bed(result), "zmax")?.write(tables.join("elevation_max.txt"))?;
    envelope_table(&Envelope::energy(result), "Hmax")?.write(tables.join("head_max.txt"))?;

    log::info!(
        "results written to {} ({} snapshots)",
        dir.display(),
        snapshots.len()
    );
    Ok(snapshots)
}

/// Save the run configuration next to the results.
pub fn write_config_reminder<P: AsRef<Path>, T: Serialize>(
    dir: P,
    config: &T,
) -> Result<PathBuf, ResultsError> {
    let path = dir.as_ref().join("conf_reminder.json");
    fs::write(&path, serde_json::to_string_pretty(config)?)?;
    Ok(path)
}
