//! Upstream forcing: water discharge and solid supply over time.
//!
//! The synthetic Lavabre flood is
//!
//! Q(t) = QB + (QM - QB) · 2 (t/TM)^α / (1 + (t/TM)^{2α})
//!
//! which starts at the baseflow QB, peaks at QM for t = TM and decays back
//! toward QB. A measured hydrogram can be read from a two-column file
//! `t Q` (optional header line).

use std::path::Path;

use thiserror::Error;

use crate::io::{DataFileError, DataTable};
use crate::sediment::{Granulometry, TransportLaw};

/// Errors raised while building a hydrogram.
#[derive(Debug, Error)]
pub enum HydrogramError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("hydrogram data must have exactly 2 columns (t Q), found {0}")]
    ColumnCount(usize),

    #[error("time and discharge have different lengths ({0} and {1})")]
    LengthMismatch(usize, usize),

    #[error("hydrogram has no samples")]
    Empty,

    #[error("time must be strictly increasing (sample {index}, t = {value})")]
    NonIncreasingTime { index: usize, value: f64 },

    #[error("discharge must be finite and non-negative (sample {index}, Q = {value})")]
    InvalidDischarge { index: usize, value: f64 },

    #[error(transparent)]
    DataFile(#[from] DataFileError),
}

/// Parameters of the synthetic Lavabre flood.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LavabreParams {
    /// Length of the event (s)
    pub duration: f64,
    /// Time of the peak (s)
    pub tm: f64,
    /// Peak discharge (m³/s)
    pub qm: f64,
    /// Baseflow (m³/s)
    pub qb: f64,
    /// Shape exponent
    pub alpha: f64,
    /// Sampling step (s)
    pub dt: f64,
}

impl LavabreParams {
    /// Every parameter must be strictly positive.
    pub fn validate(&self) -> Result<(), HydrogramError> {
        let values = [
            ("DURATION", self.duration),
            ("DT", self.dt),
            ("TM", self.tm),
            ("QM", self.qm),
            ("QB", self.qb),
            ("ALPHA", self.alpha),
        ];
        for (name, value) in values {
            if !(value > 0.0 && value.is_finite()) {
                return Err(HydrogramError::NonPositive { name, value });
            }
        }
        Ok(())
    }

    /// Discharge at time `t`.
    pub fn discharge(&self, t: f64) -> f64 {
        let r = (t / self.tm).max(0.0).powf(self.alpha);
        self.qb + (self.qm - self.qb) * 2.0 * r / (1.0 + r * r)
    }
}

/// Sampled discharge series.
#[derive(Clone, Debug, PartialEq)]
pub struct Hydrogram {
    time: Vec<f64>,
    discharge: Vec<f64>,
}

impl Hydrogram {
    /// Lavabre flood sampled at k·DT for k·DT <= DURATION.
    pub fn lavabre(params: &LavabreParams) -> Result<Self, HydrogramError> {
        params.validate()?;
        let n = (params.duration / params.dt + 1e-9).floor() as usize;
        let time: Vec<f64> = (0..=n).map(|k| k as f64 * params.dt).collect();
        let discharge = time.iter().map(|&t| params.discharge(t)).collect();
        Ok(Self { time, discharge })
    }

    /// Hydrogram from caller-supplied samples.
    pub fn from_series(time: Vec<f64>, discharge: Vec<f64>) -> Result<Self, HydrogramError> {
        if time.len() != discharge.len() {
            return Err(HydrogramError::LengthMismatch(time.len(), discharge.len()));
        }
        if time.is_empty() {
            return Err(HydrogramError::Empty);
        }
        if let Some(index) = (1..time.len()).find(|&k| !(time[k] > time[k - 1])) {
            return Err(HydrogramError::NonIncreasingTime {
                index,
                value: time[index],
            });
        }
        if let Some(index) = discharge.iter().position(|q| !(*q >= 0.0 && q.is_finite())) {
            return Err(HydrogramError::InvalidDischarge {
                index,
                value: discharge[index],
            });
        }
        Ok(Self { time, discharge })
    }

    /// Read a two-column `t Q` file.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, HydrogramError> {
        let table = DataTable::read(path)?;
        Self::from_table(&table)
    }

    /// Hydrogram from a parsed table of exactly two columns.
    pub fn from_table(table: &DataTable) -> Result<Self, HydrogramError> {
        match (table.n_columns(), table.column_at(0), table.column_at(1)) {
            (2, Some(t), Some(q)) => Self::from_series(t.to_vec(), q.to_vec()),
            (n, _, _) => Err(HydrogramError::ColumnCount(n)),
        }
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn discharge(&self) -> &[f64] {
        &self.discharge
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Time between the first and last samples.
    pub fn duration(&self) -> f64 {
        self.time[self.time.len() - 1] - self.time[0]
    }

    /// Time and value of the largest discharge.
    pub fn peak(&self) -> (f64, f64) {
        self.time
            .iter()
            .zip(&self.discharge)
            .fold((self.time[0], self.discharge[0]), |best, (&t, &q)| {
                if q > best.1 { (t, q) } else { best }
            })
    }

    /// Discharge at time `t`, linear between samples and held outside.
    pub fn discharge_at(&self, t: f64) -> f64 {
        let n = self.time.len();
        if t <= self.time[0] {
            return self.discharge[0];
        }
        if t >= self.time[n - 1] {
            return self.discharge[n - 1];
        }
        let k = self.time.partition_point(|&ti| ti <= t) - 1;
        let w = (t - self.time[k]) / (self.time[k + 1] - self.time[k]);
        self.discharge[k] + w * (self.discharge[k + 1] - self.discharge[k])
    }

    /// Solid discharge supplied upstream at each sample.
    ///
    /// The supply reach is described by its width, bed material and slope.
    pub fn sedimentogram(
        &self,
        law: &dyn TransportLaw,
        width: f64,
        granulometry: &Granulometry,
        slope: f64,
    ) -> Vec<f64> {
        self.discharge
            .iter()
            .map(|&q| law.solid_discharge(width, granulometry, q, slope))
            .collect()
    }

    /// Samples as a `t Q` table.
    pub fn to_table(&self) -> Result<DataTable, DataFileError> {
        DataTable::new(["t", "Q"], vec![self.time.clone(), self.discharge.clone()])
    }
}
