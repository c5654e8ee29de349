//! Project configuration.
//!
//! A project is described by one JSON file:
//!
//! ```text
//! {
//!   "NAME": "torrent", "PROFILE_PATH": "profile.txt", "SECTION": "rectangular",
//!   "LAVABRE": true, "DURATION": 7200, "TM": 1800, "QM": 40, "QB": 1, "ALPHA": 2, "DT": 60,
//!   "TRANSPORT_LAW": "Rickenmann1990", "UPSTREAM_SLOPE": 5.0, "UPSTREAM_WIDTH": 4.0,
//!   "GRANULOMETRY_FILES": ["granulometry.json"],
//!   "INTERPOLATION": true, "DX": 5.0, "CRITICAL": false, "FRICTION_LAW": "Ferguson",
//!   "UPSTREAM_CONDITION": "critical_depth", "DOWNSTREAM_CONDITION": "normal_depth",
//!   "SPEED_COEF": 0.5, "BACKUP_TIME_STEP": 600, "PERF": false
//! }
//! ```
//!
//! Relative paths are resolved against the directory of the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::boundary::{HydrogramError, LavabreParams};
use crate::mesh::{SectionKind, UnknownSectionKind};
use crate::sediment::{TransportLawKind, UnknownTransportLaw};
use crate::solver::{BoundaryCondition, UnknownBoundaryCondition};
use crate::source::{FrictionLaw, UnknownFrictionLaw};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Missing(&'static str),

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error(transparent)]
    Hydrogram(#[from] HydrogramError),

    #[error(transparent)]
    SectionKind(#[from] UnknownSectionKind),

    #[error(transparent)]
    TransportLaw(#[from] UnknownTransportLaw),

    #[error(transparent)]
    FrictionLaw(#[from] UnknownFrictionLaw),

    #[error(transparent)]
    BoundaryCondition(#[from] UnknownBoundaryCondition),
}

fn default_speed_coef() -> f64 {
    0.5
}

/// Contents of a project configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ProjectConfig {
    pub name: String,
    pub profile_path: PathBuf,
    pub section: String,

    #[serde(default)]
    pub lavabre: bool,
    pub duration: Option<f64>,
    pub tm: Option<f64>,
    pub qm: Option<f64>,
    pub qb: Option<f64>,
    pub alpha: Option<f64>,
    pub dt: Option<f64>,
    pub hydrogram_path: Option<PathBuf>,

    pub transport_law: String,
    /// Slope of the supply reach, in percent
    pub upstream_slope: f64,
    pub upstream_width: f64,
    pub granulometry_files: Vec<PathBuf>,

    #[serde(default)]
    pub interpolation: bool,
    pub dx: Option<f64>,

    #[serde(default)]
    pub critical: bool,
    pub friction_law: Option<String>,
    pub upstream_condition: String,
    pub downstream_condition: String,

    #[serde(default = "default_speed_coef")]
    pub speed_coef: f64,
    pub backup_time_step: f64,
    #[serde(default)]
    pub perf: bool,
}

impl ProjectConfig {
    /// Parse a configuration from JSON text, without path resolution.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read, resolve and validate a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Make relative paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &Path| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.to_path_buf()
            }
        };
        self.profile_path = resolve(&self.profile_path);
        self.hydrogram_path = self.hydrogram_path.as_deref().map(resolve);
        self.granulometry_files = self.granulometry_files.iter().map(|p| resolve(p)).collect();
    }

    /// Check names and the options required by the chosen modes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.section_kind()?;
        self.transport_law_kind()?;
        self.boundary_conditions()?;
        self.friction()?;

        if self.lavabre {
            self.lavabre_params()?.validate()?;
        } else if self.hydrogram_path.is_none() {
            return Err(ConfigError::Missing(
                "HYDROGRAM_PATH is required when LAVABRE is false",
            ));
        }

        if self.interpolation {
            match self.dx {
                None => {
                    return Err(ConfigError::Missing(
                        "DX is required when INTERPOLATION is true",
                    ));
                }
                Some(dx) if !(dx > 0.0) => {
                    return Err(ConfigError::NonPositive {
                        name: "DX",
                        value: dx,
                    });
                }
                Some(_) => {}
            }
        }

        if self.granulometry_files.is_empty() {
            return Err(ConfigError::Missing(
                "GRANULOMETRY_FILES must list at least one file",
            ));
        }

        let positive = [
            ("SPEED_COEF", self.speed_coef),
            ("BACKUP_TIME_STEP", self.backup_time_step),
            ("UPSTREAM_WIDTH", self.upstream_width),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        Ok(())
    }

    pub fn section_kind(&self) -> Result<SectionKind, ConfigError> {
        Ok(self.section.parse()?)
    }

    pub fn transport_law_kind(&self) -> Result<TransportLawKind, ConfigError> {
        Ok(self.transport_law.parse()?)
    }

    /// Friction law; optional under the critical-depth hypothesis.
    pub fn friction(&self) -> Result<FrictionLaw, ConfigError> {
        match (&self.friction_law, self.critical) {
            (Some(name), _) => Ok(name.parse()?),
            (None, true) => Ok(FrictionLaw::default()),
            (None, false) => Err(ConfigError::Missing(
                "FRICTION_LAW is required when CRITICAL is false",
            )),
        }
    }

    /// (upstream, downstream) boundary conditions.
    pub fn boundary_conditions(&self) -> Result<(BoundaryCondition, BoundaryCondition), ConfigError> {
        Ok((
            self.upstream_condition.parse()?,
            self.downstream_condition.parse()?,
        ))
    }

    /// Upstream supply slope as a ratio.
    pub fn upstream_slope_ratio(&self) -> f64 {
        self.upstream_slope * 0.01
    }

    /// Lavabre parameters; every one must be present.
    pub fn lavabre_params(&self) -> Result<LavabreParams, ConfigError> {
        let need = |value: Option<f64>, message: &'static str| value.ok_or(ConfigError::Missing(message));
        Ok(LavabreParams {
            duration: need(self.duration, "DURATION is required when LAVABRE is true")?,
            tm: need(self.tm, "TM is required when LAVABRE is true")?,
            qm: need(self.qm, "QM is required when LAVABRE is true")?,
            qb: need(self.qb, "QB is required when LAVABRE is true")?,
            alpha: need(self.alpha, "ALPHA is required when LAVABRE is true")?,
            dt: need(self.dt, "DT is required when LAVABRE is true")?,
        })
    }
}
