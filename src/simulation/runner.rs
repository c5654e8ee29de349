//! Project runner.
//!
//! Ties a configuration to the objects of a run: granulometries,
//! hydrogram, profile, transport law and upstream sedimentogram.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::analysis::Performance;
use crate::boundary::{Hydrogram, HydrogramError};
use crate::config::{ConfigError, ProjectConfig};
use crate::io::{GranulometryFileError, ProfileFileError, read_granulometry, read_profile};
use crate::mesh::{Profile, ProfileError};
use crate::sediment::{Granulometry, TransportLaw};
use crate::solver::{BackwaterError, DepthProfile, compute_depth};
use crate::time::{EventConfig, EventError, EventResult, compute_event};

/// Errors raised while loading or running a project.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("granulometry file {path}: {source}")]
    Granulometry {
        path: String,
        #[source]
        source: GranulometryFileError,
    },

    #[error(transparent)]
    Hydrogram(#[from] HydrogramError),

    #[error(transparent)]
    ProfileFile(#[from] ProfileFileError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Backwater(#[from] BackwaterError),

    #[error(transparent)]
    Event(#[from] EventError),
}

/// Everything needed to compute an event.
pub struct Project {
    pub config: ProjectConfig,
    pub granulometries: Vec<Arc<Granulometry>>,
    pub hydrogram: Hydrogram,
    pub profile: Profile,
    pub law: Box<dyn TransportLaw>,
    /// Solid discharge supplied upstream at each hydrogram sample
    pub sedimentogram: Vec<f64>,
    /// Filled when the configuration enables `PERF`
    pub performance: Option<Performance>,
}

impl Project {
    /// Load a project from its configuration file.
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self, RunError> {
        let config = ProjectConfig::from_file(config_path)?;
        Self::from_config(config)
    }

    /// Build a project from a validated configuration with resolved paths.
    pub fn from_config(config: ProjectConfig) -> Result<Self, RunError> {
        let granulometries = config
            .granulometry_files
            .iter()
            .map(|path| {
                read_granulometry(path).map(Arc::new).map_err(|source| RunError::Granulometry {
                    path: path.display().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let hydrogram = if config.lavabre {
            Hydrogram::lavabre(&config.lavabre_params()?)?
        } else {
            let path = config.hydrogram_path.as_ref().ok_or(ConfigError::Missing(
                "HYDROGRAM_PATH is required when LAVABRE is false",
            ))?;
            Hydrogram::read(path)?
        };

        let sections = read_profile(&config.profile_path, config.section_kind()?, &granulometries)?;
        let mut profile = Profile::new(config.name.clone(), sections)?;
        if config.interpolation {
            let dx = config
                .dx
                .ok_or(ConfigError::Missing("DX is required when INTERPOLATION is true"))?;
            profile.complete(dx)?;
        }

        let law = config.transport_law_kind()?.law();
        let upstream_granulometry = profile.sections()[0].granulometry().clone();
        let sedimentogram = hydrogram.sedimentogram(
            law.as_ref(),
            config.upstream_width,
            &upstream_granulometry,
            config.upstream_slope_ratio(),
        );

        log::info!(
            "project '{}': {} sections, {} hydrogram samples, peak {:.2} m³/s, law {}",
            config.name,
            profile.len(),
            hydrogram.len(),
            hydrogram.peak().1,
            law.name()
        );

        let performance = config.perf.then(Performance::new);
        Ok(Self {
            config,
            granulometries,
            hydrogram,
            profile,
            law,
            sedimentogram,
            performance,
        })
    }

    /// Parameters of the event loop.
    pub fn event_config(&self) -> Result<EventConfig, RunError> {
        let (upstream, downstream) = self.config.boundary_conditions()?;
        Ok(EventConfig {
            friction: self.config.friction()?,
            speed_coef: self.config.speed_coef,
            critical: self.config.critical,
            upstream,
            downstream,
            ..EventConfig::default()
        })
    }

    /// Compute the flood event, mutating the profile bed.
    pub fn run(&mut self) -> Result<EventResult, RunError> {
        let event = self.event_config()?;
        if let Some(perf) = self.performance.as_mut() {
            perf.start();
        }
        let result = compute_event(
            &mut self.profile,
            self.hydrogram.time(),
            self.hydrogram.discharge(),
            &self.sedimentogram,
            self.law.as_ref(),
            &event,
            self.performance.as_mut(),
        );
        if let Some(perf) = self.performance.as_mut() {
            perf.stop();
        }
        Ok(result?)
    }

    /// Steady depths along the current profile for one discharge.
    pub fn hydraulics(&self, discharge: f64) -> Result<DepthProfile, RunError> {
        let event = self.event_config()?;
        let (upstream, downstream) = event.boundary_conditions();
        let state = compute_depth(
            &self.profile,
            discharge,
            event.friction,
            upstream,
            downstream,
        )?;
        for &i in &state.clamped {
            let section = &self.profile.sections()[i];
            log::warn!(
                "depth reaches the maximum {:.3} m at x = {:.2}, clamped",
                section.y_max(),
                section.x()
            );
        }
        Ok(state)
    }
}
