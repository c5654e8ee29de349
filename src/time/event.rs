//! Transient flood event with bed evolution.
//!
//! The event loop alternates a steady backwater solve with an explicit
//! Exner update of every section:
//!
//! 1. depths for the current discharge and bed
//! 2. energy slope toward the downstream neighbour at each section
//! 3. sections updated from upstream to downstream, each passing its
//!    outgoing solid discharge to the next one
//!
//! The internal step obeys dt <= speed_coef * dx_min / max(|V| + √(g y))
//! and never jumps over a hydrogram sample, where the state is recorded.
//! A CFL step shorter than `min_dt` aborts the event.

use std::time::Instant;

use thiserror::Error;

use crate::analysis::Performance;
use crate::mesh::{BedUpdate, Profile, SectionError};
use crate::sediment::TransportLaw;
use crate::solver::{BackwaterError, BoundaryCondition, DepthProfile, compute_depth};
use crate::source::FrictionLaw;

/// Errors that abort an event computation.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("time, discharge and sedimentogram must have the same length ({time}, {discharge}, {sediment})")]
    LengthMismatch {
        time: usize,
        discharge: usize,
        sediment: usize,
    },

    #[error("the hydrogram needs at least one sample")]
    Empty,

    #[error("time must be strictly increasing (t[{index}] = {value})")]
    NonIncreasingTime { index: usize, value: f64 },

    #[error("speed coefficient must be positive, got {0}")]
    InvalidSpeedCoef(f64),

    #[error("CFL time step {dt:.3e} s is below the minimum {min_dt:.3e} s (fastest wave at x = {x}, t = {t})")]
    TimeStepTooSmall { dt: f64, min_dt: f64, x: f64, t: f64 },

    #[error("non-finite {quantity} at x = {x}, t = {t}")]
    NonFinite {
        quantity: &'static str,
        x: f64,
        t: f64,
    },

    #[error(transparent)]
    Backwater(#[from] BackwaterError),

    #[error(transparent)]
    Section(#[from] SectionError),
}

/// Parameters of an event computation.
#[derive(Clone, Debug)]
pub struct EventConfig {
    /// Friction closure of the backwater solve
    pub friction: FrictionLaw,
    /// Safety factor on the CFL time step
    pub speed_coef: f64,
    /// Impose critical depth at both ends
    pub critical: bool,
    /// Upstream boundary condition
    pub upstream: BoundaryCondition,
    /// Downstream boundary condition
    pub downstream: BoundaryCondition,
    /// Shortest CFL step accepted before the event is aborted (s)
    pub min_dt: f64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            friction: FrictionLaw::ManningStrickler,
            speed_coef: 0.5,
            critical: false,
            upstream: BoundaryCondition::CriticalDepth,
            downstream: BoundaryCondition::NormalDepth,
            min_dt: 1e-6,
        }
    }
}

impl EventConfig {
    /// Boundary conditions actually applied.
    pub fn boundary_conditions(&self) -> (BoundaryCondition, BoundaryCondition) {
        if self.critical {
            (BoundaryCondition::CriticalDepth, BoundaryCondition::CriticalDepth)
        } else {
            (self.upstream, self.downstream)
        }
    }
}

/// Time series of the profile state, one row per recorded time.
#[derive(Clone, Debug, Default)]
pub struct EventResult {
    /// Section positions (m)
    pub abscissa: Vec<f64>,
    /// Recorded times (s)
    pub time: Vec<f64>,
    /// Water depth, `depth[k][i]` at time k and section i
    pub depth: Vec<Vec<f64>>,
    /// Bed elevation
    pub bed: Vec<Vec<f64>>,
    /// Energy head
    pub energy: Vec<Vec<f64>>,
    /// Internal steps taken over the event
    pub n_internal_steps: usize,
    /// Solid volume that entered at the upstream end (m³)
    pub volume_in: f64,
    /// Solid volume that left at the downstream end (m³)
    pub volume_out: f64,
}

impl EventResult {
    fn record(&mut self, t: f64, state: &DepthProfile) {
        self.time.push(t);
        self.depth.push(state.depth.clone());
        self.bed.push(state.bed.clone());
        self.energy.push(state.energy.clone());
    }

    /// Number of recorded times.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Linear interpolation in a sampled series, `k` being the interval index.
fn interpolate(time: &[f64], values: &[f64], k: usize, t: f64) -> f64 {
    if k + 1 >= time.len() {
        return values[time.len() - 1];
    }
    let w = ((t - time[k]) / (time[k + 1] - time[k])).clamp(0.0, 1.0);
    values[k] + w * (values[k + 1] - values[k])
}

fn check_finite(profile: &Profile, state: &DepthProfile, t: f64) -> Result<(), EventError> {
    for (i, x) in state.abscissa.iter().enumerate() {
        let quantity = if !state.depth[i].is_finite() {
            "depth"
        } else if !state.bed[i].is_finite() {
            "bed elevation"
        } else if !state.energy[i].is_finite() {
            "energy head"
        } else {
            continue;
        };
        log::error!("profile '{}': {} diverged at x = {}", profile.name(), quantity, x);
        return Err(EventError::NonFinite { quantity, x: *x, t });
    }
    Ok(())
}

/// Largest gravity-wave speed over the profile and where it occurs.
fn max_celerity(profile: &Profile, state: &DepthProfile) -> (f64, f64) {
    profile
        .sections()
        .iter()
        .zip(&state.depth)
        .map(|(s, &y)| (s.celerity(state.discharge, y), s.x()))
        .fold((0.0, f64::NAN), |best, c| if c.0 > best.0 { c } else { best })
}

/// Steady solve with the configured boundary conditions.
fn solve(
    profile: &Profile,
    q: f64,
    config: &EventConfig,
    perf: Option<&mut Performance>,
) -> Result<DepthProfile, BackwaterError> {
    let (upstream, downstream) = config.boundary_conditions();
    let start = Instant::now();
    let state = compute_depth(profile, q, config.friction, upstream, downstream);
    if let Some(p) = perf {
        p.record_hydraulics(start.elapsed());
    }
    state
}

/// Report depths clamped at `y_max`: a warning the first time a section is
/// clamped, debug afterwards. Returns the number of new warnings.
fn report_clamped(profile: &Profile, state: &DepthProfile, t: f64, warned: &mut [bool]) -> usize {
    let mut new = 0;
    for &i in &state.clamped {
        let section = &profile.sections()[i];
        if warned[i] {
            log::debug!("t = {:.1} s: depth clamped at x = {:.2}", t, section.x());
        } else {
            warned[i] = true;
            new += 1;
            log::warn!(
                "profile '{}': depth reaches the maximum {:.3} m at x = {:.2} (t = {:.1} s), clamped",
                profile.name(),
                section.y_max(),
                section.x(),
                t
            );
        }
    }
    new
}

/// Apply one Exner step to every section and return the outgoing solid discharge.
fn update_bed(
    profile: &mut Profile,
    state: &DepthProfile,
    qs_upstream: f64,
    dt: f64,
    law: &dyn TransportLaw,
) -> Result<f64, SectionError> {
    let q = state.discharge;
    let n = profile.len();
    let slopes: Vec<f64> = (0..n)
        .map(|i| profile.energy_slope(i, q, &state.depth))
        .collect();
    let lengths = profile.section_lengths();

    let mut qs = qs_upstream;
    for (i, section) in profile.sections_mut().iter_mut().enumerate() {
        let update = BedUpdate {
            discharge: q,
            depth: state.depth[i],
            slope: slopes[i],
            length: lengths[i],
            qs_in: qs,
            dt,
        };
        qs = section.update_bottom(&update, law)?;
    }
    Ok(qs)
}

/// Run a flood event over the profile, mutating bed elevations.
///
/// `time`, `discharge` and `sedimentogram` are the hydrogram samples and the
/// solid discharge supplied upstream at each sample. The state is recorded
/// at every sample time.
pub fn compute_event(
    profile: &mut Profile,
    time: &[f64],
    discharge: &[f64],
    sedimentogram: &[f64],
    law: &dyn TransportLaw,
    config: &EventConfig,
    perf: Option<&mut Performance>,
) -> Result<EventResult, EventError> {
    if time.len() != discharge.len() || time.len() != sedimentogram.len() {
        return Err(EventError::LengthMismatch {
            time: time.len(),
            discharge: discharge.len(),
            sediment: sedimentogram.len(),
        });
    }
    if time.is_empty() {
        return Err(EventError::Empty);
    }
    if let Some(k) = (1..time.len()).find(|&k| !(time[k] > time[k - 1])) {
        return Err(EventError::NonIncreasingTime {
            index: k,
            value: time[k],
        });
    }
    if !(config.speed_coef > 0.0) {
        return Err(EventError::InvalidSpeedCoef(config.speed_coef));
    }

    let mut perf = perf;
    let dx_min = profile.dx_min();

    log::info!(
        "profile '{}': event of {} samples over {} s, {} sections, law {}",
        profile.name(),
        time.len(),
        time[time.len() - 1] - time[0],
        profile.len(),
        law.name()
    );

    let mut result = EventResult {
        abscissa: profile.abscissa(),
        ..Default::default()
    };

    let mut t = time[0];
    let mut state = solve(profile, discharge[0], config, perf.as_deref_mut())?;
    check_finite(profile, &state, t)?;
    let mut warned = vec![false; profile.len()];
    report_clamped(profile, &state, t, &mut warned);
    result.record(t, &state);

    for k in 0..time.len() - 1 {
        let target = time[k + 1];
        let mut steps_in_sample = 0usize;

        while t < target {
            let (celerity, x_fastest) = max_celerity(profile, &state);
            let dt_cfl = if celerity > 0.0 {
                config.speed_coef * dx_min / celerity
            } else {
                f64::INFINITY
            };
            if dt_cfl < config.min_dt {
                log::error!(
                    "profile '{}': CFL step {:.3e} s below the minimum {:.3e} s at t = {}",
                    profile.name(),
                    dt_cfl,
                    config.min_dt,
                    t
                );
                return Err(EventError::TimeStepTooSmall {
                    dt: dt_cfl,
                    min_dt: config.min_dt,
                    x: x_fastest,
                    t,
                });
            }
            let remaining = target - t;
            let reaches_sample = dt_cfl >= remaining;
            let dt = if reaches_sample { remaining } else { dt_cfl };

            let qs_in = interpolate(time, sedimentogram, k, t);
            let start = Instant::now();
            let qs_out = update_bed(profile, &state, qs_in, dt, law)?;
            if let Some(p) = perf.as_deref_mut() {
                p.record_bed_update(start.elapsed());
            }
            result.volume_in += qs_in * dt;
            result.volume_out += qs_out * dt;
            result.n_internal_steps += 1;
            steps_in_sample += 1;

            t = if reaches_sample { target } else { t + dt };
            let q = interpolate(time, discharge, k, t);
            state = solve(profile, q, config, perf.as_deref_mut())?;
            check_finite(profile, &state, t)?;
            report_clamped(profile, &state, t, &mut warned);
        }

        log::debug!(
            "t = {:.1} s: {} internal steps, Q = {:.3} m³/s",
            target,
            steps_in_sample,
            state.discharge
        );
        result.record(target, &state);
    }

    log::info!(
        "profile '{}': event done in {} internal steps, solid volume in {:.3} m³, out {:.3} m³",
        profile.name(),
        result.n_internal_steps,
        result.volume_in,
        result.volume_out
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::POROSITY;
    use crate::mesh::Section;
    use crate::sediment::{Granulometry, Meunier1989, Rickenmann1990};
    use std::sync::Arc;

    fn torrent(n: usize, dx: f64, slope: f64) -> Profile {
        let g = Arc::new(Granulometry::new(0.05, 0.02, 0.04, 0.15, 0.09, 0.2, 2.5).unwrap());
        let sections = (0..n)
            .map(|i| {
                let x = i as f64 * dx;
                Section::rectangular(x, 100.0 - slope * x, 5.0, g.clone())
                    .unwrap()
                    .with_z_min(90.0 - slope * x)
                    .unwrap()
            })
            .collect();
        Profile::new("torrent", sections).unwrap()
    }

    fn config() -> EventConfig {
        EventConfig {
            speed_coef: 0.8,
            ..Default::default()
        }
    }

    #[test]
    fn test_interpolate() {
        let t = [0.0, 10.0, 20.0];
        let v = [1.0, 3.0, 2.0];
        assert_eq!(interpolate(&t, &v, 0, 5.0), 2.0);
        assert_eq!(interpolate(&t, &v, 1, 15.0), 2.5);
        assert_eq!(interpolate(&t, &v, 2, 25.0), 2.0);
    }

    #[test]
    fn test_records_every_sample() {
        let mut profile = torrent(11, 10.0, 0.05);
        let time = [0.0, 60.0, 120.0, 180.0];
        let q = [2.0, 8.0, 5.0, 2.0];
        let qs = [0.0; 4];
        let result =
            compute_event(&mut profile, &time, &q, &qs, &Meunier1989, &config(), None).unwrap();

        assert_eq!(result.time, time.to_vec());
        assert_eq!(result.depth.len(), 4);
        assert!(result.depth.iter().all(|row| row.len() == 11));
        assert!(result.n_internal_steps >= 3);
    }

    #[test]
    fn test_cfl_subdivides_steps() {
        let mut profile = torrent(11, 10.0, 0.05);
        let time = [0.0, 600.0];
        let q = [5.0, 5.0];
        let qs = [0.0; 2];
        let result =
            compute_event(&mut profile, &time, &q, &qs, &Meunier1989, &config(), None).unwrap();
        // Gravity waves of a few m/s cross 10 m in a few seconds
        assert!(result.n_internal_steps > 100);
    }

    /// Reach with two sections 1 cm apart.
    fn close_pair() -> Profile {
        let g = Arc::new(Granulometry::new(0.05, 0.02, 0.04, 0.15, 0.09, 0.2, 2.5).unwrap());
        let sections = [0.0, 10.0, 10.01, 20.0]
            .iter()
            .map(|&x| Section::rectangular(x, 100.0 - 0.05 * x, 4.0, g.clone()).unwrap())
            .collect();
        Profile::new("close", sections).unwrap()
    }

    #[test]
    fn test_step_never_exceeds_cfl_on_close_sections() {
        let mut profile = close_pair();
        let config = EventConfig {
            speed_coef: 0.5,
            ..Default::default()
        };
        let state = solve(&profile, 10.0, &config, None).unwrap();
        let (celerity, _) = max_celerity(&profile, &state);
        let dt_cfl = config.speed_coef * profile.dx_min() / celerity;
        assert!(dt_cfl < 1e-3);

        // Floor at the initial bed and no supply: the bed and the CFL step stay fixed
        let result = compute_event(
            &mut profile,
            &[0.0, 1.0],
            &[10.0, 10.0],
            &[0.0, 0.0],
            &Meunier1989,
            &config,
            None,
        )
        .unwrap();
        let required = (1.0 / dt_cfl).ceil() as usize;
        assert!(
            result.n_internal_steps >= required,
            "{} steps, at least {} required (dt_cfl = {:e})",
            result.n_internal_steps,
            required,
            dt_cfl
        );
    }

    #[test]
    fn test_step_below_minimum_is_an_error() {
        let mut profile = close_pair();
        let config = EventConfig {
            speed_coef: 0.5,
            min_dt: 1e-3,
            ..Default::default()
        };
        let result = compute_event(
            &mut profile,
            &[0.0, 1.0],
            &[10.0, 10.0],
            &[0.0, 0.0],
            &Meunier1989,
            &config,
            None,
        );
        match result {
            Err(EventError::TimeStepTooSmall { dt, min_dt, t, .. }) => {
                assert!(dt < min_dt);
                assert_eq!(t, 0.0);
            }
            other => panic!("expected TimeStepTooSmall, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_clamp_warning_once_per_section() {
        let g = Arc::new(Granulometry::uniform(0.05).unwrap());
        let sections = (0..4)
            .map(|i| {
                let x = i as f64 * 10.0;
                let s = Section::rectangular(x, 100.0 - 0.05 * x, 4.0, g.clone()).unwrap();
                if i == 1 { s.with_y_max(0.3) } else { s }
            })
            .collect();
        let profile = Profile::new("low bank", sections).unwrap();
        let state = solve(&profile, 10.0, &config(), None).unwrap();
        assert_eq!(state.clamped, vec![1]);

        let mut warned = vec![false; profile.len()];
        assert_eq!(report_clamped(&profile, &state, 0.0, &mut warned), 1);
        assert_eq!(report_clamped(&profile, &state, 1.0, &mut warned), 0);
        assert_eq!(warned, vec![false, true, false, false]);
    }

    #[test]
    fn test_mass_conservation() {
        let mut profile = torrent(11, 10.0, 0.05);
        let time = [0.0, 120.0, 240.0];
        let q = [3.0, 10.0, 3.0];
        let qs = [0.01, 0.05, 0.0];
        let mut perf = Performance::new();
        let result = compute_event(
            &mut profile,
            &time,
            &q,
            &qs,
            &Rickenmann1990,
            &config(),
            Some(&mut perf),
        )
        .unwrap();

        let stored = profile.stored_volume().unwrap();
        let solid_balance = result.volume_in - result.volume_out;
        assert!(
            (stored * (1.0 - POROSITY) - solid_balance).abs() < 1e-9 * (1.0 + solid_balance.abs()),
            "stored {} vs balance {}",
            stored,
            solid_balance
        );

        let lengths = profile.section_lengths();
        let from_bed: f64 = profile
            .sections()
            .iter()
            .zip(&lengths)
            .zip(&result.bed[0])
            .map(|((s, l), z0)| (s.z() - z0) * s.width() * l)
            .sum();
        assert!((from_bed - stored).abs() < 1e-9 * (1.0 + stored.abs()));

        assert_eq!(perf.n_internal_steps, result.n_internal_steps);
        assert_eq!(perf.n_backwater_solves, result.n_internal_steps + 1);
    }

    #[test]
    fn test_bed_stays_above_floor() {
        let mut profile = torrent(6, 10.0, 0.1);
        let time = [0.0, 3600.0];
        let q = [30.0, 30.0];
        let qs = [0.0; 2];
        compute_event(&mut profile, &time, &q, &qs, &Meunier1989, &config(), None).unwrap();
        for s in profile.sections() {
            assert!(s.z() >= s.z_min() - 1e-12);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let mut profile = torrent(3, 10.0, 0.05);
        let law = Meunier1989;
        assert!(matches!(
            compute_event(&mut profile, &[0.0, 1.0], &[1.0], &[0.0, 0.0], &law, &config(), None),
            Err(EventError::LengthMismatch { .. })
        ));
        assert!(matches!(
            compute_event(
                &mut profile,
                &[0.0, 0.0],
                &[1.0, 1.0],
                &[0.0, 0.0],
                &law,
                &config(),
                None
            ),
            Err(EventError::NonIncreasingTime { index: 1, .. })
        ));
        let bad = EventConfig {
            speed_coef: 0.0,
            ..config()
        };
        assert!(matches!(
            compute_event(&mut profile, &[0.0], &[1.0], &[0.0], &law, &bad, None),
            Err(EventError::InvalidSpeedCoef(_))
        ));
    }

    #[test]
    fn test_trapezoidal_profile_rejected() {
        let g = Arc::new(Granulometry::uniform(0.05).unwrap());
        let sections = vec![
            Section::trapezoidal(0.0, 10.0, 3.0, 1.0, g.clone()).unwrap(),
            Section::trapezoidal(10.0, 9.0, 3.0, 1.0, g).unwrap(),
        ];
        let mut profile = Profile::new("trapeze", sections).unwrap();
        let result = compute_event(
            &mut profile,
            &[0.0, 10.0],
            &[1.0, 1.0],
            &[0.0, 0.0],
            &Meunier1989,
            &config(),
            None,
        );
        assert!(matches!(result, Err(EventError::Section(SectionError::Unsupported { .. }))));
    }
}
