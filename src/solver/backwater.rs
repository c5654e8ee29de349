//! Steady gradually-varied flow along a profile.
//!
//! For a discharge Q the water depth obeys
//!
//! dy/dx = (I - S_f(Q, y)) / (1 - Fr(Q, y)²)
//!
//! with x increasing downstream and I the bed slope. Two branches are
//! integrated with Heun's method (improved Euler):
//!
//! - a subcritical branch, marched upstream from the downstream boundary
//! - a supercritical branch, marched downstream from the upstream boundary
//!
//! At each section the branch with the larger specific force wins, which
//! places hydraulic jumps where momentum balances.
//!
//! Each interval between two sections is crossed with adaptive Heun
//! sub-steps so that long reaches stay stable.
//!
//! The ODE is singular at Fr = 1. The denominator is kept at least
//! `MIN_DENOMINATOR` away from zero with the sign of the branch regime,
//! and a step that lands in the wrong regime (or is not finite) restarts
//! the branch at critical depth.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{G, Y_MIN};
use crate::mesh::{Profile, Section, SectionShape};
use crate::source::FrictionLaw;

/// Smallest |1 - Fr²| used by the integrator.
pub const MIN_DENOMINATOR: f64 = 0.1;

const BISECTION_TOL: f64 = 1e-10;
const BISECTION_MAX_ITER: usize = 200;

/// Relative depth error accepted per Heun sub-step.
const STEP_REL_TOL: f64 = 1e-4;
/// Sub-steps allowed per interval before the remainder is taken at once.
const MAX_SUBSTEPS: usize = 10_000;

/// Unrecognised boundary condition name.
#[derive(Debug, Error, PartialEq)]
#[error("unknown boundary condition '{0}', expected 'critical_depth' or 'normal_depth'")]
pub struct UnknownBoundaryCondition(pub String);

/// Depth imposed at an end of the profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundaryCondition {
    /// Fr = 1
    #[default]
    CriticalDepth,
    /// S_f = I
    NormalDepth,
}

impl BoundaryCondition {
    pub fn name(&self) -> &'static str {
        match self {
            BoundaryCondition::CriticalDepth => "critical_depth",
            BoundaryCondition::NormalDepth => "normal_depth",
        }
    }
}

impl FromStr for BoundaryCondition {
    type Err = UnknownBoundaryCondition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical_depth" => Ok(BoundaryCondition::CriticalDepth),
            "normal_depth" => Ok(BoundaryCondition::NormalDepth),
            other => Err(UnknownBoundaryCondition(other.to_string())),
        }
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors of the steady solve.
#[derive(Debug, Error, PartialEq)]
pub enum BackwaterError {
    #[error("discharge must be finite and non-negative, got {0}")]
    InvalidDischarge(f64),

    #[error("non-finite depth at section {index} (x = {x})")]
    NonFiniteDepth { index: usize, x: f64 },
}

/// Steady depth profile for one discharge.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthProfile {
    /// Discharge (m³/s)
    pub discharge: f64,
    /// Section positions (m)
    pub abscissa: Vec<f64>,
    /// Bed elevations (m)
    pub bed: Vec<f64>,
    /// Water depths (m)
    pub depth: Vec<f64>,
    /// Energy heads (m)
    pub energy: Vec<f64>,
    /// Indices of the sections whose depth was clamped at `y_max`
    pub clamped: Vec<usize>,
}

impl DepthProfile {
    /// Number of sections.
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    /// Free-surface elevations z + y.
    pub fn water_surface(&self) -> Vec<f64> {
        self.bed.iter().zip(&self.depth).map(|(z, y)| z + y).collect()
    }
}

/// Flow regime of an integration branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Regime {
    Subcritical,
    Supercritical,
}

/// Root of a decreasing function on [lo, hi] by bisection.
fn bisect_decreasing(f: impl Fn(f64) -> f64, mut lo: f64, mut hi: f64) -> f64 {
    for _ in 0..BISECTION_MAX_ITER {
        let mid = 0.5 * (lo + hi);
        if f(mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < BISECTION_TOL {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// Clamp into [Y_MIN, y_max] without warning, for intermediate values.
fn bounded(section: &Section, y: f64) -> f64 {
    if y.is_nan() {
        Y_MIN
    } else {
        y.clamp(Y_MIN, section.y_max())
    }
}

/// Critical depth (Fr = 1) of a section.
///
/// Closed form (Q² / (g b²))^{1/3} for rectangular sections, bisection
/// otherwise.
pub fn critical_depth(section: &Section, q: f64) -> f64 {
    if q <= 0.0 {
        return Y_MIN;
    }
    match section.shape() {
        SectionShape::Rectangular { b } => bounded(section, (q * q / (G * b * b)).cbrt()),
        _ => {
            let y_max = section.y_max();
            if section.froude(q, y_max) > 1.0 {
                return y_max;
            }
            bisect_decreasing(|y| section.froude(q, y) - 1.0, Y_MIN, y_max)
        }
    }
}

/// Normal depth (S_f = I) of a section.
///
/// A non-positive slope has no uniform flow: critical depth is returned.
pub fn normal_depth(section: &Section, q: f64, slope: f64, friction: FrictionLaw) -> f64 {
    if !(slope > 0.0) {
        log::debug!(
            "no normal depth for slope {:.5} at x = {:.2}, critical depth used",
            slope,
            section.x()
        );
        return critical_depth(section, q);
    }
    if q <= 0.0 {
        return Y_MIN;
    }
    let y_max = section.y_max();
    if section.friction_slope_with(friction, q, y_max) > slope {
        log::debug!(
            "normal depth above the maximum depth {:.3} m at x = {:.2}, clamped",
            y_max,
            section.x()
        );
        return y_max;
    }
    bisect_decreasing(
        |y| section.friction_slope_with(friction, q, y) - slope,
        Y_MIN,
        y_max,
    )
}

fn boundary_depth(
    section: &Section,
    q: f64,
    slope: f64,
    condition: BoundaryCondition,
    friction: FrictionLaw,
) -> f64 {
    match condition {
        BoundaryCondition::CriticalDepth => critical_depth(section, q),
        BoundaryCondition::NormalDepth => normal_depth(section, q, slope, friction),
    }
}

/// Right-hand side of the gradually-varied flow equation.
fn gradient(
    section: &Section,
    q: f64,
    y: f64,
    slope: f64,
    friction: FrictionLaw,
    regime: Regime,
) -> f64 {
    let fr = section.froude(q, y);
    let denominator = match regime {
        Regime::Subcritical => (1.0 - fr * fr).max(MIN_DENOMINATOR),
        Regime::Supercritical => (1.0 - fr * fr).min(-MIN_DENOMINATOR),
    };
    (slope - section.friction_slope_with(friction, q, y)) / denominator
}

/// Integrate the depth from section `from` (depth `y`) to section `to`.
///
/// `h` is the signed distance x_to - x_from. The right-hand side is
/// blended linearly in x between the two sections. Heun steps are paired
/// with the embedded Euler estimate to halve or double the sub-step.
#[allow(clippy::too_many_arguments)]
fn integrate_interval(
    from: &Section,
    to: &Section,
    q: f64,
    y: f64,
    h: f64,
    slope: f64,
    friction: FrictionLaw,
    regime: Regime,
) -> f64 {
    let rhs = |w: f64, y: f64| {
        (1.0 - w) * gradient(from, q, y, slope, friction, regime)
            + w * gradient(to, q, y, slope, friction, regime)
    };

    let mut y = y;
    let mut w = 0.0;
    let mut dw: f64 = 1.0;
    let mut n_steps = 0;
    while w < 1.0 {
        if n_steps >= MAX_SUBSTEPS {
            dw = 1.0 - w;
        }
        dw = dw.min(1.0 - w);
        let s = h * dw;
        let k1 = rhs(w, y);
        let predicted = bounded(to, y + s * k1);
        let k2 = rhs(w + dw, predicted);
        let error = 0.5 * (s * (k2 - k1)).abs();
        let tolerance = STEP_REL_TOL * y + Y_MIN;
        n_steps += 1;

        if error > tolerance && n_steps < MAX_SUBSTEPS {
            dw *= 0.5;
            continue;
        }

        y += 0.5 * s * (k1 + k2);
        w += dw;
        if !y.is_finite() {
            return y;
        }
        y = bounded(to, y);
        if error < 0.25 * tolerance {
            dw *= 2.0;
        }
    }
    y
}

/// Accept a branch depth or restart at critical depth.
fn settle(section: &Section, y: f64, y_critical: f64, regime: Regime) -> f64 {
    let wrong_regime = match regime {
        Regime::Subcritical => y < y_critical,
        Regime::Supercritical => y > y_critical,
    };
    if !y.is_finite() || wrong_regime {
        y_critical
    } else {
        section.clamp_depth(y)
    }
}

/// Steady depth at every section of the profile for discharge `q`.
pub fn compute_depth(
    profile: &Profile,
    q: f64,
    friction: FrictionLaw,
    upstream: BoundaryCondition,
    downstream: BoundaryCondition,
) -> Result<DepthProfile, BackwaterError> {
    if !(q >= 0.0 && q.is_finite()) {
        return Err(BackwaterError::InvalidDischarge(q));
    }

    let sections = profile.sections();
    let n = sections.len();
    let critical: Vec<f64> = sections.iter().map(|s| critical_depth(s, q)).collect();

    // Subcritical branch, downstream to upstream
    let mut sub = vec![0.0; n];
    let last = n - 1;
    let y_down = boundary_depth(
        &sections[last],
        q,
        profile.bed_slope(last),
        downstream,
        friction,
    );
    sub[last] = y_down.max(critical[last]);
    for i in (0..last).rev() {
        let (here, below) = (&sections[i], &sections[i + 1]);
        let h = here.x() - below.x();
        let y = integrate_interval(
            below,
            here,
            q,
            sub[i + 1],
            h,
            profile.bed_slope(i),
            friction,
            Regime::Subcritical,
        );
        sub[i] = settle(here, y, critical[i], Regime::Subcritical);
    }

    // Supercritical branch, upstream to downstream
    let mut sup = vec![0.0; n];
    let y_up = boundary_depth(&sections[0], q, profile.bed_slope(0), upstream, friction);
    sup[0] = y_up.min(critical[0]);
    for i in 1..n {
        let (above, here) = (&sections[i - 1], &sections[i]);
        let h = here.x() - above.x();
        let y = integrate_interval(
            above,
            here,
            q,
            sup[i - 1],
            h,
            profile.bed_slope(i - 1),
            friction,
            Regime::Supercritical,
        );
        sup[i] = settle(here, y, critical[i], Regime::Supercritical);
    }

    let mut depth = Vec::with_capacity(n);
    for (i, section) in sections.iter().enumerate() {
        let y = if section.specific_force(q, sub[i]) >= section.specific_force(q, sup[i]) {
            sub[i]
        } else {
            sup[i]
        };
        if !y.is_finite() {
            return Err(BackwaterError::NonFiniteDepth {
                index: i,
                x: section.x(),
            });
        }
        depth.push(y);
    }

    let energy = sections
        .iter()
        .zip(&depth)
        .map(|(s, &y)| s.energy_head(q, y))
        .collect();

    let clamped = sections
        .iter()
        .zip(&depth)
        .enumerate()
        .filter(|(_, (s, &y))| y >= s.y_max())
        .map(|(i, _)| i)
        .collect();

    Ok(DepthProfile {
        discharge: q,
        abscissa: profile.abscissa(),
        bed: profile.elevations(),
        depth,
        energy,
        clamped,
    })
}
