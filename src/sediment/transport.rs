//! Empirical bedload transport formulas for steep channels.
//!
//! Every law maps the local state `(width, granulometry, discharge, slope)`
//! to a volumetric solid discharge Qs (m³/s, solid volume without pores).
//! Laws are stateless and selected by name at configuration time.
//!
//! Notation:
//! - s = ρs/ρ, relative density of the sediment
//! - q = Q/b, unit discharge (m²/s)
//! - I, channel slope (m/m)
//! - θ = R I / ((s-1) d), Shields number
//! - Φ = qs / √(g (s-1) d³), dimensionless transport rate
//!
//! Formulas that need a flow depth use the uniform-flow depth of a
//! rectangular channel of the given width, closed with the Ferguson (2007)
//! resistance law on the bed-surface d84.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{G, RELATIVE_DENSITY};
use crate::sediment::Granulometry;
use crate::source::ferguson_resistance;

/// Unrecognised transport law name.
#[derive(Debug, Error, PartialEq)]
#[error("unknown sediment transport law '{0}', expected one of: {names}", names = TransportLawKind::NAMES.join(", "))]
pub struct UnknownTransportLaw(pub String);

/// A sediment transport formula.
pub trait TransportLaw: Send + Sync {
    /// Name as written in configuration files.
    fn name(&self) -> &'static str;

    /// Solid volumetric discharge (m³/s), finite and non-negative.
    ///
    /// # Arguments
    /// * `width` - Active channel width (m)
    /// * `granulometry` - Bed material
    /// * `discharge` - Water discharge Q (m³/s)
    /// * `slope` - Energy or bed slope I (m/m)
    fn solid_discharge(
        &self,
        width: f64,
        granulometry: &Granulometry,
        discharge: f64,
        slope: f64,
    ) -> f64;
}

/// Returns true when the formula inputs admit transport.
fn transports(width: f64, discharge: f64, slope: f64) -> bool {
    width > 0.0 && discharge > 0.0 && slope > 0.0 && width.is_finite() && slope.is_finite()
}

/// Clamp a formula result to a finite non-negative number.
fn sanitize(qs: f64) -> f64 {
    if qs.is_finite() && qs > 0.0 { qs } else { 0.0 }
}

/// Uniform-flow depth in a rectangular channel with Ferguson resistance.
///
/// Solves Q = b h √(g R I) f(R/d84) by bisection, R = b h / (b + 2h).
pub fn uniform_flow_depth(width: f64, discharge: f64, slope: f64, d84: f64) -> f64 {
    let flow = |h: f64| {
        let r = width * h / (width + 2.0 * h);
        width * h * (G * r * slope).sqrt() * ferguson_resistance(r / d84)
    };

    let mut lo = 1e-6;
    let mut hi = 1.0;
    while flow(hi) < discharge && hi < 1e3 {
        hi *= 2.0;
    }
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if flow(mid) < discharge {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-10 * hi {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// Hydraulic state of the uniform flow used by Shields-type formulas.
struct UniformFlow {
    depth: f64,
    hydraulic_radius: f64,
    velocity: f64,
}

impl UniformFlow {
    fn new(width: f64, granulometry: &Granulometry, discharge: f64, slope: f64) -> Self {
        let depth = uniform_flow_depth(width, discharge, slope, granulometry.d84bs);
        Self {
            depth,
            hydraulic_radius: width * depth / (width + 2.0 * depth),
            velocity: discharge / (width * depth),
        }
    }

    fn shields(&self, slope: f64, d: f64) -> f64 {
        self.hydraulic_radius * slope / ((RELATIVE_DENSITY - 1.0) * d)
    }

    fn froude(&self) -> f64 {
        self.velocity / (G * self.depth).sqrt()
    }
}

/// Einstein scaling √(g (s-1) d³) turning Φ into a unit solid discharge.
fn einstein_scale(d: f64) -> f64 {
    (G * (RELATIVE_DENSITY - 1.0) * d.powi(3)).sqrt()
}

/// Rickenmann (1990) critical unit discharge.
///
/// q_cr = 0.065 (s-1)^{1.67} √g d50^{1.5} I^{-1.12}
fn rickenmann_critical_discharge(d50: f64, slope: f64) -> f64 {
    0.065 * (RELATIVE_DENSITY - 1.0).powf(1.67) * G.sqrt() * d50.powf(1.5) * slope.powf(-1.12)
}

/// Lefort critical unit discharge.
///
/// q_cr / √(g dm³) = 0.0776 (s-1)^{8/3} (1 - 1.2 I)^{8/3} I^{-13/6}
fn lefort_critical_discharge(dm: f64, slope: f64) -> f64 {
    let s1 = RELATIVE_DENSITY - 1.0;
    let reduction = (1.0 - 1.2 * slope).max(0.0);
    0.0776 * (G * dm.powi(3)).sqrt() * s1.powf(8.0 / 3.0) * reduction.powf(8.0 / 3.0)
        * slope.powf(-13.0 / 6.0)
}

/// Rickenmann (1990), flume data up to 20 % slope.
///
/// qs = 12.6 / (s-1)^{1.6} (d90/d30)^{0.2} (q - q_cr) I²
#[derive(Clone, Copy, Debug, Default)]
pub struct Rickenmann1990;

impl TransportLaw for Rickenmann1990 {
    fn name(&self) -> &'static str {
        "Rickenmann1990"
    }

    fn solid_discharge(&self, width: f64, g: &Granulometry, discharge: f64, slope: f64) -> f64 {
        if !transports(width, discharge, slope) {
            return 0.0;
        }
        let q = discharge / width;
        let excess = q - rickenmann_critical_discharge(g.d50, slope);
        if excess <= 0.0 {
            return 0.0;
        }
        let qs = 12.6 / (RELATIVE_DENSITY - 1.0).powf(1.6) * g.sorting_factor() * excess * slope * slope;
        sanitize(width * qs)
    }
}

/// Rickenmann (1991), Froude-dependent bedload for steep channels.
///
/// Φ = 3.1 / (s-1)^{0.5} (d90/d30)^{0.2} θ^{0.5} (θ - θ_cr) Fr^{1.1}, θ_cr = 0.05.
///
/// The Shields number and the Einstein scale use d50.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rickenmann1991;

impl Rickenmann1991 {
    /// Critical Shields number
    pub const THETA_CR: f64 = 0.05;
}

impl TransportLaw for Rickenmann1991 {
    fn name(&self) -> &'static str {
        "Rickenmann1991"
    }

    fn solid_discharge(&self, width: f64, g: &Granulometry, discharge: f64, slope: f64) -> f64 {
        if !transports(width, discharge, slope) {
            return 0.0;
        }
        let flow = UniformFlow::new(width, g, discharge, slope);
        let theta = flow.shields(slope, g.d50);
        if theta <= Self::THETA_CR {
            return 0.0;
        }
        let phi = 3.1 / (RELATIVE_DENSITY - 1.0).sqrt()
            * g.sorting_factor()
            * theta.sqrt()
            * (theta - Self::THETA_CR)
            * flow.froude().powf(1.1);
        sanitize(width * phi * einstein_scale(g.d50))
    }
}

/// Lefort (2015), solid concentration law calibrated on torrent data.
///
/// Cs = 1.7 I^{1.21} (d90/d30)^{0.2} / (s-1) × F, with F = 1 above the
/// critical discharge and F = (q/q_cr)^{6.1} below it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lefort2015;

impl TransportLaw for Lefort2015 {
    fn name(&self) -> &'static str {
        "Lefort2015"
    }

    fn solid_discharge(&self, width: f64, g: &Granulometry, discharge: f64, slope: f64) -> f64 {
        if !transports(width, discharge, slope) {
            return 0.0;
        }
        let q = discharge / width;
        let q_cr = lefort_critical_discharge(g.dm, slope);
        let threshold = if q_cr <= 0.0 || q >= q_cr {
            1.0
        } else {
            (q / q_cr).powf(6.1)
        };
        let concentration =
            1.7 * slope.powf(1.21) * g.sorting_factor() / (RELATIVE_DENSITY - 1.0) * threshold;
        sanitize(discharge * concentration)
    }
}

/// Lefort / Sogreah (1991).
///
/// Qs = 4.45 Q I^{1.5} (d90/d30)^{0.2} / (s-1) [1 - (Q_cr/Q)^{0.375}]
#[derive(Clone, Copy, Debug, Default)]
pub struct LefortSogreah1991;

impl TransportLaw for LefortSogreah1991 {
    fn name(&self) -> &'static str {
        "LefortSogreah1991"
    }

    fn solid_discharge(&self, width: f64, g: &Granulometry, discharge: f64, slope: f64) -> f64 {
        if !transports(width, discharge, slope) {
            return 0.0;
        }
        let q_cr = width * lefort_critical_discharge(g.dm, slope);
        let excess = 1.0 - (q_cr / discharge).powf(0.375);
        if excess <= 0.0 {
            return 0.0;
        }
        let qs = 4.45 * discharge * slope.powf(1.5) * g.sorting_factor() / (RELATIVE_DENSITY - 1.0)
            * excess;
        sanitize(qs)
    }
}

/// Meunier (1989), torrent flume law.
///
/// Qs = 8.2 Q I²
#[derive(Clone, Copy, Debug, Default)]
pub struct Meunier1989;

impl TransportLaw for Meunier1989 {
    fn name(&self) -> &'static str {
        "Meunier1989"
    }

    fn solid_discharge(&self, width: f64, _g: &Granulometry, discharge: f64, slope: f64) -> f64 {
        if !transports(width, discharge, slope) {
            return 0.0;
        }
        sanitize(8.2 * discharge * slope * slope)
    }
}

/// Meyer-Peter & Müller (1948).
///
/// Φ = 8 (θ - 0.047)^{1.5} on the mean diameter
#[derive(Clone, Copy, Debug, Default)]
pub struct MeyerPeter1948;

impl MeyerPeter1948 {
    /// Critical Shields number
    pub const THETA_CR: f64 = 0.047;
}

impl TransportLaw for MeyerPeter1948 {
    fn name(&self) -> &'static str {
        "MeyerPeter1948"
    }

    fn solid_discharge(&self, width: f64, g: &Granulometry, discharge: f64, slope: f64) -> f64 {
        if !transports(width, discharge, slope) {
            return 0.0;
        }
        let flow = UniformFlow::new(width, g, discharge, slope);
        let excess = flow.shields(slope, g.dm) - Self::THETA_CR;
        if excess <= 0.0 {
            return 0.0;
        }
        let phi = 8.0 * excess.powf(1.5);
        sanitize(width * phi * einstein_scale(g.dm))
    }
}

/// Recking-type transport function Φ = 14 θ^{2.5} / (1 + (θm/θ)^4).
fn recking_phi(theta: f64, theta_m: f64) -> f64 {
    if theta <= 0.0 {
        return 0.0;
    }
    14.0 * theta.powf(2.5) / (1.0 + (theta_m / theta).powi(4))
}

/// Piton & Recking (2017), Recking (2013) function with distinct
/// bed-surface and travelling-bedload d84.
///
/// θ = R I / ((s-1) d84tb), θm = (5 I + 0.06) (d84tb/d50)^{4.4 √I - 1.5}
#[derive(Clone, Copy, Debug, Default)]
pub struct PitonRecking2017;

impl TransportLaw for PitonRecking2017 {
    fn name(&self) -> &'static str {
        "PitonRecking2017"
    }

    fn solid_discharge(&self, width: f64, g: &Granulometry, discharge: f64, slope: f64) -> f64 {
        if !transports(width, discharge, slope) {
            return 0.0;
        }
        let flow = UniformFlow::new(width, g, discharge, slope);
        let theta = flow.shields(slope, g.d84tb);
        let theta_m = (5.0 * slope + 0.06) * (g.d84tb / g.d50).powf(4.4 * slope.sqrt() - 1.5);
        sanitize(width * recking_phi(theta, theta_m) * einstein_scale(g.d84tb))
    }
}

/// Piton (2016), Recking function with the simplified torrent threshold.
///
/// θ = R I / ((s-1) d84bs), θm = 1.5 I^{0.75}
#[derive(Clone, Copy, Debug, Default)]
pub struct Piton2016;

impl TransportLaw for Piton2016 {
    fn name(&self) -> &'static str {
        "Piton2016"
    }

    fn solid_discharge(&self, width: f64, g: &Granulometry, discharge: f64, slope: f64) -> f64 {
        if !transports(width, discharge, slope) {
            return 0.0;
        }
        let flow = UniformFlow::new(width, g, discharge, slope);
        let theta = flow.shields(slope, g.d84bs);
        let theta_m = 1.5 * slope.powf(0.75);
        sanitize(width * recking_phi(theta, theta_m) * einstein_scale(g.d84bs))
    }
}

/// Closed set of available laws, selectable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportLawKind {
    Rickenmann1990,
    Rickenmann1991,
    Lefort2015,
    LefortSogreah1991,
    Meunier1989,
    MeyerPeter1948,
    PitonRecking2017,
    Piton2016,
}

impl TransportLawKind {
    /// Every variant, in configuration order.
    pub const ALL: [TransportLawKind; 8] = [
        TransportLawKind::Rickenmann1990,
        TransportLawKind::Rickenmann1991,
        TransportLawKind::Lefort2015,
        TransportLawKind::LefortSogreah1991,
        TransportLawKind::Meunier1989,
        TransportLawKind::MeyerPeter1948,
        TransportLawKind::PitonRecking2017,
        TransportLawKind::Piton2016,
    ];

    /// Configuration names of every variant.
    pub const NAMES: [&'static str; 8] = [
        "Rickenmann1990",
        "Rickenmann1991",
        "Lefort2015",
        "LefortSogreah1991",
        "Meunier1989",
        "MeyerPeter1948",
        "PitonRecking2017",
        "Piton2016",
    ];

    /// Instantiate the formula.
    pub fn law(&self) -> Box<dyn TransportLaw> {
        match self {
            TransportLawKind::Rickenmann1990 => Box::new(Rickenmann1990),
            TransportLawKind::Rickenmann1991 => Box::new(Rickenmann1991),
            TransportLawKind::Lefort2015 => Box::new(Lefort2015),
            TransportLawKind::LefortSogreah1991 => Box::new(LefortSogreah1991),
            TransportLawKind::Meunier1989 => Box::new(Meunier1989),
            TransportLawKind::MeyerPeter1948 => Box::new(MeyerPeter1948),
            TransportLawKind::PitonRecking2017 => Box::new(PitonRecking2017),
            TransportLawKind::Piton2016 => Box::new(Piton2016),
        }
    }

    /// Configuration name.
    pub fn name(&self) -> &'static str {
        Self::NAMES[*self as usize]
    }
}

impl FromStr for TransportLawKind {
    type Err = UnknownTransportLaw;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .iter()
            .position(|name| *name == s)
            .map(|i| Self::ALL[i])
            .ok_or_else(|| UnknownTransportLaw(s.to_string()))
    }
}

impl fmt::Display for TransportLawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
