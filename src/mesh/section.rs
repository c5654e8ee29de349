//! Cross-sections of the longitudinal profile.
//!
//! A section couples a geometry (rectangular, trapezoidal or an arbitrary
//! bank-to-bank polyline) with its position `x`, bed elevation `z` and
//! roughness. It answers the hydraulic queries of the backwater solver for
//! a given discharge Q and depth y:
//!
//! - A(y), P(y), R(y) = A/P
//! - V = Q / A
//! - H = z + y + V²/(2g), Hs = y + V²/(2g)
//! - Sf = (n V / R^{2/3})²
//! - Fr = V / √(g y)
//!
//! and carries the Exner bed update driven by a transport law.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{G, POROSITY, Y_MAX_DEFAULT, Y_MIN};
use crate::mesh::polygon::{WetProperties, bank_height, wet_polygon, wet_properties};
use crate::sediment::{Granulometry, TransportLaw};
use crate::source::FrictionLaw;

/// Errors raised by section construction, mutation or bed update.
#[derive(Debug, Error, PartialEq)]
pub enum SectionError {
    /// Width must be strictly positive
    #[error("width b must be positive, got {0}")]
    NonPositiveWidth(f64),

    /// Side slope must be non-negative
    #[error("side slope s must be non-negative, got {0}")]
    NegativeSideSlope(f64),

    /// Roughness must be strictly positive
    #[error("manning coefficient must be positive, got {0}")]
    NonPositiveManning(f64),

    /// Bed elevation below the non-erodible floor
    #[error("bed elevation {z} is below the floor elevation {z_min}")]
    BelowFloor { z: f64, z_min: f64 },

    /// Polyline geometry cannot describe a channel
    #[error("invalid cross-section polygon: {0}")]
    InvalidPolygon(String),

    /// Interpolation between incompatible geometries
    #[error("cannot interpolate between {0} and {1} sections")]
    ShapeMismatch(&'static str, &'static str),

    /// Operation without a definition for this geometry
    #[error("operation '{operation}' is not supported for {geometry} sections")]
    Unsupported {
        operation: &'static str,
        geometry: &'static str,
    },
}

/// Unrecognised section kind.
#[derive(Debug, Error, PartialEq)]
#[error("unknown section kind '{0}', expected 'rectangular' or 'trapezoidal'")]
pub struct UnknownSectionKind(pub String);

/// Section geometry family of a profile data file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    #[default]
    Rectangular,
    Trapezoidal,
}

impl SectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Rectangular => "rectangular",
            SectionKind::Trapezoidal => "trapezoidal",
        }
    }
}

impl FromStr for SectionKind {
    type Err = UnknownSectionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectangular" => Ok(SectionKind::Rectangular),
            "trapezoidal" => Ok(SectionKind::Trapezoidal),
            other => Err(UnknownSectionKind(other.to_string())),
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Geometry of a cross-section.
#[derive(Clone, Debug, PartialEq)]
pub enum SectionShape {
    /// Constant width b
    Rectangular { b: f64 },
    /// Bottom width b and symmetric side slope s (horizontal / vertical)
    Trapezoidal { b: f64, s: f64 },
    /// Bank-to-bank polyline of (offset, height above the bottom) points
    Irregular { points: Vec<(f64, f64)> },
}

impl SectionShape {
    /// Geometry name used in messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SectionShape::Rectangular { .. } => "rectangular",
            SectionShape::Trapezoidal { .. } => "trapezoidal",
            SectionShape::Irregular { .. } => "irregular",
        }
    }

    fn wet(&self, y: f64) -> WetProperties {
        match self {
            SectionShape::Rectangular { b } => WetProperties {
                area: b * y,
                perimeter: b + 2.0 * y,
                top_width: *b,
                moment: 0.5 * b * y * y,
            },
            SectionShape::Trapezoidal { b, s } => WetProperties {
                area: (b + s * y) * y,
                perimeter: b + 2.0 * y * (1.0 + s * s).sqrt(),
                top_width: b + 2.0 * s * y,
                moment: 0.5 * b * y * y + s * y * y * y / 3.0,
            },
            SectionShape::Irregular { points } => wet_properties(points, y),
        }
    }

    /// Outline of the section up to height `y_max`.
    fn outline(&self, y_max: f64) -> Vec<(f64, f64)> {
        match self {
            SectionShape::Rectangular { b } => vec![(0.0, y_max), (0.0, 0.0), (*b, 0.0), (*b, y_max)],
            SectionShape::Trapezoidal { b, s } => vec![
                (0.0, y_max),
                (s * y_max, 0.0),
                (s * y_max + b, 0.0),
                (2.0 * s * y_max + b, y_max),
            ],
            SectionShape::Irregular { points } => points.clone(),
        }
    }
}

fn validate_polygon(points: &[(f64, f64)]) -> Result<(), SectionError> {
    if points.len() < 3 {
        return Err(SectionError::InvalidPolygon(format!(
            "need at least 3 points, got {}",
            points.len()
        )));
    }
    if points.iter().any(|p| !(p.0.is_finite() && p.1.is_finite())) {
        return Err(SectionError::InvalidPolygon("non-finite coordinate".into()));
    }
    if points.windows(2).any(|w| w[1].0 < w[0].0) {
        return Err(SectionError::InvalidPolygon(
            "offsets must be non-decreasing from left to right bank".into(),
        ));
    }
    let bottom = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    if bottom.abs() > 1e-12 {
        return Err(SectionError::InvalidPolygon(format!(
            "heights are measured from the bottom, lowest point is {}",
            bottom
        )));
    }
    if bank_height(points) <= 0.0 {
        return Err(SectionError::InvalidPolygon("banks have no height".into()));
    }
    Ok(())
}

/// Bed-update inputs for one section over one internal step.
#[derive(Clone, Copy, Debug)]
pub struct BedUpdate {
    /// Water discharge Q (m³/s)
    pub discharge: f64,
    /// Water depth y at the section (m)
    pub depth: f64,
    /// Slope driving the transport toward the downstream neighbour
    pub slope: f64,
    /// Reach length represented by the section (m)
    pub length: f64,
    /// Solid discharge entering from upstream (m³/s)
    pub qs_in: f64,
    /// Time step (s)
    pub dt: f64,
}

/// A cross-section of the profile.
#[derive(Clone, Debug)]
pub struct Section {
    x: f64,
    z: f64,
    z_min: f64,
    y_max: f64,
    manning: f64,
    shape: SectionShape,
    granulometry: Arc<Granulometry>,
    stored_volume: f64,
    /// Index of the upstream neighbour in the owning profile
    pub(crate) upstream: Option<usize>,
    /// Index of the downstream neighbour in the owning profile
    pub(crate) downstream: Option<usize>,
}

impl Section {
    fn build(
        x: f64,
        z: f64,
        shape: SectionShape,
        granulometry: Arc<Granulometry>,
    ) -> Result<Self, SectionError> {
        let y_max = match &shape {
            SectionShape::Irregular { points } => bank_height(points),
            _ => Y_MAX_DEFAULT,
        };
        let manning = granulometry.default_manning();
        Ok(Self {
            x,
            z,
            z_min: z,
            y_max,
            manning,
            shape,
            granulometry,
            stored_volume: 0.0,
            upstream: None,
            downstream: None,
        })
    }

    /// Rectangular section of width `b`.
    pub fn rectangular(
        x: f64,
        z: f64,
        b: f64,
        granulometry: Arc<Granulometry>,
    ) -> Result<Self, SectionError> {
        if !(b > 0.0) {
            return Err(SectionError::NonPositiveWidth(b));
        }
        Self::build(x, z, SectionShape::Rectangular { b }, granulometry)
    }

    /// Trapezoidal section of bottom width `b` and side slope `s`.
    pub fn trapezoidal(
        x: f64,
        z: f64,
        b: f64,
        s: f64,
        granulometry: Arc<Granulometry>,
    ) -> Result<Self, SectionError> {
        if !(b > 0.0) {
            return Err(SectionError::NonPositiveWidth(b));
        }
        if !(s >= 0.0) {
            return Err(SectionError::NegativeSideSlope(s));
        }
        Self::build(x, z, SectionShape::Trapezoidal { b, s }, granulometry)
    }

    /// Section of arbitrary shape, points given bank to bank.
    pub fn irregular(
        x: f64,
        z: f64,
        points: Vec<(f64, f64)>,
        granulometry: Arc<Granulometry>,
    ) -> Result<Self, SectionError> {
        validate_polygon(&points)?;
        Self::build(x, z, SectionShape::Irregular { points }, granulometry)
    }

    /// Set the non-erodible floor elevation (defaults to the initial `z`).
    pub fn with_z_min(mut self, z_min: f64) -> Result<Self, SectionError> {
        self.set_z_min(z_min)?;
        Ok(self)
    }

    /// Set the maximum admissible depth; non-positive values keep the default.
    pub fn with_y_max(mut self, y_max: f64) -> Self {
        if y_max > 0.0 {
            self.y_max = match &self.shape {
                SectionShape::Irregular { points } => y_max.min(bank_height(points)),
                _ => y_max,
            };
        }
        self
    }

    /// Set the Manning coefficient.
    pub fn with_manning(mut self, manning: f64) -> Result<Self, SectionError> {
        self.set_manning(manning)?;
        Ok(self)
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    pub fn x(&self) -> f64 {
        self.x
    }

    pub(crate) fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    /// Move the bed; the floor elevation still bounds it from below.
    pub fn set_z(&mut self, z: f64) -> Result<(), SectionError> {
        if z < self.z_min {
            return Err(SectionError::BelowFloor { z, z_min: self.z_min });
        }
        self.z = z;
        Ok(())
    }

    pub fn z_min(&self) -> f64 {
        self.z_min
    }

    pub fn set_z_min(&mut self, z_min: f64) -> Result<(), SectionError> {
        if self.z < z_min {
            return Err(SectionError::BelowFloor { z: self.z, z_min });
        }
        self.z_min = z_min;
        Ok(())
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    pub fn manning(&self) -> f64 {
        self.manning
    }

    pub fn set_manning(&mut self, manning: f64) -> Result<(), SectionError> {
        if !(manning > 0.0) {
            return Err(SectionError::NonPositiveManning(manning));
        }
        self.manning = manning;
        Ok(())
    }

    pub fn shape(&self) -> &SectionShape {
        &self.shape
    }

    /// Bottom width; irregular sections report their wet width at the bed.
    pub fn width(&self) -> f64 {
        match &self.shape {
            SectionShape::Rectangular { b } | SectionShape::Trapezoidal { b, .. } => *b,
            SectionShape::Irregular { .. } => self.top_width(Y_MIN),
        }
    }

    /// Change the bottom width of a rectangular or trapezoidal section.
    pub fn set_width(&mut self, width: f64) -> Result<(), SectionError> {
        if !(width > 0.0) {
            return Err(SectionError::NonPositiveWidth(width));
        }
        match &mut self.shape {
            SectionShape::Rectangular { b } | SectionShape::Trapezoidal { b, .. } => {
                *b = width;
                Ok(())
            }
            SectionShape::Irregular { .. } => Err(SectionError::Unsupported {
                operation: "set_width",
                geometry: "irregular",
            }),
        }
    }

    /// Side slope of a trapezoidal section.
    pub fn side_slope(&self) -> Option<f64> {
        match self.shape {
            SectionShape::Trapezoidal { s, .. } => Some(s),
            _ => None,
        }
    }

    pub fn set_side_slope(&mut self, slope: f64) -> Result<(), SectionError> {
        if !(slope >= 0.0) {
            return Err(SectionError::NegativeSideSlope(slope));
        }
        match &mut self.shape {
            SectionShape::Trapezoidal { s, .. } => {
                *s = slope;
                Ok(())
            }
            other => Err(SectionError::Unsupported {
                operation: "set_side_slope",
                geometry: other.kind(),
            }),
        }
    }

    pub fn granulometry(&self) -> &Granulometry {
        &self.granulometry
    }

    /// Shared handle on the granulometry.
    pub fn granulometry_handle(&self) -> Arc<Granulometry> {
        Arc::clone(&self.granulometry)
    }

    /// Index of the upstream neighbour in the owning profile.
    pub fn upstream(&self) -> Option<usize> {
        self.upstream
    }

    /// Index of the downstream neighbour in the owning profile.
    pub fn downstream(&self) -> Option<usize> {
        self.downstream
    }

    // ---------------------------------------------------------------------
    // Hydraulics
    // ---------------------------------------------------------------------

    /// Depth actually used by the geometric integrals.
    fn effective_depth(&self, y: f64) -> f64 {
        y.clamp(Y_MIN, self.y_max)
    }

    /// Clamp a computed depth into [Y_MIN, y_max].
    ///
    /// Silent: callers report clamped sections through
    /// [`DepthProfile::clamped`](crate::solver::DepthProfile::clamped).
    pub fn clamp_depth(&self, y: f64) -> f64 {
        if y > self.y_max {
            self.y_max
        } else if y < Y_MIN || y.is_nan() {
            Y_MIN
        } else {
            y
        }
    }

    fn wet(&self, y: f64) -> WetProperties {
        self.shape.wet(self.effective_depth(y))
    }

    /// Wetted area A (m²).
    pub fn wetted_area(&self, y: f64) -> f64 {
        self.wet(y).area
    }

    /// Wetted perimeter P (m).
    pub fn wetted_perimeter(&self, y: f64) -> f64 {
        self.wet(y).perimeter
    }

    /// Hydraulic radius R = A/P (m).
    pub fn hydraulic_radius(&self, y: f64) -> f64 {
        let wet = self.wet(y);
        wet.area / wet.perimeter
    }

    /// Free-surface width (m).
    pub fn top_width(&self, y: f64) -> f64 {
        self.wet(y).top_width
    }

    /// Mean velocity V = Q/A (m/s).
    pub fn velocity(&self, q: f64, y: f64) -> f64 {
        q / self.wetted_area(y)
    }

    /// Energy head H = z + y + V²/(2g) (m).
    pub fn energy_head(&self, q: f64, y: f64) -> f64 {
        self.z + self.specific_head(q, y)
    }

    /// Specific head Hs = y + V²/(2g) (m).
    pub fn specific_head(&self, q: f64, y: f64) -> f64 {
        let v = self.velocity(q, y);
        self.effective_depth(y) + v * v / (2.0 * G)
    }

    /// Manning-Strickler friction slope (n V / R^{2/3})².
    pub fn friction_slope(&self, q: f64, y: f64) -> f64 {
        self.friction_slope_with(FrictionLaw::ManningStrickler, q, y)
    }

    /// Friction slope with the given closure.
    pub fn friction_slope_with(&self, law: FrictionLaw, q: f64, y: f64) -> f64 {
        let wet = self.wet(y);
        let v = q / wet.area;
        law.friction_slope(v, wet.area / wet.perimeter, self.manning, self.granulometry.d84bs)
    }

    /// Froude number Fr = V / √(g y).
    pub fn froude(&self, q: f64, y: f64) -> f64 {
        self.velocity(q, y) / (G * self.effective_depth(y)).sqrt()
    }

    /// Specific force Q²/(gA) + A ȳ, conserved across a hydraulic jump.
    pub fn specific_force(&self, q: f64, y: f64) -> f64 {
        let wet = self.wet(y);
        q * q / (G * wet.area) + wet.moment
    }

    /// Fastest gravity-wave speed |V| + √(g y) (m/s).
    pub fn celerity(&self, q: f64, y: f64) -> f64 {
        self.velocity(q, y).abs() + (G * self.effective_depth(y)).sqrt()
    }

    /// Wet part of the section below depth `y`, bank to bank.
    ///
    /// Depths at or above `y_max` return the whole outline with a warning.
    pub fn wet_cross_section_polygon(&self, y: f64) -> Vec<(f64, f64)> {
        let outline = self.shape.outline(self.y_max);
        if y >= self.y_max {
            log::warn!(
                "depth {:.3} m reaches the maximum depth {:.3} m at x = {:.2}, full section returned",
                y,
                self.y_max,
                self.x
            );
            return outline;
        }
        wet_polygon(&outline, y.max(0.0))
    }

    // ---------------------------------------------------------------------
    // Sediment
    // ---------------------------------------------------------------------

    /// Width over which deposits spread and erosion acts.
    fn active_width(&self, y: f64) -> f64 {
        match &self.shape {
            SectionShape::Rectangular { b } => *b,
            _ => self.top_width(y),
        }
    }

    /// Apply one Exner step and return the solid discharge leaving downstream.
    ///
    /// Δz b L (1 - p) = (Qs_in - Qs_out) dt
    ///
    /// When the floor `z_min` stops erosion, the outgoing discharge is
    /// reduced to what was actually eroded.
    pub fn update_bottom(
        &mut self,
        update: &BedUpdate,
        law: &dyn TransportLaw,
    ) -> Result<f64, SectionError> {
        if let SectionShape::Trapezoidal { .. } = self.shape {
            return Err(SectionError::Unsupported {
                operation: "update_bottom",
                geometry: "trapezoidal",
            });
        }

        let width = self.active_width(update.depth);
        let mut qs_out =
            law.solid_discharge(width, &self.granulometry, update.discharge, update.slope);
        let footprint = width * update.length;
        let mut dz = (update.qs_in - qs_out) * update.dt / ((1.0 - POROSITY) * footprint);

        if self.z + dz < self.z_min {
            dz = self.z_min - self.z;
            let eroded = -dz * footprint * (1.0 - POROSITY);
            qs_out = update.qs_in + eroded / update.dt;
        }

        self.z += dz;
        self.stored_volume += dz * footprint;
        Ok(qs_out)
    }

    /// Bulk volume deposited (positive) or eroded (negative) so far (m³).
    pub fn stored_volume(&self) -> Result<f64, SectionError> {
        match self.shape {
            SectionShape::Trapezoidal { .. } => Err(SectionError::Unsupported {
                operation: "stored_volume",
                geometry: "trapezoidal",
            }),
            _ => Ok(self.stored_volume),
        }
    }

    // ---------------------------------------------------------------------
    // Interpolation
    // ---------------------------------------------------------------------

    /// New section between `self` (upstream) and `other` (downstream).
    ///
    /// Every attribute is linearly interpolated in x, at the midpoint by default.
    pub fn interpolate_as_upstream_of(
        &self,
        other: &Section,
        at_x: Option<f64>,
    ) -> Result<Section, SectionError> {
        interpolate(self, other, at_x)
    }

    /// New section between `other` (upstream) and `self` (downstream).
    pub fn interpolate_as_downstream_of(
        &self,
        other: &Section,
        at_x: Option<f64>,
    ) -> Result<Section, SectionError> {
        interpolate(other, self, at_x)
    }
}

fn lerp(a: f64, b: f64, w: f64) -> f64 {
    a + w * (b - a)
}

fn interpolate(up: &Section, down: &Section, at_x: Option<f64>) -> Result<Section, SectionError> {
    let x = at_x.unwrap_or(0.5 * (up.x + down.x));
    let span = down.x - up.x;
    let w = if span.abs() > 0.0 { (x - up.x) / span } else { 0.5 };

    let shape = match (&up.shape, &down.shape) {
        (SectionShape::Rectangular { b: b0 }, SectionShape::Rectangular { b: b1 }) => {
            SectionShape::Rectangular { b: lerp(*b0, *b1, w) }
        }
        (
            SectionShape::Trapezoidal { b: b0, s: s0 },
            SectionShape::Trapezoidal { b: b1, s: s1 },
        ) => SectionShape::Trapezoidal {
            b: lerp(*b0, *b1, w),
            s: lerp(*s0, *s1, w),
        },
        (SectionShape::Irregular { points: p0 }, SectionShape::Irregular { points: p1 })
            if p0.len() == p1.len() =>
        {
            SectionShape::Irregular {
                points: p0
                    .iter()
                    .zip(p1)
                    .map(|(a, b)| (lerp(a.0, b.0, w), lerp(a.1, b.1, w)))
                    .collect(),
            }
        }
        (a, b) => return Err(SectionError::ShapeMismatch(a.kind(), b.kind())),
    };

    let granulometry = if w <= 0.5 {
        Arc::clone(&up.granulometry)
    } else {
        Arc::clone(&down.granulometry)
    };

    Ok(Section {
        x,
        z: lerp(up.z, down.z, w),
        z_min: lerp(up.z_min, down.z_min, w),
        y_max: lerp(up.y_max, down.y_max, w),
        manning: lerp(up.manning, down.manning, w),
        shape,
        granulometry,
        stored_volume: 0.0,
        upstream: None,
        downstream: None,
    })
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.shape {
            SectionShape::Rectangular { b } => {
                write!(f, "Rectangular section: x={}, z={}, b={}", self.x, self.z, b)
            }
            SectionShape::Trapezoidal { b, s } => write!(
                f,
                "Trapezoidal section: x={}, z={}, b={}, s={}",
                self.x, self.z, b, s
            ),
            SectionShape::Irregular { points } => write!(
                f,
                "Irregular section: x={}, z={}, {} points",
                self.x,
                self.z,
                points.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sediment::Meunier1989;

    const TOL: f64 = 1e-12;

    fn gravel() -> Arc<Granulometry> {
        Arc::new(Granulometry::new(0.05, 0.02, 0.04, 0.15, 0.09, 0.2, 2.5).unwrap())
    }

    #[test]
    fn test_rectangular_matches_flat_trapezoid() {
        let g = gravel();
        let rect = Section::rectangular(0.0, 100.0, 6.0, g.clone()).unwrap();
        let trap = Section::trapezoidal(0.0, 100.0, 6.0, 0.0, g).unwrap();

        for &y in &[0.05, 0.3, 1.0, 2.5, 7.0] {
            assert!((rect.wetted_area(y) - trap.wetted_area(y)).abs() < TOL);
            assert!((rect.wetted_perimeter(y) - trap.wetted_perimeter(y)).abs() < TOL);
            assert!((rect.hydraulic_radius(y) - trap.hydraulic_radius(y)).abs() < TOL);
            assert!((rect.velocity(12.0, y) - trap.velocity(12.0, y)).abs() < TOL);
        }
    }

    #[test]
    fn test_irregular_rectangle_matches_rectangular() {
        let g = gravel();
        let rect = Section::rectangular(0.0, 0.0, 4.0, g.clone()).unwrap();
        let poly = Section::irregular(
            0.0,
            0.0,
            vec![(0.0, 10.0), (0.0, 0.0), (4.0, 0.0), (4.0, 10.0)],
            g,
        )
        .unwrap();

        for &y in &[0.1, 1.0, 3.0] {
            assert!((rect.wetted_area(y) - poly.wetted_area(y)).abs() < 1e-10);
            assert!((rect.wetted_perimeter(y) - poly.wetted_perimeter(y)).abs() < 1e-10);
            assert!((rect.specific_force(5.0, y) - poly.specific_force(5.0, y)).abs() < 1e-10);
        }
    }

    #[test]
    fn test_trapezoidal_formulas() {
        let trap = Section::trapezoidal(0.0, 0.0, 2.0, 1.5, gravel()).unwrap();
        let y = 1.0;
        assert!((trap.wetted_area(y) - 3.5).abs() < TOL);
        assert!((trap.wetted_perimeter(y) - (2.0 + 2.0 * 3.25f64.sqrt())).abs() < TOL);
        assert!((trap.top_width(y) - 5.0).abs() < TOL);
    }

    #[test]
    fn test_energy_and_froude() {
        let rect = Section::rectangular(0.0, 10.0, 2.0, gravel()).unwrap();
        let (q, y) = (4.0, 1.0);
        // V = 2
        assert!((rect.velocity(q, y) - 2.0).abs() < TOL);
        assert!((rect.specific_head(q, y) - (1.0 + 4.0 / (2.0 * G))).abs() < TOL);
        assert!((rect.energy_head(q, y) - (11.0 + 4.0 / (2.0 * G))).abs() < TOL);
        assert!((rect.froude(q, y) - 2.0 / G.sqrt()).abs() < TOL);
    }

    #[test]
    fn test_friction_slope_manning() {
        let rect = Section::rectangular(0.0, 0.0, 2.0, gravel())
            .unwrap()
            .with_manning(0.04)
            .unwrap();
        let (q, y) = (4.0, 1.0);
        let r: f64 = 0.5;
        let expected = (0.04 * 2.0 / r.powf(2.0 / 3.0)).powi(2);
        assert!((rect.friction_slope(q, y) - expected).abs() < TOL);
    }

    #[test]
    fn test_setters_validate() {
        let mut rect = Section::rectangular(0.0, 5.0, 2.0, gravel()).unwrap();
        assert_eq!(rect.set_width(0.0), Err(SectionError::NonPositiveWidth(0.0)));
        assert_eq!(rect.set_width(-1.0), Err(SectionError::NonPositiveWidth(-1.0)));
        assert!(rect.set_width(3.0).is_ok());
        assert!((rect.width() - 3.0).abs() < TOL);
        assert!(rect.set_manning(0.0).is_err());
        assert!(rect.set_side_slope(1.0).is_err());

        rect.set_z_min(4.0).unwrap();
        assert!(rect.set_z(3.0).is_err());
        assert!(rect.set_z(4.5).is_ok());
    }

    #[test]
    fn test_constructor_rejects_bad_width() {
        assert!(Section::rectangular(0.0, 0.0, 0.0, gravel()).is_err());
        assert!(Section::trapezoidal(0.0, 0.0, 1.0, -0.5, gravel()).is_err());
        assert!(Section::irregular(0.0, 0.0, vec![(0.0, 1.0), (1.0, 0.0)], gravel()).is_err());
    }

    #[test]
    fn test_depth_clamped_to_y_max() {
        let rect = Section::rectangular(0.0, 0.0, 2.0, gravel())
            .unwrap()
            .with_y_max(1.5);
        assert!((rect.clamp_depth(3.0) - 1.5).abs() < TOL);
        assert!((rect.wetted_area(3.0) - 3.0).abs() < TOL);
        assert!(rect.clamp_depth(-1.0) > 0.0);
        assert!(rect.wetted_area(0.0) > 0.0);
    }

    #[test]
    fn test_wet_polygon_full_above_y_max() {
        let trap = Section::trapezoidal(0.0, 0.0, 2.0, 1.0, gravel())
            .unwrap()
            .with_y_max(2.0);
        let full = trap.wet_cross_section_polygon(5.0);
        assert_eq!(full, vec![(0.0, 2.0), (2.0, 0.0), (4.0, 0.0), (6.0, 2.0)]);

        let wet = trap.wet_cross_section_polygon(1.0);
        assert_eq!(wet.len(), 4);
        assert!((wet[0].0 - 1.0).abs() < TOL);
        assert!((wet[3].0 - 5.0).abs() < TOL);
    }

    #[test]
    fn test_midpoint_interpolation_is_mean() {
        let g = gravel();
        let up = Section::trapezoidal(0.0, 110.0, 4.0, 0.5, g.clone())
            .unwrap()
            .with_manning(0.05)
            .unwrap();
        let down = Section::trapezoidal(10.0, 100.0, 8.0, 1.5, g)
            .unwrap()
            .with_manning(0.03)
            .unwrap();

        for mid in [
            up.interpolate_as_upstream_of(&down, None).unwrap(),
            down.interpolate_as_downstream_of(&up, None).unwrap(),
        ] {
            assert!((mid.x() - 5.0).abs() < TOL);
            assert!((mid.z() - 105.0).abs() < TOL);
            assert!((mid.width() - 6.0).abs() < TOL);
            assert!((mid.side_slope().unwrap() - 1.0).abs() < TOL);
            assert!((mid.manning() - 0.04).abs() < TOL);
            assert!(mid.upstream().is_none() && mid.downstream().is_none());
        }
    }

    #[test]
    fn test_interpolation_at_given_x() {
        let g = gravel();
        let up = Section::rectangular(0.0, 10.0, 2.0, g.clone()).unwrap();
        let down = Section::rectangular(4.0, 6.0, 6.0, g).unwrap();
        let s = up.interpolate_as_upstream_of(&down, Some(1.0)).unwrap();
        assert!((s.z() - 9.0).abs() < TOL);
        assert!((s.width() - 3.0).abs() < TOL);
    }

    #[test]
    fn test_interpolation_shape_mismatch() {
        let g = gravel();
        let rect = Section::rectangular(0.0, 10.0, 2.0, g.clone()).unwrap();
        let trap = Section::trapezoidal(4.0, 6.0, 6.0, 1.0, g).unwrap();
        assert!(matches!(
            rect.interpolate_as_upstream_of(&trap, None),
            Err(SectionError::ShapeMismatch(..))
        ));
    }

    #[test]
    fn test_section_kind_names() {
        assert_eq!("rectangular".parse(), Ok(SectionKind::Rectangular));
        assert_eq!("trapezoidal".parse(), Ok(SectionKind::Trapezoidal));
        assert!("circular".parse::<SectionKind>().is_err());
        assert_eq!(SectionKind::Trapezoidal.to_string(), "trapezoidal");
    }

    #[test]
    fn test_trapezoidal_bed_update_unsupported() {
        let mut trap = Section::trapezoidal(0.0, 0.0, 2.0, 1.0, gravel()).unwrap();
        let update = BedUpdate {
            discharge: 5.0,
            depth: 1.0,
            slope: 0.05,
            length: 10.0,
            qs_in: 0.01,
            dt: 1.0,
        };
        assert_eq!(
            trap.update_bottom(&update, &Meunier1989),
            Err(SectionError::Unsupported {
                operation: "update_bottom",
                geometry: "trapezoidal"
            })
        );
        assert!(trap.stored_volume().is_err());
    }

    #[test]
    fn test_bed_update_deposition_balance() {
        let mut rect = Section::rectangular(0.0, 50.0, 4.0, gravel()).unwrap();
        let update = BedUpdate {
            discharge: 10.0,
            depth: 1.0,
            slope: 0.02,
            length: 20.0,
            qs_in: 0.5,
            dt: 10.0,
        };
        let qs_out = rect.update_bottom(&update, &Meunier1989).unwrap();
        let expected_out = 8.2 * 10.0 * 0.02 * 0.02;
        assert!((qs_out - expected_out).abs() < TOL);

        let stored = rect.stored_volume().unwrap();
        let solid = (0.5 - expected_out) * 10.0;
        assert!((stored * (1.0 - POROSITY) - solid).abs() < 1e-10);
        assert!((rect.z() - 50.0 - stored / 80.0).abs() < TOL);
    }

    #[test]
    fn test_bed_update_respects_floor() {
        let mut rect = Section::rectangular(0.0, 50.0, 4.0, gravel())
            .unwrap()
            .with_z_min(49.99)
            .unwrap();
        let update = BedUpdate {
            discharge: 50.0,
            depth: 1.0,
            slope: 0.2,
            length: 10.0,
            qs_in: 0.0,
            dt: 100.0,
        };
        let qs_out = rect.update_bottom(&update, &Meunier1989).unwrap();
        assert!((rect.z() - 49.99).abs() < 1e-12);
        // Only the eroded layer leaves the section
        let eroded = 0.01 * 40.0 * (1.0 - POROSITY);
        assert!((qs_out * 100.0 - eroded).abs() < 1e-10);
    }
}
