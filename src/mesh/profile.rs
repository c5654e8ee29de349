//! Longitudinal profile: an ordered chain of cross-sections.
//!
//! The profile owns its sections in a vector which is the only ordering
//! authority. Index 0 is the upstream end and `x` increases downstream.
//! Each section stores the indices of its neighbours; these are rebuilt
//! whenever the vector changes.

use thiserror::Error;

use crate::mesh::section::{Section, SectionError};

/// Errors raised while building or refining a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Not enough sections to describe a reach
    #[error("a profile needs at least 2 sections, got {0}")]
    TooFewSections(usize),

    /// Two sections share the same position
    #[error("duplicate abscissa x = {0}")]
    DuplicateAbscissa(f64),

    /// Position is NaN or infinite
    #[error("non-finite abscissa for section {0}")]
    NonFiniteAbscissa(usize),

    /// Refinement step must be positive
    #[error("refinement step dx must be positive, got {0}")]
    InvalidStep(f64),

    /// Failure while interpolating new sections
    #[error(transparent)]
    Section(#[from] SectionError),
}

/// Ordered chain of sections from upstream to downstream.
#[derive(Clone, Debug)]
pub struct Profile {
    name: String,
    sections: Vec<Section>,
    reversed: bool,
}

impl Profile {
    /// Build a profile, normalising its orientation.
    ///
    /// When the lowest bed lies at a smaller `x` than the highest bed, the
    /// abscissa is reflected with `x' = x_min + x_max - x` so that the
    /// upstream end has the smallest `x`. Sections are then sorted by `x`.
    pub fn new(name: impl Into<String>, mut sections: Vec<Section>) -> Result<Self, ProfileError> {
        let name = name.into();
        if sections.len() < 2 {
            return Err(ProfileError::TooFewSections(sections.len()));
        }
        if let Some(i) = sections.iter().position(|s| !s.x().is_finite()) {
            return Err(ProfileError::NonFiniteAbscissa(i));
        }

        let reversed = needs_reflection(&sections);
        if reversed {
            log::info!(
                "profile '{}': reversed abscissa, upstream is now at the lowest x",
                name
            );
            let x_min = sections.iter().map(Section::x).fold(f64::INFINITY, f64::min);
            let x_max = sections.iter().map(Section::x).fold(f64::NEG_INFINITY, f64::max);
            for section in &mut sections {
                section.set_x(x_min + x_max - section.x());
            }
        }

        sections.sort_by(|a, b| a.x().total_cmp(&b.x()));
        if let Some(w) = sections.windows(2).find(|w| w[0].x() == w[1].x()) {
            return Err(ProfileError::DuplicateAbscissa(w[0].x()));
        }

        let mut profile = Self {
            name,
            sections,
            reversed,
        };
        profile.relink();
        Ok(profile)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Always false for a constructed profile.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// True if the input abscissa was reflected at construction.
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn sections_mut(&mut self) -> &mut [Section] {
        &mut self.sections
    }

    pub fn section(&self, i: usize) -> Option<&Section> {
        self.sections.get(i)
    }

    /// Insert interpolated sections so that no gap exceeds `dx`.
    ///
    /// Existing sections are kept unchanged; a gap of length L receives
    /// ceil(L / dx) - 1 evenly spaced sections.
    pub fn complete(&mut self, dx: f64) -> Result<(), ProfileError> {
        if !(dx > 0.0 && dx.is_finite()) {
            return Err(ProfileError::InvalidStep(dx));
        }

        let mut refined = Vec::with_capacity(self.sections.len());
        for pair in self.sections.windows(2) {
            let (up, down) = (&pair[0], &pair[1]);
            refined.push(up.clone());
            let gap = down.x() - up.x();
            let n_intervals = (gap / dx).ceil() as usize;
            for k in 1..n_intervals {
                let x = up.x() + gap * k as f64 / n_intervals as f64;
                refined.push(up.interpolate_as_upstream_of(down, Some(x))?);
            }
        }
        if let Some(last) = self.sections.last() {
            refined.push(last.clone());
        }

        let added = refined.len() - self.sections.len();
        if added > 0 {
            log::info!(
                "profile '{}': {} interpolated sections added (dx = {})",
                self.name,
                added,
                dx
            );
        }
        self.sections = refined;
        self.relink();
        Ok(())
    }

    /// Rebuild the neighbour indices from the vector order.
    fn relink(&mut self) {
        let n = self.sections.len();
        for (i, section) in self.sections.iter_mut().enumerate() {
            section.upstream = i.checked_sub(1);
            section.downstream = if i + 1 < n { Some(i + 1) } else { None };
        }
    }

    /// Section positions.
    pub fn abscissa(&self) -> Vec<f64> {
        self.sections.iter().map(Section::x).collect()
    }

    /// Bed elevations.
    pub fn elevations(&self) -> Vec<f64> {
        self.sections.iter().map(Section::z).collect()
    }

    /// Reach length attached to each section.
    ///
    /// Half the distance to each neighbour, so the lengths sum to the
    /// total profile length.
    pub fn section_lengths(&self) -> Vec<f64> {
        let x = self.abscissa();
        let n = x.len();
        (0..n)
            .map(|i| {
                let up = if i > 0 { x[i] - x[i - 1] } else { 0.0 };
                let down = if i + 1 < n { x[i + 1] - x[i] } else { 0.0 };
                0.5 * (up + down)
            })
            .collect()
    }

    /// Smallest distance between consecutive sections.
    pub fn dx_min(&self) -> f64 {
        self.sections
            .windows(2)
            .map(|w| w[1].x() - w[0].x())
            .fold(f64::INFINITY, f64::min)
    }

    /// Total length between the end sections.
    pub fn length(&self) -> f64 {
        match (self.sections.first(), self.sections.last()) {
            (Some(first), Some(last)) => last.x() - first.x(),
            _ => 0.0,
        }
    }

    /// Indices (i, i+1) of the interval used for slopes at section `i`.
    ///
    /// Every section looks downstream except the last one, which reuses the
    /// interval upstream of it.
    fn slope_interval(&self, i: usize) -> (usize, usize) {
        let n = self.sections.len();
        if i + 1 < n { (i, i + 1) } else { (n - 2, n - 1) }
    }

    /// Bed slope I = (z_i - z_{i+1}) / (x_{i+1} - x_i) at section `i`.
    pub fn bed_slope(&self, i: usize) -> f64 {
        let (a, b) = self.slope_interval(i);
        let (up, down) = (&self.sections[a], &self.sections[b]);
        (up.z() - down.z()) / (down.x() - up.x())
    }

    /// Energy-line slope at section `i` for discharge `q` and the given depths.
    pub fn energy_slope(&self, i: usize, q: f64, depth: &[f64]) -> f64 {
        let (a, b) = self.slope_interval(i);
        let (up, down) = (&self.sections[a], &self.sections[b]);
        (up.energy_head(q, depth[a]) - down.energy_head(q, depth[b])) / (down.x() - up.x())
    }

    /// Total bulk volume stored in the bed since the start (m³).
    pub fn stored_volume(&self) -> Result<f64, SectionError> {
        self.sections.iter().map(Section::stored_volume).sum()
    }
}

/// True when the lowest bed sits at a smaller x than the highest bed.
fn needs_reflection(sections: &[Section]) -> bool {
    let mut lowest = &sections[0];
    let mut highest = &sections[0];
    for section in &sections[1..] {
        if section.z() < lowest.z() {
            lowest = section;
        }
        if section.z() > highest.z() {
            highest = section;
        }
    }
    lowest.x() < highest.x()
}
