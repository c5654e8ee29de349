//! Wet-area integrals of an open cross-section profile.
//!
//! A cross-section is described bank to bank by a polyline of
//! `(offset, height)` points, heights measured from the section bottom.
//! For a water level `y`, each segment is clipped to the part lying below
//! the free surface and the integrals are accumulated exactly (the depth is
//! linear along a segment).

/// Integral quantities of the wet part of a cross-section.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WetProperties {
    /// Wetted area A (m²)
    pub area: f64,
    /// Wetted perimeter P (m)
    pub perimeter: f64,
    /// Free-surface width T (m)
    pub top_width: f64,
    /// First moment of the wet area about the free surface (m³)
    pub moment: f64,
}

/// Clipped wet part of one segment.
struct WetSegment {
    start: (f64, f64),
    end: (f64, f64),
}

impl WetSegment {
    fn dx(&self) -> f64 {
        self.end.0 - self.start.0
    }

    fn length(&self) -> f64 {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Clip segment p0-p1 to the region below level `y`.
fn clip_segment(p0: (f64, f64), p1: (f64, f64), y: f64) -> Option<WetSegment> {
    let d0 = y - p0.1;
    let d1 = y - p1.1;

    if d0 <= 0.0 && d1 <= 0.0 {
        return None;
    }
    if d0 >= 0.0 && d1 >= 0.0 {
        return Some(WetSegment { start: p0, end: p1 });
    }

    // Crossing: depth vanishes at fraction t along the segment
    let t = d0 / (d0 - d1);
    let crossing = (p0.0 + t * (p1.0 - p0.0), y);
    if d0 > 0.0 {
        Some(WetSegment {
            start: p0,
            end: crossing,
        })
    } else {
        Some(WetSegment {
            start: crossing,
            end: p1,
        })
    }
}

/// Integrate area, perimeter, top width and moment below level `y`.
pub fn wet_properties(points: &[(f64, f64)], y: f64) -> WetProperties {
    let mut props = WetProperties::default();

    for pair in points.windows(2) {
        let Some(seg) = clip_segment(pair[0], pair[1], y) else {
            continue;
        };
        let dx = seg.dx().abs();
        let d0 = y - seg.start.1;
        let d1 = y - seg.end.1;

        props.area += dx * 0.5 * (d0 + d1);
        props.perimeter += seg.length();
        props.top_width += dx;
        props.moment += dx * (d0 * d0 + d0 * d1 + d1 * d1) / 6.0;
    }

    props
}

/// Points of the wet sub-polygon below level `y`, bank to bank.
///
/// The polygon is closed by the free surface between the first and last
/// returned points.
pub fn wet_polygon(points: &[(f64, f64)], y: f64) -> Vec<(f64, f64)> {
    let mut wet: Vec<(f64, f64)> = Vec::with_capacity(points.len() + 2);

    for pair in points.windows(2) {
        if let Some(seg) = clip_segment(pair[0], pair[1], y) {
            if wet.last() != Some(&seg.start) {
                wet.push(seg.start);
            }
            wet.push(seg.end);
        }
    }

    wet
}

/// Lowest bank top: the level above which the section overflows.
pub fn bank_height(points: &[(f64, f64)]) -> f64 {
    match (points.first(), points.last()) {
        (Some(left), Some(right)) => left.1.min(right.1),
        _ => 0.0,
    }
}
