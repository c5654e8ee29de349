//! Maxima reached at each section over an event.

use crate::time::EventResult;

/// Per-section maximum of a quantity and the time it was first reached.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    /// Section positions (m)
    pub abscissa: Vec<f64>,
    /// Maximum value at each section
    pub max: Vec<f64>,
    /// Earliest time of the maximum (s)
    pub time_of_max: Vec<f64>,
}

impl Envelope {
    /// Envelope of a `[time][section]` matrix.
    pub fn from_matrix(abscissa: &[f64], time: &[f64], matrix: &[Vec<f64>]) -> Self {
        let n = abscissa.len();
        let mut max = vec![f64::NEG_INFINITY; n];
        let mut time_of_max = vec![time.first().copied().unwrap_or(0.0); n];

        for (row, &t) in matrix.iter().zip(time) {
            for (i, &value) in row.iter().enumerate().take(n) {
                if value > max[i] {
                    max[i] = value;
                    time_of_max[i] = t;
                }
            }
        }

        Self {
            abscissa: abscissa.to_vec(),
            max,
            time_of_max,
        }
    }

    /// Maximum water depth.
    pub fn depth(result: &EventResult) -> Self {
        Self::from_matrix(&result.abscissa, &result.time, &result.depth)
    }

    /// Maximum bed elevation.
    pub fn bed(result: &EventResult) -> Self {
        Self::from_matrix(&result.abscissa, &result.time, &result.bed)
    }

    /// Maximum energy head.
    pub fn energy(result: &EventResult) -> Self {
        Self::from_matrix(&result.abscissa, &result.time, &result.energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_and_first_time() {
        let x = [0.0, 10.0];
        let t = [0.0, 60.0, 120.0];
        let m = vec![vec![1.0, 5.0], vec![3.0, 2.0], vec![3.0, 4.0]];
        let env = Envelope::from_matrix(&x, &t, &m);
        assert_eq!(env.max, vec![3.0, 5.0]);
        assert_eq!(env.time_of_max, vec![60.0, 0.0]);
    }

    #[test]
    fn test_from_event_result() {
        let result = EventResult {
            abscissa: vec![0.0],
            time: vec![0.0, 1.0],
            depth: vec![vec![0.5], vec![0.7]],
            bed: vec![vec![10.0], vec![9.0]],
            energy: vec![vec![11.0], vec![10.5]],
            ..Default::default()
        };
        assert_eq!(Envelope::depth(&result).time_of_max, vec![1.0]);
        assert_eq!(Envelope::bed(&result).max, vec![10.0]);
        assert_eq!(Envelope::energy(&result).max, vec![11.0]);
    }
}
