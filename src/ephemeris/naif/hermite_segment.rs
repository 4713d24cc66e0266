//! SPK type 13 segments: Hermite interpolation over unequally spaced states.
//!
//! Segment layout, in double-precision words:
//!
//! ```text
//! N states (x, y, z, vx, vy, vz)   6·N words, km and km/s
//! N epochs                          N words, ET seconds, strictly increasing
//! epoch directory                   (N - 1) / 100 words, every 100th epoch
//! window size - 1                   1 word
//! N                                 1 word
//! ```
//!
//! The interpolation window holds `window_size` consecutive states centered on the
//! interval that contains the request epoch, shifted inward at the segment edges.
use nalgebra::Vector3;

use crate::boundary_errors::BoundaryError;

#[derive(Debug, Clone, PartialEq)]
pub struct HermiteSegment {
    pub epochs: Vec<f64>,
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
    pub window_size: usize,
}

impl HermiteSegment {
    /// Decode a type 13 segment from its words.
    pub fn from_segment_words(words: &[f64]) -> Result<Self, BoundaryError> {
        let invalid = |reason: String| BoundaryError::InvalidDafFile(format!("type 13 segment: {reason}"));

        let (n, window_minus_one) = match words {
            [.., w, n] => (*n, *w),
            _ => return Err(invalid("fewer than two words".to_string())),
        };
        if !(n >= 1.0 && window_minus_one >= 0.0) {
            return Err(invalid(format!("N = {n}, window size - 1 = {window_minus_one}")));
        }
        let n = n as usize;
        let window_size = window_minus_one as usize + 1;
        let directory_size = (n - 1) / 100;

        let expected = 7 * n + directory_size + 2;
        if words.len() < expected {
            return Err(invalid(format!(
                "{} words for {n} states (expected {expected})",
                words.len()
            )));
        }

        let (states, rest) = words.split_at(6 * n);
        let epochs = rest[..n].to_vec();
        if epochs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid("epochs are not strictly increasing".to_string()));
        }

        let positions = states
            .chunks_exact(6)
            .map(|s| Vector3::new(s[0], s[1], s[2]))
            .collect();
        let velocities = states
            .chunks_exact(6)
            .map(|s| Vector3::new(s[3], s[4], s[5]))
            .collect();

        Ok(HermiteSegment {
            epochs,
            positions,
            velocities,
            window_size: window_size.min(n),
        })
    }

    /// Index range `[first, first + window)` of the states used at `et_seconds`.
    fn window(&self, et_seconds: f64) -> std::ops::Range<usize> {
        let n = self.epochs.len();
        let window = self.window_size.max(1);

        // last epoch <= et, so that et lies in [epochs[low], epochs[low + 1])
        let low = self.epochs.partition_point(|&t| t <= et_seconds).saturating_sub(1);

        let first = (low + 1).saturating_sub(window / 2);
        let first = first.min(n - window);
        first..first + window
    }

    /// Interpolate the position (km) at `et_seconds`.
    pub fn interpolate(&self, et_seconds: f64) -> Vector3<f64> {
        let range = self.window(et_seconds);
        let times = &self.epochs[range.clone()];

        let mut position = Vector3::zeros();
        for axis in 0..3 {
            let values: Vec<f64> = self.positions[range.clone()].iter().map(|p| p[axis]).collect();
            let derivatives: Vec<f64> = self.velocities[range.clone()].iter().map(|v| v[axis]).collect();
            position[axis] = hermite_interpolate(times, &values, &derivatives, et_seconds);
        }
        position
    }
}

/// Hermite interpolation through `(t_i, f_i, f'_i)` using Newton divided
/// differences on the doubled nodes `t_0, t_0, t_1, t_1, ...`.
pub fn hermite_interpolate(times: &[f64], values: &[f64], derivatives: &[f64], t: f64) -> f64 {
    let m = 2 * times.len();
    if m == 0 {
        return 0.0;
    }

    let nodes: Vec<f64> = times.iter().flat_map(|&ti| [ti, ti]).collect();
    let mut table: Vec<f64> = values.iter().flat_map(|&fi| [fi, fi]).collect();

    // first-order differences; repeated nodes use the derivative
    let mut coefficients = Vec::with_capacity(m);
    coefficients.push(table[0]);
    for order in 1..m {
        for i in (order..m).rev() {
            let span = nodes[i] - nodes[i - order];
            table[i] = if order == 1 && i % 2 == 1 {
                derivatives[i / 2]
            } else {
                (table[i] - table[i - 1]) / span
            };
        }
        coefficients.push(table[order]);
    }

    // Horner evaluation of the Newton form
    let mut result = coefficients[m - 1];
    for k in (0..m - 1).rev() {
        result = result * (t - nodes[k]) + coefficients[k];
    }
    result
}

#[cfg(test)]
mod test_hermite_segment {
    use super::*;
    use approx::assert_relative_eq;

    /// Cubic trajectory x = t³ - 2t, y = 5, z = -t², sampled at `times`.
    fn cubic_words(times: &[f64], window_size: usize) -> Vec<f64> {
        let mut words = Vec::new();
        for &t in times {
            words.extend_from_slice(&[t.powi(3) - 2.0 * t, 5.0, -t * t]);
            words.extend_from_slice(&[3.0 * t * t - 2.0, 0.0, -2.0 * t]);
        }
        words.extend_from_slice(times);
        for i in (1..=(times.len() - 1) / 100).map(|k| k * 100) {
            words.push(times[i - 1]);
        }
        words.push((window_size - 1) as f64);
        words.push(times.len() as f64);
        words
    }

    #[test]
    fn test_hermite_interpolate_cubic_exact() {
        let times = [0.0, 1.0, 3.0];
        let values: Vec<f64> = times.iter().map(|t: &f64| t.powi(3) - 2.0 * t).collect();
        let derivs: Vec<f64> = times.iter().map(|t: &f64| 3.0 * t * t - 2.0).collect();
        for t in [0.25, 1.5, 2.9] {
            assert_relative_eq!(
                hermite_interpolate(&times, &values, &derivs, t),
                t.powi(3) - 2.0 * t,
                epsilon = 1e-10
            );
        }
    }

    #[test]
    fn test_segment_decode_and_interpolate() {
        let times = [0.0, 2.0, 3.0, 7.0, 8.0, 10.0];
        let segment = HermiteSegment::from_segment_words(&cubic_words(&times, 4)).unwrap();
        assert_eq!(segment.epochs.len(), 6);
        assert_eq!(segment.window_size, 4);

        for t in [0.0, 1.0, 2.5, 5.0, 9.9, 10.0] {
            let p = segment.interpolate(t);
            assert_relative_eq!(p.x, t.powi(3) - 2.0 * t, epsilon = 1e-8);
            assert_relative_eq!(p.y, 5.0, epsilon = 1e-10);
            assert_relative_eq!(p.z, -t * t, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_window_centered_and_clamped() {
        let times = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let segment = HermiteSegment::from_segment_words(&cubic_words(&times, 4)).unwrap();
        assert_eq!(segment.window(3.5), 2..6);
        assert_eq!(segment.window(0.1), 0..4);
        assert_eq!(segment.window(6.0), 3..7);
    }

    #[test]
    fn test_rejects_unsorted_epochs() {
        let times = [0.0, 2.0, 1.0];
        assert!(HermiteSegment::from_segment_words(&cubic_words(&times, 2)).is_err());
    }
}
