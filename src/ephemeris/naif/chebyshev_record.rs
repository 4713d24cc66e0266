//! Chebyshev ephemeris records (SPK types 2 and 3).
//!
//! A record is the midpoint `mid` (ET seconds), the half-interval `radius`
//! (seconds), and `ncoeff` Chebyshev coefficients per axis for the position (km).
//! Type 3 records carry `ncoeff` more coefficients per axis for the velocity,
//! which the boundary analysis does not need and which are therefore not kept.
//!
//! The normalized time is `t = (et - mid) / radius`, clamped to `[-1, 1]`.

use nalgebra::Vector3;

/// One SPK Chebyshev record (midpoint, half-width, position coefficients).
#[derive(Debug, Clone, PartialEq)]
pub struct ChebyshevRecord {
    /// ET seconds
    pub mid: f64,
    /// seconds
    pub radius: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl ChebyshevRecord {
    /// Decode one record from its words.
    ///
    /// Arguments
    /// -----------------
    /// * `words`: the `rsize` words of the record.
    /// * `components`: `3` for type 2 (position), `6` for type 3 (position + velocity).
    pub fn from_words(words: &[f64], components: usize) -> Self {
        let ncoeff = (words.len() - 2) / components;
        let coeffs = |axis: usize| words[2 + axis * ncoeff..2 + (axis + 1) * ncoeff].to_vec();

        ChebyshevRecord {
            mid: words[0],
            radius: words[1],
            x: coeffs(0),
            y: coeffs(1),
            z: coeffs(2),
        }
    }

    /// Decode `n_records` contiguous records of `rsize` words.
    pub fn parse_all(
        words: &[f64],
        rsize: usize,
        n_records: usize,
        components: usize,
    ) -> Vec<Self> {
        words
            .chunks_exact(rsize)
            .take(n_records)
            .map(|record| Self::from_words(record, components))
            .collect()
    }

    /// Position (km) at `et`, clamped to the record span.
    pub fn interpolate(&self, et: f64) -> Vector3<f64> {
        let t = ((et - self.mid) / self.radius).clamp(-1.0, 1.0);
        Vector3::new(clenshaw(&self.x, t), clenshaw(&self.y, t), clenshaw(&self.z, t))
    }
}

/// Sum of `coeffs[k] * T_k(t)` by Clenshaw's backward recurrence.
fn clenshaw(coeffs: &[f64], t: f64) -> f64 {
    let Some((&c0, higher)) = coeffs.split_first() else {
        return 0.0;
    };
    let (mut b1, mut b2) = (0.0, 0.0);
    for &c in higher.iter().rev() {
        (b1, b2) = (c + 2.0 * t * b1 - b2, b1);
    }
    c0 + t * b1 - b2
}
