//! The reconstruction engine: given `k` shadows, rebuilds each pixel group
//! of the (still-whitened) secret by solving a k×(k+1) Vandermonde-augmented
//! linear system over GF(257) with Gaussian elimination.
//!
//! This is algorithmically equivalent to Lagrange interpolation at `x = 0`
//! for each coefficient's contribution, just organized as elimination
//! instead (the spec calls elimination and Lagrange interpolation
//! equivalent ways of solving the same system).

use crate::bmp::Bitmap;
use crate::error::{Result, ShadowShareError};
use crate::gf257;

/// A k×(k+1) matrix over GF(257), stored as a single contiguous row-major
/// buffer rather than k separately-allocated rows (see the Design Note on
/// matrix representation).
struct Matrix {
    k: usize,
    data: Vec<u16>,
}

impl Matrix {
    fn get(&self, row: usize, col: usize) -> u16 {
        self.data[row * (self.k + 1) + col]
    }

    fn set(&mut self, row: usize, col: usize, value: u16) {
        self.data[row * (self.k + 1) + col] = value;
    }
}

/// Reconstructs the secret's logical pixel stream from `k` shadows.
///
/// All shadows must carry distinct, non-zero `shadow_index` values and the
/// same `seed`; any violation is a `MalformedShadow` error. A zero pivot
/// encountered mid-elimination (which cannot happen for distinct non-zero
/// indices, but is checked defensively) is an `ArithmeticFailure`.
pub fn reconstruct(shadows: &[Bitmap]) -> Result<(Vec<u8>, u16)> {
    let k = shadows.len();
    if k < 2 {
        return Err(ShadowShareError::InvalidArguments(
            "reconstruction requires at least 2 shadows".into(),
        ));
    }

    let xs: Vec<u16> = shadows.iter().map(|s| s.shadow_index).collect();
    if xs.iter().any(|&x| x == 0) {
        return Err(ShadowShareError::MalformedShadow(
            "a shadow with index 0 was supplied (0 means 'not a shadow')".into(),
        ));
    }
    let mut sorted_xs = xs.clone();
    sorted_xs.sort_unstable();
    sorted_xs.dedup();
    if sorted_xs.len() != xs.len() {
        return Err(ShadowShareError::MalformedShadow(
            "duplicate shadow indices among the supplied shadows".into(),
        ));
    }

    let seed = shadows[0].seed;
    if shadows.iter().any(|s| s.seed != seed) {
        return Err(ShadowShareError::MalformedShadow(
            "supplied shadows disagree on their seed header".into(),
        ));
    }

    let pixel_streams: Vec<Vec<u8>> = shadows.iter().map(|s| s.logical_pixels()).collect();
    let m = pixel_streams[0].len();
    if pixel_streams.iter().any(|p| p.len() != m) {
        return Err(ShadowShareError::MalformedShadow(
            "supplied shadows do not all hold the same pixel count".into(),
        ));
    }

    let mut out = vec![0u8; m * k];
    for p in 0..m {
        let mut matrix = Matrix { k, data: vec![0u16; k * (k + 1)] };
        for (row, &x) in xs.iter().enumerate() {
            let mut power = 1u16;
            for col in 0..k {
                matrix.set(row, col, power);
                power = gf257::reduce(power as i32 * x as i32);
            }
            matrix.set(row, k, pixel_streams[row][p] as u16);
        }

        let coeffs = gaussian_eliminate(&mut matrix)?;
        out[p * k..p * k + k].copy_from_slice(
            &coeffs.iter().map(|&c| c as u8).collect::<Vec<u8>>(),
        );
    }

    Ok((out, seed))
}

/// Solves `matrix` (k rows, k unknowns, augmented column `k`) in place,
/// returning the `k` solved coefficients. Forward elimination followed by
/// back-substitution, exactly as specified.
fn gaussian_eliminate(matrix: &mut Matrix) -> Result<Vec<u16>> {
    let k = matrix.k;

    // Forward elimination.
    for c in 0..k.saturating_sub(1) {
        for r in (c + 1..k).rev() {
            let pivot = matrix.get(r - 1, c);
            if pivot == 0 {
                return Err(ShadowShareError::ArithmeticFailure(format!(
                    "zero pivot at row {}, column {c} during forward elimination",
                    r - 1
                )));
            }
            let alpha = gf257::reduce(matrix.get(r, c) as i32 * gf257::inv(pivot) as i32);
            for t in c..=k {
                let updated =
                    gf257::reduce(matrix.get(r, t) as i32 - matrix.get(r - 1, t) as i32 * alpha as i32);
                matrix.set(r, t, updated);
            }
        }
    }

    // Back-substitution.
    for i in (1..k).rev() {
        let pivot = matrix.get(i, i);
        if pivot == 0 {
            return Err(ShadowShareError::ArithmeticFailure(format!(
                "zero pivot at row {i} during back-substitution"
            )));
        }
        let inv_pivot = gf257::inv(pivot);
        for t in i..=k {
            matrix.set(i, t, gf257::reduce(matrix.get(i, t) as i32 * inv_pivot as i32));
        }
        for row in 0..i {
            let factor = matrix.get(row, i);
            let updated = gf257::reduce(matrix.get(row, k) as i32 - matrix.get(i, k) as i32 * factor as i32);
            matrix.set(row, k, updated);
            matrix.set(row, i, 0);
        }
    }

    if matrix.get(0, 0) == 0 {
        return Err(ShadowShareError::ArithmeticFailure(
            "zero pivot at row 0 after elimination".into(),
        ));
    }
    let inv_pivot = gf257::inv(matrix.get(0, 0));
    let a0 = gf257::reduce(matrix.get(0, k) as i32 * inv_pivot as i32);
    matrix.set(0, k, a0);

    Ok((0..k).map(|row| matrix.get(row, k)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shadow(pixels: &[u8], seed: u16, index: u16) -> Bitmap {
        Bitmap::from_logical_pixels(pixels.len() as u32, 1, seed, index, pixels)
    }

    #[test]
    fn reconstructs_constant_coefficients_from_two_shadows() {
        // coefficients (a0=10, a1=20): f(1)=30, f(2)=50
        let s1 = shadow(&[30], 0, 1);
        let s2 = shadow(&[50], 0, 2);
        let (pixels, seed) = reconstruct(&[s1, s2]).unwrap();
        assert_eq!(pixels, vec![10, 20]);
        assert_eq!(seed, 0);
    }

    #[test]
    fn rejects_shadow_with_zero_index() {
        let s1 = shadow(&[30], 0, 0);
        let s2 = shadow(&[50], 0, 2);
        assert!(reconstruct(&[s1, s2]).is_err());
    }

    #[test]
    fn rejects_duplicate_indices() {
        let s1 = shadow(&[30], 0, 1);
        let s2 = shadow(&[50], 0, 1);
        assert!(reconstruct(&[s1, s2]).is_err());
    }

    #[test]
    fn rejects_disagreeing_seeds() {
        let s1 = shadow(&[30], 0, 1);
        let s2 = shadow(&[50], 9, 2);
        assert!(reconstruct(&[s1, s2]).is_err());
    }
}
