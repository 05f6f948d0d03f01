//! The sharing engine: partitions a whitened secret's pixels into
//! length-`k` groups, treats each group as the coefficients of a degree
//! `k-1` polynomial over GF(257), and evaluates it at `x = 1..=n` to produce
//! `n` shadow pixel streams.

use crate::bmp::Bitmap;
use crate::error::{Result, ShadowShareError};
use crate::gf257;

/// Evaluates `f(x) = sum(coeffs[i] * x^i)` mod 257.
///
/// Reduces `acc` mod 257 after every term rather than summing `k` unreduced
/// products first: `k` is bounded only by `n <= 65535`, so an unreduced
/// accumulator would overflow `i32` well before the loop ends.
fn evaluate(coeffs: &[u16], x: u16) -> u16 {
    let mut acc = 0i64;
    let mut power = 1i64;
    for &c in coeffs {
        acc = (acc + c as i64 * power) % gf257::PRIME as i64;
        power = (power * x as i64) % gf257::PRIME as i64;
    }
    gf257::reduce(acc as i32)
}

/// Applies the coefficient-repair rule in place: while some evaluation at
/// `x = 1..=n` lands on 256 (unrepresentable in a byte), decrements the
/// first non-zero coefficient (mod 256) and re-evaluates.
///
/// This follows the source's actual documented behavior rather than the
/// paper's idealized claim that a zero coefficient is always available to
/// absorb the adjustment (see the Open Question in the spec). When this
/// branch triggers on a coefficient the whitening mask did not zero out,
/// the recovered secret will differ from the original by the applied
/// decrements; callers that care should treat a `true` return as a
/// diagnostic signal.
fn repair_coefficients(coeffs: &mut [u16], n: u16) -> bool {
    let mut repaired = false;
    loop {
        let overflow = (1..=n).any(|x| evaluate(coeffs, x) == 256);
        if !overflow {
            break;
        }
        repaired = true;
        match coeffs.iter().position(|&c| c != 0) {
            Some(i) => coeffs[i] = (coeffs[i] as i32 - 1).rem_euclid(256) as u16,
            None => {
                // All-zero coefficients cannot evaluate to 256 anywhere, so
                // this is unreachable in practice; guard against an infinite
                // loop regardless.
                break;
            }
        }
    }
    repaired
}

/// Shares an already-whitened secret bitmap into `n` shadow bitmaps, each
/// holding `|secret pixels| / k` logical pixels.
///
/// `secret` must already have had `prng::mask_in_place` applied; this
/// function is the pure polynomial-sharing step and does not whiten or
/// un-whiten anything itself.
pub fn share(secret: &Bitmap, k: u16, n: u16, seed: u16) -> Result<Vec<Bitmap>> {
    if !(2..=n).contains(&k) || n < 2 || n > 65535 {
        return Err(ShadowShareError::InvalidArguments(format!(
            "k and n must satisfy 2 <= k <= n <= 65535 (got k={k}, n={n})"
        )));
    }

    let pixels = secret.logical_pixels();
    let k_usize = k as usize;
    if pixels.len() % k_usize != 0 {
        return Err(ShadowShareError::InvalidArguments(format!(
            "secret pixel count {} is not divisible by k={k}",
            pixels.len()
        )));
    }
    let pixels_per_shadow = pixels.len() / k_usize;
    let (width, height) = Bitmap::shadow_dimensions(pixels_per_shadow).ok_or_else(|| {
        ShadowShareError::UnsupportedBmp {
            path: "<secret>".into(),
            reason: format!("shadow size {pixels_per_shadow} has no usable dimensions"),
        }
    })?;

    let mut shadow_pixels: Vec<Vec<u8>> = (0..n).map(|_| vec![0u8; pixels_per_shadow]).collect();

    for (group_idx, group) in pixels.chunks_exact(k_usize).enumerate() {
        let mut coeffs: Vec<u16> = group.iter().map(|&b| b as u16).collect();
        repair_coefficients(&mut coeffs, n);
        for (shadow_idx, shadow) in shadow_pixels.iter_mut().enumerate() {
            let x = (shadow_idx + 1) as u16;
            let v = evaluate(&coeffs, x);
            debug_assert!(v <= 255, "coefficient repair left an out-of-range value");
            shadow[group_idx] = v as u8;
        }
    }

    Ok(shadow_pixels
        .into_iter()
        .enumerate()
        .map(|(i, pixels)| {
            Bitmap::from_logical_pixels(width, height, seed, (i + 1) as u16, &pixels)
        })
        .collect())
}
