//! Arithmetic in GF(257), the prime field used for the sharing polynomial.
//!
//! 257 is the smallest prime greater than 255, so every pixel byte 0..=255
//! embeds directly as a field element; the single element 256 is
//! representable in the field but not storable back in a byte, which is the
//! reason the sharing engine needs a coefficient-repair rule at all.

use std::sync::OnceLock;

pub const PRIME: i32 = 257;

/// Euclidean remainder mod 257, always non-negative, for any signed input.
pub fn reduce(x: i32) -> u16 {
    (x.rem_euclid(PRIME)) as u16
}

/// `inv(a)` is the unique `b` in `1..=256` such that `(a * b) % 257 == 1`.
///
/// `a` must be in `1..=256`; `a == 0` has no inverse and panics, since every
/// caller in this crate only looks up inverses of pivot entries already
/// known to be non-zero.
pub fn inv(a: u16) -> u16 {
    table()[a as usize]
}

fn table() -> &'static [u16; 257] {
    static TABLE: OnceLock<[u16; 257]> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

fn build_table() -> [u16; 257] {
    let mut table = [0u16; 257];
    for a in 1..=256i32 {
        table[a as usize] = extended_gcd_inverse(a);
    }
    table
}

/// Extended Euclidean algorithm, specialized to modulus 257.
fn extended_gcd_inverse(a: i32) -> u16 {
    let (mut old_r, mut r) = (a, PRIME);
    let (mut old_s, mut s) = (1i32, 0i32);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }
    debug_assert_eq!(old_r, 1, "{a} is not invertible mod {PRIME}");
    reduce(old_s)
}
