//! `distribute` and `recover`: the two end-to-end pipelines, composing the
//! codec, mask, sharing/reconstruction engines, stego layer and carrier
//! discovery.

use std::path::{Path, PathBuf};

use crate::bmp::Bitmap;
use crate::carriers;
use crate::error::{Result, ShadowShareError};
use crate::prng;
use crate::reconstruct;
use crate::sharing;
use crate::stego;

/// Splits the secret at `secret_path` into `n` shadows and hides each inside
/// a carrier BMP discovered in `dir`, writing `shadow<i>.bmp` for
/// `i in 1..=n` into the current working directory.
///
/// `expected_width`/`expected_height`, when given (spec.md §6: `-w`/`-h` are
/// "used to validate carriers in `-d`"), must match the secret's actual
/// dimensions or this fails with `UnsupportedBmp` before anything is shared.
pub fn distribute(
    dir: &Path,
    secret_path: &Path,
    k: u16,
    n: u16,
    seed: u16,
    expected_width: Option<u32>,
    expected_height: Option<u32>,
) -> Result<()> {
    let mut secret = Bitmap::read_from(secret_path)?;

    if let Some(width) = expected_width {
        if width != secret.width {
            return Err(ShadowShareError::UnsupportedBmp {
                path: secret_path.to_path_buf(),
                reason: format!("declared width {width} does not match secret width {}", secret.width),
            });
        }
    }
    if let Some(height) = expected_height {
        if height != secret.height.unsigned_abs() {
            return Err(ShadowShareError::UnsupportedBmp {
                path: secret_path.to_path_buf(),
                reason: format!(
                    "declared height {height} does not match secret height {}",
                    secret.height.unsigned_abs()
                ),
            });
        }
    }

    let pixel_count = secret.logical_pixels().len();
    if pixel_count % k as usize != 0 {
        return Err(ShadowShareError::UnsupportedBmp {
            path: secret_path.to_path_buf(),
            reason: format!("pixel count {pixel_count} is not divisible by k={k}"),
        });
    }
    let pixels_per_shadow = pixel_count / k as usize;

    let carrier_bmps = carriers::find_carriers(dir, n, k, pixels_per_shadow)?;

    let mut logical = secret.logical_pixels();
    prng::mask_in_place(&mut logical, seed);
    secret = Bitmap::from_logical_pixels(
        secret.width,
        secret.height.unsigned_abs(),
        seed,
        0,
        &logical,
    );

    let shadows = sharing::share(&secret, k, n, seed)?;

    for (carrier, shadow) in carrier_bmps.iter().zip(shadows.iter()) {
        let hidden = stego::hide(carrier, shadow)?;
        let out_path = PathBuf::from(format!("shadow{}.bmp", shadow.shadow_index));
        hidden.write_to(&out_path)?;
    }

    Ok(())
}

/// Reads `k` stego carriers from `dir`, extracts their hidden shadows,
/// reconstructs the whitened secret and un-whitens it, writing the result to
/// `out_path`.
pub fn recover(dir: &Path, out_path: &Path, width: u32, height: u32, k: u16) -> Result<()> {
    let pixel_count = (width as usize) * (height as usize);
    if pixel_count % k as usize != 0 {
        return Err(ShadowShareError::InvalidArguments(format!(
            "secret pixel count {pixel_count} (from {width}x{height}) is not divisible by k={k}"
        )));
    }
    let pixels_per_shadow = pixel_count / k as usize;
    let (shadow_width, shadow_height) = Bitmap::shadow_dimensions(pixels_per_shadow).ok_or_else(|| {
        ShadowShareError::UnsupportedBmp {
            path: dir.to_path_buf(),
            reason: format!("shadow size {pixels_per_shadow} has no usable dimensions"),
        }
    })?;
    let shadow_pixel_len = (shadow_width * shadow_height) as usize;

    let min_carrier_pixels = shadow_pixel_len * 8;
    let carriers = carriers::find_stego_carriers(dir, k, min_carrier_pixels)?;

    let shadows: Vec<Bitmap> = carriers
        .iter()
        .map(|carrier| stego::reveal(carrier, shadow_pixel_len))
        .collect::<Result<_>>()?;

    let (mut pixels, seed) = reconstruct::reconstruct(&shadows)?;
    prng::mask_in_place(&mut pixels, seed);

    let secret = Bitmap::from_logical_pixels(width, height, seed, 0, &pixels);
    secret.write_to(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("shadowshare-orchestrator-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).ok();
        dir
    }

    #[test]
    fn distribute_then_recover_round_trips_a_minimal_secret() {
        let dir = scratch_dir("roundtrip");
        let secret_path = dir.join("secret.bmp");
        let secret = Bitmap::from_logical_pixels(4, 1, 0, 0, &[10, 20, 30, 40]);
        secret.write_to(&secret_path).unwrap();

        // k=2, n=2: need 2 carriers each holding >= 8 * (4/2) = 8 pixels.
        Bitmap::new(8, 1, 0, 0).write_to(&dir.join("carrier_a.bmp")).unwrap();
        Bitmap::new(8, 1, 0, 0).write_to(&dir.join("carrier_b.bmp")).unwrap();

        distribute(&dir, &secret_path, 2, 2, 0, None, None).unwrap();

        // shadow1.bmp/shadow2.bmp land in the current working directory;
        // move them into the scratch dir so recover's glob sees only them.
        for i in 1..=2u16 {
            let name = format!("shadow{i}.bmp");
            fs::rename(&name, dir.join(&name)).unwrap();
        }

        let out_path = dir.join("recovered.bmp");
        recover(&dir, &out_path, 4, 1, 2).unwrap();

        let recovered = Bitmap::read_from(&out_path).unwrap();
        assert_eq!(recovered.logical_pixels(), vec![10, 20, 30, 40]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn distribute_fails_when_not_enough_carriers_qualify() {
        let dir = scratch_dir("insufficient");
        let secret_path = dir.join("secret.bmp");
        let secret = Bitmap::from_logical_pixels(4, 1, 0, 0, &[1, 2, 3, 4]);
        secret.write_to(&secret_path).unwrap();
        Bitmap::new(8, 1, 0, 0).write_to(&dir.join("only_one.bmp")).unwrap();

        let err = distribute(&dir, &secret_path, 2, 2, 0, None, None).unwrap_err();
        assert!(matches!(err, ShadowShareError::InsufficientCarriers { .. }));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn distribute_rejects_a_declared_width_that_does_not_match_the_secret() {
        let dir = scratch_dir("dim-mismatch");
        let secret_path = dir.join("secret.bmp");
        let secret = Bitmap::from_logical_pixels(4, 1, 0, 0, &[1, 2, 3, 4]);
        secret.write_to(&secret_path).unwrap();
        Bitmap::new(8, 1, 0, 0).write_to(&dir.join("carrier_a.bmp")).unwrap();
        Bitmap::new(8, 1, 0, 0).write_to(&dir.join("carrier_b.bmp")).unwrap();

        let err = distribute(&dir, &secret_path, 2, 2, 0, Some(99), None).unwrap_err();
        assert!(matches!(err, ShadowShareError::UnsupportedBmp { .. }));

        fs::remove_dir_all(&dir).ok();
    }
}
