//! Directory-wide carrier/shadow file discovery, the distribute/recover
//! pipelines' one external collaborator beyond the codec itself.
//!
//! Grounded on the teacher's own `glob::glob_with` directory sweep in
//! `examples/rsb-stats.rs`; adapted here to filter candidates by BMP
//! validity and pixel-count requirements rather than just a file extension.

use std::path::{Path, PathBuf};

use glob::MatchOptions;

use crate::bmp::Bitmap;
use crate::error::{Result, ShadowShareError};

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Every regular file directly inside `dir`, in directory-enumeration order
/// (case-insensitively globbed, matching the teacher's `glob_with` options).
fn regular_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*");
    let pattern = pattern.to_string_lossy().into_owned();
    let mut files = Vec::new();
    for entry in glob::glob_with(&pattern, GLOB_OPTIONS)
        .map_err(|e| ShadowShareError::InvalidArguments(format!("bad carrier directory pattern: {e}")))?
    {
        let path = entry.map_err(|e| ShadowShareError::io(dir, e.into_error()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Finds the first `n` regular files in `dir` that parse as 8-bit BMPs whose
/// logical pixel count is divisible by `k` and large enough to embed one
/// `pixels_per_shadow`-pixel shadow (`>= 8 * pixels_per_shadow`), per
/// spec.md §4.7 step 2. Fails with `InsufficientCarriers` if fewer qualify.
pub fn find_carriers(dir: &Path, n: u16, k: u16, pixels_per_shadow: usize) -> Result<Vec<Bitmap>> {
    let needed = pixels_per_shadow * 8;
    let mut found = Vec::new();
    for path in regular_files(dir)? {
        if found.len() >= n as usize {
            break;
        }
        let Ok(bmp) = Bitmap::read_from(&path) else { continue };
        let pixel_count = bmp.logical_pixels().len();
        if pixel_count % k as usize != 0 {
            continue;
        }
        if pixel_count < needed {
            continue;
        }
        found.push(bmp);
    }
    if found.len() < n as usize {
        return Err(ShadowShareError::InsufficientCarriers {
            dir: dir.to_path_buf(),
            found: found.len(),
            needed: n as usize,
        });
    }
    Ok(found)
}

/// Finds the first `k` regular files in `dir` that parse as 8-bit BMPs
/// carrying a nonzero `shadow_index` header and at least `min_pixels`
/// logical pixels, per spec.md §4.7 step 1 of `recover`.
pub fn find_stego_carriers(dir: &Path, k: u16, min_pixels: usize) -> Result<Vec<Bitmap>> {
    let mut found = Vec::new();
    for path in regular_files(dir)? {
        if found.len() >= k as usize {
            break;
        }
        let Ok(bmp) = Bitmap::read_from(&path) else { continue };
        if bmp.shadow_index == 0 {
            continue;
        }
        if bmp.logical_pixels().len() < min_pixels {
            continue;
        }
        found.push(bmp);
    }
    if found.len() < k as usize {
        return Err(ShadowShareError::InsufficientCarriers {
            dir: dir.to_path_buf(),
            found: found.len(),
            needed: k as usize,
        });
    }
    Ok(found)
}
