//! Bit-exact reader/writer for the uncompressed 8-bit indexed BMP variant
//! this crate treats as its canonical container: a 14-byte file header, a
//! 40-byte `BITMAPINFOHEADER`-shaped DIB header whose two reserved 16-bit
//! slots in the file header double as the *seed* and *shadow-index*
//! channels, a fixed 1024-byte greyscale palette, and a row-padded pixel
//! array.
//!
//! Every multi-byte field is serialized explicitly as little-endian on both
//! read and write, so the on-disk form is identical regardless of host
//! endianness (see the Design Note on header endianness).

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use byteorder::{ReadBytesExt, WriteBytesExt, LE};

use crate::error::{Result, ShadowShareError};

const MAGIC: [u8; 2] = *b"BM";
const DIB_HEADER_SIZE: u32 = 40;
const PIXEL_DATA_OFFSET: u32 = 1078;
const PALETTE_LEN: usize = 1024;
const HEADER_LEN: usize = 14 + 40 + PALETTE_LEN; // == PIXEL_DATA_OFFSET as usize

/// An in-memory 8-bit indexed bitmap: the canonical form every component of
/// this crate (codec, sharing, reconstruction, stego) reads and writes.
#[derive(Clone)]
pub struct Bitmap {
    pub width: u32,
    pub height: i32,
    pub palette: [u8; PALETTE_LEN],
    /// Raw on-disk pixel bytes, including row padding to a 4-byte boundary.
    pub pixels: Vec<u8>,
    /// Reserved header slot #1: the PRNG seed that whitened this image, or
    /// that this shadow's shares were produced under.
    pub seed: u16,
    /// Reserved header slot #2: the x-coordinate of this share, 0 if this
    /// bitmap is not a shadow.
    pub shadow_index: u16,
}

impl Bitmap {
    /// Row stride in bytes, padded to a 4-byte boundary.
    pub fn row_stride(width: u32) -> usize {
        ((8 * width as usize + 31) / 32) * 4
    }

    /// Exact on-disk pixel array length for a `width x height` image.
    pub fn pixel_array_size(width: u32, height: u32) -> usize {
        Self::row_stride(width) * height as usize
    }

    fn height_abs(&self) -> u32 {
        self.height.unsigned_abs()
    }

    /// The standard greyscale palette: entry `i` is `(i, i, i, 0)`.
    pub fn greyscale_palette() -> [u8; PALETTE_LEN] {
        let mut palette = [0u8; PALETTE_LEN];
        for i in 0..256usize {
            palette[i * 4] = i as u8;
            palette[i * 4 + 1] = i as u8;
            palette[i * 4 + 2] = i as u8;
            palette[i * 4 + 3] = 0;
        }
        palette
    }

    /// Builds a fresh, zeroed bitmap of the given dimensions carrying the
    /// standard greyscale palette and the given seed/shadow-index header
    /// values (`newBitmap` in the spec).
    pub fn new(width: u32, height: u32, seed: u16, shadow_index: u16) -> Self {
        Self {
            width,
            height: height as i32,
            palette: Self::greyscale_palette(),
            pixels: vec![0u8; Self::pixel_array_size(width, height)],
            seed,
            shadow_index,
        }
    }

    /// The flat `width * height` logical pixel stream, with row padding
    /// stripped. The sharing, reconstruction and stego layers all work over
    /// this flat view rather than the padded on-disk buffer.
    pub fn logical_pixels(&self) -> Vec<u8> {
        let width = self.width as usize;
        let height = self.height_abs() as usize;
        let stride = Self::row_stride(self.width);
        let mut out = Vec::with_capacity(width * height);
        for row in 0..height {
            let start = row * stride;
            out.extend_from_slice(&self.pixels[start..start + width]);
        }
        out
    }

    /// Builds a bitmap from a flat logical pixel stream of exactly
    /// `width * height` bytes, re-padding each row to the 4-byte boundary.
    pub fn from_logical_pixels(
        width: u32,
        height: u32,
        seed: u16,
        shadow_index: u16,
        logical: &[u8],
    ) -> Self {
        assert_eq!(logical.len(), (width as usize) * (height as usize));
        let stride = Self::row_stride(width);
        let mut pixels = vec![0u8; stride * height as usize];
        for row in 0..height as usize {
            let src = &logical[row * width as usize..(row + 1) * width as usize];
            let dst_start = row * stride;
            pixels[dst_start..dst_start + width as usize].copy_from_slice(src);
        }
        Self {
            width,
            height: height as i32,
            palette: Self::greyscale_palette(),
            pixels,
            seed,
            shadow_index,
        }
    }

    /// Chooses `(width, height)` for a shadow holding `pixels_per_shadow`
    /// logical pixels: `width` is the largest divisor of `pixels_per_shadow`
    /// not exceeding `floor(sqrt(pixels_per_shadow))`, preferring a divisor
    /// above 2 so shadows are roughly square rather than a thin strip.
    ///
    /// When no divisor above 2 exists (small `pixels_per_shadow`, e.g. the
    /// (2,2) minimal scenario's 2-pixel shadows), falls back to the largest
    /// divisor at all -- still a valid, if visually degenerate, bitmap --
    /// rather than the source's width=0 bug (see the Design Note). Only
    /// `pixels_per_shadow == 0` has no valid dimensions and is rejected.
    pub fn shadow_dimensions(pixels_per_shadow: usize) -> Option<(u32, u32)> {
        if pixels_per_shadow == 0 {
            return None;
        }
        let sqrt = (pixels_per_shadow as f64).sqrt() as usize;
        for width in (1..=sqrt.max(1)).rev() {
            if pixels_per_shadow % width == 0 && width > 2 {
                return Some((width as u32, (pixels_per_shadow / width) as u32));
            }
        }
        for width in (1..=sqrt.max(1)).rev() {
            if pixels_per_shadow % width == 0 {
                return Some((width as u32, (pixels_per_shadow / width) as u32));
            }
        }
        None
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| ShadowShareError::io(path, e))?;
        Self::read_bytes(&bytes).map_err(|e| attach_path(e, path))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.write_bytes();
        fs::write(path, bytes).map_err(|e| ShadowShareError::io(path, e))
    }

    /// Parses a BMP from an in-memory buffer. Used directly by tests and by
    /// `read_from`.
    pub fn read_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(ShadowShareError::NotABmp { path: "<memory>".into() });
        }
        let mut buf = Cursor::new(data);

        let mut magic = [0u8; 2];
        buf.read_exact(&mut magic).map_err(|e| ShadowShareError::io("<memory>", e))?;
        if magic != MAGIC {
            return Err(ShadowShareError::NotABmp { path: "<memory>".into() });
        }

        let file_size = buf.read_u32::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let seed = buf.read_u16::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let shadow_index = buf.read_u16::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let pixel_data_offset =
            buf.read_u32::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let dib_header_size =
            buf.read_u32::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;

        if dib_header_size != DIB_HEADER_SIZE {
            return Err(ShadowShareError::UnsupportedBmp {
                path: "<memory>".into(),
                reason: format!("unsupported DIB header size {dib_header_size}"),
            });
        }
        if pixel_data_offset != PIXEL_DATA_OFFSET {
            return Err(ShadowShareError::UnsupportedBmp {
                path: "<memory>".into(),
                reason: format!("unexpected pixel data offset {pixel_data_offset}"),
            });
        }

        let width = buf.read_u32::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let height = buf.read_i32::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let planes = buf.read_u16::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let bits_per_pixel =
            buf.read_u16::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let compression = buf.read_u32::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let pixel_array_size =
            buf.read_u32::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let _hres = buf.read_u32::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let _vres = buf.read_u32::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let _palette_colors =
            buf.read_u32::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;
        let _important_colors =
            buf.read_u32::<LE>().map_err(|e| ShadowShareError::io("<memory>", e))?;

        if width == 0 {
            return Err(ShadowShareError::UnsupportedBmp {
                path: "<memory>".into(),
                reason: "zero width".into(),
            });
        }
        if planes != 1 {
            return Err(ShadowShareError::UnsupportedBmp {
                path: "<memory>".into(),
                reason: format!("unsupported planes count {planes}"),
            });
        }
        if bits_per_pixel != 8 {
            return Err(ShadowShareError::UnsupportedBmp {
                path: "<memory>".into(),
                reason: format!("unsupported bit depth {bits_per_pixel}"),
            });
        }
        if compression != 0 {
            return Err(ShadowShareError::UnsupportedBmp {
                path: "<memory>".into(),
                reason: format!("unsupported compression {compression}"),
            });
        }

        let mut palette = [0u8; PALETTE_LEN];
        buf.read_exact(&mut palette).map_err(|e| ShadowShareError::io("<memory>", e))?;

        let height_abs = height.unsigned_abs();
        let expected_pixel_len = Self::pixel_array_size(width, height_abs);
        if pixel_array_size as usize != expected_pixel_len {
            return Err(ShadowShareError::UnsupportedBmp {
                path: "<memory>".into(),
                reason: format!(
                    "pixel array size {pixel_array_size} does not match {width}x{height_abs} \
                     at 8bpp (expected {expected_pixel_len})"
                ),
            });
        }
        let expected_file_size = (HEADER_LEN + expected_pixel_len) as u32;
        if file_size != expected_file_size {
            return Err(ShadowShareError::UnsupportedBmp {
                path: "<memory>".into(),
                reason: format!(
                    "file size {file_size} does not match header-declared content \
                     (expected {expected_file_size})"
                ),
            });
        }

        let mut pixels = vec![0u8; expected_pixel_len];
        buf.read_exact(&mut pixels).map_err(|e| ShadowShareError::io("<memory>", e))?;

        Ok(Self { width, height, palette, pixels, seed, shadow_index })
    }

    /// Serializes this bitmap to bytes, little-endian on every host.
    pub fn write_bytes(&self) -> Vec<u8> {
        let pixel_array_size = self.pixels.len() as u32;
        let file_size = HEADER_LEN as u32 + pixel_array_size;

        let mut out = Vec::with_capacity(file_size as usize);
        out.write_all(&MAGIC).unwrap();
        out.write_u32::<LE>(file_size).unwrap();
        out.write_u16::<LE>(self.seed).unwrap();
        out.write_u16::<LE>(self.shadow_index).unwrap();
        out.write_u32::<LE>(PIXEL_DATA_OFFSET).unwrap();
        out.write_u32::<LE>(DIB_HEADER_SIZE).unwrap();
        out.write_u32::<LE>(self.width).unwrap();
        out.write_i32::<LE>(self.height).unwrap();
        out.write_u16::<LE>(1).unwrap(); // planes
        out.write_u16::<LE>(8).unwrap(); // bits per pixel
        out.write_u32::<LE>(0).unwrap(); // compression
        out.write_u32::<LE>(pixel_array_size).unwrap();
        out.write_u32::<LE>(0).unwrap(); // hres
        out.write_u32::<LE>(0).unwrap(); // vres
        out.write_u32::<LE>(0).unwrap(); // palette colors
        out.write_u32::<LE>(0).unwrap(); // important colors
        out.write_all(&self.palette).unwrap();
        out.write_all(&self.pixels).unwrap();
        out
    }
}

fn attach_path(err: ShadowShareError, path: &Path) -> ShadowShareError {
    match err {
        ShadowShareError::NotABmp { .. } => ShadowShareError::NotABmp { path: path.to_path_buf() },
        ShadowShareError::UnsupportedBmp { reason, .. } => {
            ShadowShareError::UnsupportedBmp { path: path.to_path_buf(), reason }
        }
        ShadowShareError::Io { source, .. } => ShadowShareError::io(path, source),
        other => other,
    }
}
