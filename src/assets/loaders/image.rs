//! Image decoding for 2D textures and cubemaps.

use bitflags::bitflags;
use image::imageops::FilterType;
use image::RgbaImage;

use crate::errors::{Result, TavernError};
use crate::renderer::backend::{MipLevel, TextureFormat};

bitflags! {
    /// Load-time options. Part of the texture cache key.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TextureFlags: u32 {
        /// Flip rows so the first row of the file becomes the last.
        const FLIP          = 1 << 0;
        /// Build a full mip chain on the CPU.
        const GEN_MIPMAPS   = 1 << 1;
        /// The source is gamma encoded; sample it as sRGB.
        const GAMMA_CORRECT = 1 << 2;
    }
}

/// A decoded RGBA8 image with its mip chain.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub levels: Vec<MipLevel>,
}

/// Number of levels in a full mip chain for the given size.
#[must_use]
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

fn decode_rgba(path: &str, bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| TavernError::ImageDecodeError(format!("{path}: {e}")))?;
    Ok(image.to_rgba8())
}

/// Decodes `bytes` honoring `flags`.
pub fn decode_image(path: &str, bytes: &[u8], flags: TextureFlags) -> Result<ImageData> {
    let mut rgba = decode_rgba(path, bytes)?;
    if flags.contains(TextureFlags::FLIP) {
        image::imageops::flip_vertical_in_place(&mut rgba);
    }

    let (width, height) = rgba.dimensions();
    let format = if flags.contains(TextureFlags::GAMMA_CORRECT) {
        TextureFormat::Rgba8UnormSrgb
    } else {
        TextureFormat::Rgba8Unorm
    };

    let mut levels = Vec::new();
    if flags.contains(TextureFlags::GEN_MIPMAPS) {
        let count = mip_level_count(width, height);
        levels.reserve(count as usize);
        for level in 1..count {
            let w = (width >> level).max(1);
            let h = (height >> level).max(1);
            let mip = image::imageops::resize(&rgba, w, h, FilterType::Triangle);
            levels.push(MipLevel {
                width: w,
                height: h,
                bytes: mip.into_raw(),
            });
        }
    }
    levels.insert(
        0,
        MipLevel {
            width,
            height,
            bytes: rgba.into_raw(),
        },
    );

    Ok(ImageData {
        width,
        height,
        format,
        levels,
    })
}

/// Decodes six square faces of equal size into cubemap layers
/// (+X, -X, +Y, -Y, +Z, -Z).
pub fn decode_cubemap(faces: &[(&str, Vec<u8>); 6]) -> Result<(u32, Vec<Vec<MipLevel>>)> {
    let mut layers = Vec::with_capacity(6);
    let mut size = None;
    for (path, bytes) in faces {
        let rgba = decode_rgba(path, bytes)?;
        let (w, h) = rgba.dimensions();
        if w != h {
            return Err(TavernError::CubeMapError(format!("{path}: face is {w}x{h}, not square")));
        }
        match size {
            None => size = Some(w),
            Some(s) if s != w => {
                return Err(TavernError::CubeMapError(format!(
                    "{path}: face size {w} differs from {s}"
                )));
            }
            Some(_) => {}
        }
        layers.push(vec![MipLevel {
            width: w,
            height: h,
            bytes: rgba.into_raw(),
        }]);
    }
    Ok((size.unwrap_or(0), layers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png(width: u32, height: u32, top: [u8; 4], bottom: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |_, y| {
            if y == 0 { Rgba(top) } else { Rgba(bottom) }
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn mip_count_matches_largest_dimension() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(512, 4), 10);
    }

    #[test]
    fn flip_swaps_first_and_last_rows() {
        let bytes = png(2, 2, [255, 0, 0, 255], [0, 0, 255, 255]);
        let plain = decode_image("a.png", &bytes, TextureFlags::empty()).unwrap();
        let flipped = decode_image("a.png", &bytes, TextureFlags::FLIP).unwrap();
        assert_eq!(&plain.levels[0].bytes[0..4], &[255, 0, 0, 255]);
        assert_eq!(&flipped.levels[0].bytes[0..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn mipmaps_and_gamma_flags() {
        let bytes = png(8, 8, [10, 10, 10, 255], [10, 10, 10, 255]);
        let data = decode_image(
            "b.png",
            &bytes,
            TextureFlags::GEN_MIPMAPS | TextureFlags::GAMMA_CORRECT,
        )
        .unwrap();
        assert_eq!(data.levels.len(), 4);
        assert_eq!(data.levels[3].width, 1);
        assert_eq!(data.format, TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn corrupt_bytes_are_reported() {
        let err = decode_image("bad.png", b"not an image", TextureFlags::empty()).unwrap_err();
        assert!(matches!(err, TavernError::ImageDecodeError(_)));
    }
}
