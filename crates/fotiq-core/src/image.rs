//! Decoded source pixels and rendered frames.
//!
//! The engine never decodes files. Callers hand over interleaved buffers
//! (already linear) or an `image::DynamicImage`, and receive the same
//! representation back from a render.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, Result};

/// Bit depth of the buffer an image was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitDepth {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 32-bit floating point.
    F32,
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => write!(f, "8-bit"),
            Self::U16 => write!(f, "16-bit"),
            Self::F32 => write!(f, "32-bit float"),
        }
    }
}

/// Borrowed interleaved pixel data accepted by [`LinearImage::from_interleaved`].
#[derive(Debug, Clone, Copy)]
pub enum PixelData<'a> {
    /// 8-bit RGBA, four bytes per pixel.
    Rgba8(&'a [u8]),
    /// Float RGBA, four values per pixel.
    RgbaF32(&'a [f32]),
    /// Float RGB planes interleaved, three values per pixel. Alpha is opaque.
    RgbF32(&'a [f32]),
}

impl PixelData<'_> {
    fn channels(&self) -> usize {
        match self {
            Self::Rgba8(_) | Self::RgbaF32(_) => 4,
            Self::RgbF32(_) => 3,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Rgba8(d) => d.len(),
            Self::RgbaF32(d) | Self::RgbF32(d) => d.len(),
        }
    }
}

/// Internal image representation. Always RGBA f32, linear.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Row-major RGBA pixels.
    pub pixels: Vec<[f32; 4]>,
    /// Bit depth of the buffer the image was built from.
    pub source_bit_depth: BitDepth,
}

impl LinearImage {
    /// Create an image filled with a single color.
    pub fn filled(width: u32, height: u32, rgba: [f32; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgba; width as usize * height as usize],
            source_bit_depth: BitDepth::F32,
        }
    }

    /// Build an image from an interleaved buffer.
    ///
    /// Fails with [`EngineError::UnsupportedInput`] when a dimension is zero or
    /// the buffer length does not match `width * height * channels`.
    pub fn from_interleaved(data: PixelData<'_>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::unsupported(format!(
                "image dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let pixel_count = width as usize * height as usize;
        let expected = pixel_count * data.channels();
        if data.len() != expected {
            return Err(EngineError::unsupported(format!(
                "buffer holds {} values, {width}x{height} needs {expected}",
                data.len()
            )));
        }

        let (pixels, source_bit_depth) = match data {
            PixelData::Rgba8(bytes) => (
                bytes
                    .chunks_exact(4)
                    .map(|p| {
                        [
                            p[0] as f32 / 255.0,
                            p[1] as f32 / 255.0,
                            p[2] as f32 / 255.0,
                            p[3] as f32 / 255.0,
                        ]
                    })
                    .collect(),
                BitDepth::U8,
            ),
            PixelData::RgbaF32(values) => (
                values
                    .chunks_exact(4)
                    .map(|p| [p[0], p[1], p[2], p[3]])
                    .collect(),
                BitDepth::F32,
            ),
            PixelData::RgbF32(values) => (
                values
                    .chunks_exact(3)
                    .map(|p| [p[0], p[1], p[2], 1.0])
                    .collect(),
                BitDepth::F32,
            ),
        };

        tracing::info!(width, height, depth = %source_bit_depth, "loaded source image");

        Ok(Self {
            width,
            height,
            pixels,
            source_bit_depth,
        })
    }

    /// Convert a decoded `image` crate buffer.
    pub fn from_dynamic(img: &image::DynamicImage) -> Result<Self> {
        let rgba = img.to_rgba32f();
        let (width, height) = rgba.dimensions();
        let mut out = Self::from_interleaved(PixelData::RgbaF32(rgba.as_raw()), width, height)?;
        out.source_bit_depth = match img.color() {
            image::ColorType::Rgb8 | image::ColorType::Rgba8 => BitDepth::U8,
            image::ColorType::L8 | image::ColorType::La8 => BitDepth::U8,
            image::ColorType::Rgb16 | image::ColorType::Rgba16 => BitDepth::U16,
            image::ColorType::L16 | image::ColorType::La16 => BitDepth::U16,
            _ => BitDepth::F32,
        };
        Ok(out)
    }

    /// Pixel count.
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Quantize to interleaved 8-bit RGBA, clamping out-of-range values.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.map(|v| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8))
            .collect()
    }

    /// Export as an `image` crate float buffer without clamping.
    pub fn to_rgba32f_image(&self) -> Option<image::Rgba32FImage> {
        let raw: Vec<f32> = self.pixels.iter().flatten().copied().collect();
        image::Rgba32FImage::from_raw(self.width, self.height, raw)
    }

    /// Fetch a pixel with clamp-to-edge addressing.
    pub fn texel(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.pixels[y * self.width as usize + x]
    }

    /// Bilinear sample at normalized coordinates, clamp-to-edge.
    ///
    /// Texel centers sit at `(i + 0.5) / size`, so sampling at a pixel center
    /// of a same-size target returns the source pixel exactly.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> [f32; 4] {
        let px = u * self.width as f32 - 0.5;
        let py = v * self.height as f32 - 0.5;
        let x0 = px.floor();
        let y0 = py.floor();
        let fx = px - x0;
        let fy = py - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let a = self.texel(x0, y0);
        let b = self.texel(x0 + 1, y0);
        let c = self.texel(x0, y0 + 1);
        let d = self.texel(x0 + 1, y0 + 1);

        let mut out = [0.0; 4];
        for i in 0..4 {
            let top = a[i] + (b[i] - a[i]) * fx;
            let bottom = c[i] + (d[i] - c[i]) * fx;
            out[i] = top + (bottom - top) * fy;
        }
        out
    }
}
