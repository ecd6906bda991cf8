//! RGB histogram of a rendered frame.

use serde::{Deserialize, Serialize};

use crate::image::LinearImage;

/// Number of bins per channel.
pub const HISTOGRAM_BINS: usize = 256;

/// Per-channel bin counts. Each `Vec` has 256 entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramData {
    pub red: Vec<u32>,
    pub green: Vec<u32>,
    pub blue: Vec<u32>,
    /// Largest bin across all channels (for normalization).
    pub peak: u32,
}

impl HistogramData {
    /// Build from the flat `[R; 256] [G; 256] [B; 256]` layout used by the GPU pass.
    pub fn from_flat(bins: &[u32]) -> Option<Self> {
        if bins.len() < HISTOGRAM_BINS * 3 {
            return None;
        }
        let red = bins[..HISTOGRAM_BINS].to_vec();
        let green = bins[HISTOGRAM_BINS..HISTOGRAM_BINS * 2].to_vec();
        let blue = bins[HISTOGRAM_BINS * 2..HISTOGRAM_BINS * 3].to_vec();
        let peak = red.iter().chain(&green).chain(&blue).copied().max().unwrap_or(0);
        Some(Self {
            red,
            green,
            blue,
            peak,
        })
    }

    /// Total count in one channel; equals the pixel count.
    pub fn total(&self) -> u64 {
        self.red.iter().map(|&v| v as u64).sum()
    }
}

/// Bin index for a channel value: clamp to `[0, 1]` and round to 8 bits.
pub fn bin_index(value: f32) -> usize {
    if value.is_nan() {
        return 0;
    }
    ((value.clamp(0.0, 1.0) * 255.0 + 0.5) as usize).min(HISTOGRAM_BINS - 1)
}

/// Compute the histogram of `image`.
pub fn compute(image: &LinearImage) -> HistogramData {
    let mut channels = [
        vec![0u32; HISTOGRAM_BINS],
        vec![0u32; HISTOGRAM_BINS],
        vec![0u32; HISTOGRAM_BINS],
    ];
    for px in &image.pixels {
        for (c, bins) in channels.iter_mut().enumerate() {
            bins[bin_index(px[c])] += 1;
        }
    }
    let peak = channels.iter().flatten().copied().max().unwrap_or(0);
    let [red, green, blue] = channels;
    HistogramData {
        red,
        green,
        blue,
        peak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bins_sum_to_pixel_count() {
        let image = LinearImage::filled(5, 3, [0.2, 0.5, 0.9, 1.0]);
        let hist = compute(&image);
        assert_eq!(hist.red.len(), 256);
        assert_eq!(hist.total(), 15);
        assert_eq!(hist.peak, 15);
    }

    #[test]
    fn test_out_of_range_values_land_in_end_bins() {
        let image = LinearImage::filled(1, 1, [-1.0, 3.0, f32::NAN, 1.0]);
        let hist = compute(&image);
        assert_eq!(hist.red[0], 1);
        assert_eq!(hist.green[255], 1);
        assert_eq!(hist.blue[0], 1);
    }

    #[test]
    fn test_rounding_matches_8bit_quantization() {
        assert_eq!(bin_index(128.0 / 255.0), 128);
        assert_eq!(bin_index(0.5), 128);
        assert_eq!(bin_index(0.001), 0);
    }

    #[test]
    fn test_from_flat_rejects_short_input() {
        assert!(HistogramData::from_flat(&[0; 10]).is_none());
    }
}
