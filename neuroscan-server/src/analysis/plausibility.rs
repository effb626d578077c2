//! MRI-plausibility gate
//!
//! Coarse statistical test run before inference. This is not a medical
//! judgment: it rejects uploads that are clearly not scans (photos,
//! screenshots, blank frames) using intensity statistics and the mean of
//! the log-magnitude frequency spectrum. The thresholds were tuned
//! empirically against real scans and must be kept as-is.

use image::GrayImage;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Scans darker than this mean intensity are rejected
pub const MIN_MEAN_INTENSITY: f64 = 10.0;
/// Scans brighter than this mean intensity are rejected
pub const MAX_MEAN_INTENSITY: f64 = 245.0;
/// Minimum standard deviation; anything flatter lacks scan contrast
pub const MIN_STD_INTENSITY: f64 = 20.0;
/// Lower bound on the mean of the log-magnitude spectrum
pub const MIN_SPECTRUM_MEAN: f64 = 50.0;
/// Upper bound on the mean of the log-magnitude spectrum
pub const MAX_SPECTRUM_MEAN: f64 = 200.0;

/// Mean and population standard deviation of the pixel intensities
#[derive(Debug, Clone, Copy)]
pub struct IntensityStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// Decide whether a decoded grayscale image is plausibly an MRI scan.
///
/// Pure function of the pixel data; rejection order matches the tuned
/// heuristic: intensity mean, then contrast, then frequency content.
/// An empty or fully uniform image is always rejected.
pub fn is_plausible_mri(image: &GrayImage) -> bool {
    if image.width() == 0 || image.height() == 0 {
        return false;
    }

    let stats = intensity_stats(image);
    if stats.mean < MIN_MEAN_INTENSITY || stats.mean > MAX_MEAN_INTENSITY {
        return false;
    }
    if stats.std_dev < MIN_STD_INTENSITY {
        return false;
    }

    spectrum_mean_in_band(log_magnitude_spectrum_mean(image))
}

/// Frequency-band rule: reject spectra that are too sparse or too dense
pub fn spectrum_mean_in_band(spectrum_mean: f64) -> bool {
    (MIN_SPECTRUM_MEAN..=MAX_SPECTRUM_MEAN).contains(&spectrum_mean)
}

/// Compute pixel intensity statistics over the whole image
pub fn intensity_stats(image: &GrayImage) -> IntensityStats {
    let count = (image.width() as f64) * (image.height() as f64);
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for pixel in image.pixels() {
        let value = pixel.0[0] as f64;
        sum += value;
        sum_sq += value * value;
    }

    let mean = sum / count;
    let variance = (sum_sq / count - mean * mean).max(0.0);
    IntensityStats {
        mean,
        std_dev: variance.sqrt(),
    }
}

/// Mean of the element-wise log-magnitude spectrum `20 * ln(|F| + 1)`
/// over the 2D DFT of the image.
///
/// Centering the zero-frequency bin is a permutation of the spectrum,
/// so the mean is computed directly from the unshifted layout.
pub fn log_magnitude_spectrum_mean(image: &GrayImage) -> f64 {
    let width = image.width() as usize;
    let height = image.height() as usize;

    let mut buffer: Vec<Complex<f64>> = image
        .pixels()
        .map(|p| Complex::new(p.0[0] as f64, 0.0))
        .collect();

    let mut planner = FftPlanner::new();
    let row_fft = planner.plan_fft_forward(width);
    let col_fft = planner.plan_fft_forward(height);

    // Row pass, in place
    for row in buffer.chunks_exact_mut(width) {
        row_fft.process(row);
    }

    // Column pass through a scratch column
    let mut column = vec![Complex::new(0.0, 0.0); height];
    for x in 0..width {
        for y in 0..height {
            column[y] = buffer[y * width + x];
        }
        col_fft.process(&mut column);
        for y in 0..height {
            buffer[y * width + x] = column[y];
        }
    }

    let total: f64 = buffer
        .iter()
        .map(|c| 20.0 * (c.norm() + 1.0).ln())
        .sum();

    total / (width as f64 * height as f64)
}
