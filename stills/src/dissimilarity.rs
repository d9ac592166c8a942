//! How different consecutive frames are, judged by their gray level histograms.

use image::RgbImage;
use stills_common::utils::{
    imgutils::{self, Histogram},
    math::Average,
};

use crate::frame_source::FrameSource;

/// Pearson correlation between two histograms, in [-1, 1]. Two histograms where every
/// bin holds the same count have no variance, they are considered perfectly correlated.
pub fn correlation(h1: &Histogram, h2: &Histogram) -> f64 {
    let mean1 = h1.iter().copied().collect::<Average>().average();
    let mean2 = h2.iter().copied().collect::<Average>().average();

    let (mut cross, mut var1, mut var2) = (0.0, 0.0, 0.0);
    for (&a, &b) in h1.iter().zip(h2.iter()) {
        let a = f64::from(a) - mean1;
        let b = f64::from(b) - mean2;
        cross += a * b;
        var1 += a * a;
        var2 += b * b;
    }

    let denom = var1 * var2;
    if denom.abs() <= f64::EPSILON {
        return 1.0;
    }
    (cross / denom.sqrt()).clamp(-1.0, 1.0)
}

/// `1 - correlation`, so 0 for frames with identical histograms and at most 2
pub fn histogram_dissimilarity(h1: &Histogram, h2: &Histogram) -> f64 {
    1.0 - correlation(h1, h2)
}

pub fn dissimilarity(a: &RgbImage, b: &RgbImage) -> f64 {
    histogram_dissimilarity(&imgutils::histogram(a), &imgutils::histogram(b))
}

/// The dissimilarity of every pair of consecutive frames. Value `i` describes the
/// transition from frame `i` to frame `i + 1`, so there is one value less than there are
/// frames, and none at all for zero or one frame.
pub fn compute<S>(source: &S) -> Vec<f64>
where
    S: FrameSource + ?Sized,
{
    let mut prev: Option<Histogram> = None;
    let mut signal = Vec::with_capacity(source.frame_count().saturating_sub(1));
    for frame in source.frames() {
        let hist = imgutils::histogram(frame);
        if let Some(prev) = prev.as_ref() {
            signal.push(histogram_dissimilarity(prev, &hist));
        }
        prev = Some(hist);
    }
    signal
}
