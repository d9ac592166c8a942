use std::fmt;

use stills_common::args;

use crate::{dissimilarity, frame_source::FrameSource, peaks, smoothing};

args! {
    #[derive(Clone, Debug, PartialEq)]
    Keyframe {
        "Window size of the smoothing filter, odd and at least the polynomial degree + 2"
        smoothing_window: usize = 9;

        "Degree of the polynomial fitted by the smoothing filter"
        polynomial_degree: usize = smoothing::DEFAULT_DEGREE;

        "Minimum prominence of a peak in the smoothed dissimilarity signal"
        prominence: f64 = 0.08;

        "Use evenly spaced frames instead if fewer peaks than this are found"
        minimum_keyframes: usize = 3;
    }
}

/// Frame indices chosen as stills, in ascending order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keyframes(Vec<usize>);

impl Keyframes {
    /// A quarter, half and three quarters into a video of `total` frames. Some of them are
    /// the same index when `total` is less than four.
    pub fn evenly_spaced(total: usize) -> Self {
        Self(vec![total / 4, total / 2, 3 * total / 4])
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for Keyframes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Why the peaks of the signal were not used
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fallback {
    /// The signal is shorter than the smoothing window
    ShortSignal { len: usize },
    /// The smoothing window can't fit the polynomial
    InvalidWindow,
    TooFewPeaks { found: usize },
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::ShortSignal { len } => {
                write!(f, "the signal is too short to smooth ({len} values)")
            }
            Fallback::InvalidWindow => write!(f, "the smoothing window is unusable"),
            Fallback::TooFewPeaks { found } => write!(f, "only found {found} peaks"),
        }
    }
}

/// The result of keyframe selection, and how it got there.
#[derive(Clone, Debug)]
pub struct Selection {
    pub signal: Vec<f64>,
    /// Missing if smoothing was skipped
    pub smoothed: Option<Vec<f64>>,
    /// Every peak that was found, even if they were thrown away
    pub peaks: Vec<usize>,
    pub keyframes: Keyframes,
    pub fallback: Option<Fallback>,
}

pub fn select_keyframes<S>(source: &S, args: &KeyframeArgs) -> Selection
where
    S: FrameSource + ?Sized,
{
    select_from_signal(dissimilarity::compute(source), source.frame_count(), args)
}

/// Picks keyframes from the dissimilarity signal of a video with `total` frames. Never
/// fails, evenly spaced frames are used when the signal doesn't give enough peaks.
pub fn select_from_signal(signal: Vec<f64>, total: usize, args: &KeyframeArgs) -> Selection {
    let fallback = |signal: Vec<f64>,
                    smoothed: Option<Vec<f64>>,
                    peaks: Vec<usize>,
                    reason: Fallback| Selection {
        signal,
        smoothed,
        peaks,
        keyframes: Keyframes::evenly_spaced(total),
        fallback: Some(reason),
    };

    if signal.len() < args.smoothing_window {
        let len = signal.len();
        return fallback(signal, None, vec![], Fallback::ShortSignal { len });
    }

    let Some(smoothed) =
        smoothing::smooth(&signal, args.smoothing_window, args.polynomial_degree)
    else {
        return fallback(signal, None, vec![], Fallback::InvalidWindow);
    };

    let peaks = peaks::find_peaks(&smoothed, args.prominence);
    if peaks.len() < args.minimum_keyframes {
        let found = peaks.len();
        return fallback(signal, Some(smoothed), peaks, Fallback::TooFewPeaks { found });
    }

    Selection {
        keyframes: Keyframes(peaks.clone()),
        signal,
        smoothed: Some(smoothed),
        peaks,
        fallback: None,
    }
}
