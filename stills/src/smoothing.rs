//! Savitzky-Golay smoothing, i.e., replacing every sample with the value of a polynomial
//! fitted with least squares to the window around it.
//!
//! Samples closer to an edge than half a window are taken from the polynomial fitted to
//! the first, or last, full window instead of padding the signal.

use stills_common::utils::math::solve_linear;

pub const DEFAULT_DEGREE: usize = 3;

/// Whether a window of this size can be used to fit a polynomial of `degree`
pub fn is_valid_window(window: usize, degree: usize) -> bool {
    window % 2 == 1 && window >= degree + 2
}

/// Weights that, when applied to the `window` samples centered at position zero, evaluate
/// the fitted polynomial at position `at`.
pub fn savgol_weights(window: usize, degree: usize, at: f64) -> Option<Vec<f64>> {
    if !is_valid_window(window, degree) {
        return None;
    }
    let half = (window / 2) as f64;
    let positions: Vec<f64> = (0..window).map(|j| j as f64 - half).collect();

    // Normal equations of the vandermonde matrix, solved for the evaluation point instead
    // of for the samples.
    let terms = degree + 1;
    let normal: Vec<Vec<f64>> = (0..terms)
        .map(|k| {
            (0..terms)
                .map(|l| positions.iter().map(|x| x.powi((k + l) as i32)).sum())
                .collect()
        })
        .collect();
    let at_powers: Vec<f64> = (0..terms).map(|k| at.powi(k as i32)).collect();
    let coeffs = solve_linear(normal, at_powers)?;

    Some(
        positions
            .iter()
            .map(|x| {
                coeffs
                    .iter()
                    .enumerate()
                    .map(|(k, c)| c * x.powi(k as i32))
                    .sum()
            })
            .collect(),
    )
}

fn apply(weights: &[f64], samples: &[f64]) -> f64 {
    weights.iter().zip(samples).map(|(w, s)| w * s).sum()
}

/// Smooths `signal`, the result has the same length. Returns None if the window is not
/// valid for `degree` or is longer than the signal.
pub fn smooth(signal: &[f64], window: usize, degree: usize) -> Option<Vec<f64>> {
    if !is_valid_window(window, degree) || window > signal.len() {
        return None;
    }
    let half = window / 2;
    let len = signal.len();

    let center = savgol_weights(window, degree, 0.0)?;
    let edges: Vec<Vec<f64>> = (0..half)
        .map(|i| savgol_weights(window, degree, i as f64 - half as f64))
        .collect::<Option<_>>()?;

    let first = &signal[..window];
    let last = &signal[len - window..];

    let smoothed = (0..len)
        .map(|i| {
            if i < half {
                apply(&edges[i], first)
            } else if i >= len - half {
                // mirrored position from the end, applied to the reversed last window
                let from_end = len - 1 - i;
                edges[from_end]
                    .iter()
                    .zip(last.iter().rev())
                    .map(|(w, s)| w * s)
                    .sum()
            } else {
                apply(&center, &signal[i - half..=i + half])
            }
        })
        .collect();
    Some(smoothed)
}
