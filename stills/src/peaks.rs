/// Indices of samples strictly greater than both their neighbours. The first and last
/// samples only have one neighbour and are never maxima, neither are plateaus.
pub fn local_maxima(signal: &[f64]) -> impl Iterator<Item = usize> + '_ {
    signal
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
        .map(|(i, _)| i + 1)
}

/// How much the peak at `peak` stands out. On each side, the signal is followed until it
/// rises above the peak or ends, and the lowest point on the way is noted. The prominence
/// is the height of the peak above the higher of those two lows.
pub fn prominence(signal: &[f64], peak: usize) -> f64 {
    let height = signal[peak];
    let left_low = lowest_before_higher(signal[..peak].iter().rev(), height);
    let right_low = lowest_before_higher(signal[peak + 1..].iter(), height);
    height - left_low.max(right_low)
}

fn lowest_before_higher<'a>(side: impl Iterator<Item = &'a f64>, height: f64) -> f64 {
    side.take_while(|&&v| v <= height)
        .fold(height, |low, &v| low.min(v))
}

/// Local maxima with a prominence of at least `min_prominence`, in ascending order
pub fn find_peaks(signal: &[f64], min_prominence: f64) -> Vec<usize> {
    local_maxima(signal)
        .filter(|&peak| prominence(signal, peak) >= min_prominence)
        .collect()
}
