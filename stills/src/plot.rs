use color_eyre::eyre;
use plotters::prelude::*;
use std::path::Path;

use crate::keyframes::Selection;

/// Draws the raw (blue) and smoothed (red) dissimilarity signal as an SVG. Detected peaks
/// are circled and the chosen keyframes are marked with vertical lines.
pub fn signal_chart(path: impl AsRef<Path>, selection: &Selection) -> eyre::Result<()> {
    let signal = &selection.signal;
    eyre::ensure!(!signal.is_empty(), "there is no signal to plot");
    let smoothed = selection.smoothed.as_deref();

    let width = (50 + 8 * signal.len()).clamp(400, 4000) as u32;
    let root = SVGBackend::new(&path, (width, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let (low, high) = value_range(signal, smoothed);
    let mut chart = ChartBuilder::on(&root)
        .margin(5)
        .set_left_and_bottom_label_area_size(40)
        .build_cartesian_2d(0f64..signal.len() as f64, low..high)?;

    chart
        .configure_mesh()
        .x_desc("frame")
        .y_desc("dissimilarity")
        .draw()?;

    chart.draw_series(LineSeries::new(indexed(signal), &BLUE))?;

    if let Some(smoothed) = smoothed {
        chart.draw_series(LineSeries::new(indexed(smoothed), &RED))?;
        chart.draw_series(
            selection
                .peaks
                .iter()
                .map(|&p| Circle::new((p as f64, smoothed[p]), 4, RED.filled())),
        )?;
    }

    chart.draw_series(selection.keyframes.indices().iter().map(|&k| {
        PathElement::new(vec![(k as f64, low), (k as f64, high)], &BLACK)
    }))?;

    root.present()?;
    Ok(())
}

fn indexed(values: &[f64]) -> impl Iterator<Item = (f64, f64)> + '_ {
    values.iter().enumerate().map(|(i, &v)| (i as f64, v))
}

/// The y range to show, always including zero and never empty
fn value_range(signal: &[f64], smoothed: Option<&[f64]>) -> (f64, f64) {
    let all = || signal.iter().chain(smoothed.into_iter().flatten()).copied();
    let low = all().fold(0.0, f64::min);
    let high = all().fold(0.0, f64::max).max(low + 0.1);
    (low, high * 1.05)
}
