use std::path::{Path, PathBuf};

use color_eyre::eyre;
use image::RgbaImage;

use crate::{
    compositor,
    error::StillsError,
    frame_source::FrameSource,
    keyframes::{self, KeyframeArgs, Selection},
    plot,
};

/// Keyframes of a video and their composite
#[derive(Clone, Debug)]
pub struct Stills {
    pub selection: Selection,
    pub composite: RgbaImage,
}

/// Selects keyframes and composites them, all in memory.
pub fn make_stills<S>(source: &S, args: &KeyframeArgs) -> Result<Stills, StillsError>
where
    S: FrameSource + ?Sized,
{
    if source.is_empty() {
        return Err(StillsError::EmptySource);
    }

    let selection = keyframes::select_keyframes(source, args);
    let composite = compositor::compose(source, selection.keyframes.indices())?;
    Ok(Stills {
        selection,
        composite,
    })
}

#[derive(Clone, Debug, Default)]
pub struct ProcessOptions {
    pub keyframe_args: KeyframeArgs,
    /// Put the stills here instead of next to the video
    pub outdir: Option<PathBuf>,
    /// Draw the dissimilarity signal of every video here
    pub plot_dir: Option<PathBuf>,
}

/// Makes the stills of the already decoded `video` and saves them. Returns where they
/// were saved.
pub fn save_stills<S>(source: &S, video: &Path, opts: &ProcessOptions) -> eyre::Result<PathBuf>
where
    S: FrameSource + ?Sized,
{
    let stills = make_stills(source, &opts.keyframe_args)?;
    let Stills {
        selection,
        composite,
    } = &stills;

    if let Some(reason) = selection.fallback {
        log::debug!(
            "Using evenly spaced frames for {}: {reason}",
            video.display()
        );
    }
    log::info!("Keyframes: {} ({})", selection.keyframes, video.display());

    if let Some(plot_dir) = opts.plot_dir.as_deref() {
        let mut name = video.file_stem().unwrap_or_default().to_owned();
        name.push("_signal.svg");
        let plot_path = plot_dir.join(name);
        // a broken plot is not a reason to throw away the stills
        if let Err(e) = plot::signal_chart(&plot_path, selection) {
            log::warn!("Failed to plot {}: {e:?}", plot_path.display());
        }
    }

    let outname = compositor::stills_path(video, opts.outdir.as_deref());
    compositor::save_png(composite, &outname)?;
    Ok(outname)
}

/// Decodes `video`, makes its stills and saves them. The decoder is closed before this
/// returns, no matter the outcome.
#[cfg(feature = "ffmpeg")]
pub fn process_video(video: &Path, opts: &ProcessOptions) -> eyre::Result<PathBuf> {
    use color_eyre::eyre::Context;

    log::info!("Processing: {}", video.display());
    let frames = crate::frame_extractor::read_frames(video)
        .wrap_err("failed to decode the video")?;
    log::debug!(
        "Decoded {} frames from {}",
        frames.frame_count(),
        video.display()
    );

    save_stills(&frames, video, opts)
}
