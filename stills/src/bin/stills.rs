use std::{
    ffi::OsString,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use clap::Parser;
use color_eyre::eyre::{self, Context};
use rayon::prelude::*;
use stills::{
    keyframes::KeyframeCli,
    pipeline::{self, ProcessOptions},
};
use stills_common::{
    bin_common::{
        init::{init_eyre, init_logger},
        termination,
    },
    utils::fsutils::{all_files, has_extension, read_optional_file},
};

#[derive(Parser, Debug)]
#[command()]
/// Picks a few representative frames from videos and places them side by side in a
/// transparent PNG named `<video>_stills.png`.
///
/// Without any arguments, they are instead read from `./.stillsrc` if it exists.
struct Cli {
    #[command(flatten)]
    keyframe_args: KeyframeCli,

    /// Only pick videos with this extension from directories, ignoring case
    #[arg(long, default_value = "mp4")]
    extension: String,

    /// Place the stills here instead of next to each video
    #[arg(long, short = 'o')]
    outdir: Option<PathBuf>,

    /// Also draw the dissimilarity signal of each video as an SVG in this directory
    #[arg(long)]
    plot_dir: Option<PathBuf>,

    /// Process this many videos at the same time
    #[arg(long, short = 'j', default_value = "1")]
    threads: NonZeroUsize,

    /// A file to additionally write the logs to
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// Log more
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Video files, or directories with videos
    #[arg(default_value = ".")]
    inputs: Vec<PathBuf>,
}

fn cli_arguments() -> eyre::Result<Cli> {
    const ARGS_FILE: &str = ".stillsrc";
    let mut args: Vec<OsString> = std::env::args_os().collect();

    if args.len() == 1 {
        if let Some(flags) = read_optional_file(ARGS_FILE)
            .wrap_err_with(|| format!("Could not read config file at: {ARGS_FILE}"))?
        {
            args.extend(
                flags
                    .split_whitespace()
                    .map(|s| std::ffi::OsStr::new(s).to_owned()),
            );
        }
    }

    Ok(Cli::parse_from(args))
}

/// Explicitly given files are always used, directories are searched for files with the
/// extension.
fn collect_videos(inputs: &[PathBuf], extension: &str) -> eyre::Result<Vec<PathBuf>> {
    let mut videos = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = all_files([input])
                .wrap_err_with(|| format!("Failed to list {}", input.display()))?;
            found.retain(|f| f.is_file() && has_extension(f, extension));
            found.sort();
            videos.extend(found);
        } else {
            videos.push(input.clone());
        }
    }
    Ok(videos)
}

fn create_dir(dir: Option<&Path>) -> eyre::Result<()> {
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)
            .wrap_err_with(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

enum Outcome {
    Done,
    Failed(eyre::Report),
    Skipped,
}

/// Runs `process` on every video, unless `is_terminating` says to stop. A failing video is
/// logged and does not affect the others. The outcomes are in the same order as `videos`.
fn process_all<T, P>(videos: &[PathBuf], is_terminating: T, process: P) -> Vec<Outcome>
where
    T: Fn() -> bool + Sync,
    P: Fn(&Path) -> eyre::Result<PathBuf> + Sync,
{
    videos
        .par_iter()
        .map(|video| {
            if is_terminating() {
                return Outcome::Skipped;
            }

            let before = Instant::now();
            match process(video) {
                Ok(outname) => {
                    let elapsed = Duration::from_millis(
                        before.elapsed().as_millis().try_into().unwrap_or(u64::MAX),
                    );
                    log::info!(
                        "Saved: {} (took {})",
                        outname.display(),
                        humantime::format_duration(elapsed)
                    );
                    Outcome::Done
                }
                Err(e) => {
                    log::error!("{}: {e:?}", video.display());
                    Outcome::Failed(e)
                }
            }
        })
        .collect()
}

/// Logs how it went, and errors with a list of the failed videos if there were any.
fn summarise(videos: &[PathBuf], outcomes: Vec<Outcome>) -> eyre::Result<()> {
    let mut failed = Vec::new();
    let mut skipped = 0;
    for (video, outcome) in videos.iter().zip(outcomes) {
        match outcome {
            Outcome::Done => (),
            Outcome::Failed(e) => failed.push((video, e)),
            Outcome::Skipped => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Termination signal received, skipped {skipped} videos");
    }

    let done = videos.len() - failed.len() - skipped;
    log::info!("Made stills for {done} of {} videos", videos.len());

    if !failed.is_empty() {
        let mut lines = vec!["Summary of videos that errored:".to_string()];
        lines.extend(
            failed
                .into_iter()
                .map(|(path, error)| format!("'{}': {error}", path.display())),
        );
        eyre::bail!(lines.join("\n"));
    }

    Ok(())
}

fn main() -> eyre::Result<()> {
    init_eyre()?;
    let cli = cli_arguments()?;
    init_logger(cli.logfile.as_deref(), cli.verbose)?;
    log::debug!("CLI arguments: {cli:#?}");

    let videos = collect_videos(&cli.inputs, &cli.extension)?;
    log::info!("Found {} videos", videos.len());

    create_dir(cli.outdir.as_deref())?;
    create_dir(cli.plot_dir.as_deref())?;

    let opts = ProcessOptions {
        keyframe_args: cli.keyframe_args.to_args(),
        outdir: cli.outdir,
        plot_dir: cli.plot_dir,
    };

    let term_cookie =
        termination::Cookie::new().wrap_err("failed to create term cookie")?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads.get())
        .thread_name(|i| format!("V{i:>02}"))
        .build()
        .wrap_err("failed to create the thread pool")?;

    let outcomes = pool.install(|| {
        process_all(
            &videos,
            || term_cookie.is_terminating(),
            |video| pipeline::process_video(video, &opts),
        )
    });

    summarise(&videos, outcomes)
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["stills"]);
        assert_eq!(vec![PathBuf::from(".")], cli.inputs);
        assert_eq!(
            stills::keyframes::KeyframeArgs::default(),
            cli.keyframe_args.to_args()
        );
    }

    fn names(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn failed_video_does_not_stop_the_rest() {
        let videos = names(&["a.mp4", "broken.mp4", "c.mp4"]);
        let attempted = std::sync::Mutex::new(Vec::new());

        let outcomes = process_all(
            &videos,
            || false,
            |video| {
                attempted.lock().unwrap().push(video.to_owned());
                if video == Path::new("broken.mp4") {
                    eyre::bail!("no frames");
                }
                Ok(video.with_extension("png"))
            },
        );

        let mut attempted = attempted.into_inner().unwrap();
        attempted.sort();
        assert_eq!(videos, attempted);
        assert!(matches!(
            outcomes.as_slice(),
            [Outcome::Done, Outcome::Failed(_), Outcome::Done]
        ));

        let summary = summarise(&videos, outcomes).unwrap_err().to_string();
        assert!(summary.contains("'broken.mp4': no frames"), "{summary}");
        assert!(!summary.contains("a.mp4"), "{summary}");
    }

    #[test]
    fn terminating_skips_everything() {
        let videos = names(&["a.mp4", "b.mp4"]);
        let outcomes = process_all(&videos, || true, |_| unreachable!());
        assert!(outcomes.iter().all(|o| matches!(o, Outcome::Skipped)));
        assert!(summarise(&videos, outcomes).is_ok());
    }

    #[test]
    fn collects_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp4", "a.MP4", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let explicit = dir.path().join("notes.txt");
        let videos =
            collect_videos(&[dir.path().to_owned(), explicit.clone()], "mp4").unwrap();
        assert_eq!(
            vec![dir.path().join("a.MP4"), dir.path().join("b.mp4"), explicit],
            videos
        );
    }
}
