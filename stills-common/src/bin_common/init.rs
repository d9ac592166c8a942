use std::{fs::File, path::Path};

use color_eyre::eyre::{self, Context};

pub fn init_eyre() -> eyre::Result<()> {
    use color_eyre::config::{HookBuilder, Theme};
    let eyre_color = if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        Theme::dark()
    } else {
        Theme::new()
    };

    HookBuilder::default()
        .theme(eyre_color)
        .install()
        .wrap_err("Failed to install eyre")
}

/// Logs to stdout, and additionally to `logfile` if given. Must be called before any
/// threads are spawned, the local time offset can't be determined otherwise.
pub fn init_logger(logfile: Option<&Path>, verbose: bool) -> eyre::Result<()> {
    use simplelog::*;

    let mut builder = ConfigBuilder::new();
    builder.set_thread_level(LevelFilter::Error);
    builder.set_target_level(LevelFilter::Error);
    builder.set_location_level(LevelFilter::Off);

    builder.set_level_padding(LevelPadding::Right);
    builder.set_thread_padding(ThreadPadding::Right(3));
    builder.set_thread_mode(ThreadLogMode::Both);

    let timezone_failed = builder.set_time_offset_to_local().is_err();

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_color = if std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        builder.build(),
        TerminalMode::Stdout,
        log_color,
    )];

    if let Some(logfile) = logfile {
        let f = File::create(logfile).wrap_err_with(|| {
            format!("Failed to create the log file at: {}", logfile.display())
        })?;
        loggers.push(WriteLogger::new(LevelFilter::Debug, builder.build(), f));
    }

    CombinedLogger::init(loggers).wrap_err("Failed to set the logger")?;

    if timezone_failed {
        log::warn!("Failed to set time zone for the logger, using UTC instead");
    }

    if let Some(logfile) = logfile {
        log::debug!("Logging to: {}", logfile.display());
    }

    Ok(())
}
