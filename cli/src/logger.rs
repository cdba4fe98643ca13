//! Log setup for the `plcopen` command.
//!
//! Each `-v` raises the level by one step: the reader and writer log the
//! files they touch at info, validation and encoding summaries at debug.
use env_logger::{Builder, Target};
use log::trace;
use log::LevelFilter;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use time::OffsetDateTime;

/// The most `-v` flags the command accepts.
pub const MAX_VERBOSITY: u8 = 4;

fn level_filter(verbosity: u8) -> Result<LevelFilter, String> {
    match verbosity {
        0 => Ok(LevelFilter::Error),
        1 => Ok(LevelFilter::Warn),
        2 => Ok(LevelFilter::Info),
        3 => Ok(LevelFilter::Debug),
        4 => Ok(LevelFilter::Trace),
        _ => Err(format!(
            "At most {} verbose flags are supported, got {}",
            MAX_VERBOSITY, verbosity
        )),
    }
}

/// Installs the global logger. Records go to `log_file` when set and to
/// standard error otherwise, so that converted documents written to
/// standard output stay clean.
pub fn configure(verbosity: u8, log_file: Option<PathBuf>) -> Result<(), String> {
    let level = level_filter(verbosity)?;

    let mut builder = Builder::new();
    if let Some(path) = log_file {
        let file = File::create(&path)
            .map_err(|e| format!("Unable to create log file {}. {}", path.display(), e))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                OffsetDateTime::now_utc(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(level)
        .try_init()
        .map_err(|e| format!("Unable to configure logging. {}", e))?;

    trace!("Log level {level}");
    Ok(())
}

#[cfg(test)]
mod test {
    use log::LevelFilter;

    use crate::logger::{configure, level_filter, MAX_VERBOSITY};

    #[test]
    fn configure_when_verbosity_is_5_then_return_err() {
        let result = configure(MAX_VERBOSITY + 1, None);

        assert!(result.unwrap_err().contains("verbose"));
    }

    #[test]
    fn configure_when_log_file_in_missing_dir_then_return_err() {
        let result = configure(1, Some("does/not/exist/plcopen.log".into()));

        assert!(result.unwrap_err().contains("Unable to create log file"));
    }

    #[test]
    fn level_filter_when_max_verbosity_then_trace() {
        assert_eq!(level_filter(0).unwrap(), LevelFilter::Error);
        assert_eq!(level_filter(MAX_VERBOSITY).unwrap(), LevelFilter::Trace);
    }
}
