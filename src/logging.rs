use log::LevelFilter;
use std::path::Path;

/// Install the global logger: `timestamp LEVEL [target] message` on stdout and,
/// when `log_file` is given, appended to that file as well.
///
/// HTTP client internals are capped at `Warn`.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), fern::InitError> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {:<5} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("reqwest", LevelFilter::Warn.min(level))
        .level_for("hyper", LevelFilter::Warn.min(level))
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}
