use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use time::OffsetDateTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::configs::Logger;

/// Installs the global subscriber: console output plus a per-run file named
/// after the local start time. Returns the file path.
pub fn init(logger: &Logger) -> io::Result<PathBuf> {
    let directory = PathBuf::from(&logger.directory);
    fs::create_dir_all(&directory)?;

    let started = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let path = directory.join(log_file_name(started));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_filter(&logger.level).into()))
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file)))
        .try_init()
        .map_err(io::Error::other)?;

    Ok(path)
}

pub fn default_filter(level: &str) -> String {
    let app_name = env!("CARGO_PKG_NAME").replace('-', "_");

    format!("{app_name}={level},sensorcast_generator={level}")
}

/// `YYYYmmddHHMMSS.log`
pub fn log_file_name(at: OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}.log",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}
