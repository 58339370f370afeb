use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, EnvFilter, Registry};

/// Composes the bunyan subscriber. `RUST_LOG` wins over `env_filter` when set.
///
/// When `log_file` is given every record is also appended to it.
pub fn get_subscriber<Sink>(
    name: &str,
    env_filter: &str,
    sink: Sink,
    log_file: Option<File>,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let formatting_layer = BunyanFormattingLayer::new(name.to_string(), sink);
    let file_layer =
        log_file.map(|file| BunyanFormattingLayer::new(name.to_string(), Mutex::new(file)));
    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
        .with(file_layer)
}

pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<(), anyhow::Error> {
    LogTracer::init().context("Failed to set logger")?;
    set_global_default(subscriber).context("Failed to set subscriber")?;
    Ok(())
}

pub fn init_logger<Sink>(
    name: &str,
    env_filter: &str,
    sink: Sink,
    log_dir: Option<&Path>,
) -> Result<(), anyhow::Error>
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let log_file = log_dir.map(|dir| open_log_file(dir, name)).transpose()?;
    init_subscriber(get_subscriber(name, env_filter, sink, log_file))
}

/// Opens today's log file (`<dir>/<name>_<YYYY-MM-DD>.log`), creating the
/// directory first if needed.
pub fn open_log_file(dir: &Path, name: &str) -> Result<File, anyhow::Error> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Could not create log directory {}", dir.display()))?;
    let path = dir.join(format!(
        "{}_{}.log",
        name,
        chrono::Local::now().format("%Y-%m-%d")
    ));
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Could not open log file {}", path.display()))
}

pub fn spawn_blocking_with_tracing<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let current_span = tracing::Span::current();
    tokio::task::spawn_blocking(move || current_span.in_scope(f))
}
