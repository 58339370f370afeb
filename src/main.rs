use anyhow::Context;
use bulk_mailer::configuration::{get_configuration, load_env_file};
use bulk_mailer::inbound::cli::Cli;
use bulk_mailer::outbound::telemetry::init_logger;
use bulk_mailer::startup::Application;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env_file = load_env_file(cli.env_file.as_deref())?;
    let configuration = get_configuration(cli.config.as_deref(), &cli.overrides())
        .context("Failed to read configuration")?;
    init_logger(
        "bulk_mailer",
        configuration.application.log_level.as_directive(),
        std::io::stdout,
        Some(configuration.application.log_dir.as_path()),
    )?;
    tracing::debug!(env_file = ?env_file, "Loaded configuration");

    let application = Application::build(configuration).await.map_err(|e| {
        tracing::error!(error.cause_chain = ?e, "Failed to initialize");
        e
    })?;
    let report = application.run_until_complete().await?;

    tracing::info!(
        loaded = report.loaded,
        skipped = report.skipped,
        sent = report.sent,
        dry_run = report.dry_run,
        failed = report.failures.len(),
        "Finished sending emails"
    );
    Ok(())
}
