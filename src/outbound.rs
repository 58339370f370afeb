pub mod csv_source;
pub mod failure_report;
pub mod notifier;
pub mod telemetry;
pub mod template;
