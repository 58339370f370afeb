use crate::configuration::LogLevel;
use clap::Parser;
use std::path::PathBuf;

const TEMPLATE_HELP: &str = "Path to the HTML template file.

Place variables in the template as {{ my_variable }}. Variable names MUST match \
the CSV column names: a column `first_name` is rendered wherever the template \
contains {{ first_name }}. Variables without a matching column render empty.";

const CSV_HELP: &str = "Path to the CSV file to read.

It MUST contain an `email_address` column; every other column is available to \
the template.";

const ENV_FILE_HELP: &str = "Path of a .env file to load. Defaults to ./.env when present.

Expected variables:
  MSGRAPH_TENANT_ID=<tenant id>
  MSGRAPH_CLIENT_ID=<client id>
  MSGRAPH_CLIENT_SECRET=<secret>
  EMAILS_MUST_MATCH_REGEX=.+@mycompany.com   (optional)";

/// Send a rendered HTML template to a CSV list of recipients.
#[derive(Debug, Parser)]
#[command(name = "bulk_mailer", version)]
pub struct Cli {
    #[arg(long = "template-path", short = 't', long_help = TEMPLATE_HELP)]
    pub template_path: Option<PathBuf>,

    #[arg(long = "csv-path", short = 'c', long_help = CSV_HELP)]
    pub csv_path: Option<PathBuf>,

    /// Subject of the email to send.
    #[arg(long, short = 's')]
    pub subject: Option<String>,

    /// Address of the sending mailbox.
    #[arg(long = "email", short = 'e')]
    pub sender_email: Option<String>,

    /// Display name of the sending mailbox.
    #[arg(long = "name", short = 'n')]
    pub sender_name: Option<String>,

    /// Render every template but do not send any email.
    #[arg(long = "dry-run", short = 'd')]
    pub dry_run: bool,

    /// Log level (INFO, WARNING, DEBUG or TRACE). Defaults to INFO.
    #[arg(long = "log-level", short = 'l', value_enum, ignore_case = true)]
    pub log_level: Option<LogLevel>,

    #[arg(long = "env-file", long_help = ENV_FILE_HELP)]
    pub env_file: Option<PathBuf>,

    /// Maximum number of emails in flight at once. Defaults to 10.
    #[arg(long = "max-concurrent-sends", short = 'm')]
    pub max_concurrent_sends: Option<usize>,

    /// Optional YAML/TOML/JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory the failure report is written to. Defaults to the current directory.
    #[arg(long = "failure-report-dir")]
    pub failure_report_dir: Option<PathBuf>,
}

impl Cli {
    /// Flags that were given, as configuration keys.
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        if let Some(path) = &self.template_path {
            overrides.push(("application.template_path", path.display().to_string()));
        }
        if let Some(path) = &self.csv_path {
            overrides.push(("application.csv_path", path.display().to_string()));
        }
        if let Some(subject) = &self.subject {
            overrides.push(("application.subject", subject.clone()));
        }
        if let Some(email) = &self.sender_email {
            overrides.push(("email_client.sender_email", email.clone()));
        }
        if let Some(name) = &self.sender_name {
            overrides.push(("email_client.sender_name", name.clone()));
        }
        if self.dry_run {
            overrides.push(("application.dry_run", "true".to_string()));
        }
        if let Some(level) = self.log_level {
            overrides.push(("application.log_level", level.as_directive().to_string()));
        }
        if let Some(max) = self.max_concurrent_sends {
            overrides.push(("application.max_concurrent_sends", max.to_string()));
        }
        if let Some(dir) = &self.failure_report_dir {
            overrides.push(("application.failure_report_dir", dir.display().to_string()));
        }
        overrides
    }
}
