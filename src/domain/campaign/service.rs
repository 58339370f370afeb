use anyhow::Context;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::domain::{
    campaign::{
        errors::CampaignError,
        models::{
            message::{EmailImportance, EmailMessage, EmailSubject},
            report::{DeliveryFailure, DeliveryOutcome, DeliveryReport},
        },
        ports::{CampaignService, FailureReporter, MailSender, RecipientSource, TemplateRenderer},
    },
    recipient::{
        errors::RecipientError,
        models::{policy::AddressPolicy, recipient::Recipient},
    },
};

#[derive(Debug, Clone)]
pub struct CampaignSettings {
    pub subject: EmailSubject,
    pub importance: EmailImportance,
    pub dry_run: bool,
    pub max_concurrent_sends: usize,
    pub policy: AddressPolicy,
}

/// Renders and delivers one message per recipient row.
#[derive(Debug, Clone)]
pub struct Campaign<S, R, N, F>
where
    S: RecipientSource,
    R: TemplateRenderer,
    N: MailSender,
    F: FailureReporter,
{
    pub source: Arc<S>,
    pub renderer: Arc<R>,
    pub notifier: Arc<N>,
    pub reporter: Arc<F>,
    settings: CampaignSettings,
}

impl<S, R, N, F> Campaign<S, R, N, F>
where
    S: RecipientSource,
    R: TemplateRenderer,
    N: MailSender,
    F: FailureReporter,
{
    pub fn new(
        source: Arc<S>,
        renderer: Arc<R>,
        notifier: Arc<N>,
        reporter: Arc<F>,
        settings: CampaignSettings,
    ) -> Result<Self, CampaignError> {
        if settings.max_concurrent_sends == 0 {
            return Err(CampaignError::ValidationError(
                "At least one concurrent send is required.".into(),
            ));
        }
        Ok(Self {
            source,
            renderer,
            notifier,
            reporter,
            settings,
        })
    }

    pub fn settings(&self) -> &CampaignSettings {
        &self.settings
    }

    /// Splits loaded rows into work for the delivery stream. Rows outside the
    /// address policy are dropped and counted. Invalid rows stay in place as
    /// failures so they reach the failure report in table order.
    fn accept(
        &self,
        rows: Vec<Result<Recipient, RecipientError>>,
    ) -> (Vec<Result<Recipient, DeliveryFailure>>, usize) {
        let policy = &self.settings.policy;
        let mut accepted = Vec::with_capacity(rows.len());
        let mut skipped = 0;
        for row in rows {
            match row {
                Ok(recipient) if policy.allows(recipient.email()) => {
                    tracing::trace!(row = recipient.row_number(), "Loaded recipient row");
                    accepted.push(Ok(recipient));
                }
                Ok(recipient) => {
                    skipped += 1;
                    tracing::warn!(
                        row = recipient.row_number(),
                        recipient_email = %recipient.email(),
                        pattern = ?policy.pattern(),
                        "Recipient does not match the address policy. Skipping row",
                    );
                }
                Err(error) => match error.address() {
                    Some(address) if !policy.allows(address) => {
                        skipped += 1;
                        tracing::warn!(
                            recipient_email = %address,
                            pattern = ?policy.pattern(),
                            "Recipient does not match the address policy. Skipping row",
                        );
                    }
                    _ => match DeliveryFailure::rejected_row(&error) {
                        Some(failure) => {
                            tracing::warn!(
                                error.cause_chain = ?error,
                                "Recipient row is invalid. Recording it as a failure",
                            );
                            accepted.push(Err(failure));
                        }
                        None => {
                            skipped += 1;
                            tracing::warn!(error.cause_chain = ?error, "Skipping a recipient row");
                        }
                    },
                },
            }
        }
        (accepted, skipped)
    }

    async fn dispatch(&self, entry: Result<Recipient, DeliveryFailure>) -> DeliveryOutcome {
        match entry {
            Ok(recipient) => self.deliver(recipient).await,
            Err(failure) => DeliveryOutcome::Failed(failure),
        }
    }

    #[tracing::instrument(
        name = "Deliver email to recipient",
        skip(self, recipient),
        fields(recipient_email = %recipient.email(), row = recipient.row_number())
    )]
    async fn deliver(&self, recipient: Recipient) -> DeliveryOutcome {
        tracing::debug!("Rendering template");
        let html_content = match self.renderer.render(&recipient) {
            Ok(html_content) => html_content,
            Err(error) => {
                tracing::error!(error.cause_chain = ?error, "Failed to render template");
                return DeliveryOutcome::Failed(DeliveryFailure::new(
                    &recipient,
                    format!("{:#}", error),
                    String::new(),
                ));
            }
        };

        if self.settings.dry_run {
            tracing::info!("Did not send mail because dry run mode is enabled");
            return DeliveryOutcome::DryRun;
        }

        let message = EmailMessage::new(
            self.settings.subject.clone(),
            html_content,
            self.settings.importance,
        );
        match self.notifier.send_mail(recipient.email(), &message).await {
            Ok(()) => {
                tracing::info!("Successfully sent mail");
                DeliveryOutcome::Sent
            }
            Err(error) => {
                tracing::error!(
                    error.cause_chain = ?error,
                    "Failed to send mail. Recording the failure and continuing",
                );
                DeliveryOutcome::Failed(DeliveryFailure::new(
                    &recipient,
                    format!("{:#}", error),
                    message.html_as_ref().as_ref().to_string(),
                ))
            }
        }
    }
}

#[async_trait]
impl<S, R, N, F> CampaignService for Campaign<S, R, N, F>
where
    S: RecipientSource,
    R: TemplateRenderer,
    N: MailSender,
    F: FailureReporter,
{
    #[tracing::instrument(
        name = "Run email campaign",
        skip(self),
        fields(run_id = %uuid::Uuid::new_v4(), dry_run = self.settings.dry_run)
    )]
    async fn run(&self) -> Result<DeliveryReport, CampaignError> {
        if self.settings.dry_run {
            tracing::warn!("Dry run mode enabled. Templates are rendered but no email is sent");
        }
        let rows = self.source.load_recipients().await?;
        let (entries, skipped) = self.accept(rows);

        let mut report = DeliveryReport {
            loaded: entries.len(),
            skipped,
            ..Default::default()
        };
        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped,
            max_concurrent_sends = self.settings.max_concurrent_sends,
            "Loaded recipients"
        );

        let outcomes: Vec<DeliveryOutcome> = stream::iter(entries)
            .map(|entry| self.dispatch(entry))
            .buffered(self.settings.max_concurrent_sends)
            .collect()
            .await;
        for outcome in outcomes {
            report.record(outcome);
        }

        if report.is_success() {
            tracing::info!(
                sent = report.sent,
                dry_run = report.dry_run,
                "All emails processed successfully"
            );
            return Ok(report);
        }

        let path = self
            .reporter
            .report(&report.failures)
            .await
            .context("Failed to export delivery failures.")?;
        tracing::error!(
            failed = report.failures.len(),
            total = report.loaded,
            path = %path.display(),
            "Failed to send some emails. Failure details were exported",
        );
        report.failure_report = Some(path);
        Ok(report)
    }
}
