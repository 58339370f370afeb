use crate::configuration::Settings;
use crate::domain::{
    campaign::{
        models::{
            message::{EmailImportance, EmailSubject},
            report::DeliveryReport,
        },
        ports::CampaignService,
        service::{Campaign, CampaignSettings},
    },
    recipient::models::policy::AddressPolicy,
};
use crate::outbound::{
    csv_source::CsvRecipientSource, failure_report::CsvFailureReporter,
    notifier::graph_client::EmailClient, template::MiniJinjaRenderer,
};
use anyhow::Context;
use std::sync::Arc;

pub type MailMergeCampaign =
    Campaign<CsvRecipientSource, MiniJinjaRenderer, EmailClient, CsvFailureReporter>;

pub struct Application {
    campaign: MailMergeCampaign,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        configuration.validate()?;
        let application = configuration.application;

        let policy = AddressPolicy::new(application.emails_must_match_regex.as_deref())?;
        let subject = EmailSubject::try_from(application.subject)?;
        let importance = EmailImportance::parse(&application.importance)?;

        let renderer = MiniJinjaRenderer::new(&application.template_path)?;
        tracing::info!("Loaded email template");
        let email_client = EmailClient::new(configuration.email_client)?;
        if !application.dry_run {
            email_client
                .authenticate()
                .await
                .context("Failed to authenticate against the email API")?;
        }
        tracing::info!(sender = %email_client.sender(), "Initialized email client");

        let campaign = Campaign::new(
            Arc::new(CsvRecipientSource::new(application.csv_path)),
            Arc::new(renderer),
            Arc::new(email_client),
            Arc::new(CsvFailureReporter::new(application.failure_report_dir)),
            CampaignSettings {
                subject,
                importance,
                dry_run: application.dry_run,
                max_concurrent_sends: application.max_concurrent_sends,
                policy,
            },
        )?;

        Ok(Self { campaign })
    }

    pub fn campaign(&self) -> &MailMergeCampaign {
        &self.campaign
    }

    pub async fn run_until_complete(self) -> Result<DeliveryReport, anyhow::Error> {
        Ok(self.campaign.run().await?)
    }
}
