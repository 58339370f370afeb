use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use secrecy::ExposeSecret;

use crate::configuration::EmailClientSettings;
use crate::domain::{
    campaign::{errors::DeliveryError, models::message::EmailMessage, ports::MailSender},
    recipient::models::{email::RecipientEmail, name::SenderName},
};

mod token;

pub use token::ClientCredentialsToken;

/// Sends mail on behalf of a single mailbox through the Microsoft Graph
/// `sendMail` endpoint.
#[derive(Debug)]
pub struct EmailClient {
    http_client: Client,
    send_mail_url: Url,
    sender: RecipientEmail,
    sender_name: Option<SenderName>,
    token: ClientCredentialsToken,
}

impl EmailClient {
    pub fn new(configuration: EmailClientSettings) -> Result<Self, anyhow::Error> {
        let sender = configuration
            .sender()
            .context("Invalid sender email address")?;
        let sender_name = configuration
            .sender_name()
            .context("Invalid sender name")?;
        let http_client = Client::builder()
            .timeout(configuration.timeout())
            .build()
            .context("Failed to build the HTTP client.")?;
        let token = ClientCredentialsToken::new(http_client.clone(), &configuration);
        let send_mail_url = send_mail_url(&configuration.graph_base_url, &sender)?;

        Ok(Self {
            http_client,
            send_mail_url,
            sender,
            sender_name,
            token,
        })
    }

    pub fn sender(&self) -> &RecipientEmail {
        &self.sender
    }

    /// Acquires the first access token, so bad credentials surface before
    /// any message is sent.
    pub async fn authenticate(&self) -> Result<(), DeliveryError> {
        self.token.access_token().await.map(|_| ())
    }
}

/// `{base}/v1.0/users/{sender}/sendMail`, with the sender percent-encoded as
/// a single path segment.
fn send_mail_url(base_url: &str, sender: &RecipientEmail) -> Result<Url, anyhow::Error> {
    let mut url = Url::parse(base_url)
        .with_context(|| format!("Invalid email API base URL {}", base_url))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Email API base URL {} cannot carry a path", base_url))?
        .pop_if_empty()
        .extend(["v1.0", "users", sender.as_ref(), "sendMail"]);
    Ok(url)
}

#[async_trait]
impl MailSender for EmailClient {
    #[tracing::instrument(
        name = "Send email through Microsoft Graph",
        skip(self, recipient, message),
        fields(recipient_email = %recipient)
    )]
    async fn send_mail(
        &self,
        recipient: &RecipientEmail,
        message: &EmailMessage,
    ) -> Result<(), DeliveryError> {
        let access_token = self.token.access_token().await?;
        let request_body = SendMailRequest {
            message: GraphMessage {
                subject: message.subject_as_ref().as_ref(),
                body: ItemBody {
                    content_type: "HTML",
                    content: message.html_as_ref().as_ref(),
                },
                to_recipients: vec![Mailbox {
                    email_address: EmailAddress {
                        address: recipient.as_ref(),
                        name: None,
                    },
                }],
                from: Mailbox {
                    email_address: EmailAddress {
                        address: self.sender.as_ref(),
                        name: self.sender_name.as_ref().map(AsRef::as_ref),
                    },
                },
                importance: message.importance().as_str(),
            },
            save_to_sent_items: true,
        };

        let response = self
            .http_client
            .post(self.send_mail_url.clone())
            .bearer_auth(access_token.expose_secret())
            .json(&request_body)
            .send()
            .await
            .context("Failed to reach the email API.")?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::UNAUTHORIZED {
            self.token.invalidate().await;
        }
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailRequest<'a> {
    message: GraphMessage<'a>,
    save_to_sent_items: bool,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphMessage<'a> {
    subject: &'a str,
    body: ItemBody<'a>,
    to_recipients: Vec<Mailbox<'a>>,
    from: Mailbox<'a>,
    importance: &'a str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody<'a> {
    content_type: &'a str,
    content: &'a str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Mailbox<'a> {
    email_address: EmailAddress<'a>,
}

#[derive(serde::Serialize)]
struct EmailAddress<'a> {
    address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}
