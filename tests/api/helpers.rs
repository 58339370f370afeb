use bulk_mailer::configuration::{get_configuration, Settings};
use bulk_mailer::domain::campaign::models::report::DeliveryReport;
use bulk_mailer::outbound::telemetry::init_logger;
use bulk_mailer::startup::Application;
use once_cell::sync::Lazy;
use secrecy::Secret;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT: &str = "test-tenant";
pub const SENDER: &str = "it.helpdesk@mycompany.com";

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info";
    let subscriber_name = "test";
    if std::env::var("TEST_LOG").is_ok() {
        init_logger(subscriber_name, default_filter_level, std::io::stdout, None)
            .expect("Failed to initialize logger");
    } else {
        init_logger(subscriber_name, default_filter_level, std::io::sink, None)
            .expect("Failed to initialize logger");
    }
});

pub struct TestApp {
    #[allow(dead_code)]
    pub workspace: TempDir,
    pub email_server: MockServer,
    pub settings: Settings,
}

impl TestApp {
    pub fn write_recipients(&self, content: &str) {
        fs::write(&self.settings.application.csv_path, content).expect("Failed to write CSV.");
    }

    pub fn write_template(&self, content: &str) {
        fs::write(&self.settings.application.template_path, content)
            .expect("Failed to write template.");
    }

    pub async fn mount_token_endpoint(&self) {
        Mock::given(path(format!("/{}/oauth2/v2.0/token", TENANT)))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "integration-token"
            })))
            .named("Token endpoint")
            .mount(&self.email_server)
            .await;
    }

    pub async fn run(&self) -> Result<DeliveryReport, anyhow::Error> {
        Application::build(self.settings.clone())
            .await?
            .run_until_complete()
            .await
    }

    /// Bodies of every `sendMail` call the mock API received.
    pub async fn sent_messages(&self) -> Vec<serde_json::Value> {
        self.email_server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|request| request.url.path().ends_with("/sendMail"))
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }

    pub async fn sent_to(&self) -> Vec<String> {
        let mut recipients: Vec<String> = self
            .sent_messages()
            .await
            .iter()
            .map(|body| {
                body["message"]["toRecipients"][0]["emailAddress"]["address"]
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();
        recipients.sort();
        recipients
    }

    pub fn read_failure_report(&self, path: &Path) -> Vec<csv::StringRecord> {
        csv::Reader::from_path(path)
            .expect("Failed to open failure report.")
            .records()
            .map(|record| record.unwrap())
            .collect()
    }
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);
    let email_server = MockServer::start().await;
    let workspace = tempfile::tempdir().expect("Failed to create workspace.");

    let settings = {
        let mut c = get_configuration(None, &[]).expect("Failed to read configuration");
        c.application.template_path = workspace.path().join("template.html");
        c.application.csv_path = workspace.path().join("recipients.csv");
        c.application.subject = "Quarterly security training".to_string();
        c.application.failure_report_dir = workspace.path().join("reports");
        c.application.max_concurrent_sends = 4;
        c.application.emails_must_match_regex = None;
        c.email_client.graph_base_url = email_server.uri();
        c.email_client.authority_base_url = email_server.uri();
        c.email_client.tenant_id = TENANT.to_string();
        c.email_client.client_id = "integration-client".to_string();
        c.email_client.client_secret = Secret::new("integration-secret".to_string());
        c.email_client.sender_email = SENDER.to_string();
        c.email_client.sender_name = Some("IT Helpdesk".to_string());
        c.email_client.timeout_milliseconds = 2_000;
        c
    };

    let test_app = TestApp {
        workspace,
        email_server,
        settings,
    };
    test_app.write_template("<p>Hello {{ first_name }}, your team is {{ team }}.</p>");
    test_app.write_recipients(
        "first_name,email_address,team\n\
         Ursula,ursula@mycompany.com,Ops\n\
         Octavia,octavia@mycompany.com,Finance\n\
         Ada,ada@mycompany.com,Engineering\n",
    );
    test_app
}
