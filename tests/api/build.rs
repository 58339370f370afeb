use crate::helpers::spawn_app;
use bulk_mailer::startup::Application;
use claim::{assert_err, assert_ok};
use secrecy::Secret;
use wiremock::matchers::any;
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn a_valid_configuration_builds_the_application() {
    let app = spawn_app().await;
    app.mount_token_endpoint().await;

    assert_ok!(Application::build(app.settings.clone()).await.map(|_| ()));
}

#[tokio::test]
async fn a_missing_template_is_rejected_at_startup() {
    let mut app = spawn_app().await;
    app.settings.application.template_path = app.workspace.path().join("absent.html");

    assert_err!(Application::build(app.settings.clone()).await.map(|_| ()));
}

#[tokio::test]
async fn a_broken_template_is_rejected_at_startup() {
    let app = spawn_app().await;
    app.write_template("<p>{% if first_name %}unterminated</p>");

    assert_err!(Application::build(app.settings.clone()).await.map(|_| ()));
}

#[tokio::test]
async fn an_invalid_sender_is_rejected_at_startup() {
    let mut app = spawn_app().await;
    app.settings.email_client.sender_email = "not-an-address".into();

    assert_err!(Application::build(app.settings.clone()).await.map(|_| ()));
}

#[tokio::test]
async fn an_invalid_address_policy_is_rejected_at_startup() {
    let mut app = spawn_app().await;
    app.settings.application.emails_must_match_regex = Some("([unclosed".into());

    assert_err!(Application::build(app.settings.clone()).await.map(|_| ()));
}

#[tokio::test]
async fn live_runs_without_credentials_are_rejected_at_startup() {
    let mut app = spawn_app().await;
    app.settings.email_client.client_secret = Secret::new(String::new());

    assert_err!(Application::build(app.settings.clone()).await.map(|_| ()));
}

#[tokio::test]
async fn zero_concurrent_sends_is_rejected_at_startup() {
    let mut app = spawn_app().await;
    app.settings.application.max_concurrent_sends = 0;

    assert_err!(Application::build(app.settings.clone()).await.map(|_| ()));
}

#[tokio::test]
async fn a_sender_name_with_punctuation_is_accepted() {
    let mut app = spawn_app().await;
    app.mount_token_endpoint().await;
    app.settings.email_client.sender_name = Some("IT Helpdesk (Sales/Marketing)".into());

    assert_ok!(Application::build(app.settings.clone()).await.map(|_| ()));
}

#[tokio::test]
async fn dry_runs_do_not_request_a_token() {
    let mut app = spawn_app().await;
    app.settings.application.dry_run = true;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&app.email_server)
        .await;

    assert_ok!(Application::build(app.settings.clone()).await.map(|_| ()));
}
