use crate::helpers::{spawn_app, SENDER};
use wiremock::matchers::{any, body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn every_recipient_receives_a_personalised_email() {
    // Arrange
    let app = spawn_app().await;
    app.mount_token_endpoint().await;
    Mock::given(path(format!("/v1.0/users/{}/sendMail", SENDER)))
        .and(method("POST"))
        .and(header("Authorization", "Bearer integration-token"))
        .respond_with(ResponseTemplate::new(202))
        .expect(3)
        .mount(&app.email_server)
        .await;

    // Act
    let report = app.run().await.unwrap();

    // Assert
    assert_eq!(report.loaded, 3);
    assert_eq!(report.sent, 3);
    assert!(report.failure_report.is_none());
    let messages = app.sent_messages().await;
    let ursula = messages
        .iter()
        .find(|m| m["message"]["toRecipients"][0]["emailAddress"]["address"] == "ursula@mycompany.com")
        .expect("Ursula did not receive an email");
    assert_eq!(
        ursula["message"]["body"]["content"],
        "<p>Hello Ursula, your team is Ops.</p>"
    );
    assert_eq!(ursula["message"]["subject"], "Quarterly security training");
    assert_eq!(ursula["message"]["importance"], "high");
}

#[tokio::test]
async fn a_failed_delivery_is_exported_and_does_not_stop_the_others() {
    // Arrange
    let app = spawn_app().await;
    app.mount_token_endpoint().await;
    Mock::given(path_regex(r"/sendMail$"))
        .and(body_string_contains("octavia@mycompany.com"))
        .respond_with(ResponseTemplate::new(400).set_body_string("MailboxNotEnabledForRESTAPI"))
        .named("Rejected recipient")
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(path_regex(r"/sendMail$"))
        .respond_with(ResponseTemplate::new(202))
        .named("Accepted recipients")
        .expect(2)
        .mount(&app.email_server)
        .await;

    // Act
    let report = app.run().await.unwrap();

    // Assert
    assert_eq!(report.sent, 2);
    assert_eq!(report.failures.len(), 1);
    let failure_report = report
        .failure_report
        .expect("No failure report was written");
    let records = app.read_failure_report(&failure_report);
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][0], "octavia@mycompany.com");
    assert_eq!(
        &records[0][1],
        r#"{"first_name":"Octavia","email_address":"octavia@mycompany.com","team":"Finance"}"#
    );
    assert!(records[0][2].contains("MailboxNotEnabledForRESTAPI"));
    assert_eq!(&records[0][3], "<p>Hello Octavia, your team is Finance.</p>");
}

#[tokio::test]
async fn dry_run_renders_templates_without_calling_the_api() {
    // Arrange
    let mut app = spawn_app().await;
    app.settings.application.dry_run = true;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&app.email_server)
        .await;

    // Act
    let report = app.run().await.unwrap();

    // Assert
    assert_eq!(report.dry_run, 3);
    assert_eq!(report.sent, 0);
}

#[tokio::test]
async fn recipients_outside_the_address_policy_are_skipped() {
    // Arrange
    let mut app = spawn_app().await;
    app.settings.application.emails_must_match_regex = Some(r"(ursula|ada)@mycompany\.com".into());
    app.write_recipients(
        "first_name,email_address,team\n\
         Ursula,ursula@mycompany.com,Ops\n\
         Octavia,octavia@mycompany.com,Finance\n\
         Ada,ada@mycompany.com,Engineering\n\
         Mallory,mallory@elsewhere.com,Unknown\n",
    );
    app.mount_token_endpoint().await;
    Mock::given(path_regex(r"/sendMail$"))
        .respond_with(ResponseTemplate::new(202))
        .expect(2)
        .mount(&app.email_server)
        .await;

    // Act
    let report = app.run().await.unwrap();

    // Assert
    assert_eq!(report.skipped, 2);
    assert_eq!(
        app.sent_to().await,
        vec!["ada@mycompany.com", "ursula@mycompany.com"]
    );
}

#[tokio::test]
async fn rows_with_invalid_addresses_are_exported_as_failures() {
    // Arrange
    let app = spawn_app().await;
    app.write_recipients(
        "first_name,email_address,team\n\
         Ursula,ursula@mycompany.com,Ops\n\
         Typo,typo.mycompany.com,Ops\n",
    );
    app.mount_token_endpoint().await;
    Mock::given(path_regex(r"/sendMail$"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let report = app.run().await.unwrap();

    // Assert
    assert_eq!(report.sent, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failures.len(), 1);
    let records = app.read_failure_report(&report.failure_report.unwrap());
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][0], "typo.mycompany.com");
    assert_eq!(
        &records[0][1],
        r#"{"first_name":"Typo","email_address":"typo.mycompany.com","team":"Ops"}"#
    );
    assert!(records[0][2].contains("invalid email address"));
    assert_eq!(&records[0][3], "");
}

#[tokio::test]
async fn refused_credentials_abort_the_run_before_any_send() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(path_regex(r"/oauth2/v2.0/token$"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(path_regex(r"/sendMail$"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&app.email_server)
        .await;

    // Act
    let outcome = app.run().await;

    // Assert
    let error = outcome.unwrap_err();
    assert!(format!("{:#}", error).contains("invalid_client"));
    assert!(!app.settings.application.failure_report_dir.exists());
}

#[tokio::test]
async fn a_table_without_an_email_column_aborts_the_run() {
    // Arrange
    let app = spawn_app().await;
    app.write_recipients("first_name,mail\nUrsula,ursula@mycompany.com\n");
    Mock::given(any())
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&app.email_server)
        .await;

    // Act
    let outcome = app.run().await;

    // Assert
    assert!(outcome.is_err());
}
