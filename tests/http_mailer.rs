use rental_market::config::MailerConfig;
use rental_market::error::NotifyError;
use rental_market::notify::{Email, HttpMailer, Mailer};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mailer(server: &MockServer) -> HttpMailer {
    HttpMailer::new(
        format!("{}/api/send-email", server.uri()),
        &MailerConfig {
            endpoint: None,
            timeout_secs: 5,
        },
    )
    .unwrap()
}

fn email() -> Email {
    Email {
        to: "asha@example.com".to_string(),
        subject: "Booking Confirmed: Loft".to_string(),
        html: "<p>Confirmed</p>".to_string(),
    }
}

#[tokio::test]
async fn posts_the_email_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/send-email"))
        .and(body_json(json!({
            "to": "asha@example.com",
            "subject": "Booking Confirmed: Loft",
            "html": "<p>Confirmed</p>"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "msg_1" })))
        .expect(1)
        .mount(&server)
        .await;

    mailer(&server).send(&email()).await.unwrap();
}

#[tokio::test]
async fn error_payload_becomes_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/send-email"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "Failed to send email",
            "message": "domain not verified"
        })))
        .mount(&server)
        .await;

    let err = mailer(&server).send(&email()).await.unwrap_err();
    assert_eq!(
        err,
        NotifyError::Rejected {
            status: 500,
            message: "Failed to send email: domain not verified".to_string()
        }
    );
}

#[tokio::test]
async fn missing_fields_are_reported_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/send-email"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "Missing required fields: to, subject, html"
        })))
        .mount(&server)
        .await;

    let err = mailer(&server).send(&email()).await.unwrap_err();
    assert_eq!(
        err,
        NotifyError::Rejected {
            status: 400,
            message: "Missing required fields: to, subject, html".to_string()
        }
    );
}
