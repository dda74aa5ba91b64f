use chrono::{Duration, Utc};
use rental_market::config::OutboxConfig;
use rental_market::models::{DeliveryStatus, NewOutboxMessage};
use rental_market::notify::{Delivery, Dispatcher, Email, OutboxRelay, RecordingMailer};
use rental_market::store::{MemoryStore, OutboxStore};
use std::sync::Arc;

fn email(to: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Booking Confirmed: Loft".to_string(),
        html: "<p>Confirmed</p>".to_string(),
    }
}

fn relay_config(max_attempts: u32) -> OutboxConfig {
    OutboxConfig {
        max_attempts,
        ..OutboxConfig::default()
    }
}

#[tokio::test]
async fn dispatch_records_a_sent_email() {
    let store = Arc::new(MemoryStore::new());
    let mailer = RecordingMailer::new();
    let dispatcher = Dispatcher::new(Arc::clone(&store), Arc::new(mailer.clone()));

    let delivery = dispatcher.dispatch(email("asha@example.com")).await;

    assert!(delivery.is_sent());
    let outbox = store.outbox();
    assert_eq!(outbox.len(), 1);
    assert_eq!(delivery, Delivery::Sent { outbox_id: Some(outbox[0].id) });
    assert_eq!(outbox[0].status, DeliveryStatus::Sent);
    assert_eq!(mailer.delivered(), vec![email("asha@example.com")]);
}

#[tokio::test]
async fn dispatch_keeps_failed_emails_for_the_relay() {
    let store = Arc::new(MemoryStore::new());
    let mailer = RecordingMailer::failing();
    let dispatcher = Dispatcher::new(Arc::clone(&store), Arc::new(mailer.clone()));

    let delivery = dispatcher.dispatch(email("asha@example.com")).await;

    assert!(!delivery.is_sent());
    assert_eq!(mailer.attempts(), 1);
    let outbox = store.outbox();
    assert_eq!(outbox[0].status, DeliveryStatus::Failed);
    assert_eq!(outbox[0].attempts, 1);
}

#[tokio::test]
async fn dispatch_still_sends_when_the_outbox_is_down() {
    let store = Arc::new(MemoryStore::new());
    store.set_reject_writes(true);
    let mailer = RecordingMailer::new();
    let dispatcher = Dispatcher::new(Arc::clone(&store), Arc::new(mailer.clone()));

    let delivery = dispatcher.dispatch(email("asha@example.com")).await;

    assert_eq!(delivery, Delivery::Sent { outbox_id: None });
    assert_eq!(mailer.delivered().len(), 1);
}

#[tokio::test]
async fn relay_redelivers_failed_emails() {
    let store = Arc::new(MemoryStore::new());
    let mailer = RecordingMailer::failing();
    Dispatcher::new(Arc::clone(&store), Arc::new(mailer.clone()))
        .dispatch(email("asha@example.com"))
        .await;

    mailer.set_failing(false);
    let relay = OutboxRelay::new(Arc::clone(&store), Arc::new(mailer.clone()), relay_config(5));
    let report = relay.run_once().await.unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 0);
    let outbox = store.outbox();
    assert_eq!(outbox[0].status, DeliveryStatus::Sent);
    assert_eq!(outbox[0].attempts, 2);
    assert_eq!(outbox[0].last_error, None);

    let again = relay.run_once().await.unwrap();
    assert_eq!(again.attempted(), 0);
}

#[tokio::test]
async fn relay_gives_up_after_max_attempts() {
    let store = Arc::new(MemoryStore::new());
    let mailer = RecordingMailer::failing();
    Dispatcher::new(Arc::clone(&store), Arc::new(mailer.clone()))
        .dispatch(email("asha@example.com"))
        .await;

    let relay = OutboxRelay::new(Arc::clone(&store), Arc::new(mailer.clone()), relay_config(3));
    for _ in 0..5 {
        relay.run_once().await.unwrap();
    }

    // one inline attempt plus two relay attempts
    assert_eq!(mailer.attempts(), 3);
    let outbox = store.outbox();
    assert_eq!(outbox[0].status, DeliveryStatus::Failed);
    assert_eq!(outbox[0].attempts, 3);
}

#[tokio::test]
async fn relay_picks_up_stale_pending_emails_only() {
    let store = Arc::new(MemoryStore::new());
    store
        .enqueue_email(NewOutboxMessage {
            recipient: "owner@example.com".to_string(),
            subject: "New Booking Request for Loft".to_string(),
            html: "<p>Request</p>".to_string(),
            status: DeliveryStatus::Pending,
            attempts: 0,
        })
        .await
        .unwrap();

    let fresh = store
        .due_emails(10, 5, Utc::now() - Duration::seconds(300))
        .await
        .unwrap();
    assert!(fresh.is_empty());

    let mailer = RecordingMailer::new();
    let relay = OutboxRelay::new(
        Arc::clone(&store),
        Arc::new(mailer.clone()),
        OutboxConfig {
            pending_grace_secs: 0,
            ..OutboxConfig::default()
        },
    );
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let report = relay.run_once().await.unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(mailer.delivered()[0].to, "owner@example.com");
    assert_eq!(store.outbox()[0].attempts, 1);
}

#[tokio::test]
async fn relay_stops_on_shutdown() {
    let store = Arc::new(MemoryStore::new());
    let relay = OutboxRelay::new(store, Arc::new(RecordingMailer::new()), OutboxConfig::default());

    tokio::time::timeout(std::time::Duration::from_secs(5), relay.run_until(async {}))
        .await
        .unwrap();
}
