//! End-to-end poll cycles against a mock push service

mod common;

use common::{EventLog, FakeDownloader, RecordingPlayer, TestEnvironment};
use ctfwatch::notify::PushoverNotifier;
use ctfwatch::{CycleOutcome, WatchError, Watcher};
use std::sync::atomic::Ordering;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn push_server(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/messages.json"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

fn endpoint(server: &MockServer) -> String {
    format!("{}/1/messages.json", server.uri())
}

#[tokio::test]
async fn test_new_challenge_directory_is_reported() {
    let env = TestEnvironment::new();
    env.write_content("a.txt", "intro");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("b%2F%0A"))
        .and(body_string_contains("b%2Fc.txt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = env.config(&endpoint(&server));
    let log = EventLog::default();
    let downloader =
        FakeDownloader::new(env.content_dir(), log.clone()).then_write(vec!["b/c.txt"]);

    let watcher = Watcher::new(
        config.clone(),
        Box::new(downloader),
        Box::new(RecordingPlayer::new(log.clone())),
        Box::new(PushoverNotifier::new(config).unwrap()),
    );

    let outcome = watcher.check_once().await.unwrap();

    assert_eq!(
        outcome,
        CycleOutcome::NewContent(vec!["b/".to_string(), "b/c.txt".to_string()])
    );
    assert_eq!(log.events(), vec!["sync", "play"]);
}

#[tokio::test]
async fn test_second_cycle_without_changes_is_quiet() {
    let env = TestEnvironment::new();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = env.config(&endpoint(&server));
    let log = EventLog::default();
    let downloader =
        FakeDownloader::new(env.content_dir(), log.clone()).then_write(vec!["pwn/chall.zip"]);

    let watcher = Watcher::new(
        config.clone(),
        Box::new(downloader),
        Box::new(RecordingPlayer::new(log.clone())),
        Box::new(PushoverNotifier::new(config).unwrap()),
    );

    assert!(matches!(
        watcher.check_once().await.unwrap(),
        CycleOutcome::NewContent(_)
    ));
    assert_eq!(
        watcher.check_once().await.unwrap(),
        CycleOutcome::NoNewContent
    );
    assert_eq!(log.events(), vec!["sync", "play", "sync"]);
}

#[tokio::test]
async fn test_push_server_error_does_not_stop_loop() {
    let env = TestEnvironment::new();
    let server = push_server(500).await;

    let config = env.config(&endpoint(&server));
    let log = EventLog::default();
    let downloader =
        FakeDownloader::new(env.content_dir(), log.clone()).then_write(vec!["web/README.md"]);
    let calls = downloader.calls.clone();

    let watcher = Watcher::new(
        config.clone(),
        Box::new(downloader),
        Box::new(RecordingPlayer::new(log.clone())),
        Box::new(PushoverNotifier::new(config).unwrap()),
    );

    let result = watcher
        .run_until(tokio::time::sleep(Duration::from_millis(300)))
        .await;

    assert!(result.is_ok());
    assert!(calls.load(Ordering::SeqCst) >= 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_downloader_failure_does_not_stop_loop() {
    let env = TestEnvironment::new();
    let server = push_server(200).await;

    let config = env.config(&endpoint(&server));
    let log = EventLog::default();
    let downloader = FakeDownloader::new(env.content_dir(), log.clone()).failing_with(|| {
        Err(WatchError::DownloaderFailed {
            code: Some(2),
            stderr: "401 Unauthorized".to_string(),
        })
    });
    let calls = downloader.calls.clone();

    let watcher = Watcher::new(
        config.clone(),
        Box::new(downloader),
        Box::new(RecordingPlayer::new(log.clone())),
        Box::new(PushoverNotifier::new(config).unwrap()),
    );

    let result = watcher
        .run_until(tokio::time::sleep(Duration::from_millis(300)))
        .await;

    assert!(result.is_ok());
    assert!(calls.load(Ordering::SeqCst) >= 2);
    assert!(!log.events().contains(&"play".to_string()));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_downloader_stops_loop() {
    let env = TestEnvironment::new();
    let server = push_server(200).await;

    let config = env.config(&endpoint(&server));
    let log = EventLog::default();
    let downloader = FakeDownloader::new(env.content_dir(), log.clone()).failing_with(|| {
        Err(WatchError::DownloaderMissing {
            program: "ctfd-downloader".to_string(),
        })
    });
    let calls = downloader.calls.clone();

    let watcher = Watcher::new(
        config.clone(),
        Box::new(downloader),
        Box::new(RecordingPlayer::new(log.clone())),
        Box::new(PushoverNotifier::new(config).unwrap()),
    );

    let result = watcher.run_until(std::future::pending()).await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
