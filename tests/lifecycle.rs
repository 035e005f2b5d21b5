//! Startup and shutdown wiring: config, length listeners, sweeper, close.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use photosite::actions::{LogoutAction, PruneExpiredSessionsAction};
use photosite::events::listeners::LoggingListener;
use photosite::{
    EventRegistry, LengthSink, Listener, SessionBackend, SessionConfig, SessionError,
    SessionLength, SessionRepository, open_repository, spawn_sweeper,
};

#[derive(Clone, Default)]
struct Collector {
    lengths: Arc<Mutex<Vec<SessionLength>>>,
}

#[async_trait]
impl Listener for Collector {
    async fn handle(&self, length: &SessionLength) {
        self.lengths.lock().unwrap().push(length.clone());
    }
}

#[tokio::test]
async fn persistent_sessions_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig::persistent(dir.path().join("sessions.redb"));

    let sessions = open_repository(&config, LengthSink::disabled()).unwrap();
    let token = sessions.insert("usernameA").await.unwrap();
    sessions.close().await.unwrap();
    assert_eq!(sessions.has_key(&token).await, Err(SessionError::Closed));

    let sessions = open_repository(&config, LengthSink::disabled()).unwrap();
    assert_eq!(
        sessions.has_key(&token).await.unwrap().as_deref(),
        Some("usernameA")
    );
    sessions.close().await.unwrap();
}

#[tokio::test]
async fn memory_sessions_do_not_survive_restart() {
    let config = SessionConfig::default();
    assert_eq!(config.backend, SessionBackend::Memory);

    let sessions = open_repository(&config, LengthSink::disabled()).unwrap();
    let token = sessions.insert("usernameA").await.unwrap();

    let sessions = open_repository(&config, LengthSink::disabled()).unwrap();
    assert!(sessions.has_key(&token).await.unwrap().is_none());
}

#[tokio::test]
async fn logout_lengths_reach_listeners() {
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig::persistent(dir.path().join("sessions.redb"));
    let (sink, lengths) = LengthSink::channel(config.event_buffer);
    let sessions = open_repository(&config, sink).unwrap();

    let collector = Collector::default();
    let mut registry = EventRegistry::new();
    registry
        .listen(LoggingListener::new())
        .listen(collector.clone());
    let listeners = tokio::spawn(registry.run(lengths));

    let token = sessions.insert("alice").await.unwrap();
    sessions.insert("alice").await.unwrap();
    sessions.insert("bob").await.unwrap();

    let logout = LogoutAction::new(Arc::clone(&sessions));
    logout.execute(&token).await.unwrap();
    logout.execute_everywhere("alice").await.unwrap();

    // dropping the last repository handle closes the channel
    sessions.close().await.unwrap();
    drop(logout);
    drop(sessions);

    assert_eq!(listeners.await.unwrap(), 2);
    let seen = collector.lengths.lock().unwrap();
    assert!(seen.iter().all(|l| l.username == "alice"));
}

#[tokio::test]
async fn sweeper_expires_and_stops_before_close() {
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig {
        // anything older than a millisecond is over age
        idle_timeout: Duration::milliseconds(1),
        max_lifetime: Duration::milliseconds(1),
        ..SessionConfig::persistent(dir.path().join("sessions.redb"))
    };
    let (sink, mut lengths) = LengthSink::channel(config.event_buffer);
    let sessions = open_repository(&config, sink).unwrap();

    let token = sessions.insert("alice").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let action = PruneExpiredSessionsAction::from_config(Arc::clone(&sessions), &config);
    let sweeper = spawn_sweeper(action, Duration::milliseconds(10));

    let ended = lengths.recv().await.unwrap();
    assert_eq!(ended.username, "alice");

    assert!(sweeper.stop().await >= 1);
    assert!(sessions.has_key(&token).await.unwrap().is_none());
    sessions.close().await.unwrap();
}
