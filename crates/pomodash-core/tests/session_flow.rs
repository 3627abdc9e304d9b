//! End-to-end flow: resolve settings, drive the controller, and check the
//! session calls that reach the server.

use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use pomodash_core::{
    ApiClient, ControllerOptions, CoreError, LocalCache, SessionApi, SessionMetadata, SessionRecorder,
    SettingsApi, SettingsResolver, SettingsSource, TimerController, TimerEngine, TimerMode, TimerSettings,
};
use serde_json::json;
use tempfile::TempDir;

fn api_for(server: &mockito::ServerGuard) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(&format!("{}/api", server.url()), Duration::from_secs(5)).unwrap())
}

#[tokio::test]
async fn started_and_paused_session_is_created_then_closed() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/api/sessions")
        .match_body(Matcher::PartialJson(json!({"type": "focus", "category": "reading"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({"id": "s-1"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let close = server
        .mock("PATCH", "/api/sessions/s-1")
        .match_body(Matcher::PartialJson(json!({"completed": false, "interruptions": 1})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"id": "s-1", "completed": false}).to_string())
        .expect(1)
        .create_async()
        .await;

    let api = api_for(&server);
    let controller = TimerController::builder(TimerEngine::default())
        .recorder(SessionRecorder::spawn(api as Arc<dyn SessionApi>))
        .build();
    controller
        .set_session_metadata(SessionMetadata {
            category: Some("reading".into()),
            ..SessionMetadata::default()
        })
        .await;

    assert!(controller.start().await);
    assert!(controller.pause().await);
    // A second pause must not close anything again.
    assert!(!controller.pause().await);

    let stats = controller.shutdown().await.expect("recorder attached");
    assert_eq!(stats.created, 1);
    assert_eq!(stats.updated, 1);
    create.assert_async().await;
    close.assert_async().await;
}

#[tokio::test]
async fn session_failures_do_not_affect_the_timer() {
    let mut server = mockito::Server::new_async().await;
    let _create = server
        .mock("POST", "/api/sessions")
        .with_status(500)
        .create_async()
        .await;
    let update = server
        .mock("PATCH", Matcher::Regex(r"^/api/sessions/.*$".into()))
        .expect(0)
        .create_async()
        .await;

    let controller = TimerController::builder(TimerEngine::default())
        .recorder(SessionRecorder::spawn(api_for(&server) as Arc<dyn SessionApi>))
        .build();

    assert!(controller.start().await);
    controller.skip().await;
    let snap = controller.snapshot().await;
    assert_eq!(snap.mode, TimerMode::ShortBreak);
    assert!(!snap.is_active);

    let stats = controller.shutdown().await.unwrap();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.skipped, 1);
    update.assert_async().await;
}

#[tokio::test]
async fn startup_uses_cache_when_server_is_down_then_rolls_back_failed_save() {
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("cache.db");
    let cached = TimerSettings {
        focus_duration: 30,
        ..TimerSettings::default()
    };
    LocalCache::open(&cache_path).unwrap().store_settings(&cached).unwrap();

    let mut server = mockito::Server::new_async().await;
    let _get = server
        .mock("GET", "/api/settings")
        .with_status(502)
        .create_async()
        .await;
    let _patch = server
        .mock("PATCH", "/api/settings")
        .with_status(500)
        .create_async()
        .await;

    let mut resolver = SettingsResolver::new(
        Some(api_for(&server) as Arc<dyn SettingsApi>),
        Some(LocalCache::open(&cache_path).unwrap()),
    );
    let resolved = resolver.load().await;
    assert_eq!(resolved.source, SettingsSource::Cache);

    let controller = TimerController::new(TimerEngine::new(resolved.settings), ControllerOptions::default());
    assert_eq!(controller.snapshot().await.total_time, 30 * 60);

    let attempt = TimerSettings {
        focus_duration: 55,
        ..cached.clone()
    };
    let err = controller.save_settings(&mut resolver, attempt).await.unwrap_err();
    assert!(matches!(err, CoreError::SettingsRolledBack { .. }));
    assert_eq!(controller.settings().await, cached);
    assert_eq!(controller.snapshot().await.time_left, 30 * 60);
    assert_eq!(LocalCache::open(&cache_path).unwrap().load_settings().unwrap(), Some(cached));
}

#[tokio::test]
async fn successful_save_reaches_running_engine_on_next_mode() {
    let mut server = mockito::Server::new_async().await;
    let _get = server
        .mock("GET", "/api/settings")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;
    let saved = TimerSettings {
        short_break_duration: 7,
        ..TimerSettings::default()
    };
    let _patch = server
        .mock("PATCH", "/api/settings")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::to_string(&saved).unwrap())
        .create_async()
        .await;

    let mut resolver = SettingsResolver::new(Some(api_for(&server) as Arc<dyn SettingsApi>), None);
    let resolved = resolver.load().await;
    assert_eq!(resolved.source, SettingsSource::Remote);
    assert_eq!(resolved.settings, TimerSettings::default());

    let controller = TimerController::new(TimerEngine::new(resolved.settings), ControllerOptions::default());
    controller.start().await;
    controller.save_settings(&mut resolver, saved.clone()).await.unwrap();

    // Running focus session keeps its time; the next break uses the new length.
    assert_eq!(controller.snapshot().await.total_time, 25 * 60);
    controller.skip().await;
    assert_eq!(controller.snapshot().await.total_time, 7 * 60);
    controller.shutdown().await;
}
