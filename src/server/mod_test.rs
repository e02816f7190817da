use super::*;
use crate::grid::LightColor;
use crate::preset::{Preset, PresetCategory, PresetLight};
use crate::remote::{HttpRemote, PresetDraft, RemoteError, RemoteStore};

/// Serve the router on an ephemeral port and return its base URL.
async fn spawn_app(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });
    format!("http://{addr}")
}

fn preset(name: &str) -> Preset {
    Preset::new("custom_1".into(), name, "", vec![PresetLight { id: 8, color: LightColor::Blue }]).unwrap()
}

fn draft(name: &str) -> PresetDraft {
    PresetDraft::from(&preset(name))
}

#[tokio::test]
async fn healthz_returns_ok() {
    let base = spawn_app(AppState::default()).await;
    let resp = reqwest::get(format!("{base}/healthz")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn publish_then_fetch_by_id_over_http() {
    let state = AppState::default();
    let base = spawn_app(state.clone()).await;
    let remote = HttpRemote::new(&base).unwrap();

    let remote_id = remote.publish(&preset("Restricted")).await.unwrap();
    let fetched = remote.fetch_by_id(&remote_id).await.unwrap().unwrap();
    assert_eq!(fetched.id, remote_id);
    assert_eq!(fetched.name, "Restricted");
    assert_eq!(fetched.lights, vec![PresetLight { id: 8, color: LightColor::Blue }]);

    let stored = state.documents.get(&remote_id).await.unwrap();
    assert!(stored.is_public);
}

#[tokio::test]
async fn fetch_by_id_missing_is_none_over_http() {
    let base = spawn_app(AppState::default()).await;
    let remote = HttpRemote::new(&base).unwrap();
    assert_eq!(remote.fetch_by_id("missing").await.unwrap(), None);
}

#[tokio::test]
async fn fetch_public_orders_and_limits_over_http() {
    let state = AppState::default();
    state.documents.add_at(draft("t3"), 100).await;
    state.documents.add_at(draft("t1"), 300).await;
    state.documents.add_at(draft("t2"), 200).await;
    let base = spawn_app(state).await;
    let remote = HttpRemote::new(&base).unwrap();

    let names: Vec<String> = remote.fetch_public(50).await.unwrap().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["t1", "t2", "t3"]);

    let capped: Vec<String> = remote.fetch_public(2).await.unwrap().into_iter().map(|p| p.name).collect();
    assert_eq!(capped, vec!["t1", "t2"]);
}

#[tokio::test]
async fn list_caps_requested_limit() {
    let state = AppState::default();
    for i in 0..60 {
        state.documents.add_at(draft(&format!("p{i}")), i).await;
    }
    let base = spawn_app(state).await;
    let remote = HttpRemote::new(&base).unwrap();
    assert_eq!(remote.fetch_public(1000).await.unwrap().len(), crate::remote::DEFAULT_PUBLIC_LIMIT);
}

#[tokio::test]
async fn create_rejects_invalid_draft() {
    let state = AppState::default();
    let base = spawn_app(state.clone()).await;
    let body = PresetDraft { name: String::new(), description: String::new(), category: PresetCategory::Custom, lights: vec![] };

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/presets"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(state.documents.is_empty().await);
}

#[tokio::test]
async fn publish_rejected_surfaces_response_error() {
    let base = spawn_app(AppState::default()).await;
    let remote = HttpRemote::new(&base).unwrap();
    let bad = Preset { id: "x".into(), name: "Bad".into(), description: String::new(), category: PresetCategory::Custom, lights: vec![] };
    let err = remote.publish(&bad).await.unwrap_err();
    assert!(matches!(err, RemoteError::Response { status: 400, .. }));
}

#[tokio::test]
async fn unreachable_service_is_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let remote = HttpRemote::new(&format!("http://{addr}")).unwrap();
    let err = remote.fetch_public(10).await.unwrap_err();
    assert!(matches!(err, RemoteError::Request(_)));
}

#[tokio::test]
async fn shared_link_opens_in_another_session() {
    use std::sync::Arc;

    use crate::session::{PatternSession, Role, SessionOptions, ShareOutcome};
    use crate::store::{LocalPresets, MemoryStore};

    let base = spawn_app(AppState::default()).await;
    let share_base = reqwest::Url::parse("https://colregs.example/").unwrap();
    let remote: Arc<dyn RemoteStore> = Arc::new(HttpRemote::new(&base).unwrap());

    let mut teacher = PatternSession::new(
        LocalPresets::load(MemoryStore::new()),
        Some(remote.clone()),
        SessionOptions::new(share_base.clone()),
    );
    teacher.select_color(LightColor::White);
    teacher.toggle_light(5);
    teacher.select_color(LightColor::Red);
    teacher.toggle_light(17);
    teacher.set_name("Pilot vessel");
    let ShareOutcome::Shared { link, preset, .. } = teacher.save_and_share().await.unwrap() else {
        panic!("expected shared outcome");
    };

    let mut student =
        PatternSession::new(LocalPresets::load(MemoryStore::new()), Some(remote), SessionOptions::new(share_base));
    student.start(Some(&link)).await.unwrap();
    assert!(student.is_revealed());
    assert_eq!(student.selected_preset().unwrap().lights, preset.lights);

    student.switch_role(Role::Student).await;
    assert_eq!(student.carousel().len(), 1);
}

#[tokio::test]
async fn shutdown_flushes_documents_published_since_last_tick() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("presets.json");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

    // Interval far beyond the test so only the shutdown flush can write.
    let server = tokio::spawn(serve_until(listener, AppState::default(), snapshot.clone(), 3_600_000, async {
        let _ = stopped.await;
    }));

    let remote = HttpRemote::new(&base).unwrap();
    let remote_id = remote.publish(&preset("Late")).await.unwrap();

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();

    let docs = persistence::load_snapshot(&snapshot).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, remote_id);
}
