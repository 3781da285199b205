use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use storymatch_api::{
    db::{InMemoryCatalog, InMemoryEventLog, InMemoryProfileStore},
    models::{
        ArcPoint, CatalogItem, ContentEmotionalProfile, ItemId, PeakMoment, TensionLevel,
        TrendingEntry, UserId,
    },
    routes::{create_router, AppState},
    services::{EngineSettings, PersonalizationEngine, SystemClock},
};

fn item(title: &str, genre: &str, days_old: i64) -> CatalogItem {
    CatalogItem {
        id: ItemId::new(),
        title: title.to_string(),
        author: Some("M. Okafor".to_string()),
        genre: Some(genre.to_string()),
        tags: vec![],
        published_at: Some(Utc::now() - Duration::days(days_old)),
        is_published: true,
    }
}

fn create_test_server(catalog: Arc<InMemoryCatalog>) -> TestServer {
    let engine = PersonalizationEngine::new(
        catalog,
        Arc::new(InMemoryEventLog::new()),
        Arc::new(InMemoryProfileStore::new()),
        Arc::new(SystemClock),
        EngineSettings {
            max_recommendations: 5,
            ..EngineSettings::default()
        },
    );
    let app = create_router(Arc::new(AppState::new(Arc::new(engine))));
    TestServer::new(app).unwrap()
}

fn user_path(user_id: UserId, rest: &str) -> String {
    format!("/api/v1/users/{}/{}", user_id, rest)
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(Arc::new(InMemoryCatalog::new()));
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server(Arc::new(InMemoryCatalog::new()));
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-42"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-42");
}

#[tokio::test]
async fn test_new_user_gets_default_fingerprint() {
    let server = create_test_server(Arc::new(InMemoryCatalog::new()));
    let user_id = UserId::new();

    let response = server.get(&user_path(user_id, "fingerprint")).await;
    response.assert_status_ok();
    let fingerprint: Value = response.json();
    assert_eq!(fingerprint["emotional_profile"]["joy"], 50);
    assert_eq!(fingerprint["data_points"], 0);
    assert_eq!(fingerprint["emotional_journey_preference"], "balanced");
}

#[tokio::test]
async fn test_events_shape_the_fingerprint() {
    let server = create_test_server(Arc::new(InMemoryCatalog::new()));
    let user_id = UserId::new();
    let item_id = ItemId::new();

    let response = server
        .post(&user_path(user_id, "events"))
        .json(&json!({
            "event_type": "reread",
            "emotional_context": "Joy",
            "item_id": item_id,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["fingerprint"]["emotional_profile"]["joy"], 55);
    assert_eq!(body["event"]["event_type"], "reread");

    server
        .post(&user_path(user_id, "events"))
        .json(&json!({
            "event_type": "skip",
            "emotional_context": "fear",
            "item_id": item_id,
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let fingerprint: Value = server.get(&user_path(user_id, "fingerprint")).await.json();
    assert_eq!(fingerprint["emotional_profile"]["fear"], 45);
    assert_eq!(fingerprint["data_points"], 2);
}

#[tokio::test]
async fn test_unknown_event_type_is_bad_request() {
    let server = create_test_server(Arc::new(InMemoryCatalog::new()));
    let response = server
        .post(&user_path(UserId::new(), "events"))
        .json(&json!({
            "event_type": "teleport",
            "item_id": ItemId::new(),
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("teleport"));
}

#[tokio::test]
async fn test_preferences_and_reset() {
    let server = create_test_server(Arc::new(InMemoryCatalog::new()));
    let user_id = UserId::new();

    let response = server
        .put(&user_path(user_id, "fingerprint/preferences"))
        .json(&json!({
            "sensitivity": {
                "violence_threshold": "none",
                "romance_comfort_level": "mild",
                "dark_themes_tolerance": 20,
                "jump_scare_reaction": "avoids"
            }
        }))
        .await;
    response.assert_status_ok();
    let fingerprint: Value = response.json();
    assert_eq!(fingerprint["sensitivity_profile"]["violence_threshold"], "none");

    server
        .put(&user_path(user_id, "fingerprint/preferences"))
        .json(&json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let reset: Value = server
        .post(&user_path(user_id, "fingerprint/reset"))
        .await
        .json();
    assert_eq!(reset["sensitivity_profile"]["violence_threshold"], "moderate");
}

#[tokio::test]
async fn test_recommendations_limit_validation() {
    let server = create_test_server(Arc::new(InMemoryCatalog::new()));
    let response = server
        .get(&user_path(UserId::new(), "recommendations"))
        .add_query_param("limit", 0)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommendations_are_ranked_and_capped() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let mut ranking = Vec::new();
    for i in 0..8 {
        let hit = item(&format!("Chart Topper {}", i), "thriller", 200);
        ranking.push(TrendingEntry {
            item_id: hit.id,
            score: 95.0 - i as f64 * 5.0,
            read_count: 500 - i * 10,
        });
        catalog.insert_item(hit).await;
    }
    catalog.set_trending("weekly", ranking).await;
    catalog.insert_item(item("Fresh Ink", "mystery", 1)).await;

    let server = create_test_server(catalog);
    let response = server
        .get(&user_path(UserId::new(), "recommendations"))
        .add_query_param("limit", 40)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let recs = body["recommendations"].as_array().unwrap();
    assert!(!recs.is_empty());
    assert!(recs.len() <= 5);
    assert_eq!(body["count"], recs.len());

    let scores: Vec<f64> = recs.iter().map(|r| r["score"].as_f64().unwrap()).collect();
    assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn test_daily_picks_are_stable() {
    let catalog = Arc::new(InMemoryCatalog::new());
    for i in 0..5 {
        catalog
            .insert_item(item(&format!("New Arrival {}", i), "romance", i))
            .await;
    }
    let server = create_test_server(catalog);
    let user_id = UserId::new();

    let first: Value = server.get(&user_path(user_id, "daily-picks")).await.json();
    let second: Value = server.get(&user_path(user_id, "daily-picks")).await.json();

    let ids = |picks: &Value| -> Vec<String> {
        picks["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|pick| pick["item"]["id"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(ids(&first).len(), 3);
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first["items"][0]["source"], "daily_pick");
}

#[tokio::test]
async fn test_compatibility_endpoint() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let story = item("Ember Hollow", "horror", 30);
    catalog.insert_item(story.clone()).await;
    catalog
        .set_emotional_profile(
            story.id,
            ContentEmotionalProfile {
                emotional_arc: vec![ArcPoint {
                    position: 70,
                    emotion: "fear".to_string(),
                    intensity: 90,
                }],
                peak_moments: vec![PeakMoment {
                    position: Some(85),
                    emotion: Some("fear".to_string()),
                    description: None,
                }],
                tension_level: Some(TensionLevel::Medium),
            },
        )
        .await;

    let server = create_test_server(catalog);
    let user_id = UserId::new();

    let response = server
        .get(&user_path(user_id, &format!("compatibility/{}", story.id)))
        .await;
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["score"], 65);

    let missing = server
        .get(&user_path(user_id, &format!("compatibility/{}", ItemId::new())))
        .await;
    missing.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_genre_preferences_are_normalized() {
    let server = create_test_server(Arc::new(InMemoryCatalog::new()));
    let response = server
        .put(&user_path(UserId::new(), "genres"))
        .json(&json!({
            "favorite_genres": [" Fantasy", "fantasy", "Mystery"],
            "disliked_genres": ["Horror"]
        }))
        .await;
    response.assert_status_ok();
    let prefs: Value = response.json();
    assert_eq!(prefs["favorite_genres"], json!(["fantasy", "mystery"]));
    assert_eq!(prefs["learned"], false);
}

#[tokio::test]
async fn test_malformed_user_id_is_rejected() {
    let server = create_test_server(Arc::new(InMemoryCatalog::new()));
    let response = server.get("/api/v1/users/not-a-uuid/fingerprint").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
