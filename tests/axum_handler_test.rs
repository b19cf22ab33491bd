// Drives the extractor and error response through a real axum router

mod common;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    routing::get,
};
use common::{post_entity::Model as Post, posts_builder, posts_config, setup_seeded_db};
use query_modifier::{ModifierError, QueryParams, apply};
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait};
use serde_json::Value;
use tower::ServiceExt;

async fn list_posts(
    State(db): State<DatabaseConnection>,
    QueryParams(params): QueryParams,
) -> Result<Json<Vec<Post>>, ModifierError> {
    let builder = apply(&params, posts_builder(), &posts_config())?;
    let posts = common::post_entity::Entity::find()
        .from_raw_sql(builder.build(db.get_database_backend()))
        .all(&db)
        .await
        .unwrap_or_default();
    Ok(Json(posts))
}

async fn app() -> Router {
    let db = setup_seeded_db().await.unwrap();
    Router::new()
        .route("/posts", get(list_posts))
        .with_state(db)
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .await
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_handler_applies_query_parameters() {
    let (status, body) = get_json("/posts?status=published&sort=-views&limit=1").await;
    assert_eq!(status, StatusCode::OK);

    let posts = body.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "Learning Rust");
}

#[tokio::test]
async fn test_handler_accepts_bracket_parameters() {
    let (status, body) = get_json("/posts?id%5B%5D=2&id%5B%5D=3&sort=id").await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn test_invalid_sort_field_is_bad_request() {
    let (status, body) = get_json("/posts?sort=password").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_field");
    assert!(body["error"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn test_invalid_page_is_bad_request() {
    let (status, body) = get_json("/posts?limit=10&page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_parameter");
}

#[tokio::test]
async fn test_unknown_relation_is_bad_request() {
    let (status, body) = get_json("/posts?has=authors").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_relation");
}
