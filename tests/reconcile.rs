//! Route reconciliation against an in-memory admin API.

use serde_json::json;

use caddy_admin::reconcile::{AddMode, BatchOp};
use caddy_admin::routing::{Route, RoutePosition};
use caddy_admin::{CaddyError, Reconciler};

mod common;

async fn reconciler(mock: &common::MockCaddy) -> Reconciler {
    Reconciler::new(mock.client())
}

#[tokio::test]
async fn test_add_reverse_proxy_creates_single_route() {
    let mock = common::MockCaddy::start_with(common::bootstrapped()).await;
    let reconciler = reconciler(&mock).await;

    reconciler
        .add_reverse_proxy("api.example.com", "localhost:8080")
        .await
        .unwrap();

    let routes = reconciler.list_routes().await.unwrap();
    let matching: Vec<&Route> = routes
        .iter()
        .filter(|r| r.hosts().any(|h| h == "api.example.com"))
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].id, "api.example.com");
    assert_eq!(matching[0].upstreams(), vec!["localhost:8080"]);
}

#[tokio::test]
async fn test_second_add_conflicts() {
    let mock = common::MockCaddy::start_with(common::bootstrapped()).await;
    let reconciler = reconciler(&mock).await;

    reconciler.add_reverse_proxy("a.example.com", "localhost:1").await.unwrap();
    let writes = mock.writes();

    let err = reconciler
        .add_reverse_proxy("a.example.com", "localhost:2")
        .await
        .unwrap_err();
    assert!(matches!(err, CaddyError::Conflict(ref id) if id == "a.example.com"));
    assert_eq!(mock.writes(), writes);
    assert_eq!(mock.routes().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_replace_keeps_slot_unless_positioned() {
    let mock = common::MockCaddy::start_with(common::bootstrapped()).await;
    let reconciler = reconciler(&mock).await;

    reconciler.add_reverse_proxy("a.example.com", "localhost:1").await.unwrap();
    reconciler.add_reverse_proxy("b.example.com", "localhost:2").await.unwrap();

    let updated = Route::reverse_proxy("a.example.com", "localhost:9");
    reconciler.add_route_with(&updated, AddMode::replace()).await.unwrap();
    let ids = reconciler.fetch_routes().await.unwrap().ids();
    assert_eq!(ids, vec!["a.example.com", "b.example.com"]);
    assert_eq!(mock.routes()[0]["handle"][0]["upstreams"][0]["dial"], "localhost:9");

    let moved = Route::reverse_proxy("b.example.com", "localhost:2");
    reconciler
        .add_route_with(&moved, AddMode::replace().at(RoutePosition::First))
        .await
        .unwrap();
    let ids = reconciler.fetch_routes().await.unwrap().ids();
    assert_eq!(ids, vec!["b.example.com", "a.example.com"]);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let mock = common::MockCaddy::start_with(common::bootstrapped()).await;
    let reconciler = reconciler(&mock).await;

    reconciler.add_reverse_proxy("gone.example.com", "localhost:1").await.unwrap();

    assert!(reconciler.delete_route("gone.example.com").await.unwrap());
    let writes = mock.writes();
    assert!(!reconciler.delete_route("gone.example.com").await.unwrap());
    assert_eq!(mock.writes(), writes);
    assert!(!reconciler.client().has_id("gone.example.com").await);
}

#[tokio::test]
async fn test_delete_without_routes_key() {
    let mock = common::MockCaddy::start().await;
    let reconciler = reconciler(&mock).await;

    assert!(!reconciler.delete_route("nothing").await.unwrap());
    assert_eq!(mock.writes(), 0);
}

#[tokio::test]
async fn test_foreign_routes_survive() {
    let mut config = common::bootstrapped();
    config["apps"]["http"]["servers"]["srv0"]["routes"] = json!([
        {"handle": [{"handler": "file_server", "root": "/srv"}]}
    ]);
    let mock = common::MockCaddy::start_with(config).await;
    let reconciler = reconciler(&mock).await;

    reconciler.add_reverse_proxy("api.example.com", "localhost:8080").await.unwrap();

    let routes = mock.routes();
    assert_eq!(routes.as_array().unwrap().len(), 2);
    assert_eq!(routes[0], json!({"handle": [{"handler": "file_server", "root": "/srv"}]}));
}

#[tokio::test]
async fn test_sub_proxy_upstreams() {
    let mock = common::MockCaddy::start_with(common::bootstrapped()).await;
    let reconciler = reconciler(&mock).await;

    reconciler
        .add_sub_reverse_proxy("example.com", "web", &[3000, 3001], None)
        .await
        .unwrap();

    let routes = reconciler.list_routes().await.unwrap();
    let route = routes.iter().find(|r| r.id == "web.example.com").unwrap();
    assert_eq!(route.upstreams(), vec!["localhost:3000", "localhost:3001"]);
    assert!(reconciler.client().has_id("web.example.com").await);
}

#[tokio::test]
async fn test_sub_proxy_rejects_empty_ports() {
    let mock = common::MockCaddy::start_with(common::bootstrapped()).await;
    let reconciler = reconciler(&mock).await;

    let err = reconciler
        .add_sub_reverse_proxy("example.com", "web", &[], None)
        .await
        .unwrap_err();
    assert!(matches!(err, CaddyError::InvalidSpec(_)));
    assert_eq!(mock.writes(), 0);
}

#[tokio::test]
async fn test_sub_proxy_nests_under_wildcard() {
    let mock = common::MockCaddy::start_with(common::bootstrapped()).await;
    let reconciler = reconciler(&mock).await;

    reconciler.add_wildcard_route("example.com").await.unwrap();
    reconciler
        .add_sub_reverse_proxy("example.com", "app", &[4000], Some("10.0.0.5"))
        .await
        .unwrap();

    let routes = mock.routes();
    assert_eq!(routes.as_array().unwrap().len(), 1);
    let wildcard = &routes[0];
    assert_eq!(wildcard["@id"], "wildcard-example.com");
    assert_eq!(wildcard["match"][0]["host"], json!(["*.example.com", "example.com"]));
    assert_eq!(wildcard["handle"][1]["status_code"], 404);

    let nested = &wildcard["handle"][0]["routes"];
    assert_eq!(nested[0]["@id"], "app.example.com");
    assert_eq!(nested[0]["handle"][0]["upstreams"][0]["dial"], "10.0.0.5:4000");

    assert!(reconciler.client().has_id("app.example.com").await);
    let err = reconciler
        .add_sub_reverse_proxy("example.com", "app", &[4001], None)
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    assert!(reconciler.delete_route("app.example.com").await.unwrap());
    assert_eq!(mock.routes()[0]["handle"][0]["routes"], json!([]));
}

#[tokio::test]
async fn test_wildcard_twice_conflicts() {
    let mock = common::MockCaddy::start_with(common::bootstrapped()).await;
    let reconciler = reconciler(&mock).await;

    reconciler.add_wildcard_route("example.com").await.unwrap();
    let err = reconciler.add_wildcard_route("example.com").await.unwrap_err();
    assert!(matches!(err, CaddyError::Conflict(ref id) if id == "wildcard-example.com"));
}

#[tokio::test]
async fn test_batch_stops_at_first_failure() {
    let mock = common::MockCaddy::start_with(common::bootstrapped()).await;
    let reconciler = reconciler(&mock).await;

    let ops = vec![
        BatchOp::AddProxy {
            from: "a.example.com".into(),
            to: "localhost:1".into(),
            replace: false,
        },
        BatchOp::AddProxy {
            from: "a.example.com".into(),
            to: "localhost:2".into(),
            replace: false,
        },
        BatchOp::AddWildcard {
            domain: "example.com".into(),
        },
    ];

    let report = reconciler.apply_batch(ops).await;
    assert_eq!(report.applied.len(), 1);
    let (failed, err) = report.failed.as_ref().unwrap();
    assert!(matches!(failed, BatchOp::AddProxy { to, .. } if to == "localhost:2"));
    assert!(err.is_conflict());
    assert_eq!(report.skipped, vec![BatchOp::AddWildcard { domain: "example.com".into() }]);

    // Nothing rolled back, nothing after the failure applied.
    assert_eq!(reconciler.fetch_routes().await.unwrap().ids(), vec!["a.example.com"]);
}

#[tokio::test]
async fn test_server_error_surfaces_status() {
    let mock = common::MockCaddy::start_with(common::bootstrapped()).await;
    let reconciler = reconciler(&mock).await;
    mock.fail_writes(true);

    let err = reconciler
        .add_reverse_proxy("api.example.com", "localhost:8080")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(matches!(err, CaddyError::Transport { ref detail, .. } if detail.contains("injected failure")));
}

#[tokio::test]
async fn test_proxy_under_existing_wildcard_is_reachable() {
    let mock = common::MockCaddy::start_with(common::bootstrapped()).await;
    let reconciler = reconciler(&mock).await;

    reconciler.add_wildcard_route("example.com").await.unwrap();
    reconciler
        .add_reverse_proxy("api.example.com", "localhost:8080")
        .await
        .unwrap();
    reconciler.add_reverse_proxy("other.org", "localhost:9090").await.unwrap();

    let routes = mock.routes();
    let top: Vec<&str> = routes
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["@id"].as_str())
        .collect();
    // Not shadowed by the terminal wildcard: it lives inside its subroute.
    assert_eq!(top, vec!["wildcard-example.com", "other.org"]);
    let nested = &routes[0]["handle"][0]["routes"];
    assert_eq!(nested[0]["@id"], "api.example.com");
    assert_eq!(nested[0]["handle"][0]["upstreams"][0]["dial"], "localhost:8080");

    let err = reconciler
        .add_reverse_proxy("api.example.com", "localhost:1")
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}
