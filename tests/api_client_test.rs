// HTTP behaviour of the planning client against a mock backend

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use stratplan::api::{ApiError, ApiSettings, PlanningClient, CSRF_HEADER};
use stratplan::costing::ReferenceTables;
use stratplan::workflow::{self, WorkflowError};

fn client_for(server: &ServerGuard) -> PlanningClient {
    let settings = ApiSettings::default().with_base_url(format!("{}/api", server.url()));
    PlanningClient::new(settings).unwrap()
}

async fn mock_csrf(server: &mut ServerGuard, token: &str) -> mockito::Mock {
    server
        .mock("GET", "/api/auth/csrf/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "csrfToken": token }).to_string())
        .create_async()
        .await
}

// ── reads ──

#[tokio::test]
async fn test_paginated_list_is_unwrapped() {
    let mut server = Server::new_async().await;
    let csrf = server
        .mock("GET", "/api/auth/csrf/")
        .expect(0)
        .create_async()
        .await;
    let list = server
        .mock("GET", "/api/strategic-objectives/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "count": 2,
                "next": null,
                "results": [
                    { "id": 1, "title": "Quality services", "weight": "60.00", "is_default": true },
                    { "id": 2, "title": "Capacity", "weight": 40, "planner_weight": "35.5" }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let objectives = client.objectives().get_all().await.unwrap();

    assert_eq!(objectives.len(), 2);
    assert_eq!(objectives[0].effective_weight(), 60.0);
    assert_eq!(objectives[1].effective_weight(), 35.5);
    list.assert_async().await;
    csrf.assert_async().await;
}

fn plan_json(id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "organization": 3,
        "planner_name": "Sara Tesfaye",
        "type": "LEO/EO Plan",
        "from_date": "2025-07-08",
        "to_date": "2026-07-07",
        "status": "SUBMITTED"
    })
}

#[tokio::test]
async fn test_list_follows_next_page() {
    let mut server = Server::new_async().await;
    let next = format!("{}/api/plans/?page=2", server.url());
    let first = server
        .mock("GET", "/api/plans/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "count": 3, "next": next, "results": [plan_json(1), plan_json(2)] })
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/api/plans/?page=2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "count": 3, "next": null, "results": [plan_json(3)] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let plans = client.plans().get_all().await.unwrap();

    let ids: Vec<u64> = plans.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_failed_later_page_fails_the_list() {
    let mut server = Server::new_async().await;
    let next = format!("{}/api/plans/?page=2", server.url());
    server
        .mock("GET", "/api/plans/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "count": 2, "next": next, "results": [plan_json(1)] }).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/api/plans/?page=2")
        .with_status(502)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.plans().get_all().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 502, .. }));
}

#[tokio::test]
async fn test_server_error_is_reported_with_status() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/plans/9/")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let client = client_for(&server);
    match client.plans().get_by_id(9).await {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

// ── session ──

#[tokio::test]
async fn test_state_changing_request_carries_csrf_token() {
    let mut server = Server::new_async().await;
    let csrf = mock_csrf(&mut server, "tok123").await;
    let submit = server
        .mock("POST", "/api/plans/5/submit/")
        .match_header(CSRF_HEADER, "tok123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    let client = client_for(&server);
    client.submit_plan(5).await.unwrap();

    csrf.assert_async().await;
    submit.assert_async().await;
}

#[tokio::test]
async fn test_rejected_csrf_token_is_refreshed_once() {
    let mut server = Server::new_async().await;
    let stale = mock_csrf(&mut server, "stale").await;
    let fresh = server
        .mock("GET", "/api/auth/csrf/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "csrfToken": "fresh" }).to_string())
        .expect(1)
        .create_async()
        .await;
    let refused = server
        .mock("POST", "/api/plans/5/submit/")
        .match_header(CSRF_HEADER, "stale")
        .with_status(403)
        .with_body(r#"{"detail": "CSRF Failed: CSRF token missing or incorrect."}"#)
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("POST", "/api/plans/5/submit/")
        .match_header(CSRF_HEADER, "fresh")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    client.submit_plan(5).await.unwrap();

    assert_eq!(client.csrf_token().await.as_deref(), Some("fresh"));
    stale.assert_async().await;
    fresh.assert_async().await;
    refused.assert_async().await;
    accepted.assert_async().await;
}

#[tokio::test]
async fn test_second_csrf_rejection_is_returned() {
    let mut server = Server::new_async().await;
    let csrf = server
        .mock("GET", "/api/auth/csrf/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "csrfToken": "tok" }).to_string())
        .expect(2)
        .create_async()
        .await;
    let submit = server
        .mock("POST", "/api/plans/5/submit/")
        .with_status(403)
        .with_body(r#"{"detail": "CSRF Failed: Origin checking failed."}"#)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    match client.submit_plan(5).await {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 403);
            assert!(body.contains("CSRF Failed"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
    csrf.assert_async().await;
    submit.assert_async().await;
}

#[tokio::test]
async fn test_forbidden_without_csrf_is_not_retried() {
    let mut server = Server::new_async().await;
    let csrf = mock_csrf(&mut server, "tok").await;
    let submit = server
        .mock("POST", "/api/plans/5/submit/")
        .with_status(403)
        .with_body(r#"{"detail": "You do not have permission to perform this action."}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.submit_plan(5).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 403, .. }));
    csrf.assert_async().await;
    submit.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_clears_session() {
    let mut server = Server::new_async().await;
    mock_csrf(&mut server, "tok").await;
    server
        .mock("POST", "/api/auth/login/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "user": { "id": 4, "username": "planner", "first_name": "Sara" },
                "userOrganizations": [{ "organization": 3, "role": "PLANNER" }]
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/api/plans/")
        .with_status(401)
        .create_async()
        .await;

    let client = client_for(&server);
    let status = client.login("planner", "pw").await.unwrap();
    assert!(status.is_authenticated);
    assert_eq!(status.primary_organization(), Some(3));
    assert!(client.is_authenticated().await);

    let err = client.plans().get_all().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(!client.is_authenticated().await);
    assert!(client.csrf_token().await.is_none());
}

// ── reviews ──

#[tokio::test]
async fn test_approve_sends_feedback() {
    let mut server = Server::new_async().await;
    mock_csrf(&mut server, "tok").await;
    let approve = server
        .mock("POST", "/api/plans/8/approve/")
        .match_body(Matcher::PartialJson(json!({ "feedback": "Well aligned" })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = client_for(&server);
    workflow::approve(&client, 8, Some("  Well aligned ")).await.unwrap();
    approve.assert_async().await;
}

#[tokio::test]
async fn test_reject_without_feedback_never_reaches_server() {
    let mut server = Server::new_async().await;
    let reject = server
        .mock("POST", "/api/plans/8/reject/")
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = workflow::reject(&client, 8, "   ").await.unwrap_err();
    assert!(matches!(err, WorkflowError::FeedbackRequired));
    reject.assert_async().await;
}

// ── team/desk plans ──

#[tokio::test]
async fn test_team_desk_plans_are_filtered_by_parent_plan() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/api/team-desk-plans/")
        .match_query(Matcher::UrlEncoded("leo_eo_plan".into(), "12".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "id": 7,
                "team_desk_name": "M&E Desk",
                "leo_eo_plan": { "id": 12 },
                "status": "SUBMITTED",
                "main_activities": [21]
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let plans = client.team_desk_plans_for(12).await.unwrap();

    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].leo_eo_plan, Some(12));
    assert!(plans[0].selection().activities.contains(21));
    assert!(!plans[0].selection().activities.contains(22));
    list.assert_async().await;
}

#[tokio::test]
async fn test_team_desk_approve_and_reject() {
    let mut server = Server::new_async().await;
    mock_csrf(&mut server, "tok").await;
    let approve = server
        .mock("POST", "/api/team-desk-plans/7/approve/")
        .match_header(CSRF_HEADER, "tok")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let reject = server
        .mock("POST", "/api/team-desk-plans/9/reject/")
        .match_body(Matcher::PartialJson(json!({ "feedback": "Add Q3 targets" })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let leo_eo = server
        .mock("POST", Matcher::Regex(r"^/api/plans/".to_string()))
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    workflow::approve_team_desk(&client, 7, None).await.unwrap();
    workflow::reject_team_desk(&client, 9, " Add Q3 targets ")
        .await
        .unwrap();

    approve.assert_async().await;
    reject.assert_async().await;
    leo_eo.assert_async().await;
}

#[tokio::test]
async fn test_detail_activities_by_main_activity() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/api/detail-activities/")
        .match_query(Matcher::UrlEncoded("main_activity".into(), "21".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "count": 1,
                "next": null,
                "results": [{
                    "id": 31,
                    "name": "Print manuals",
                    "weight": "40.00",
                    "annual_target": 2,
                    "main_activity": { "id": 21, "name": "Train staff" }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let details = client.detail_activities_by_main_activity(21).await.unwrap();

    assert_eq!(details.len(), 1);
    assert_eq!(details[0].main_activity, Some(21));
    assert_eq!(details[0].weight, 40.0);
    list.assert_async().await;
}

#[tokio::test]
async fn test_inactive_feeds_are_dropped() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/initiative-feeds/")
        .match_query(Matcher::UrlEncoded("is_active".into(), "true".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                { "id": 1, "name": "Immunization" },
                { "id": 2, "name": "Legacy", "is_active": false }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let feeds = client.active_initiative_feeds().await.unwrap();
    assert_eq!(feeds.iter().map(|f| f.id).collect::<Vec<_>>(), vec![1]);
}

// ── reference tables ──

#[tokio::test]
async fn test_reference_tables_degrade_per_catalog() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/locations/")
        .with_status(500)
        .create_async()
        .await;
    server
        .mock("GET", "/api/printing-costs/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{ "id": 1, "document_type": "MANUAL", "price_per_page": "2.50" }]).to_string(),
        )
        .create_async()
        .await;
    // Every other catalog is unmocked and fails

    let client = client_for(&server);
    let tables = ReferenceTables::load(&client).await;

    assert!(tables.is_degraded());
    assert!(tables.degraded.contains(&"locations".to_string()));
    assert!(!tables.degraded.contains(&"printing-costs".to_string()));
    assert_eq!(tables.locations.len(), 5);
    assert_eq!(tables.degraded.iter().filter(|d| *d == "locations").count(), 1);
    assert_eq!(tables.printing_price("MANUAL").unwrap(), 2.5);
    assert!(tables.per_diems.is_empty());
}
