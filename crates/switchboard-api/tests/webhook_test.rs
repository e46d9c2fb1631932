//! Integration tests for the call webhook.
//!
//! Drives `POST /webhook` through the full middleware stack and checks both
//! the response script and the transaction record written for it.

use axum::http::StatusCode;
use futures::future::join_all;
use serde_json::{json, Value};
use switchboard_core::{EmployeeId, Outcome};
use switchboard_testing::{DirectoryBuilder, EmployeeBuilder, TestEnv, TEST_API_KEY};

fn connect_to(number: &str) -> Value {
    json!([
        {"action": "talk", "text": "Connecting you to our representative."},
        {"action": "connect", "endpoint": [{"type": "phone", "number": number}]}
    ])
}

#[tokio::test]
async fn department_request_connects_first_employee() {
    let env = TestEnv::new().expect("test env setup");

    let response = env
        .post_raw("/webhook", Some("secret123"), r#"{"department":"Sales"}"#)
        .await
        .expect("request execution");

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json().expect("json body"), connect_to("+15551234567"));

    let record = env.transactions.last().expect("transaction recorded");
    assert_eq!(record.route, "/webhook");
    assert_eq!(record.status, 200);
    assert_eq!(record.request, json!({"department": "Sales"}));
    assert_eq!(record.outcome, Outcome::Routed { employee_id: EmployeeId(1), fallback: false });
    assert_eq!(record.response, connect_to("+15551234567"));
    assert_eq!(record.request_id.as_deref(), response.request_id());
}

#[tokio::test]
async fn employee_id_takes_precedence_over_department() {
    let env = TestEnv::new().expect("test env setup");

    let response = env
        .post_json("/webhook", &json!({"employeeId": 2, "department": "Sales"}))
        .await
        .expect("request execution");

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json().expect("json body"), connect_to("+15559876543"));
}

#[tokio::test]
async fn requested_party_matches_exact_name() {
    let env = TestEnv::new().expect("test env setup");

    let response = env
        .post_json("/webhook", &json!({"requestedParty": "Erin Green"}))
        .await
        .expect("request execution");

    assert_eq!(response.json().expect("json body"), connect_to("+15555550105"));
}

#[tokio::test]
async fn requested_party_match_is_case_sensitive() {
    let env = TestEnv::new().expect("test env setup");

    let response = env
        .post_json("/webhook", &json!({"requestedParty": "  erin GREEN "}))
        .await
        .expect("request execution");

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json().expect("json body");
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["action"], "talk");
    assert_eq!(env.transactions.last().expect("record").outcome, Outcome::NoRoute);
}

#[tokio::test]
async fn zero_employee_id_is_bad_request() {
    let env = TestEnv::new().expect("test env setup");

    let response = env
        .post_json("/webhook", &json!({"employeeId": 0}))
        .await
        .expect("request execution");

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let record = env.transactions.last().expect("record");
    assert!(matches!(record.outcome, Outcome::Malformed { .. }));
    assert_eq!(record.request, json!({"employeeId": 0}));
}

#[tokio::test]
async fn department_match_is_case_sensitive() {
    let env = TestEnv::new().expect("test env setup");

    let response = env
        .post_json("/webhook", &json!({"department": "sales"}))
        .await
        .expect("request execution");

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json().expect("json body");
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["action"], "talk");
    assert_eq!(env.transactions.last().expect("record").outcome, Outcome::NoRoute);
}

#[tokio::test]
async fn employee_without_phone_is_never_connected() {
    let env = TestEnv::new().expect("test env setup");

    let response = env
        .post_json("/webhook", &json!({"employeeId": 3}))
        .await
        .expect("request execution");

    let body = response.json().expect("json body");
    assert_eq!(response.status, StatusCode::OK);
    assert!(body.as_array().expect("script").iter().all(|a| a["action"] != "connect"));
    assert_eq!(env.transactions.routed_count(), 0);
}

#[tokio::test]
async fn no_route_speaks_configured_message() {
    let env = TestEnv::builder()
        .no_route_message("Please call back during office hours.")
        .build()
        .expect("test env setup");

    let response = env.post_json("/webhook", &json!({})).await.expect("request execution");

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json().expect("json body"),
        json!([{"action": "talk", "text": "Please call back during office hours."}])
    );
}

#[tokio::test]
async fn unmatched_request_uses_fallback_deterministically() {
    let env = TestEnv::builder().fallback(2).build().expect("test env setup");
    let payload = json!({"department": "Legal", "callerId": "+15550009999"});

    let mut bodies = Vec::new();
    for _ in 0..5 {
        let response = env.post_json("/webhook", &payload).await.expect("request execution");
        assert_eq!(response.status, StatusCode::OK);
        bodies.push(response.json().expect("json body"));
    }

    assert!(bodies.iter().all(|body| *body == connect_to("+15559876543")));
    assert!(env
        .records()
        .iter()
        .all(|r| r.outcome == Outcome::Routed { employee_id: EmployeeId(2), fallback: true }));
}

#[tokio::test]
async fn custom_announcement_is_spoken_before_connect() {
    let env = TestEnv::builder()
        .announcement("Transferring you now.")
        .build()
        .expect("test env setup");

    let response = env
        .post_json("/webhook", &json!({"department": "Support"}))
        .await
        .expect("request execution");

    let body = response.json().expect("json body");
    assert_eq!(body[0], json!({"action": "talk", "text": "Transferring you now."}));
    assert_eq!(body[1]["endpoint"][0]["number"], "+15559876543");
}

#[tokio::test]
async fn unknown_fields_are_ignored_but_logged() {
    let env = TestEnv::new().expect("test env setup");
    let payload = json!({
        "department": "Support",
        "conversation_uuid": "CON-1234",
        "nested": {"anything": [1, 2, 3]}
    });

    let response = env.post_json("/webhook", &payload).await.expect("request execution");

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(env.transactions.last().expect("record").request, payload);
}

#[tokio::test]
async fn wrongly_typed_field_is_bad_request() {
    let env = TestEnv::new().expect("test env setup");

    let response = env
        .post_json("/webhook", &json!({"department": ["Sales"]}))
        .await
        .expect("request execution");

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json().expect("json body");
    assert_eq!(body["error"], "MalformedRequest");
    assert_eq!(body["code"], "E1002");
}

#[tokio::test]
async fn malformed_body_is_rejected_before_authentication() {
    let env = TestEnv::new().expect("test env setup");

    let response = env
        .post_raw("/webhook", Some("not-the-key"), "{department: Sales")
        .await
        .expect("request execution");

    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let record = env.transactions.last().expect("record");
    assert!(matches!(record.outcome, Outcome::Malformed { .. }));
    assert_eq!(record.request, json!("{department: Sales"));
}

#[tokio::test]
async fn non_object_bodies_are_bad_requests() {
    let env = TestEnv::new().expect("test env setup");

    for body in ["", "   ", "[]", "\"Sales\"", "42", "null"] {
        let response =
            env.post_raw("/webhook", Some(TEST_API_KEY), body).await.expect("request execution");
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "body {body:?}");
    }
    assert_eq!(env.transactions.len(), 6);
}

#[tokio::test]
async fn get_is_not_allowed() {
    let env = TestEnv::new().expect("test env setup");

    let response = env.get("/webhook").await.expect("request execution");

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn concurrent_requests_are_each_answered_and_recorded() {
    let env = TestEnv::builder()
        .directory(
            DirectoryBuilder::sample()
                .employee(EmployeeBuilder::new(6).name("Fay Hill").department("Support")),
        )
        .build()
        .expect("test env setup");

    let requests = (0..32).map(|i| {
        let env = env.clone();
        async move {
            let payload = if i % 2 == 0 {
                json!({"department": "Sales"})
            } else {
                json!({"department": "Support"})
            };
            env.post_json("/webhook", &payload).await.expect("request execution")
        }
    });
    let responses = join_all(requests).await;

    for (i, response) in responses.iter().enumerate() {
        let expected = if i % 2 == 0 { "+15551234567" } else { "+15559876543" };
        assert_eq!(response.json().expect("json body"), connect_to(expected));
    }
    assert_eq!(env.transactions.len(), 32);
    assert_eq!(env.transactions.routed_count(), 32);
}
