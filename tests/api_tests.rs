//! API integration tests
//!
//! These run against a live server with the seeded development
//! database: user 1 ("testuser") and book 1 must exist.

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};

use circulation_server::models::user::UserClaims;

const BASE_URL: &str = "http://localhost:8080/api/v1";
const DEV_SECRET: &str = "change-this-secret-in-production";

/// Helper to mint a token the way the identity provider would
fn auth_token(user_id: i32) -> String {
    let now = Utc::now().timestamp();
    UserClaims {
        sub: "testuser".to_string(),
        user_id,
        exp: now + 3600,
        iat: now,
    }
    .create_token(DEV_SECRET)
    .expect("token")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_borrow_requires_authentication() {
    let client = Client::new();

    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .json(&json!({
            "book_id": 1,
            "expected_return_date": "2030-01-01"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_flow() {
    let client = Client::new();
    let token = auth_token(1);
    let due = (Utc::now().date_naive() + Duration::days(14)).to_string();

    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": 1, "expected_return_date": due }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Book borrowed successfully");
    assert!(body["borrow_id"].is_number());

    let response = client
        .post(format!("{}/returns", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": 1 }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["days_late"], 0);
}

#[tokio::test]
#[ignore]
async fn test_returning_twice_is_rejected() {
    let client = Client::new();
    let token = auth_token(1);
    let due = (Utc::now().date_naive() + Duration::days(14)).to_string();

    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": 1, "expected_return_date": due }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let returns = format!("{}/returns", BASE_URL);
    let first = client
        .post(&returns)
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(first.status().is_success());

    let second = client
        .post(&returns)
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_borrow_with_past_due_date_is_rejected() {
    let client = Client::new();
    let token = auth_token(1);
    let due = (Utc::now().date_naive() - Duration::days(1)).to_string();

    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": 1, "expected_return_date": due }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "InvalidDueDate");
}

#[tokio::test]
#[ignore]
async fn test_overdue_listing_is_an_array() {
    let client = Client::new();
    let token = auth_token(1);

    let response = client
        .get(format!("{}/borrows/overdue", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}
