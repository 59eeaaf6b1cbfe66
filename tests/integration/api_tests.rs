//! API integration tests
//!
//! These run against a live server and database:
//! `DATABASE_URL=... cargo test -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};

const BASE_URL: &str = "http://localhost:8088/api/v1";
const PASSWORD: &str = "correct-horse-battery";

async fn database() -> PgPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database")
}

/// Insert an activated account directly and log it in
async fn activated_user(client: &Client, firstname: &str) -> String {
    let pool = database().await;

    let email = format!("{}-{}@example.com", firstname.to_lowercase(), uuid::Uuid::new_v4());
    let hash = bookshare_server::services::auth::hash_password(PASSWORD).expect("hash");

    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (firstname, lastname, email, password, enabled) VALUES ($1, 'Tester', $2, $3, TRUE) RETURNING id",
    )
    .bind(firstname)
    .bind(&email)
    .bind(&hash)
    .fetch_one(&pool)
    .await
    .expect("Failed to insert user");

    sqlx::query("INSERT INTO user_roles (user_id, role_id) SELECT $1, id FROM roles WHERE name = 'USER'")
        .bind(user_id)
        .execute(&pool)
        .await
        .expect("Failed to grant role");

    let response = client
        .post(format!("{}/auth/authenticate", BASE_URL))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn create_book(client: &Client, token: &str, title: &str, shareable: bool) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": title,
            "authorName": "Ursula K. Le Guin",
            "isbn": "9780441478125",
            "synopsis": "A lone envoy on a winter planet",
            "shareable": shareable
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse book id")
}

async fn call(client: &Client, method: reqwest::Method, path: &str, token: &str) -> reqwest::Response {
    client
        .request(method, format!("{}{}", BASE_URL, path))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
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
async fn test_protected_route_requires_token() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/authenticate", BASE_URL))
        .json(&json!({ "email": "nobody@example.com", "password": "wrong-password" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_register_is_accepted_but_not_active() {
    let client = Client::new();
    let email = format!("new-{}@example.com", uuid::Uuid::new_v4());

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "firstname": "Newcomer",
            "lastname": "Tester",
            "email": email,
            "password": PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = client
        .post(format!("{}/auth/authenticate", BASE_URL))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

async fn forbidden_message(response: reqwest::Response) -> String {
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.expect("Failed to parse error body");
    body["message"].as_str().expect("No message in error").to_string()
}

async fn post_feedback(client: &Client, token: &str, book_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/feedbacks", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "note": 3, "comment": "Worth a read", "bookId": book_id }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore]
async fn test_activation_consumes_code_once() {
    let client = Client::new();
    let email = format!("activate-{}@example.com", uuid::Uuid::new_v4());

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "firstname": "Pending",
            "lastname": "Tester",
            "email": email,
            "password": PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let code: String = sqlx::query_scalar(
        "SELECT t.token FROM tokens t JOIN users u ON u.id = t.user_id WHERE u.email = $1",
    )
    .bind(&email)
    .fetch_one(&database().await)
    .await
    .expect("No activation code stored");

    let activate = || {
        client
            .get(format!("{}/auth/activate-account", BASE_URL))
            .query(&[("token", code.as_str())])
            .send()
    };

    let response = activate().await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(format!("{}/auth/authenticate", BASE_URL))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = activate().await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_return_and_approval_rules() {
    let client = Client::new();
    let owner = activated_user(&client, "Owner").await;
    let borrower = activated_user(&client, "Borrower").await;
    let stranger = activated_user(&client, "Stranger").await;
    let book_id = create_book(&client, &owner, "The Word for World Is Forest", true).await;
    let return_path = format!("/books/borrow/return/{}", book_id);
    let approve_path = format!("/books/borrow/return/approve/{}", book_id);

    // Return before any borrow
    let response = call(&client, reqwest::Method::PATCH, &return_path, &borrower).await;
    assert_eq!(forbidden_message(response).await, "You did not borrow this book");

    let response = call(&client, reqwest::Method::POST, &format!("/books/borrow/{}", book_id), &borrower).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(&client, reqwest::Method::POST, &format!("/books/borrow/{}", book_id), &borrower).await;
    assert_eq!(forbidden_message(response).await, "The requested book is already borrowed");

    // Someone who never borrowed it cannot return it either
    let response = call(&client, reqwest::Method::PATCH, &return_path, &stranger).await;
    assert_eq!(forbidden_message(response).await, "You did not borrow this book");

    let response = call(&client, reqwest::Method::PATCH, &return_path, &borrower).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(&client, reqwest::Method::PATCH, &return_path, &borrower).await;
    assert_eq!(forbidden_message(response).await, "You did not borrow this book");

    let response = call(&client, reqwest::Method::PATCH, &approve_path, &stranger).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = call(&client, reqwest::Method::PATCH, &approve_path, &owner).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(&client, reqwest::Method::PATCH, &approve_path, &owner).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_archived_book_blocks_return_and_feedback() {
    let client = Client::new();
    let owner = activated_user(&client, "Owner").await;
    let borrower = activated_user(&client, "Borrower").await;
    let book_id = create_book(&client, &owner, "The Lathe of Heaven", true).await;

    let response = call(&client, reqwest::Method::POST, &format!("/books/borrow/{}", book_id), &borrower).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(&client, reqwest::Method::PATCH, &format!("/books/archived/{}", book_id), &owner).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(
        &client,
        reqwest::Method::PATCH,
        &format!("/books/borrow/return/{}", book_id),
        &borrower,
    )
    .await;
    assert_eq!(
        forbidden_message(response).await,
        "You cannot return this book since it is archived or not shareable"
    );

    let response = post_feedback(&client, &borrower, book_id).await;
    assert_eq!(
        forbidden_message(response).await,
        "You cannot give feedback for an archived or not shareable book"
    );
}

#[tokio::test]
#[ignore]
async fn test_private_book_blocks_feedback() {
    let client = Client::new();
    let owner = activated_user(&client, "Owner").await;
    let reader = activated_user(&client, "Reader").await;
    let book_id = create_book(&client, &owner, "Four Ways to Forgiveness", false).await;

    let response = post_feedback(&client, &reader, book_id).await;
    assert_eq!(
        forbidden_message(response).await,
        "You cannot give feedback for an archived or not shareable book"
    );

    let response = post_feedback(&client, &reader, i64::from(i32::MAX)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_overflowing_page_is_rejected() {
    let client = Client::new();
    let reader = activated_user(&client, "Reader").await;

    let response = call(&client, reqwest::Method::GET, "/books?page=1000000000000000000&size=100", &reader).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_full_borrow_lifecycle() {
    let client = Client::new();
    let owner = activated_user(&client, "Owner").await;
    let borrower = activated_user(&client, "Borrower").await;
    let book_id = create_book(&client, &owner, "The Left Hand of Darkness", true).await;

    let response = call(&client, reqwest::Method::POST, &format!("/books/borrow/{}", book_id), &borrower).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Second borrow while the first is open
    let response = call(&client, reqwest::Method::POST, &format!("/books/borrow/{}", book_id), &borrower).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Approval before the borrower returns
    let response = call(
        &client,
        reqwest::Method::PATCH,
        &format!("/books/borrow/return/approve/{}", book_id),
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = call(&client, reqwest::Method::PATCH, &format!("/books/borrow/return/{}", book_id), &borrower).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(&client, reqwest::Method::GET, "/books/returned", &owner).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let record = body["content"]
        .as_array()
        .expect("content")
        .iter()
        .find(|b| b["id"] == json!(book_id))
        .expect("returned record missing")
        .clone();
    assert_eq!(record["status"], "RETURN_REQUESTED");

    let response = call(
        &client,
        reqwest::Method::PATCH,
        &format!("/books/borrow/return/approve/{}", book_id),
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Approved records no longer block a new borrow
    let response = call(&client, reqwest::Method::POST, &format!("/books/borrow/{}", book_id), &borrower).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(&client, reqwest::Method::GET, "/books/borrowed", &borrower).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["totalElements"], 2);
}

#[tokio::test]
#[ignore]
async fn test_owner_rules() {
    let client = Client::new();
    let owner = activated_user(&client, "Owner").await;
    let other = activated_user(&client, "Other").await;
    let book_id = create_book(&client, &owner, "Earthsea", true).await;

    let response = call(&client, reqwest::Method::POST, &format!("/books/borrow/{}", book_id), &owner).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = call(&client, reqwest::Method::PATCH, &format!("/books/archived/{}", book_id), &other).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = call(&client, reqwest::Method::PATCH, &format!("/books/sharable/{}", book_id), &owner).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(&client, reqwest::Method::GET, &format!("/books/{}", book_id), &other).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["shareable"], false);

    // Private books cannot be borrowed
    let response = call(&client, reqwest::Method::POST, &format!("/books/borrow/{}", book_id), &other).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_feed_excludes_own_and_archived_books() {
    let client = Client::new();
    let owner = activated_user(&client, "Owner").await;
    let reader = activated_user(&client, "Reader").await;
    let visible = create_book(&client, &owner, "The Dispossessed", true).await;
    let archived = create_book(&client, &owner, "Lavinia", true).await;

    let response = call(&client, reqwest::Method::PATCH, &format!("/books/archived/{}", archived), &owner).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(&client, reqwest::Method::GET, "/books?size=100", &reader).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let ids: Vec<i64> = body["content"]
        .as_array()
        .expect("content")
        .iter()
        .filter_map(|b| b["id"].as_i64())
        .collect();
    assert!(ids.contains(&visible));
    assert!(!ids.contains(&archived));

    let response = call(&client, reqwest::Method::GET, "/books?size=100", &owner).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["content"]
        .as_array()
        .expect("content")
        .iter()
        .all(|b| b["id"] != json!(visible)));

    let response = call(&client, reqwest::Method::GET, "/books/owner", &owner).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["totalElements"], 2);
}

#[tokio::test]
#[ignore]
async fn test_feedback_rules() {
    let client = Client::new();
    let owner = activated_user(&client, "Owner").await;
    let reader = activated_user(&client, "Reader").await;
    let book_id = create_book(&client, &owner, "Always Coming Home", true).await;

    let response = client
        .post(format!("{}/feedbacks", BASE_URL))
        .bearer_auth(&owner)
        .json(&json!({ "note": 5, "comment": "My own book", "bookId": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .post(format!("{}/feedbacks", BASE_URL))
        .bearer_auth(&reader)
        .json(&json!({ "note": 4, "comment": "Lovely", "bookId": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = call(&client, reqwest::Method::GET, &format!("/feedbacks/book/{}", book_id), &reader).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["content"][0]["ownFeedback"], true);

    let response = call(&client, reqwest::Method::GET, &format!("/books/{}", book_id), &owner).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["rate"], 4.0);
}

#[tokio::test]
#[ignore]
async fn test_cover_upload() {
    let client = Client::new();
    let owner = activated_user(&client, "Owner").await;
    let other = activated_user(&client, "Other").await;
    let book_id = create_book(&client, &owner, "Tehanu", true).await;

    let form = || {
        reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(vec![0x89, 0x50, 0x4e, 0x47]).file_name("cover.png"),
        )
    };

    let response = client
        .post(format!("{}/books/cover/{}", BASE_URL, book_id))
        .bearer_auth(&other)
        .multipart(form())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .post(format!("{}/books/cover/{}", BASE_URL, book_id))
        .bearer_auth(&owner)
        .multipart(form())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = call(&client, reqwest::Method::GET, &format!("/books/{}", book_id), &owner).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["cover"], "iVBORw==");
}
