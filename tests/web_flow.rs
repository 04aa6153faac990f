//! End-to-end tests of the HTTP façade against an in-memory database.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use kiosco::config::database;
use kiosco::config::settings::{BootstrapAdmin, ProductSeed, Settings};
use kiosco::core::seed;
use kiosco::web::{AppState, create_app};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "admin-pass-123";
const FORM: &str = "application/x-www-form-urlencoded";

async fn setup() -> Router {
    let db = database::connect("sqlite::memory:").await.unwrap();
    database::create_tables(&db).await.unwrap();

    let settings = Settings {
        bootstrap_admin: Some(BootstrapAdmin {
            username: "admin".to_string(),
            first_name: "Shop".to_string(),
            last_name: "Owner".to_string(),
            email: "admin@shop.test".to_string(),
        }),
        products: vec![ProductSeed {
            name: "Soda".to_string(),
            description: Some("Cola 500ml".to_string()),
            price: Decimal::new(1000, 2),
            stock: 50,
        }],
        ..Default::default()
    };
    seed::seed_bootstrap_admin(&db, &settings, Some(ADMIN_PASSWORD.to_string()))
        .await
        .unwrap();
    seed::seed_products(&db, &settings).await.unwrap();

    create_app(AppState::new(db))
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response.headers()["location"].to_str().unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", FORM)
            .body(Body::from(format!("username={username}&password={password}")))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let set_cookie = response.headers()["set-cookie"].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn post(app: &Router, cookie: &str, uri: &str, body: &str) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("cookie", cookie)
            .header("content-type", FORM)
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn get_json(app: &Router, cookie: &str, uri: &str) -> (StatusCode, Value) {
    let response = send(
        app,
        Request::builder()
            .uri(uri)
            .header("cookie", cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

fn messages(page: &Value) -> Vec<(String, String)> {
    page["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| {
            (
                m["level"].as_str().unwrap().to_string(),
                m["text"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;
    let response = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_pages_require_login() {
    let app = setup().await;

    let response = send(&app, Request::builder().uri("/").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = post(&app, "kiosco_session=bogus", "/sales", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = setup().await;
    let response = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", FORM)
            .body(Body::from("username=admin&password=nope"))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get("set-cookie").is_none());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = setup().await;
    let cookie = login(&app, "admin", ADMIN_PASSWORD).await;

    let response = post(&app, &cookie, "/logout", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let cleared = response.headers()["set-cookie"].to_str().unwrap();
    assert!(cleared.starts_with("kiosco_session="));
    assert!(cleared.contains("Max-Age=0"));

    let response = send(
        &app,
        Request::builder()
            .uri("/")
            .header("cookie", &cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_checkout_flow() {
    let app = setup().await;
    let cookie = login(&app, "admin", ADMIN_PASSWORD).await;

    // Open the till
    let response = post(&app, &cookie, "/till/open", "starting_cash=100.00&notes=").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let (status, page) = get_json(&app, &cookie, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"]["stats"]["till_open"], true);
    assert_eq!(messages(&page)[0].0, "success");

    // Start a sale and add five sodas
    let (_, products) = get_json(&app, &cookie, "/products").await;
    let soda_id = products["data"][0]["id"].as_i64().unwrap();

    let response = post(&app, &cookie, "/sales", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let lines_url = location(&response).to_string();
    assert!(lines_url.ends_with("/lines"));

    let response = post(
        &app,
        &cookie,
        &lines_url,
        &format!("product_id={soda_id}&quantity=5"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let finalize_url = location(&response).to_string();
    assert!(finalize_url.ends_with("/finalize"));

    let (_, pending) = get_json(&app, &cookie, &finalize_url).await;
    assert_eq!(decimal(&pending["data"]["sale"]["total"]), Decimal::new(5000, 2));
    assert_eq!(pending["data"]["lines"][0]["product_name"], "Soda");

    // Finalize and check stock
    let response = post(&app, &cookie, &finalize_url, "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let sale_url = finalize_url.trim_end_matches("/finalize").to_string();
    let (_, sale) = get_json(&app, &cookie, &sale_url).await;
    assert_eq!(sale["data"]["sale"]["status"], "finalized");

    let (_, product) = get_json(&app, &cookie, &format!("/products/{soda_id}")).await;
    assert_eq!(product["data"]["product"]["stock"], 45);

    // Close: the close form shows the expected cash
    let (_, summary) = get_json(&app, &cookie, "/till/close").await;
    assert_eq!(decimal(&summary["data"]["expected_cash"]), Decimal::new(150, 0));

    let response = post(&app, &cookie, "/till/close", "ending_cash=150.00").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let (_, history) = get_json(&app, &cookie, "/till/history").await;
    let close = &history["data"][0];
    assert_eq!(close["kind"], "close");
    assert_eq!(decimal(&close["sales_total"]), Decimal::new(50, 0));
    assert_eq!(decimal(&close["starting_cash"]), Decimal::new(100, 0));
}

#[tokio::test]
async fn test_open_till_twice_shows_error() {
    let app = setup().await;
    let cookie = login(&app, "admin", ADMIN_PASSWORD).await;

    post(&app, &cookie, "/till/open", "starting_cash=100").await;
    let (_, _) = get_json(&app, &cookie, "/").await;

    let response = post(&app, &cookie, "/till/open", "starting_cash=50").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let (_, page) = get_json(&app, &cookie, "/").await;
    let shown = messages(&page);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].0, "error");
    assert!(shown[0].1.contains("already have an open till"));

    let (_, summary) = get_json(&app, &cookie, "/till/close").await;
    assert_eq!(
        decimal(&summary["data"]["open_event"]["starting_cash"]),
        Decimal::new(100, 0)
    );
}

#[tokio::test]
async fn test_start_sale_without_till_redirects_to_open_till() {
    let app = setup().await;
    let cookie = login(&app, "admin", ADMIN_PASSWORD).await;

    let response = post(&app, &cookie, "/sales", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/till/open");

    let (_, page) = get_json(&app, &cookie, "/till/open").await;
    assert_eq!(page["data"]["till_open"], false);
    assert_eq!(messages(&page)[0].0, "error");
}

#[tokio::test]
async fn test_insufficient_stock_loops_back() {
    let app = setup().await;
    let cookie = login(&app, "admin", ADMIN_PASSWORD).await;
    post(&app, &cookie, "/till/open", "starting_cash=0").await;

    let (_, products) = get_json(&app, &cookie, "/products").await;
    let soda_id = products["data"][0]["id"].as_i64().unwrap();

    let response = post(&app, &cookie, "/sales", "").await;
    let lines_url = location(&response).to_string();

    let response = post(
        &app,
        &cookie,
        &lines_url,
        &format!("product_id={soda_id}&quantity=51&add_another=1"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), lines_url);

    let (_, page) = get_json(&app, &cookie, &lines_url).await;
    assert!(messages(&page).iter().any(|(level, text)| level == "error"
        && text.contains("Not enough stock")));
    assert!(page["data"]["lines"].as_array().unwrap().is_empty());
    assert_eq!(page["data"]["products"][0]["stock"], 50);

    // Finalizing the empty sale sends the user back to add lines
    let finalize_url = lines_url.replace("/lines", "/finalize");
    let response = post(&app, &cookie, &finalize_url, "").await;
    assert_eq!(location(&response), lines_url);
}

#[tokio::test]
async fn test_user_administration() {
    let app = setup().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let response = post(
        &app,
        &admin,
        "/users",
        "username=ana&first_name=Ana&last_name=Lopez&email=ana%40shop.test\
         &password=employee-pass&password_confirmation=employee-pass&role=employee",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users");

    let (_, users) = get_json(&app, &admin, "/users?search=ana").await;
    assert_eq!(users["data"].as_array().unwrap().len(), 1);
    assert_eq!(users["data"][0]["role"], "employee");
    assert!(users["data"][0].get("password_hash").is_none());

    // Employees cannot reach user administration
    let employee = login(&app, "ana", "employee-pass").await;
    let response = send(
        &app,
        Request::builder()
            .uri("/users")
            .header("cookie", &employee)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    // Administrators cannot deactivate themselves
    let (_, dashboard) = get_json(&app, &admin, "/").await;
    let admin_id = dashboard["data"]["user"]["id"].as_i64().unwrap();
    let response = post(&app, &admin, &format!("/users/{admin_id}/deactivate"), "").await;
    assert_eq!(location(&response), "/users");

    let (_, users) = get_json(&app, &admin, "/users").await;
    assert_eq!(messages(&users)[0].0, "error");
    assert!(users["data"].as_array().unwrap().iter().all(|u| u["is_active"] == true));
}

#[tokio::test]
async fn test_validation_and_not_found() {
    let app = setup().await;
    let cookie = login(&app, "admin", ADMIN_PASSWORD).await;

    let response = post(&app, &cookie, "/products", "name=Gum&price=-1&stock=3").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["field"], "price");

    let (status, _) = get_json(&app, &cookie, "/products/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_price_edit_records_history() {
    let app = setup().await;
    let cookie = login(&app, "admin", ADMIN_PASSWORD).await;
    let (_, products) = get_json(&app, &cookie, "/products").await;
    let soda_id = products["data"][0]["id"].as_i64().unwrap();

    let response = post(
        &app,
        &cookie,
        &format!("/products/{soda_id}/edit"),
        "name=Soda&description=Cola+500ml&price=12.00&stock=50",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let (_, detail) = get_json(&app, &cookie, &format!("/products/{soda_id}")).await;
    let history = detail["data"]["price_history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(decimal(&history[0]["previous_price"]), Decimal::new(10, 0));
    assert_eq!(decimal(&history[0]["new_price"]), Decimal::new(12, 0));
}

#[tokio::test]
async fn test_cannot_finalize_another_operators_sale() {
    let app = setup().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    post(
        &app,
        &admin,
        "/users",
        "username=bob&email=bob%40shop.test&password=employee-pass\
         &password_confirmation=employee-pass&role=employee",
    )
    .await;
    let bob = login(&app, "bob", "employee-pass").await;

    post(&app, &admin, "/till/open", "starting_cash=100").await;
    post(&app, &bob, "/till/open", "starting_cash=100").await;

    let (_, products) = get_json(&app, &admin, "/products").await;
    let soda_id = products["data"][0]["id"].as_i64().unwrap();
    let response = post(&app, &admin, "/sales", "").await;
    let lines_url = location(&response).to_string();
    post(&app, &admin, &lines_url, &format!("product_id={soda_id}&quantity=5")).await;

    let finalize_url = lines_url.replace("/lines", "/finalize");
    let response = post(&app, &bob, &finalize_url, "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/sales");

    let (_, page) = get_json(&app, &bob, "/sales").await;
    assert_eq!(messages(&page)[0].0, "error");
    assert_eq!(page["data"][0]["status"], "open");

    let (_, summary) = get_json(&app, &bob, "/till/close").await;
    assert_eq!(decimal(&summary["data"]["sales_total"]), Decimal::ZERO);
}
