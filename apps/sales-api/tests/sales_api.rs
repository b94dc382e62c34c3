use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use tally_db::{Database, DbConfig};
use tally_sales_api::{router, AppState};

/// Same router as production, over a fresh in-memory database.
async fn app() -> Router {
    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("failed to open in-memory database");
    router(AppState::new(db))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

fn sale_body(number: &str, items: Value) -> Value {
    json!({
        "saleNumber": number,
        "saleDate": "2026-03-01T10:00:00Z",
        "customerId": Uuid::new_v4(),
        "branchId": Uuid::new_v4(),
        "items": items,
    })
}

async fn post_sale(app: &Router, number: &str, items: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/api/sales", Some(sale_body(number, items))).await
}

fn line(product: Uuid, quantity: i64, unit_price_cents: i64) -> Value {
    json!([{ "productId": product, "quantity": quantity, "unitPriceCents": unit_price_cents }])
}

#[tokio::test]
async fn health_reports_database() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn create_then_get_sale() {
    let app = app().await;
    let beer = Uuid::new_v4();
    let soda = Uuid::new_v4();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(sale_body(
            "S-0001",
            json!([
                { "productId": beer, "quantity": 5, "unitPriceCents": 1000 },
                { "productId": soda, "quantity": 3, "unitPriceCents": 2000 },
            ]),
        )),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["totalAmountCents"], 10500);
    assert_eq!(body["data"]["isCancelled"], false);
    assert_eq!(body["data"]["items"][0]["discountCents"], 500);

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, body) = send(&app, Method::GET, &format!("/api/sales/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saleNumber"], "S-0001");
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn create_merges_lines_for_the_same_product() {
    let app = app().await;
    let beer = Uuid::new_v4();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(sale_body(
            "S-0001",
            json!([
                { "productId": beer, "quantity": 5, "unitPriceCents": 1000 },
                { "productId": beer, "quantity": 15, "unitPriceCents": 1000 },
            ]),
        )),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 20);
    assert_eq!(items[0]["discountCents"], 4000);
}

#[tokio::test]
async fn invalid_create_lists_field_errors() {
    let app = app().await;
    let beer = Uuid::new_v4();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(sale_body(
            "S-0001",
            json!([
                { "productId": beer, "quantity": 15, "unitPriceCents": 1000 },
                { "productId": beer, "quantity": 15, "unitPriceCents": 1000 },
            ]),
        )),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    let messages: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["message"].as_str())
        .collect();
    assert!(messages.contains(&"The grouped quantity cannot be greater than 20."));

    let (_, list) = send(&app, Method::GET, "/api/sales", None).await;
    assert_eq!(list["totalCount"], 0);
}

#[tokio::test]
async fn missing_fields_are_validation_errors() {
    let app = app().await;

    let (status, body) = send(&app, Method::POST, "/api/sales", Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"saleNumber"));
    assert!(fields.contains(&"customerId"));
    assert!(fields.contains(&"items"));
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/sales")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_sale_number_conflicts() {
    let app = app().await;
    let items = line(Uuid::new_v4(), 1, 100);

    let (status, _) = post_sale(&app, "S-0001", items.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_sale(&app, "S-0001", items).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Sale with number S-0001 already exists");
}

#[tokio::test]
async fn update_replaces_sale() {
    let app = app().await;
    let beer = Uuid::new_v4();

    let (_, created) = post_sale(&app, "S-0001", line(beer, 5, 1000)).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/sales/{id}"),
        Some(sale_body("S-0001", line(beer, 10, 1000))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["totalAmountCents"], 8000);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/sales/{}", Uuid::new_v4()),
        Some(sale_body("S-0009", line(beer, 1, 1000))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_and_delete() {
    let app = app().await;

    let (_, created) = post_sale(&app, "S-0001", line(Uuid::new_v4(), 2, 500)).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::PATCH, &format!("/api/sales/{id}/cancel"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled"], true);

    let (_, fetched) = send(&app, Method::GET, &format!("/api/sales/{id}"), None).await;
    assert_eq!(fetched["isCancelled"], true);

    let (status, body) = send(&app, Method::DELETE, &format!("/api/sales/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, _) = send(&app, Method::GET, &format!("/api/sales/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/sales/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PATCH, &format!("/api/sales/{id}/cancel"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/sales/not-a-uuid", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn list_pages_and_filters() {
    let app = app().await;
    let beer = Uuid::new_v4();

    for (number, quantity) in [("S-0001", 1), ("S-0002", 5), ("X-0003", 10)] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/sales",
            Some(sale_body(
                number,
                json!([{ "productId": beer, "quantity": quantity, "unitPriceCents": 1000 }]),
            )),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = send(&app, Method::GET, "/api/sales?page=1&pageSize=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalCount"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);

    let (_, page) = send(&app, Method::GET, "/api/sales?saleNumber=s-000", None).await;
    assert_eq!(page["totalCount"], 2);

    let uri = "/api/sales?totalAmount_min=40&quantity_max=9";
    let (_, page) = send(&app, Method::GET, uri, None).await;
    assert_eq!(page["totalCount"], 1);
    assert_eq!(page["items"][0]["saleNumber"], "S-0002");

    let (_, page) = send(&app, Method::GET, "/api/sales?colour=red&pageSize=0", None).await;
    assert_eq!(page["totalCount"], 3);
    assert_eq!(page["pageSize"], 10);
}

#[tokio::test]
async fn oversized_unit_price_is_rejected() {
    let app = app().await;

    let oversized = line(Uuid::new_v4(), 2, i64::MAX / 2 + 1);
    let (status, body) = post_sale(&app, "S-0001", oversized).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["errors"][0]["field"], "items[0].unitPriceCents");
    assert_eq!(
        body["errors"][0]["message"],
        "The unit price cannot be greater than $1000000000.00."
    );

    let (status, list) = send(&app, Method::GET, "/api/sales", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["totalCount"], 0);

    let at_cap = line(Uuid::new_v4(), 20, 100_000_000_000);
    let (status, body) = post_sale(&app, "S-0001", at_cap).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["totalAmountCents"], 1_600_000_000_000i64);
}

#[tokio::test]
async fn update_cannot_take_another_sales_number() {
    let app = app().await;
    let items = line(Uuid::new_v4(), 1, 100);

    let (_, first) = post_sale(&app, "S-0001", items.clone()).await;
    let (status, _) = post_sale(&app, "S-0002", items.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = first["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/sales/{id}"),
        Some(sale_body("S-0002", items)),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Sale with number S-0002 already exists");

    let (_, fetched) = send(&app, Method::GET, &format!("/api/sales/{id}"), None).await;
    assert_eq!(fetched["saleNumber"], "S-0001");
}
