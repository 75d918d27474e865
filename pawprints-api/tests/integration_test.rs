use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use pawprints_api::{app, AppState};
use pawprints_catalog::PricingEngine;
use pawprints_core::QuotePollPolicy;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use tower::ServiceExt;

fn test_app() -> Router {
    app(AppState::new(PricingEngine::standard(), QuotePollPolicy::default()))
}

fn bronze_webhook_body() -> Value {
    json!({
        "source": "shapeways",
        "all_materials": {
            "6": { "name": "Versatile Plastic", "shapeways_cost": 30.0 },
            "85": { "name": "Raw Bronze", "shapeways_cost": 200.0 }
        }
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
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
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_and_materials() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, "GET", "/v1/materials", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["abs", "sla", "bronze"]);
}

#[tokio::test]
async fn test_size_validation() {
    let app = test_app();

    let (_, body) = send(
        &app,
        "POST",
        "/v1/sizes/validate",
        Some(json!({ "material_id": "bronze", "height_mm": 180.0 })),
    )
    .await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "Maximum size for Lost Wax Bronze is 150mm");
    assert_eq!(body["clamped"], 150.0);

    let (_, body) = send(
        &app,
        "POST",
        "/v1/sizes/validate",
        Some(json!({ "material_id": "sla", "height_mm": 10.0 })),
    )
    .await;
    assert_eq!(body["valid"], false);
    assert!(body.get("clamped").is_none());
}

#[tokio::test]
async fn test_estimate_then_vendor_quote() {
    let app = test_app();
    let request = json!({
        "material_id": "bronze",
        "height_mm": 100.0,
        "finish": "Raw",
        "job_id": "job-42"
    });

    // No vendor answer yet
    let (status, body) = send(&app, "POST", "/v1/prices", Some(request.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quote"]["source"], "estimate");
    assert!(body["label"].as_str().unwrap().ends_with("AUD (est.)"));

    let (status, _) = send(
        &app,
        "POST",
        "/v1/webhooks/vendor-quotes/job-42",
        Some(bronze_webhook_body()),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, body) = send(&app, "POST", "/v1/prices", Some(request)).await;
    assert_eq!(body["quote"]["source"], "vendor-quote");
    assert_eq!(body["label"], "$290.00 AUD");

    let (_, body) = send(&app, "GET", "/v1/vendor-quotes/job-42", None).await;
    assert_eq!(body["source"], "vendor");
}

#[tokio::test(start_paused = true)]
async fn test_price_waits_for_late_vendor_quote() {
    let app = test_app();
    let request = json!({
        "material_id": "bronze",
        "height_mm": 100.0,
        "finish": "Raw",
        "job_id": "job-7",
        "wait_for_vendor": true
    });

    // Lands between the third (25s) and fourth (30s) poll attempts
    let webhook = async {
        tokio::time::sleep(Duration::from_secs(27)).await;
        send(&app, "POST", "/v1/webhooks/vendor-quotes/job-7", Some(bronze_webhook_body())).await
    };

    let start = Instant::now();
    let ((status, body), (hook_status, _)) =
        tokio::join!(send(&app, "POST", "/v1/prices", Some(request)), webhook);

    assert_eq!(hook_status, StatusCode::ACCEPTED);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quote"]["source"], "vendor-quote");
    assert_eq!(body["label"], "$290.00 AUD");
    assert_eq!(start.elapsed(), Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_price_wait_falls_back_to_estimate() {
    let app = test_app();
    let start = Instant::now();
    let (status, body) = send(
        &app,
        "POST",
        "/v1/prices",
        Some(json!({
            "material_id": "abs",
            "height_mm": 150.0,
            "finish": "Standard",
            "job_id": "job-never",
            "wait_for_vendor": true
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quote"]["source"], "estimate");
    assert_eq!(body["label"], "$52.33 AUD (est.)");
    assert_eq!(start.elapsed(), QuotePollPolicy::default().max_wait());
}

#[tokio::test]
async fn test_unknown_material_price() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/v1/prices",
        Some(json!({ "material_id": "gold", "height_mm": 100.0, "finish": "Raw" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("gold"));
}

#[tokio::test]
async fn test_negative_height_price_stays_finite() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/v1/prices",
        Some(json!({ "material_id": "abs", "height_mm": -10.0, "finish": "Standard" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quote"]["total"], 30.0);
    assert_eq!(body["label"], "$30.00 AUD (est.)");
    assert_eq!(body["size"]["valid"], false);
}

#[tokio::test]
async fn test_keyring_price_is_fixed() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/v1/prices/keyring", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quote"]["source"], "fixed");
    assert_eq!(body["label"], "$320.00 AUD");
    assert_eq!(body["size"]["valid"], true);
}

#[tokio::test]
async fn test_order_flow() {
    let app = test_app();

    let (status, statue) = send(
        &app,
        "POST",
        "/v1/orders",
        Some(json!({
            "product": "statue",
            "material_id": "abs",
            "height_mm": 150.0,
            "finish": "Standard",
            "color": "White"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(statue["id"].as_str().unwrap().starts_with("PP-"));
    assert_eq!(statue["price"], "$52.33 AUD");
    assert_eq!(statue["status"], "Processing");

    let (status, keyring) = send(
        &app,
        "POST",
        "/v1/orders",
        Some(json!({ "product": "keyring", "material_id": "abs", "height_mm": 300.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(keyring["material_id"], "bronze");
    assert_eq!(keyring["size"], "50mm");
    assert_eq!(keyring["finish"], "Raw");
    assert_eq!(keyring["price"], "$320.00 AUD");

    let (_, body) = send(&app, "GET", "/v1/orders", None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let uri = format!("/v1/orders/{}", statue["id"].as_str().unwrap());
    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["material"], "ABS Plastic");

    let (status, _) = send(&app, "GET", "/v1/orders/PP-NOPE", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_rejects_invalid_size() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/v1/orders",
        Some(json!({
            "product": "statue",
            "material_id": "bronze",
            "height_mm": 10.0,
            "finish": "Raw"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Minimum size for Lost Wax Bronze is 20mm");

    let (_, body) = send(&app, "GET", "/v1/orders", None).await;
    assert!(body.as_array().unwrap().is_empty());
}
