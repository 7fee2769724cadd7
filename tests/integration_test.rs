use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use claims_intake::pipeline::storage::{ClaimStorage, InMemoryStorage};
use claims_intake::rate_limiter::RateLimiter;
use claims_intake::server::{create_server, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const BOUNDARY: &str = "claims-intake-test-boundary";
const FIXTURE: &str = include_str!("fixtures/claim_1234.csv");

fn app() -> (Router, Arc<InMemoryStorage>) {
    let storage = Arc::new(InMemoryStorage::new());
    let state = AppState::new(storage.clone(), RateLimiter::new(6, Duration::from_secs(60)));
    (create_server(state), storage)
}

fn upload_request(content: &str, content_type: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"csv_file\"; filename=\"claim_1234.csv\"\r\n\
         Content-Type: {content_type}\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/claims")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn upload_returns_claims_in_row_order() -> Result<()> {
    let (app, storage) = app();

    let (status, body) = send(&app, upload_request(FIXTURE, "text/csv")).await?;
    assert_eq!(status, StatusCode::OK);

    let claims = body["claims"].as_array().expect("claims array");
    assert_eq!(claims.len(), 4);

    let procedures: Vec<&str> = claims
        .iter()
        .map(|c| c["submitted_procedure"].as_str().unwrap())
        .collect();
    assert_eq!(procedures, ["D0180", "D0210", "D4346", "D4211"]);

    let net_fees: Vec<f64> = claims.iter().map(|c| c["net_fee"].as_f64().unwrap()).collect();
    assert_eq!(net_fees, [0.0, 0.0, 81.25, 178.0 + 35.6 + 0.0 - 178.0]);

    let mut ids: Vec<&str> = claims.iter().map(|c| c["id"].as_str().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);

    let last = &claims[3];
    assert_eq!(last["quadrant"], "UR");
    assert_eq!(last["provider_npi"], 1497775530i64);
    assert_eq!(last["service_date"], "2018-03-28T00:00:00");
    assert_eq!(last["member_coinsurance"], 35.6);

    assert_eq!(storage.claim_count().await?, 4);
    Ok(())
}

#[tokio::test]
async fn one_invalid_row_rejects_the_upload() -> Result<()> {
    let (app, storage) = app();
    let content = FIXTURE.replacen("1497775530", "149777553", 1);

    let (status, body) = send(&app, upload_request(&content, "text/csv")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Error processing file: "));
    assert!(detail.contains("provider_npi"));
    assert_eq!(storage.claim_count().await?, 0);

    let (status, body) = send(&app, get("/providers")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No providers found");
    Ok(())
}

#[tokio::test]
async fn non_csv_part_is_rejected() -> Result<()> {
    let (app, storage) = app();

    let (status, body) = send(&app, upload_request(FIXTURE, "application/json")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "File type must be CSV.");
    assert_eq!(storage.claim_count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn claims_are_retrievable_by_id() -> Result<()> {
    let (app, _) = app();
    let (_, body) = send(&app, upload_request(FIXTURE, "text/csv")).await?;
    let id = body["claims"][2]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get(&format!("/claims/{id}"))).await?;
    assert_eq!(status, StatusCode::OK);
    let found = body.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["net_fee"], 81.25);

    let (status, body) = send(&app, get("/claims/not-a-uuid")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Claims not found.");
    Ok(())
}

#[tokio::test]
async fn providers_report_rolls_up_net_fees() -> Result<()> {
    let (app, _) = app();
    send(&app, upload_request(FIXTURE, "text/csv")).await?;

    let (status, body) = send(&app, get("/providers?limit=5")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "provider_npi": 1497775530i64,
            "total_net_fee": 116.85,
            "claim_count": 4,
            "average_net_fee": 29.21,
        }])
    );
    Ok(())
}

#[tokio::test]
async fn providers_report_defaults_to_ten_highest_totals() -> Result<()> {
    let (app, _) = app();

    let mut content = String::from(
        "service date,submitted procedure,quadrant,Plan/Group #,Subscriber#,Provider NPI,provider fees,Allowed fees,member coinsurance,member copay\n",
    );
    for i in 0..12u32 {
        let npi = 1_000_000_000 + i as i64;
        let provider_fees = 100 + i * 10;
        content.push_str(&format!(
            "03/28/18 00:00,D0180,,GRP-1000,3730189502,{npi},${provider_fees}.00,$0.00,$0.00,$0.00\n"
        ));
    }
    let (status, _) = send(&app, upload_request(&content, "text/csv")).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/providers")).await?;
    assert_eq!(status, StatusCode::OK);

    let providers = body.as_array().expect("provider list");
    assert_eq!(providers.len(), 10);

    let totals: Vec<f64> = providers
        .iter()
        .map(|p| p["total_net_fee"].as_f64().unwrap())
        .collect();
    assert!(totals.windows(2).all(|pair| pair[0] > pair[1]));
    assert_eq!(totals[0], 210.0);
    assert_eq!(totals[9], 120.0);
    assert_eq!(providers[0]["provider_npi"], 1_000_000_011i64);
    Ok(())
}

#[tokio::test]
async fn providers_report_is_rate_limited_per_client() -> Result<()> {
    let (app, _) = app();
    send(&app, upload_request(FIXTURE, "text/csv")).await?;

    let from = |client: &str| {
        Request::builder()
            .uri("/providers")
            .header("x-forwarded-for", client)
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..6 {
        let (status, _) = send(&app, from("10.0.0.1")).await?;
        assert_eq!(status, StatusCode::OK);
    }

    let response = app.clone().oneshot(from("10.0.0.1")).await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));

    let (status, _) = send(&app, from("10.0.0.2")).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn health_reports_service() -> Result<()> {
    let (app, _) = app();
    let (status, body) = send(&app, get("/health")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    Ok(())
}
