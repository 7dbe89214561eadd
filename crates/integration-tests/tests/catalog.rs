//! Integration tests for the public catalog pages.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - A seeded catalog (ps-cli seed)
//! - The storefront running (cargo run -p pitstop-storefront)
//!
//! Run with: cargo test -p pitstop-integration-tests -- --ignored

use pitstop_integration_tests::{base_url, client, first_part_id};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_health_endpoints() {
    let client = client();
    let base = base_url();

    let resp = client
        .get(format!("{base}/health"))
        .send()
        .await
        .expect("health request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base}/health/ready"))
        .send()
        .await
        .expect("readiness request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_home_shows_featured_parts() {
    let client = client();
    let base = base_url();

    let resp = client
        .get(format!("{base}/"))
        .send()
        .await
        .expect("home request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("failed to read home page");
    assert!(body.contains("part-grid"), "home should show the featured grid");
    assert!(body.contains("Ft"), "prices should render in forints");
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_parts_listing_and_search() {
    let client = client();
    let base = base_url();

    let resp = client
        .get(format!("{base}/parts"))
        .send()
        .await
        .expect("listing request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("failed to read listing");
    assert!(first_part_id(&body).is_some(), "listing should link to parts");

    // A search that cannot match anything renders the empty state, not an error
    let resp = client
        .get(format!("{base}/parts?q=nincsilyenalkatresz"))
        .send()
        .await
        .expect("search request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_part_detail_page() {
    let client = client();
    let base = base_url();

    let listing = client
        .get(format!("{base}/parts"))
        .send()
        .await
        .expect("listing request failed")
        .text()
        .await
        .expect("failed to read listing");
    let part_id = first_part_id(&listing).expect("seeded catalog should have parts");

    let resp = client
        .get(format!("{base}/parts/{part_id}"))
        .send()
        .await
        .expect("detail request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("failed to read detail page");
    assert!(body.contains("/cart/add"), "detail page should offer add-to-cart");
    assert!(body.contains("/compare/add"), "detail page should offer compare");
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_missing_part_is_404() {
    let client = client();
    let base = base_url();

    let resp = client
        .get(format!(
            "{base}/parts/00000000-0000-0000-0000-000000000000"
        ))
        .send()
        .await
        .expect("detail request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_unknown_path_redirects_home() {
    let client = pitstop_integration_tests::manual_redirect_client();
    let base = base_url();

    let resp = client
        .get(format!("{base}/nincs-ilyen-oldal"))
        .send()
        .await
        .expect("request failed");
    assert!(resp.status().is_redirection());
    assert_eq!(
        resp.headers()
            .get("location")
            .and_then(|v| v.to_str().ok()),
        Some("/")
    );
}
