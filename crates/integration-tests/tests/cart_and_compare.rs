//! Integration tests for cart and compare fragment endpoints.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - A seeded catalog (ps-cli seed)
//! - The storefront running (cargo run -p pitstop-storefront)
//!
//! Run with: cargo test -p pitstop-integration-tests -- --ignored

use pitstop_integration_tests::{
    base_url, client, first_part_id, manual_redirect_client, page_owner, sign_up_and_in,
};
use reqwest::{Client, StatusCode};
use uuid::Uuid;

/// Collect enough distinct part ids for the compare-limit test.
async fn part_ids(client: &Client, count: usize) -> Vec<String> {
    let body = client
        .get(format!("{}/parts", base_url()))
        .send()
        .await
        .expect("listing request failed")
        .text()
        .await
        .expect("failed to read listing");

    let mut ids = Vec::new();
    let mut rest = body.as_str();
    while ids.len() < count {
        let Some(id) = first_part_id(rest) else { break };
        let cut = rest.find(&id).expect("id came from this string") + id.len();
        rest = &rest[cut..];
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    assert_eq!(ids.len(), count, "seeded catalog should have {count} parts");
    ids
}

// ============================================================================
// Guest behaviour
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_guest_cart_add_is_rejected_with_toast() {
    let client = client();
    let base = base_url();
    let ids = part_ids(&client, 1).await;

    let resp = client
        .post(format!("{base}/cart/add"))
        .form(&[
            ("part_id", ids[0].as_str()),
            ("quantity", "1"),
            ("owner", "guest"),
        ])
        .send()
        .await
        .expect("cart add failed");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("hx-retarget")
            .and_then(|v| v.to_str().ok()),
        Some("#toast")
    );
    let body = resp.text().await.expect("failed to read toast");
    assert!(body.contains("jelentkezzen be"), "toast should ask for sign-in");
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_guest_cart_page_redirects_to_login() {
    let client = manual_redirect_client();
    let resp = client
        .get(format!("{}/cart", base_url()))
        .send()
        .await
        .expect("cart page failed");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/login")
    );
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_guest_compare_flow_duplicate_and_limit() {
    let client = client();
    let base = base_url();
    let ids = part_ids(&client, 4).await;

    let add = |part_id: String| {
        let client = client.clone();
        let base = base.clone();
        async move {
            client
                .post(format!("{base}/compare/add"))
                .form(&[("part_id", part_id.as_str()), ("owner", "guest")])
                .send()
                .await
                .expect("compare add failed")
        }
    };

    // Three distinct parts go in fine
    for id in &ids[..3] {
        let resp = add(id.clone()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("hx-trigger")
                .and_then(|v| v.to_str().ok()),
            Some("compare-updated")
        );
    }

    // A repeat of the first is reported as already listed, not as full
    let resp = add(ids[0].clone()).await;
    let body = resp.text().await.expect("failed to read toast");
    assert!(
        body.contains("már a listán van"),
        "duplicate should produce the already-listed toast, got: {body}"
    );

    // A fourth distinct part hits the limit
    let resp = add(ids[3].clone()).await;
    let body = resp.text().await.expect("failed to read toast");
    assert!(
        body.contains("Legfeljebb"),
        "overflow should produce the limit toast, got: {body}"
    );

    // The table shows the three listed parts
    let table = client
        .get(format!("{base}/compare"))
        .send()
        .await
        .expect("compare page failed")
        .text()
        .await
        .expect("failed to read compare page");
    for id in &ids[..3] {
        assert!(table.contains(id.as_str()), "compare table should list {id}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_mutation_from_stale_page_triggers_refresh() {
    let client = client();
    let base = base_url();
    let ids = part_ids(&client, 1).await;

    // This client is a guest, but the form claims it was rendered for some
    // signed-in user. The server answers with a full-page refresh instead
    // of applying the mutation.
    let forged_owner = Uuid::new_v4().to_string();
    let resp = client
        .post(format!("{base}/compare/add"))
        .form(&[("part_id", ids[0].as_str()), ("owner", forged_owner.as_str())])
        .send()
        .await
        .expect("compare add failed");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("hx-refresh")
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
}

// ============================================================================
// Signed-in cart flow
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_signed_in_cart_add_update_remove() {
    let client = client();
    let base = base_url();
    sign_up_and_in(&client).await;

    let ids = part_ids(&client, 1).await;
    let cart_page = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .expect("cart page failed")
        .text()
        .await
        .expect("failed to read cart page");
    let owner = page_owner(&cart_page).expect("cart page should echo its owner");
    assert_ne!(owner, "guest", "signed-in cart should be owned by the user");

    // Add twice: quantities merge into one line
    for _ in 0..2 {
        let resp = client
            .post(format!("{base}/cart/add"))
            .form(&[
                ("part_id", ids[0].as_str()),
                ("quantity", "1"),
                ("owner", owner.as_str()),
            ])
            .send()
            .await
            .expect("cart add failed");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("hx-trigger")
                .and_then(|v| v.to_str().ok()),
            Some("cart-updated")
        );
    }

    let count = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .expect("count failed")
        .text()
        .await
        .expect("failed to read count");
    assert!(count.contains('2'), "two units should be counted, got: {count}");

    // Setting the quantity to zero removes the line
    let resp = client
        .post(format!("{base}/cart/update"))
        .form(&[
            ("part_id", ids[0].as_str()),
            ("quantity", "0"),
            ("owner", owner.as_str()),
        ])
        .send()
        .await
        .expect("cart update failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let count = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .expect("count failed")
        .text()
        .await
        .expect("failed to read count");
    assert!(
        !count.contains("badge"),
        "empty cart should render no badge, got: {count}"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_cart_survives_relogin() {
    let client = client();
    let base = base_url();
    let email = sign_up_and_in(&client).await;

    let ids = part_ids(&client, 1).await;
    let cart_page = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .expect("cart page failed")
        .text()
        .await
        .expect("failed to read cart page");
    let owner = page_owner(&cart_page).expect("cart page should echo its owner");

    client
        .post(format!("{base}/cart/add"))
        .form(&[
            ("part_id", ids[0].as_str()),
            ("quantity", "3"),
            ("owner", owner.as_str()),
        ])
        .send()
        .await
        .expect("cart add failed");

    // Sign out and back in: the cart was persisted under the user's slot
    client
        .post(format!("{base}/logout"))
        .send()
        .await
        .expect("logout failed");
    client
        .post(format!("{base}/login"))
        .form(&[
            ("email", email.as_str()),
            ("password", pitstop_integration_tests::TEST_PASSWORD),
        ])
        .send()
        .await
        .expect("login failed");

    let count = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .expect("count failed")
        .text()
        .await
        .expect("failed to read count");
    assert!(count.contains('3'), "cart should come back after login, got: {count}");
}
