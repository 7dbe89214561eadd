//! Shared helpers for the HTTP integration tests.
//!
//! The tests drive a running storefront over plain HTTP and are ignored by
//! default. Start the stack first:
//!
//! ```bash
//! cargo run -p pitstop-cli -- migrate
//! cargo run -p pitstop-cli -- seed
//! cargo run -p pitstop-storefront &
//! cargo test -p pitstop-integration-tests -- --ignored
//! ```
//!
//! Point the tests at another instance with `PITSTOP_BASE_URL`.

use pitstop_core::{OwnerKey, PartId};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use uuid::Uuid;

/// Base URL of the storefront under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("PITSTOP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Headers giving this client its own rate-limit bucket.
///
/// The server resolves the client IP from `X-Forwarded-For` before falling
/// back to the peer address. All tests connect from localhost, so without
/// this they would share one bucket and trip the login limiter.
fn per_client_headers() -> HeaderMap {
    let b = Uuid::new_v4().into_bytes();
    let fake_ip = format!("10.{}.{}.{}", b[0], b[1], b[2]);
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&fake_ip).expect("dotted quad is a valid header value"),
    );
    headers
}

/// A cookie-carrying client that follows redirects, like a browser.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .default_headers(per_client_headers())
        .build()
        .expect("failed to build HTTP client")
}

/// A cookie-carrying client that leaves redirects unfollowed, for tests
/// that assert on `Location`.
#[must_use]
pub fn manual_redirect_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .default_headers(per_client_headers())
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("failed to build HTTP client")
}

/// A registration email unique to this test run.
#[must_use]
pub fn unique_email() -> String {
    format!("teszt-{}@example.com", Uuid::new_v4().simple())
}

/// Password used by all test accounts.
pub const TEST_PASSWORD: &str = "jelszo123";

/// Register a fresh account and sign it in on `client`. Returns the email.
///
/// # Panics
///
/// Panics if either request fails or the server rejects the flow.
pub async fn sign_up_and_in(client: &Client) -> String {
    let base = base_url();
    let email = unique_email();

    let resp = client
        .post(format!("{base}/register"))
        .form(&[
            ("email", email.as_str()),
            ("password", TEST_PASSWORD),
            ("confirm_password", TEST_PASSWORD),
            ("full_name", "Teszt Elek"),
            ("phone_number", ""),
        ])
        .send()
        .await
        .expect("register request failed");
    assert!(
        resp.status().is_success(),
        "registration rejected: {}",
        resp.status()
    );

    let resp = client
        .post(format!("{base}/login"))
        .form(&[("email", email.as_str()), ("password", TEST_PASSWORD)])
        .send()
        .await
        .expect("login request failed");
    assert!(resp.status().is_success(), "login rejected: {}", resp.status());

    email
}

/// Pull the first part id out of a catalog page.
///
/// Part links render as `href="/parts/<uuid>"`, so take the 36 characters
/// after the prefix and keep them only if they parse as a [`PartId`].
#[must_use]
pub fn first_part_id(body: &str) -> Option<String> {
    let start = body.find("href=\"/parts/")? + "href=\"/parts/".len();
    let id = body.get(start..start + 36)?;
    id.parse::<PartId>().ok()?;
    Some(id.to_owned())
}

/// Pull the owner echoed into mutation forms out of a rendered page.
///
/// The value is either `guest` or a user id; anything else means the
/// scraper latched onto the wrong input.
#[must_use]
pub fn page_owner(body: &str) -> Option<String> {
    let marker = "name=\"owner\" value=\"";
    let start = body.find(marker)? + marker.len();
    let rest = body.get(start..)?;
    let owner = rest.get(..rest.find('"')?)?;
    owner.parse::<OwnerKey>().ok()?;
    Some(owner.to_owned())
}
