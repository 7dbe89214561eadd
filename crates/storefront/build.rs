//! Build script for the storefront crate.
//!
//! Computes a content hash for the stylesheet so templates can emit a
//! cache-busting query string that changes whenever the CSS does.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    hash_css();
}

/// Hash main.css and expose the result as the `CSS_HASH` environment
/// variable for `env!("CSS_HASH")` in the `css_hash` template filter.
fn hash_css() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let css_path = Path::new(&manifest_dir).join("static/css/main.css");

    println!("cargo:rerun-if-changed={}", css_path.display());

    let content = match fs::read(&css_path) {
        Ok(content) => content,
        Err(e) => {
            // CSS might not exist yet during initial build
            println!("cargo:warning=Could not read main.css: {e}");
            println!("cargo:rustc-env=CSS_HASH=dev");
            return;
        }
    };

    // First 8 hex chars are plenty for a cache buster
    let mut hasher = Sha256::new();
    hasher.update(&content);
    let mut hash = format!("{:x}", hasher.finalize());
    hash.truncate(8);

    println!("cargo:rustc-env=CSS_HASH={hash}");
}
