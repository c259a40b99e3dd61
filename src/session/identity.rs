//! Identity bootstrap client.
//!
//! Identity issuance is an out-of-band HTTP contract: the caller supplies a
//! username and receives the opaque `random_id` used to address it on the
//! peer-scoped channels.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub random_id: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("identity service rejected the request: {0}")]
    Rejected(StatusCode),
}

/// Fetch an identity from the relay's issuance endpoint.
pub async fn fetch_identity(http_base: &str, username: &str) -> Result<Identity, IdentityError> {
    let url = format!("{}/api/identity", http_base.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(url)
        .json(&serde_json::json!({ "username": username }))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(IdentityError::Rejected(response.status()));
    }
    Ok(response.json().await?)
}
