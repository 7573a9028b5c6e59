// Social graph provider - fetch friends and their free-text locations
//
// Thin client over the upstream friends/list API. The core only needs
// the name → location mapping; everything else in the payload is
// ignored. Rejected credentials are fatal to the run.

use crate::error::{MapError, Result};
use crate::model::LocationRequest;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.twitter.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// How many friends to pull per run
const FRIEND_COUNT: u32 = 15;

#[derive(Debug, Deserialize)]
struct FriendsPage {
    users: Option<Vec<Friend>>,
    errors: Option<Vec<ApiError>>,
}

#[derive(Debug, Deserialize)]
struct Friend {
    screen_name: String,
    #[serde(default)]
    location: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

pub struct SocialGraphClient {
    client: reqwest::Client,
    base_url: String,
}

impl SocialGraphClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(MapError::HttpClient)?;

        Ok(SocialGraphClient {
            client,
            base_url: base_url.into(),
        })
    }

    /// Fetch the user's friends and turn them into location requests,
    /// skipping friends without a location.
    pub async fn friend_locations(
        &self,
        username: &str,
        token: &str,
    ) -> Result<Vec<LocationRequest>> {
        let url = format!("{}/1.1/friends/list.json", self.base_url);

        let page: FriendsPage = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("screen_name", format!("@{}", username)),
                ("count", FRIEND_COUNT.to_string()),
            ])
            .send()
            .await
            .map_err(MapError::SocialGraph)?
            .json()
            .await
            .map_err(MapError::SocialGraph)?;

        let requests = extract_requests(page)?;
        debug!(username, count = requests.len(), "friends with a location");
        Ok(requests)
    }
}

/// A payload without `users` is an API error page; treat it as a
/// credential rejection and surface the upstream message.
fn extract_requests(page: FriendsPage) -> Result<Vec<LocationRequest>> {
    let users = match page.users {
        Some(users) => users,
        None => {
            let message = page
                .errors
                .and_then(|errors| errors.into_iter().next())
                .map(|e| e.message)
                .unwrap_or_else(|| "unexpected response from provider".to_string());
            return Err(MapError::Auth(message));
        }
    };

    Ok(users
        .into_iter()
        .filter(|friend| !friend.location.trim().is_empty())
        .map(|friend| LocationRequest::new(friend.screen_name, friend.location))
        .collect())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_requests_skips_missing_locations() {
        let page: FriendsPage = serde_json::from_str(
            r#"{
                "users": [
                    {"screen_name": "alice", "location": "Paris"},
                    {"screen_name": "bob", "location": ""},
                    {"screen_name": "carol"}
                ]
            }"#,
        )
        .unwrap();

        let requests = extract_requests(page).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].entity_name, "alice");
        assert_eq!(requests[0].raw_location, "Paris");
    }

    #[test]
    fn test_extract_requests_error_payload_is_auth_failure() {
        let page: FriendsPage = serde_json::from_str(
            r#"{"errors": [{"code": 89, "message": "Invalid or expired token."}]}"#,
        )
        .unwrap();

        let err = extract_requests(page).unwrap_err();
        match err {
            MapError::Auth(message) => assert_eq!(message, "Invalid or expired token."),
            other => panic!("expected Auth, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_requests_empty_friend_list() {
        let page: FriendsPage = serde_json::from_str(r#"{"users": []}"#).unwrap();
        assert!(extract_requests(page).unwrap().is_empty());
    }
}
