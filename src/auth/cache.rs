//! Per-scope token cache with single-flight refresh.

use super::{AccessToken, TokenIssuer};
use crate::errors::BigQueryResult;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

type Slot = Arc<tokio::sync::Mutex<Option<AccessToken>>>;

/// Sorts scopes and joins them with a single space.
///
/// Two scope lists that differ only in order map to the same key.
pub fn canonical_scope_key<S: AsRef<str>>(scopes: &[S]) -> String {
    let mut sorted: Vec<&str> = scopes.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.join(" ")
}

/// Caches access tokens by canonical scope key.
///
/// # Thread Safety
///
/// Each key owns an async mutex. Callers asking for the same key while a token is
/// being issued wait on that mutex and then see the fresh token, so concurrent
/// misses produce one issuance. Distinct keys never wait on each other.
pub struct TokenCache {
    issuer: TokenIssuer,
    slots: Mutex<HashMap<String, Slot>>,
}

impl TokenCache {
    /// Creates an empty cache in front of `issuer`.
    pub fn new(issuer: TokenIssuer) -> Self {
        Self {
            issuer,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped issuer.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Returns a usable token for `scopes`, issuing one on miss, expiry or `force_refresh`.
    ///
    /// A fresh token replaces the cached entry for the key.
    pub async fn get_token<S: AsRef<str>>(
        &self,
        scopes: &[S],
        force_refresh: bool,
    ) -> BigQueryResult<AccessToken> {
        self.get_token_at(scopes, force_refresh, Utc::now().timestamp())
            .await
    }

    /// Same as [`TokenCache::get_token`], judging usability at epoch second `now`.
    pub(crate) async fn get_token_at<S: AsRef<str>>(
        &self,
        scopes: &[S],
        force_refresh: bool,
        now: i64,
    ) -> BigQueryResult<AccessToken> {
        let key = canonical_scope_key(scopes);
        let slot = self.slot(&key);
        let mut entry = slot.lock().await;

        if !force_refresh {
            if let Some(token) = entry.as_ref().filter(|t| t.is_usable_at(now)) {
                tracing::debug!(scope = %key, "Access token cache hit");
                return Ok(token.clone());
            }
        }

        tracing::debug!(scope = %key, force_refresh, "Issuing access token");

        let scope: Vec<&str> = scopes.iter().map(AsRef::as_ref).collect();
        let token = self.issuer.issue(&scope.join(" ")).await?;
        *entry = Some(token.clone());

        Ok(token)
    }
}
