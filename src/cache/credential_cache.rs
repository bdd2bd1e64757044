use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::credential::{CredentialType, CredentialValue};
use crate::error::{CredentialError, Result};
use crate::helpers::time::{format_expiration, get_instant, now_i64};
use crate::observability::metrics::get_metrics;

/// Look-ahead used by the STS delegation and credentials-URI providers.
pub const STS_LOOK_AHEAD_SECONDS: i64 = 180;

/// When a cached credential is considered due for refresh.
///
/// A cache uses exactly one policy for its whole life.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshPolicy {
    /// Refresh once `fraction * validity` seconds remain before expiry.
    /// `None` refreshes only at or after expiry.
    Fractional(Option<f64>),
    /// Refresh once the given number of seconds remain before expiry.
    FixedLookAhead(i64),
}

impl RefreshPolicy {
    /// Fractions outside the open interval `(0, 1)` disable advance refresh.
    pub fn fractional(advance_fraction: Option<f64>) -> Self {
        RefreshPolicy::Fractional(advance_fraction.filter(|f| *f > 0.0 && *f < 1.0))
    }

    pub fn sts() -> Self {
        RefreshPolicy::FixedLookAhead(STS_LOOK_AHEAD_SECONDS)
    }

    fn look_ahead(&self, validity_secs: i64) -> i64 {
        match self {
            RefreshPolicy::Fractional(Some(fraction)) => (fraction * validity_secs as f64) as i64,
            RefreshPolicy::Fractional(None) => 0,
            RefreshPolicy::FixedLookAhead(seconds) => *seconds,
        }
    }
}

/// Session credentials as produced by a refreshable provider's protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: String,
    pub expiration: DateTime<Utc>,
}

impl SessionCredentials {
    pub fn into_value(self, credential_type: CredentialType, provider_name: &str) -> CredentialValue {
        CredentialValue::access_key(self.access_key_id, self.access_key_secret, credential_type, provider_name)
            .with_security_token(self.security_token)
            .with_expiration(Some(self.expiration))
    }
}

#[derive(Debug, Default)]
struct CacheState {
    session: Option<SessionCredentials>,
    /// unix seconds of the last successful refresh
    last_refresh_ts: i64,
    /// validity window in seconds, measured at refresh time
    validity_secs: i64,
    last_error: Option<CredentialError>,
}

impl CacheState {
    fn needs_refresh_at(&self, policy: RefreshPolicy, now: i64) -> bool {
        if self.session.is_none() {
            return true;
        }
        let expiry = self.last_refresh_ts + self.validity_secs;
        now >= expiry - policy.look_ahead(self.validity_secs)
    }

    fn stale_usable_at(&self, now: i64) -> bool {
        self.session.is_some() && self.validity_secs > now - self.last_refresh_ts
    }
}

/// Expiration-aware cache held by every refreshable provider.
///
/// Refreshes run while the state lock is held, so at most one refresh is in flight
/// per cache. Callers queued behind a refresh reuse its outcome instead of issuing
/// their own call.
#[derive(Debug)]
pub struct CredentialCache {
    provider: String,
    policy: RefreshPolicy,
    state: Mutex<CacheState>,
    completed_refreshes: AtomicU64,
}

impl CredentialCache {
    pub fn new(provider: impl Into<String>, policy: RefreshPolicy) -> Self {
        Self {
            provider: provider.into(),
            policy,
            state: Mutex::new(CacheState::default()),
            completed_refreshes: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub async fn needs_refresh(&self) -> bool {
        self.state.lock().await.needs_refresh_at(self.policy, now_i64())
    }

    /// Returns the cached session, refreshing first when it is due.
    /// Refresh errors are always propagated.
    pub async fn get<F, Fut>(&self, refresh: F) -> Result<SessionCredentials>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionCredentials>>,
    {
        self.resolve(refresh, false).await
    }

    /// Like [`CredentialCache::get`], but a failed refresh falls back to the previous
    /// session while its original validity window has not fully elapsed.
    pub async fn get_or_stale<F, Fut>(&self, refresh: F) -> Result<SessionCredentials>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionCredentials>>,
    {
        self.resolve(refresh, true).await
    }

    async fn resolve<F, Fut>(&self, refresh: F, allow_stale: bool) -> Result<SessionCredentials>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionCredentials>>,
    {
        let observed = self.completed_refreshes.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        if !state.needs_refresh_at(self.policy, now_i64()) {
            if let Some(session) = &state.session {
                return Ok(session.clone());
            }
        }

        // a refresh finished while we were queued on the lock, take its outcome
        let outcome = if self.completed_refreshes.load(Ordering::Acquire) != observed {
            debug!(provider = %self.provider, "reusing outcome of concurrent refresh");
            if let Some(err) = state.last_error.clone() {
                Err(err)
            } else if let Some(session) = state.session.clone() {
                Ok(session)
            } else {
                self.refresh_locked(&mut state, refresh).await
            }
        } else {
            self.refresh_locked(&mut state, refresh).await
        };

        match outcome {
            Ok(session) => Ok(session),
            Err(err) if allow_stale && state.stale_usable_at(now_i64()) => {
                warn!(provider = %self.provider, "refresh failed, serving cached credentials: {}", err);
                get_metrics()
                    .await
                    .credential_stale_served
                    .with_label_values(&[self.provider.as_str()])
                    .inc();
                state.session.clone().ok_or(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn refresh_locked<F, Fut>(&self, state: &mut CacheState, refresh: F) -> Result<SessionCredentials>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionCredentials>>,
    {
        let metrics = get_metrics().await;
        let provider = self.provider.as_str();
        let start = get_instant();
        metrics.credential_refresh_total.with_label_values(&[provider]).inc();

        let result = refresh().await;
        metrics
            .credential_refresh_duration
            .with_label_values(&[provider])
            .observe(start.elapsed().as_secs_f64());

        let result = match result {
            Ok(session) => {
                let now = now_i64();
                state.last_refresh_ts = now;
                state.validity_secs = session.expiration.timestamp() - now;
                state.session = Some(session.clone());
                state.last_error = None;
                metrics
                    .credential_expiry_unix
                    .with_label_values(&[provider])
                    .set(session.expiration.timestamp());
                info!(
                    provider,
                    expires_at = %format_expiration(&session.expiration),
                    "credentials refreshed"
                );
                Ok(session)
            }
            Err(err) => {
                metrics
                    .credential_refresh_failures
                    .with_label_values(&[provider, err.kind()])
                    .inc();
                warn!(provider, "credentials refresh failed: {}", err);
                state.last_error = Some(err.clone());
                Err(err)
            }
        };
        self.completed_refreshes.fetch_add(1, Ordering::Release);
        result
    }

    #[cfg(test)]
    pub(crate) async fn seed(&self, session: SessionCredentials, last_refresh_ts: i64) {
        let mut state = self.state.lock().await;
        state.validity_secs = session.expiration.timestamp() - last_refresh_ts;
        state.last_refresh_ts = last_refresh_ts;
        state.session = Some(session);
    }
}
