//! Where the auth service lives and how long we wait for it. Values are
//! public; no secrets belong here.

use crate::flow::FlowKind;
use anyhow::{bail, Context, Result};
use std::time::Duration;
use url::Url;

/// Default request timeout applied to every call.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
    timeout: Duration,
}

impl ApiConfig {
    /// Endpoint paths are appended to `base_url`, so it may carry a path
    /// prefix but no query or fragment.
    ///
    /// # Errors
    /// Returns an error if `base_url` is empty, does not parse, is not
    /// http(s), or has a query or fragment.
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let base_url = normalize_base_url(base_url);
        if base_url.is_empty() {
            bail!("auth service URL is not configured");
        }

        let parsed =
            Url::parse(&base_url).with_context(|| format!("invalid auth service URL: {base_url}"))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => bail!("unsupported auth service URL scheme: {scheme}"),
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            bail!("auth service URL must not have a query or fragment: {base_url}");
        }

        let timeout_seconds = if timeout_seconds == 0 {
            DEFAULT_TIMEOUT_SECONDS
        } else {
            timeout_seconds
        };

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_seconds),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full URL for `endpoint` of the given flow kind.
    #[must_use]
    pub fn endpoint_url(&self, kind: FlowKind, endpoint: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            path_prefix(kind),
            endpoint.trim_start_matches('/')
        )
    }
}

#[must_use]
pub const fn path_prefix(kind: FlowKind) -> &'static str {
    match kind {
        FlowKind::Register => "/v1/auth/register",
        FlowKind::Reset => "/v1/auth/password-reset",
    }
}

fn normalize_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}
