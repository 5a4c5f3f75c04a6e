//! Backend base address resolution.
//!
//! A single build works against a local development backend and against a
//! same-origin deployment: the address is derived from an explicit override
//! when one is configured, otherwise from the host the client is served from.

pub const LOCAL_DEV_URL: &str = "http://localhost:8000";

pub const CHAT_PATH: &str = "/api/chat";

const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1", "[::1]", "0.0.0.0"];

/// What the client knows about where it is running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Explicitly configured backend address.
    pub api_url: Option<String>,
    /// Origin of the hosting page/deployment, e.g. `https://coach.example.com`.
    /// `None` when there is no host context at all.
    pub origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseUrl {
    Explicit(String),
    /// Relative to the origin the client is served from.
    SameOrigin(String),
    LocalDev,
}

impl BaseUrl {
    pub fn as_str(&self) -> &str {
        match self {
            BaseUrl::Explicit(url) | BaseUrl::SameOrigin(url) => url,
            BaseUrl::LocalDev => LOCAL_DEV_URL,
        }
    }

    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.as_str(), path)
    }

    pub fn chat_url(&self) -> String {
        self.join(CHAT_PATH)
    }
}

impl std::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the backend address: override, then same-origin for a non-local
/// host, then the local development address.
pub fn resolve_base_url(ctx: &ExecutionContext) -> BaseUrl {
    if let Some(url) = non_empty(ctx.api_url.as_deref()) {
        return BaseUrl::Explicit(url.trim_end_matches('/').to_string());
    }

    match non_empty(ctx.origin.as_deref()) {
        Some(origin) if !is_local_host(host_of(origin)) => {
            BaseUrl::SameOrigin(origin_root(origin).to_string())
        }
        _ => BaseUrl::LocalDev,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `scheme://authority` of `origin`, dropping any path, query or fragment,
/// which is where a root-relative path resolves.
fn origin_root(origin: &str) -> &str {
    let scheme_len = origin.find("://").map(|i| i + 3).unwrap_or(0);
    let authority_len = authority_of(origin).len();
    &origin[..scheme_len + authority_len]
}

fn authority_of(origin: &str) -> &str {
    let rest = origin.split_once("://").map(|(_, r)| r).unwrap_or(origin);
    rest.split(['/', '?', '#']).next().unwrap_or(rest)
}

/// Extract the host from an origin such as `https://host:8443/`.
fn host_of(origin: &str) -> &str {
    let authority = authority_of(origin);

    if authority.starts_with('[') {
        // IPv6 literal, keep the brackets
        return match authority.find(']') {
            Some(end) => &authority[..=end],
            None => authority,
        };
    }

    authority.split(':').next().unwrap_or(authority)
}

fn is_local_host(host: &str) -> bool {
    LOCAL_HOSTS.iter().any(|h| h.eq_ignore_ascii_case(host))
}
