use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::{Error, Result};
use crate::AppState;

/// Distinct clients tracked per window before new ones are turned away.
pub const DEFAULT_MAX_CLIENTS: usize = 10_000;

#[derive(Debug)]
struct WindowState {
    start: Instant,
    count: u32,
}

/// Fixed-window limiter keyed by client address.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    max_clients: usize,
    clients: Arc<Mutex<HashMap<String, WindowState>>>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self::with_max_clients(max, window, DEFAULT_MAX_CLIENTS)
    }

    pub fn with_max_clients(max: u32, window: Duration, max_clients: usize) -> Self {
        Self {
            max: max.max(1),
            window,
            max_clients: max_clients.max(1),
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        if let Some(window) = clients.get_mut(key) {
            if now.duration_since(window.start) >= self.window {
                window.start = now;
                window.count = 0;
            }
            if window.count >= self.max {
                return false;
            }
            window.count += 1;
            return true;
        }

        // expired windows are only swept once the table is full
        if clients.len() >= self.max_clients {
            clients.retain(|_, w| now.duration_since(w.start) < self.window);
            if clients.len() >= self.max_clients {
                return false;
            }
        }
        clients.insert(key.to_string(), WindowState { start: now, count: 1 });
        true
    }
}

/// Peer socket address, or the first `X-Forwarded-For` hop when the
/// deployment sits behind a trusted proxy.
pub fn client_key(req: &Request<Body>, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn auth_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response> {
    let key = client_key(&req, state.config.trust_proxy);
    if !state.auth_limiter.allow(&key) {
        tracing::warn!(client = %key, "auth rate limit exceeded");
        return Err(Error::RateLimited);
    }
    Ok(next.run(req).await)
}
