//! # HTTP Access Layer
//! One pooled `reqwest` client owned by the resilience context.
//!
//! The pool is created lazily by [`HttpPool::acquire`] and torn down by
//! [`HttpPool::close`]; a later `acquire` builds a fresh one. Concurrency is
//! capped globally and per host with semaphores, and a permit is held only for
//! one request/response cycle (body included).

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use crate::config::HttpConfig;
use crate::error::FetchError;

/// Status + body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug)]
pub struct HttpPool {
    cfg: HttpConfig,
    current: Mutex<Option<HttpHandle>>,
}

impl HttpPool {
    pub fn new(cfg: HttpConfig) -> Self {
        Self {
            cfg,
            current: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.cfg
    }

    /// Handle to the live pool, building it first if needed.
    pub fn acquire(&self) -> Result<HttpHandle, FetchError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(h) = current.as_ref() {
            return Ok(h.clone());
        }
        let handle = HttpHandle::build(&self.cfg)?;
        info!(
            target: "http",
            max_connections = self.cfg.max_connections,
            per_host = self.cfg.max_connections_per_host,
            "http pool created"
        );
        *current = Some(handle.clone());
        Ok(handle)
    }

    /// Drop the pool. Handles already given out keep working until dropped.
    pub fn close(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.take().is_some() {
            info!(target: "http", "http pool closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        self.acquire()?.get(url, headers, timeout).await
    }

    pub async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        self.acquire()?.post(url, headers, body, timeout).await
    }
}

/// Cheap-to-clone handle onto one generation of the pool.
#[derive(Debug, Clone)]
pub struct HttpHandle {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    client: reqwest::Client,
    global: Arc<Semaphore>,
    per_host: Mutex<HashMap<String, Arc<Semaphore>>>,
    per_host_cap: usize,
}

impl HttpHandle {
    fn build(cfg: &HttpConfig) -> Result<Self, FetchError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        if let Ok(v) = HeaderValue::from_str(&cfg.accept_language) {
            default_headers.insert(ACCEPT_LANGUAGE, v);
        }

        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .default_headers(default_headers)
            .pool_max_idle_per_host(cfg.max_connections_per_host)
            .pool_idle_timeout(cfg.keep_alive())
            .tcp_keepalive(cfg.keep_alive())
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.total_timeout())
            .build()
            .map_err(|e| FetchError::from_reqwest("<client>", e, 0))?;

        Ok(Self {
            inner: Arc::new(PoolInner {
                client,
                global: Arc::new(Semaphore::new(cfg.max_connections.max(1))),
                per_host: Mutex::new(HashMap::new()),
                per_host_cap: cfg.max_connections_per_host.max(1),
            }),
        })
    }

    pub async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        let req = self.inner.client.get(url);
        self.send(url, req, headers, timeout).await
    }

    pub async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        let req = self.inner.client.post(url).body(body);
        self.send(url, req, headers, timeout).await
    }

    async fn send(
        &self,
        url: &str,
        mut req: reqwest::RequestBuilder,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        let timeout_ms = timeout.as_millis() as u64;
        for (k, v) in headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                req = req.header(name, value);
            }
        }

        // The timeout covers the wait for a connection slot as well as the request.
        let started = Instant::now();
        // Permits live until this function returns, i.e. one request/response cycle.
        let _permits = tokio::time::timeout(timeout, self.permits(url))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                timeout_ms,
            })?;
        let remaining = timeout.saturating_sub(started.elapsed());
        debug!(target: "http", %url, timeout_ms, "GET/POST");

        let resp = req
            .timeout(remaining)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e, timeout_ms))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e, timeout_ms))?;
        Ok(HttpResponse { status, body })
    }

    async fn permits(&self, url: &str) -> Option<(OwnedSemaphorePermit, OwnedSemaphorePermit)> {
        let host_sem = {
            let host = host_key(url);
            let mut map = self
                .inner
                .per_host
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            map.entry(host)
                .or_insert_with(|| Arc::new(Semaphore::new(self.inner.per_host_cap)))
                .clone()
        };
        // Semaphores are never closed, so acquisition only fails if that changes.
        let global = self.inner.global.clone().acquire_owned().await.ok()?;
        let host = host_sem.acquire_owned().await.ok()?;
        Some((global, host))
    }

    /// Permits currently free in the global pool.
    pub fn available_connections(&self) -> usize {
        self.inner.global.available_permits()
    }

    /// True if both handles point at the same pool generation.
    pub fn same_pool(&self, other: &HttpHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn host_key(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.host_str()
                .map(|h| format!("{}:{}", h, u.port_or_known_default().unwrap_or(0)))
        })
        .unwrap_or_else(|| url.to_string())
}
