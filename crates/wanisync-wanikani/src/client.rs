use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;

use crate::types::{PageEnvelope, SubjectRecord, User};

const WANIKANI_URL: &str = "https://api.wanikani.com/v2";

#[derive(Debug, thiserror::Error)]
pub enum WkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("missing or malformed ratelimit-reset header on 429 from {0}")]
    RateLimitHeader(String),
}

#[derive(Clone)]
pub struct WaniKaniClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl WaniKaniClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, WANIKANI_URL)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch every subject page, following `pages.next_url` until the
    /// server returns null. Records come back in page order.
    ///
    /// `updated_after` limits the result to records modified since then
    /// (incremental sync); `max_level` caps the visible levels to what the
    /// user's subscription grants.
    pub async fn fetch_all_subjects(
        &self,
        updated_after: Option<DateTime<Utc>>,
        max_level: Option<u32>,
    ) -> Result<Vec<SubjectRecord>, WkError> {
        let mut params = Vec::new();
        if let Some(ts) = updated_after {
            params.push(format!(
                "updated_after={}",
                ts.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        if let Some(max) = max_level {
            let levels: Vec<String> = (1..=max).map(|l| l.to_string()).collect();
            params.push(format!("levels={}", levels.join(",")));
        }

        let mut first = format!("{}/subjects", self.base_url);
        if !params.is_empty() {
            first.push('?');
            first.push_str(&params.join("&"));
        }

        let mut records = Vec::new();
        let mut next_url = Some(first);

        while let Some(url) = next_url {
            tracing::info!("retrieving {url}");
            let page: PageEnvelope = self.get(&url).await?.json().await?;
            records.extend(page.data);
            next_url = page.pages.next_url;
        }

        tracing::debug!("got all subjects (len: {})", records.len());
        Ok(records)
    }

    pub async fn get_user(&self) -> Result<User, WkError> {
        let url = format!("{}/user", self.base_url);
        Ok(self.get(&url).await?.json().await?)
    }

    /// Highest level the user may see, or `None` when uncapped.
    /// Free accounts only get `max_level_granted` of content.
    pub async fn max_level(&self) -> Result<Option<u32>, WkError> {
        let user = self.get_user().await?;
        let subscription = &user.data.subscription;

        if subscription.active {
            Ok(None)
        } else {
            tracing::warn!(
                "user is not subscribed to wanikani, capping at level {}",
                subscription.max_level_granted
            );
            Ok(Some(subscription.max_level_granted))
        }
    }

    /// Download a raw resource (radical SVGs, pronunciation audio).
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, WkError> {
        let bytes = self.get(url).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// One GET with authorization and rate-limit handling: a 429 response
    /// names the epoch second the limit resets at, so sleep until then and
    /// retry the same URL. Retries are unbounded; any other non-success
    /// status is fatal.
    async fn get(&self, url: &str) -> Result<reqwest::Response, WkError> {
        loop {
            tracing::debug!("starting request {url}");
            let response = self.client.get(url).bearer_auth(&self.token).send().await?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                let wait = ratelimit_wait(url, &response)?;
                tracing::info!("ran into rate limit, trying again in {}s", wait.as_secs());
                tokio::time::sleep(wait).await;
                continue;
            }

            if !response.status().is_success() {
                return Err(WkError::Status {
                    status: response.status(),
                    url: url.to_string(),
                });
            }

            return Ok(response);
        }
    }
}

fn ratelimit_wait(url: &str, response: &reqwest::Response) -> Result<Duration, WkError> {
    let reset = response
        .headers()
        .get("ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| WkError::RateLimitHeader(url.to_string()))?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    Ok(Duration::from_secs(reset.saturating_sub(now)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::{Query, RawQuery, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use serde_json::json;

    use super::*;

    fn subject_json(id: u64) -> serde_json::Value {
        json!({
            "id": id,
            "object": "radical",
            "data": {
                "level": 1,
                "slug": format!("slug-{id}"),
                "characters": "一",
                "meanings": [{"meaning": "One", "primary": true}],
                "meaning_mnemonic": "mnemonic",
            }
        })
    }

    async fn bind() -> (tokio::net::TcpListener, SocketAddr) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        (listener, addr)
    }

    #[tokio::test]
    async fn test_pagination_follows_next_urls_in_order() {
        let (listener, addr) = bind().await;
        let hits: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

        type PagesState = (SocketAddr, Arc<Mutex<Vec<u32>>>);
        async fn pages(
            State((addr, hits)): State<PagesState>,
            Query(query): Query<HashMap<String, String>>,
        ) -> axum::Json<serde_json::Value> {
            let page: u32 = query
                .get("page")
                .map(|p| p.parse().expect("page param"))
                .unwrap_or(0);
            hits.lock().expect("lock").push(page);

            let next = if page < 2 {
                json!(format!("http://{addr}/subjects?page={}", page + 1))
            } else {
                json!(null)
            };
            axum::Json(json!({
                "pages": { "next_url": next },
                "data": [subject_json(u64::from(page) * 10), subject_json(u64::from(page) * 10 + 1)],
            }))
        }

        let app = Router::new()
            .route("/subjects", get(pages))
            .with_state((addr, Arc::clone(&hits)));
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve") });

        let client = WaniKaniClient::with_base_url("token", format!("http://{addr}"));
        let records = client
            .fetch_all_subjects(None, None)
            .await
            .expect("fetch_all_subjects");

        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 10, 11, 20, 21]);
        assert_eq!(*hits.lock().expect("lock"), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_rate_limited_request_sleeps_and_retries() {
        let (listener, addr) = bind().await;
        let attempts = Arc::new(AtomicUsize::new(0));

        let handler = {
            let attempts = Arc::clone(&attempts);
            move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    let reset = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .expect("clock")
                        .as_secs()
                        + 2;
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        [("ratelimit-reset", reset.to_string())],
                        "slow down".to_string(),
                    )
                        .into_response()
                } else {
                    axum::Json(json!({
                        "pages": { "next_url": null },
                        "data": [subject_json(1)],
                    }))
                    .into_response()
                }
            }
        };

        let app = Router::new().route("/subjects", get(handler));
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve") });

        let client = WaniKaniClient::with_base_url("token", format!("http://{addr}"));
        let started = std::time::Instant::now();
        let records = client
            .fetch_all_subjects(None, None)
            .await
            .expect("fetch_all_subjects");

        assert!(
            started.elapsed() >= Duration::from_secs(1),
            "should have slept until the advertised reset time"
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_incremental_query_parameters() {
        let (listener, addr) = bind().await;
        let seen: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        async fn capture(
            State(seen): State<Arc<Mutex<Option<String>>>>,
            RawQuery(query): RawQuery,
        ) -> axum::Json<serde_json::Value> {
            *seen.lock().expect("lock") = query;
            axum::Json(json!({ "pages": { "next_url": null }, "data": [] }))
        }

        let app = Router::new()
            .route("/subjects", get(capture))
            .with_state(Arc::clone(&seen));
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve") });

        let client = WaniKaniClient::with_base_url("token", format!("http://{addr}"));
        let since = DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp");
        client
            .fetch_all_subjects(Some(since), Some(3))
            .await
            .expect("fetch_all_subjects");

        let query = seen.lock().expect("lock").clone().expect("query string");
        assert_eq!(query, "updated_after=2023-11-14T22:13:20Z&levels=1,2,3");
    }

    #[tokio::test]
    async fn test_server_error_is_fatal() {
        let (listener, addr) = bind().await;
        let app = Router::new().route(
            "/subjects",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve") });

        let client = WaniKaniClient::with_base_url("token", format!("http://{addr}"));
        let err = client
            .fetch_all_subjects(None, None)
            .await
            .expect_err("500 must abort the fetch");

        assert!(matches!(
            err,
            WkError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                ..
            }
        ));
    }
}
