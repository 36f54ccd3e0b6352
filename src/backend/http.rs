//! HTTP Backend
//!
//! Drives a remote cache over a small REST contract:
//!
//! - `PUT /save/{id}` - body is the payload, `x-cache-tags` a comma list,
//!   `x-cache-ttl` the lifetime in seconds
//! - `GET /load/{id}` - 200 with the payload, 404 on a miss
//! - `POST /clean/{tag}` - invalidate a tag
//! - `GET /ids`, `GET /tags` - JSON arrays of stored names
//! - `POST /ids-matching-tags` - JSON array of tags in, JSON array of ids out
//! - `POST /flush` - remove everything

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};

use crate::backend::TaggedCache;
use crate::error::{BenchError, Result};

pub const TAGS_HEADER: &str = "x-cache-tags";
pub const TTL_HEADER: &str = "x-cache-ttl";

/// HTTP client for a remote tagged cache
#[derive(Clone)]
pub struct HttpCache {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCache {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .tcp_nodelay(true) // latency is what we measure
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of `route` applied to one id or tag, percent-encoded as a single
    /// path segment.
    fn item_url(&self, route: &str, name: &str) -> String {
        format!("{}/{}/{}", self.base_url, route, urlencoding::encode(name))
    }

    /// Turns any non-2xx status into a backend error naming the request.
    fn check(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(BenchError::Backend(format!(
                "{} failed with status {} ({})",
                what,
                status,
                response.url()
            )))
        }
    }

    async fn get_names(&self, path: &str) -> Result<Vec<String>> {
        let response = self.client.get(self.url(path)).send().await?;
        let response = Self::check(response, &format!("GET {}", path))?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TaggedCache for HttpCache {
    fn describe(&self) -> String {
        format!("http ({})", self.base_url)
    }

    async fn save(
        &self,
        payload: &[u8],
        id: &str,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<()> {
        let mut request = self
            .client
            .put(self.item_url("save", id))
            .header("Content-Type", "application/octet-stream")
            .header(TAGS_HEADER, tags.join(","))
            .body(payload.to_vec());
        if let Some(ttl) = ttl {
            request = request.header(TTL_HEADER, ttl.as_secs().to_string());
        }

        let response = request.send().await?;
        Self::check(response, &format!("save of id {}", id))?;
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let url = self.item_url("load", id);
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::check(response, &format!("load of id {}", id))?;
        Ok(Some(response.bytes().await?.to_vec()))
    }

    async fn clean(&self, tag: &str) -> Result<()> {
        let url = self.item_url("clean", tag);
        let response = self.client.post(url).send().await?;
        Self::check(response, &format!("clean of tag {}", tag))?;
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<String>> {
        self.get_names("/ids").await
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        self.get_names("/tags").await
    }

    async fn ids_matching_tags(&self, tags: &[String]) -> Result<Vec<String>> {
        let response = self
            .client
            .post(self.url("/ids-matching-tags"))
            .json(tags)
            .send()
            .await?;
        let response = Self::check(response, &format!("ids matching {:?}", tags))?;
        Ok(response.json().await?)
    }

    async fn flush_all(&self) -> Result<()> {
        let response = self.client.post(self.url("/flush")).send().await?;
        Self::check(response, "flush")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_url_encodes_one_segment() {
        let cache = HttpCache::new("http://localhost:3000", Duration::from_secs(1)).unwrap();
        assert_eq!(
            cache.item_url("save", "TAG_01-a.b~c"),
            "http://localhost:3000/save/TAG_01-a.b~c"
        );
        assert_eq!(
            cache.item_url("clean", "a/b c"),
            "http://localhost:3000/clean/a%2Fb%20c"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let cache = HttpCache::new("http://localhost:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(cache.url("/ids"), "http://localhost:3000/ids");
        assert_eq!(cache.describe(), "http (http://localhost:3000)");
    }
}
