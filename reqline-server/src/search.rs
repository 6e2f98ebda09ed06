//! Catalog search with fallback chain
//!
//! Attempts the iTunes Search API directly, falls back to a configured CORS
//! proxy, and finally to MusicBrainz. MusicBrainz is rate limited to
//! 1 request/second. Results are normalized to one shape regardless of
//! which provider answered.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";
const MUSICBRAINZ_SEARCH_URL: &str = "https://musicbrainz.org/ws/2/recording";
const USER_AGENT: &str = "ReqLine/0.1.0 (song request service)";
const RESULT_LIMIT: usize = 10;
const MB_RATE_LIMIT_MS: u64 = 1000; // 1 request per second

/// Search errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Every provider in the chain failed
    #[error("All search providers failed: {0}")]
    Exhausted(String),
}

/// Normalized search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,
    pub link: String,
}

/// Rate limiter enforcing a minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Music catalog search client with provider fallback
pub struct CatalogSearch {
    http_client: reqwest::Client,
    proxy_url: Option<String>,
    mb_limiter: RateLimiter,
}

impl CatalogSearch {
    pub fn new(proxy_url: Option<String>) -> reqline_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| reqline_common::Error::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            proxy_url,
            mb_limiter: RateLimiter::new(MB_RATE_LIMIT_MS),
        })
    }

    /// Search the fallback chain; the first provider that answers wins
    pub async fn search(&self, term: &str) -> Result<Vec<SearchResult>, SearchError> {
        let mut failures = Vec::new();

        match self.search_itunes_direct(term).await {
            Ok(results) => return Ok(results),
            Err(e) => {
                warn!(term, error = %e, "Direct iTunes search failed, trying proxy");
                failures.push(format!("itunes: {}", e));
            }
        }

        if let Some(proxy) = &self.proxy_url {
            match self.search_itunes_proxy(proxy, term).await {
                Ok(results) => return Ok(results),
                Err(e) => {
                    warn!(term, error = %e, "Proxied iTunes search failed, trying MusicBrainz");
                    failures.push(format!("proxy: {}", e));
                }
            }
        }

        match self.search_musicbrainz(term).await {
            Ok(results) => Ok(results),
            Err(e) => {
                failures.push(format!("musicbrainz: {}", e));
                Err(SearchError::Exhausted(failures.join("; ")))
            }
        }
    }

    async fn search_itunes_direct(&self, term: &str) -> Result<Vec<SearchResult>, SearchError> {
        let body = self
            .get_json(ITUNES_SEARCH_URL, &[("term", term), ("media", "music"), ("limit", "10")])
            .await?;
        Ok(parse_itunes(&body))
    }

    async fn search_itunes_proxy(
        &self,
        proxy: &str,
        term: &str,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!("{}/itunes", proxy.trim_end_matches('/'));
        let body = self.get_json(&url, &[("q", term)]).await?;
        Ok(parse_itunes(&body))
    }

    async fn search_musicbrainz(&self, term: &str) -> Result<Vec<SearchResult>, SearchError> {
        self.mb_limiter.wait().await;

        let limit = RESULT_LIMIT.to_string();
        let body = self
            .get_json(
                MUSICBRAINZ_SEARCH_URL,
                &[("query", term), ("fmt", "json"), ("limit", limit.as_str())],
            )
            .await?;
        Ok(parse_musicbrainz(&body))
    }

    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, SearchError> {
        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Network(format!("{} returned {}", url, status)));
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))
    }
}

/// Normalize an iTunes Search API response
pub fn parse_itunes(body: &serde_json::Value) -> Vec<SearchResult> {
    let Some(results) = body.get("results").and_then(|r| r.as_array()) else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|track| {
            Some(SearchResult {
                title: track.get("trackName")?.as_str()?.to_string(),
                artist: track
                    .get("artistName")
                    .and_then(|a| a.as_str())
                    .unwrap_or("Unknown Artist")
                    .to_string(),
                artwork: track
                    .get("artworkUrl100")
                    .and_then(|a| a.as_str())
                    .map(|s| s.to_string()),
                link: track.get("trackViewUrl")?.as_str()?.to_string(),
            })
        })
        .take(RESULT_LIMIT)
        .collect()
}

/// Normalize a MusicBrainz recording search response
///
/// MusicBrainz has no artwork in search results; the link is the canonical
/// recording page.
pub fn parse_musicbrainz(body: &serde_json::Value) -> Vec<SearchResult> {
    let Some(recordings) = body.get("recordings").and_then(|r| r.as_array()) else {
        return Vec::new();
    };

    recordings
        .iter()
        .filter_map(|recording| {
            let id = recording.get("id")?.as_str()?;
            let artist = recording
                .get("artist-credit")
                .and_then(|c| c.as_array())
                .and_then(|c| c.first())
                .and_then(|c| c.get("name"))
                .and_then(|n| n.as_str())
                .unwrap_or("Unknown Artist");

            Some(SearchResult {
                title: recording.get("title")?.as_str()?.to_string(),
                artist: artist.to_string(),
                artwork: None,
                link: format!("https://musicbrainz.org/recording/{}", id),
            })
        })
        .take(RESULT_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_itunes_normalizes_fields() {
        let body = json!({
            "resultCount": 2,
            "results": [
                {
                    "trackName": "Song A",
                    "artistName": "Artist A",
                    "artworkUrl100": "https://art.example/a.jpg",
                    "trackViewUrl": "https://music.apple.com/track/a"
                },
                {
                    "trackName": "Song B",
                    "trackViewUrl": "https://music.apple.com/track/b"
                }
            ]
        });

        let results = parse_itunes(&body);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Song A");
        assert_eq!(results[0].artwork.as_deref(), Some("https://art.example/a.jpg"));
        assert_eq!(results[1].artist, "Unknown Artist");
        assert!(results[1].artwork.is_none());
    }

    #[test]
    fn test_parse_itunes_skips_unusable_entries() {
        let body = json!({
            "results": [
                { "artistName": "No track name or link" },
                {
                    "trackName": "Usable",
                    "artistName": "Artist",
                    "trackViewUrl": "https://music.apple.com/track/u"
                }
            ]
        });

        let results = parse_itunes(&body);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Usable");
    }

    #[test]
    fn test_parse_itunes_empty_or_malformed() {
        assert!(parse_itunes(&json!({})).is_empty());
        assert!(parse_itunes(&json!({"results": "nope"})).is_empty());
    }

    #[test]
    fn test_parse_musicbrainz_builds_recording_links() {
        let body = json!({
            "recordings": [
                {
                    "id": "abcd-1234",
                    "title": "Song C",
                    "artist-credit": [ { "name": "Artist C" } ]
                }
            ]
        });

        let results = parse_musicbrainz(&body);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].link, "https://musicbrainz.org/recording/abcd-1234");
        assert_eq!(results[0].artist, "Artist C");
        assert!(results[0].artwork.is_none());
    }

    #[tokio::test]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new(200); // shorter interval for the test

        let start = Instant::now();
        limiter.wait().await;
        let first_elapsed = start.elapsed();

        limiter.wait().await;
        let second_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(100));
        assert!(second_elapsed >= Duration::from_millis(180));
    }
}
