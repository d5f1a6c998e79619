//! Turns a free-text query into a media locator.

use crate::error::{MediaError, MediaResult};
use crate::types::{Resolution, SearchHit};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, instrument};

static MEDIA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.?be)/.+$").expect("valid media URL regex")
});

/// Search backend used for non-URL queries.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Run one search, returning hits in the provider's order.
    async fn search(&self, query: &str) -> MediaResult<Vec<SearchHit>>;
}

/// Resolves queries to locators, searching only when the query is not a URL.
#[derive(Clone)]
pub struct Resolver {
    search: Arc<dyn VideoSearch>,
}

impl Resolver {
    pub fn new(search: Arc<dyn VideoSearch>) -> Self {
        Self { search }
    }

    /// Whether the query already is a media URL.
    pub fn is_media_url(query: &str) -> bool {
        MEDIA_URL.is_match(query)
    }

    /// Resolve a trimmed, non-empty query.
    #[instrument(skip(self))]
    pub async fn resolve(&self, query: &str) -> MediaResult<Resolution> {
        if Self::is_media_url(query) {
            debug!("Query is a media URL, skipping search");
            return Ok(Resolution::Locator(query.to_string()));
        }

        let hits = self
            .search
            .search(query)
            .await
            .map_err(|e| match e {
                MediaError::SearchFailed(_) => e,
                other => MediaError::SearchFailed(other.to_string()),
            })?;

        match hits.into_iter().next() {
            Some(hit) => {
                debug!("Top hit: {} ({:?})", hit.url, hit.title);
                Ok(Resolution::Locator(hit.url))
            }
            None => Ok(Resolution::NoResults),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSearch {
        calls: AtomicUsize,
        hits: Vec<SearchHit>,
        fail: bool,
    }

    impl CountingSearch {
        fn new(hits: Vec<SearchHit>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                hits,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(vec![])
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VideoSearch for CountingSearch {
        async fn search(&self, _query: &str) -> MediaResult<Vec<SearchHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MediaError::Retrieval("connection reset".into()));
            }
            Ok(self.hits.clone())
        }
    }

    fn hit(url: &str) -> SearchHit {
        SearchHit {
            url: url.into(),
            title: None,
        }
    }

    #[test]
    fn test_url_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?v=abc",
            "youtube.com/shorts/xyz",
            "https://youtu.be/dQw4w9WgXcQ",
            "www.youtube.com/watch?v=1",
            "youtube/abc",
        ] {
            assert!(Resolver::is_media_url(url), "{url} should be a URL");
        }

        for query in [
            "rick astley",
            "https://vimeo.com/123",
            "https://www.youtube.com/",
            "youtube.com",
        ] {
            assert!(!Resolver::is_media_url(query), "{query} should not be a URL");
        }
    }

    #[tokio::test]
    async fn test_url_skips_search() {
        let search = Arc::new(CountingSearch::new(vec![hit("https://youtu.be/other")]));
        let resolver = Resolver::new(search.clone());

        let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
        let resolution = resolver.resolve(url).await.unwrap();

        assert_eq!(resolution, Resolution::Locator(url.into()));
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_takes_first_hit() {
        let search = Arc::new(CountingSearch::new(vec![
            hit("https://www.youtube.com/watch?v=first"),
            hit("https://www.youtube.com/watch?v=second"),
        ]));
        let resolver = Resolver::new(search.clone());

        let resolution = resolver.resolve("rick astley").await.unwrap();

        assert_eq!(
            resolution,
            Resolution::Locator("https://www.youtube.com/watch?v=first".into())
        );
        assert_eq!(search.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_search_is_not_an_error() {
        let search = Arc::new(CountingSearch::new(vec![]));
        let resolver = Resolver::new(search.clone());

        let resolution = resolver.resolve("zzzz no such video").await.unwrap();

        assert_eq!(resolution, Resolution::NoResults);
        assert_eq!(search.calls(), 1);
    }

    #[tokio::test]
    async fn test_search_failure_is_search_failed() {
        let search = Arc::new(CountingSearch::failing());
        let resolver = Resolver::new(search.clone());

        let result = resolver.resolve("rick astley").await;

        assert!(matches!(result, Err(MediaError::SearchFailed(_))));
        assert_eq!(search.calls(), 1);
    }
}
