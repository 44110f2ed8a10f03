use std::sync::Arc;

use crate::archive::{ImageFetcher, Item, ResultDocument, SearchClient};
use crate::error::{Result, ViewerError};
use crate::sanitize;

/// Displayable content for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub text: String,
    pub image_bytes: Vec<u8>,
}

/// Where the cursor sits, for the "image N of M" indicator.
///
/// `generation` counts successful loads, so two positions from different
/// searches never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub index: usize,
    pub len: usize,
    pub total_hits: Option<u64>,
    pub generation: u64,
}

/// Owns the current search results and the cursor into them.
///
/// Every operation either commits its state change completely or fails and
/// leaves the document and cursor as they were. The cursor always indexes an
/// existing item while a document is loaded.
pub struct Navigator {
    fetcher: Arc<dyn ImageFetcher>,
    document: Option<ResultDocument>,
    cursor: usize,
    generation: u64,
}

impl Navigator {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Navigator {
            fetcher,
            document: None,
            cursor: 0,
            generation: 0,
        }
    }

    /// Replace the loaded results. An empty document is rejected and the
    /// previous results stay navigable.
    pub fn load_results(&mut self, document: ResultDocument) -> Result<()> {
        if document.is_empty() {
            return Err(ViewerError::EmptyResult);
        }
        self.document = Some(document);
        self.cursor = 0;
        self.generation += 1;
        Ok(())
    }

    /// Run a search and load its results, then resolve the first item.
    ///
    /// A failed or empty search leaves the current results untouched. When the
    /// results load but the first image fails, the new results stay loaded at
    /// cursor 0 and the fetch error is returned.
    pub async fn search(&mut self, client: &dyn SearchClient, query: &str) -> Result<ResolvedItem> {
        let document = client.search(query).await?;
        self.load_results(document)?;
        self.current().await
    }

    pub async fn current(&self) -> Result<ResolvedItem> {
        let item = self.item_at(self.cursor)?;
        self.resolve(item).await
    }

    /// Step to the next item. Saturates at the last one.
    pub async fn advance(&mut self) -> Result<ResolvedItem> {
        let len = self.document()?.len();
        let target = (self.cursor + 1).min(len - 1);
        self.move_to(target).await
    }

    /// Step to the previous item. Saturates at the first one.
    pub async fn retreat(&mut self) -> Result<ResolvedItem> {
        self.document()?;
        let target = self.cursor.saturating_sub(1);
        self.move_to(target).await
    }

    /// True at the first item, and when nothing is loaded.
    pub fn at_start(&self) -> bool {
        self.document.is_none() || self.cursor == 0
    }

    /// True at the last item, and when nothing is loaded.
    pub fn at_end(&self) -> bool {
        self.document
            .as_ref()
            .map_or(true, |document| self.cursor + 1 >= document.len())
    }

    pub fn position(&self) -> Option<Position> {
        self.document.as_ref().map(|document| Position {
            index: self.cursor,
            len: document.len(),
            total_hits: document.total_hits(),
            generation: self.generation,
        })
    }

    /// Strip URLs from the description and download the thumbnail.
    pub async fn resolve(&self, item: &Item) -> Result<ResolvedItem> {
        let text = sanitize::strip_urls(&item.description);
        let image_bytes = self.fetcher.fetch_bytes(&item.thumbnail_url).await?;
        if image_bytes.is_empty() {
            return Err(ViewerError::Fetch(format!(
                "empty image body from {}",
                item.thumbnail_url
            )));
        }
        Ok(ResolvedItem { text, image_bytes })
    }

    // Resolve first, commit the cursor only once the fetch succeeded.
    async fn move_to(&mut self, target: usize) -> Result<ResolvedItem> {
        let resolved = {
            let item = self.item_at(target)?;
            self.resolve(item).await?
        };
        self.cursor = target;
        Ok(resolved)
    }

    fn document(&self) -> Result<&ResultDocument> {
        self.document.as_ref().ok_or(ViewerError::NoDocument)
    }

    fn item_at(&self, index: usize) -> Result<&Item> {
        self.document()?
            .items()
            .get(index)
            .ok_or(ViewerError::NoDocument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Serves `bytes-for:<url>` for every URL except those marked as failing.
    #[derive(Default)]
    struct FakeFetcher {
        failing: Mutex<HashSet<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn fail(&self, url: &str) {
            self.failing.lock().unwrap().insert(url.to_string());
        }

        fn heal(&self, url: &str) {
            self.failing.lock().unwrap().remove(url);
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.failing.lock().unwrap().contains(url) {
                return Err(ViewerError::Fetch(format!("connection reset for {}", url)));
            }
            Ok(format!("bytes-for:{}", url).into_bytes())
        }
    }

    fn item(n: usize) -> Item {
        Item {
            description: format!("Item {} https://nasa.gov/{}", n, n),
            thumbnail_url: format!("https://img/{}.jpg", n),
        }
    }

    fn document(len: usize) -> ResultDocument {
        ResultDocument::new((0..len).map(item).collect())
    }

    fn expected(n: usize) -> ResolvedItem {
        ResolvedItem {
            text: format!("Item {} ", n),
            image_bytes: format!("bytes-for:https://img/{}.jpg", n).into_bytes(),
        }
    }

    fn navigator() -> (Arc<FakeFetcher>, Navigator) {
        let fetcher = Arc::new(FakeFetcher::default());
        let nav = Navigator::new(fetcher.clone());
        (fetcher, nav)
    }

    #[tokio::test]
    async fn test_no_document() {
        let (_, mut nav) = navigator();
        assert_eq!(nav.current().await, Err(ViewerError::NoDocument));
        assert_eq!(nav.advance().await, Err(ViewerError::NoDocument));
        assert_eq!(nav.retreat().await, Err(ViewerError::NoDocument));
        assert!(nav.at_start());
        assert!(nav.at_end());
        assert_eq!(nav.position(), None);
    }

    #[tokio::test]
    async fn test_load_resets_cursor_and_resolves_first() {
        let (_, mut nav) = navigator();
        nav.load_results(document(4)).unwrap();
        nav.advance().await.unwrap();
        nav.advance().await.unwrap();

        nav.load_results(document(2)).unwrap();
        assert_eq!(nav.position().unwrap().index, 0);
        assert_eq!(nav.current().await.unwrap(), expected(0));
        assert!(nav.at_start());
        assert!(!nav.at_end());
    }

    #[tokio::test]
    async fn test_empty_load_keeps_previous_state() {
        let (_, mut nav) = navigator();
        assert_eq!(nav.load_results(document(0)), Err(ViewerError::EmptyResult));
        assert_eq!(nav.position(), None);

        nav.load_results(document(3)).unwrap();
        nav.advance().await.unwrap();

        assert_eq!(nav.load_results(document(0)), Err(ViewerError::EmptyResult));
        assert_eq!(nav.position().unwrap().index, 1);
        assert_eq!(nav.position().unwrap().len, 3);
        assert_eq!(nav.current().await.unwrap(), expected(1));
    }

    #[tokio::test]
    async fn test_advance_saturates_at_last_item() {
        let (_, mut nav) = navigator();
        nav.load_results(document(3)).unwrap();

        let mut last = None;
        for _ in 0..5 {
            last = Some(nav.advance().await.unwrap());
        }

        assert!(nav.at_end());
        assert!(!nav.at_start());
        assert_eq!(nav.position().unwrap().index, 2);
        assert_eq!(last.unwrap(), expected(2));
        assert_eq!(nav.current().await.unwrap(), expected(2));
    }

    #[tokio::test]
    async fn test_retreat_at_start_is_noop() {
        let (_, mut nav) = navigator();
        nav.load_results(document(3)).unwrap();

        let before = nav.current().await.unwrap();
        let after = nav.retreat().await.unwrap();
        assert_eq!(before, after);
        assert!(nav.at_start());
        assert_eq!(nav.position().unwrap().index, 0);
    }

    #[tokio::test]
    async fn test_forward_then_back() {
        let (_, mut nav) = navigator();
        nav.load_results(document(3)).unwrap();

        assert_eq!(nav.advance().await.unwrap(), expected(1));
        assert_eq!(nav.advance().await.unwrap(), expected(2));
        assert_eq!(nav.retreat().await.unwrap(), expected(1));
        assert_eq!(nav.retreat().await.unwrap(), expected(0));
        assert!(nav.at_start());
    }

    #[tokio::test]
    async fn test_single_item_document() {
        let (_, mut nav) = navigator();
        nav.load_results(document(1)).unwrap();
        assert!(nav.at_start());
        assert!(nav.at_end());
        assert_eq!(nav.advance().await.unwrap(), expected(0));
        assert_eq!(nav.retreat().await.unwrap(), expected(0));
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_cursor() {
        let (fetcher, mut nav) = navigator();
        nav.load_results(document(3)).unwrap();
        fetcher.fail("https://img/1.jpg");

        let err = nav.advance().await.unwrap_err();
        assert!(matches!(err, ViewerError::Fetch(_)));
        assert_eq!(nav.position().unwrap().index, 0);
        assert!(nav.at_start());

        fetcher.heal("https://img/1.jpg");
        assert_eq!(nav.advance().await.unwrap(), expected(1));

        fetcher.fail("https://img/0.jpg");
        assert!(nav.retreat().await.is_err());
        assert_eq!(nav.position().unwrap().index, 1);
    }

    #[tokio::test]
    async fn test_resolve_strips_urls_and_fetches_once() {
        let (fetcher, nav) = navigator();
        let item = Item {
            description: "See https://example.com/a.jpg for details".to_string(),
            thumbnail_url: "https://img/a.jpg".to_string(),
        };

        let resolved = nav.resolve(&item).await.unwrap();
        assert_eq!(resolved.text, "See  for details");
        assert_eq!(resolved.image_bytes, b"bytes-for:https://img/a.jpg".to_vec());
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_position_carries_total_hits() {
        let (_, mut nav) = navigator();
        nav.load_results(document(2).with_total_hits(500)).unwrap();
        let position = nav.position().unwrap();
        assert_eq!(
            position,
            Position { index: 0, len: 2, total_hits: Some(500), generation: 1 }
        );

        nav.load_results(document(2).with_total_hits(500)).unwrap();
        assert_ne!(nav.position().unwrap(), position);
    }

    /// Returns a canned answer per query; unknown queries fail at the transport level.
    #[derive(Default)]
    struct FakeSearch {
        answers: Mutex<HashMap<String, ResultDocument>>,
    }

    impl FakeSearch {
        fn answer(&self, query: &str, document: ResultDocument) {
            self.answers.lock().unwrap().insert(query.to_string(), document);
        }
    }

    #[async_trait]
    impl SearchClient for FakeSearch {
        async fn search(&self, query: &str) -> Result<ResultDocument> {
            self.answers
                .lock()
                .unwrap()
                .get(query)
                .cloned()
                .ok_or_else(|| ViewerError::Fetch(format!("no route to archive for {}", query)))
        }
    }

    #[tokio::test]
    async fn test_search_loads_and_resets_cursor() {
        let (_, mut nav) = navigator();
        let search = FakeSearch::default();
        search.answer("earth", document(3));
        search.answer("moon", document(2));

        assert_eq!(nav.search(&search, "earth").await.unwrap(), expected(0));
        nav.advance().await.unwrap();
        nav.advance().await.unwrap();
        assert!(nav.at_end());

        assert_eq!(nav.search(&search, "moon").await.unwrap(), expected(0));
        let position = nav.position().unwrap();
        assert_eq!((position.index, position.len), (0, 2));
        assert!(nav.at_start());
    }

    #[tokio::test]
    async fn test_empty_search_keeps_previous_results() {
        let (_, mut nav) = navigator();
        let search = FakeSearch::default();
        search.answer("earth", document(3));
        search.answer("nothing", document(0));

        nav.search(&search, "earth").await.unwrap();
        nav.advance().await.unwrap();
        let before = nav.position();

        assert_eq!(nav.search(&search, "nothing").await, Err(ViewerError::EmptyResult));
        assert_eq!(nav.position(), before);
        assert_eq!(nav.advance().await.unwrap(), expected(2));
    }

    #[tokio::test]
    async fn test_search_transport_error_keeps_previous_results() {
        let (_, mut nav) = navigator();
        let search = FakeSearch::default();
        search.answer("earth", document(3));

        assert!(matches!(nav.search(&search, "mars").await, Err(ViewerError::Fetch(_))));
        assert_eq!(nav.position(), None);

        nav.search(&search, "earth").await.unwrap();
        nav.advance().await.unwrap();
        let before = nav.position();

        assert!(matches!(nav.search(&search, "mars").await, Err(ViewerError::Fetch(_))));
        assert_eq!(nav.position(), before);
        assert_eq!(nav.current().await.unwrap(), expected(1));
    }

    #[tokio::test]
    async fn test_search_with_failing_first_image_keeps_new_results() {
        let (fetcher, mut nav) = navigator();
        let search = FakeSearch::default();
        search.answer("earth", document(3));
        search.answer("moon", document(2));

        nav.search(&search, "earth").await.unwrap();
        let earth = nav.position().unwrap();
        fetcher.fail("https://img/0.jpg");

        assert!(matches!(nav.search(&search, "moon").await, Err(ViewerError::Fetch(_))));
        let moon = nav.position().unwrap();
        assert_eq!((moon.index, moon.len), (0, 2));
        assert_ne!(moon.generation, earth.generation);
        assert_eq!(nav.advance().await.unwrap(), expected(1));
    }
}
