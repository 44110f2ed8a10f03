use async_trait::async_trait;
use chrono::Datelike;
use serde::Deserialize;

use crate::config::ArchiveConfig;
use crate::error::{Result, ViewerError};
use crate::progress::{self, Kind};

/// One search hit: the raw description and the link to its preview image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub description: String,
    pub thumbnail_url: String,
}

/// The items returned by a single search, in archive order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultDocument {
    items: Vec<Item>,
    total_hits: Option<u64>,
}

impl ResultDocument {
    pub fn new(items: Vec<Item>) -> Self {
        ResultDocument { items, total_hits: None }
    }

    pub fn with_total_hits(mut self, total_hits: u64) -> Self {
        self.total_hits = Some(total_hits);
        self
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hit count reported by the archive, which may exceed the page we received.
    pub fn total_hits(&self) -> Option<u64> {
        self.total_hits
    }
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<ResultDocument>;
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    collection: Collection,
}

#[derive(Debug, Deserialize)]
struct Collection {
    #[serde(default)]
    items: Vec<RawItem>,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    total_hits: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    data: Vec<RawData>,
    #[serde(default)]
    links: Vec<RawLink>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    href: Option<String>,
}

impl RawItem {
    // Only the first data entry and the first link are considered.
    fn into_item(self) -> Option<Item> {
        let description = self.data.into_iter().next()?.description?;
        let thumbnail_url = self.links.into_iter().next()?.href?;
        Some(Item { description, thumbnail_url })
    }
}

/// Parse a search response body. Entries lacking a description or a link are dropped.
pub fn parse_document(body: &[u8]) -> Result<ResultDocument> {
    let response: SearchResponse = serde_json::from_slice(body)
        .map_err(|e| ViewerError::Fetch(format!("malformed search response: {}", e)))?;

    let raw_count = response.collection.items.len();
    let items: Vec<Item> = response
        .collection
        .items
        .into_iter()
        .filter_map(RawItem::into_item)
        .collect();

    if items.len() < raw_count {
        tracing::debug!("Skipped {} incomplete search entries", raw_count - items.len());
    }

    let document = ResultDocument::new(items);
    Ok(match response.collection.metadata.and_then(|m| m.total_hits) {
        Some(total) => document.with_total_hits(total),
        None => document,
    })
}

/// HTTP client for the image archive. Serves both as search client and image fetcher.
pub struct NasaArchive {
    search_url: String,
    media_type: String,
    client: reqwest::Client,
}

impl NasaArchive {
    pub fn with_config(config: &ArchiveConfig) -> Self {
        NasaArchive {
            search_url: config.search_url.clone(),
            media_type: config.media_type.clone(),
            client: reqwest::Client::new(),
        }
    }
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

#[async_trait]
impl SearchClient for NasaArchive {
    async fn search(&self, query: &str) -> Result<ResultDocument> {
        let year = current_year().to_string();
        progress::log_with(Kind::Search, format!("Searching for \"{}\" since {}", query, year));

        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("q", query),
                ("media_type", self.media_type.as_str()),
                ("year_start", year.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            progress::log_with(Kind::Error, format!("Search failed with {}", status));
            return Err(ViewerError::Fetch(format!("search returned {}", status)));
        }

        let body = response.bytes().await?;
        let document = parse_document(&body)?;
        progress::log_with(
            Kind::Search,
            format!("\"{}\" returned {} images", query, document.len()),
        );
        Ok(document)
    }
}

#[async_trait]
impl ImageFetcher for NasaArchive {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        progress::log_with(Kind::Fetch, format!("Fetching {}", url));

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            progress::log_with(Kind::Error, format!("Image fetch failed with {}", status));
            return Err(ViewerError::Fetch(format!("image request returned {}", status)));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ViewerError::Fetch(format!("empty image body from {}", url)));
        }

        tracing::debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
