//! In-memory catalogue used by unit tests.

use crate::catalogue::{CatalogueApi, Language, PageQuery, SongDetail, SongSummary};
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

pub fn song(seed: &str) -> SongSummary {
    SongSummary {
        seed: seed.to_string(),
        artist_name: format!("Artist {seed}"),
        music_name: format!("Song {seed}"),
        album_title: "Single".to_string(),
        genre: "Synthwave".to_string(),
        likes: 1.0,
    }
}

/// Serves deterministic pages and canned song details.
pub struct FakeCatalogue {
    base: Url,
    page_queries: Mutex<Vec<PageQuery>>,
    details: HashMap<String, SongDetail>,
    assets: HashMap<String, Vec<u8>>,
}

impl FakeCatalogue {
    pub fn new() -> Self {
        Self {
            base: Url::parse("http://catalogue.test").unwrap(),
            page_queries: Mutex::new(Vec::new()),
            details: HashMap::new(),
            assets: HashMap::new(),
        }
    }

    pub fn with_detail(mut self, detail: SongDetail) -> Self {
        self.details.insert(detail.seed.clone(), detail);
        self
    }

    pub fn with_asset(mut self, url: &str, bytes: &[u8]) -> Self {
        self.assets.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn page_queries(&self) -> Vec<PageQuery> {
        self.page_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogueApi for FakeCatalogue {
    fn base_url(&self) -> &Url {
        &self.base
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<SongSummary>> {
        self.page_queries.lock().unwrap().push(query.clone());
        Ok((0..u64::from(query.take))
            .map(|i| song(&format!("{}-{}", query.seed, query.skip + i)))
            .collect())
    }

    async fn generate_song(&self, seed: &str, _language: Language) -> Result<SongDetail> {
        self.details
            .get(seed)
            .cloned()
            .ok_or_else(|| CoreError::GenerationFailed {
                seed: seed.to_string(),
                reason: "status 500".to_string(),
            })
    }

    async fn fetch_asset(&self, url: &Url) -> Result<Vec<u8>> {
        self.assets
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| CoreError::CatalogueStatus {
                endpoint: url.path().to_string(),
                status: 404,
            })
    }
}
