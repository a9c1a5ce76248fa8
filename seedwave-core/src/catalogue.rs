//! Catalogue data model and the service trait the controllers talk to.

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Default catalogue service location when nothing is configured
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";

/// Row count advertised to paged front-ends for their page controls.
pub const PAGED_TOTAL_ROWS: u64 = 10_000;

/// Catalogue language. The service generates names and lyrics per language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
}

impl Language {
    /// Query-string identifier understood by the service.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
        }
    }

    /// The other language, for two-way toggles.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::En => Self::Ru,
            Self::Ru => Self::En,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "ru" => Ok(Self::Ru),
            other => Err(CoreError::ConfigInvalid {
                message: format!("unknown language '{other}', expected 'en' or 'ru'"),
            }),
        }
    }
}

/// How the song list is presented: one page at a time, or an accumulating
/// infinite scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Table,
    Scroll,
}

impl ViewMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Scroll => "scroll",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Table => Self::Scroll,
            Self::Scroll => Self::Table,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "scroll" => Ok(Self::Scroll),
            other => Err(CoreError::ConfigInvalid {
                message: format!("unknown view mode '{other}', expected 'table' or 'scroll'"),
            }),
        }
    }
}

/// Minimum-likes filter.
///
/// The slider runs from 0 to 10; a slider value of 0 means "no filter",
/// which the service expects as the sentinel `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LikeFilter {
    #[default]
    Any,
    AtLeast(f64),
}

impl LikeFilter {
    /// Query value meaning "no filter"
    pub const NO_FILTER: f64 = -1.0;
    /// Upper bound of the like slider
    pub const SLIDER_MAX: f64 = 10.0;

    /// Map a slider position to a filter. Non-positive and non-finite
    /// positions disable the filter; larger ones are clamped to the slider.
    #[must_use]
    pub fn from_slider(value: f64) -> Self {
        if value.is_finite() && value > 0.0 {
            Self::AtLeast(value.min(Self::SLIDER_MAX))
        } else {
            Self::Any
        }
    }

    /// Value sent as `likeFilter` on catalogue requests.
    #[must_use]
    pub const fn query_value(self) -> f64 {
        match self {
            Self::Any => Self::NO_FILTER,
            Self::AtLeast(min) => min,
        }
    }

    /// Position the slider should show for this filter.
    #[must_use]
    pub const fn slider_value(self) -> f64 {
        match self {
            Self::Any => 0.0,
            Self::AtLeast(min) => min,
        }
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::AtLeast(_))
    }

    /// Short label for the filter control ("All" when unfiltered).
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::Any => "All".to_string(),
            Self::AtLeast(min) => min.to_string(),
        }
    }
}

/// One row of the generated catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongSummary {
    pub seed: String,
    pub artist_name: String,
    pub music_name: String,
    pub album_title: String,
    pub genre: String,
    pub likes: f64,
}

impl SongSummary {
    /// Key used by front-ends to identify a displayed row.
    #[must_use]
    pub fn display_key(&self) -> String {
        format!("{}{}", self.artist_name, self.music_name)
    }

    /// Likes rounded to one decimal place for display.
    #[must_use]
    pub fn likes_label(&self) -> String {
        format!("{:.1}", self.likes)
    }

    /// File stem used when saving this song's audio.
    #[must_use]
    pub fn download_stem(&self) -> String {
        format!("{} - {}", self.artist_name, self.music_name)
    }
}

/// A timed lyric line. `time` is the playback offset in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    pub time: f64,
    pub text: String,
}

impl LyricLine {
    #[must_use]
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

/// Generated assets and lyrics for one song.
///
/// Asset paths are relative to the service base URL; empty strings are
/// treated the same as missing paths.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDetail {
    pub seed: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub midi_path: Option<String>,
    #[serde(default)]
    pub instrumental_path: Option<String>,
    #[serde(default)]
    pub vocal_path: Option<String>,
    #[serde(default)]
    pub final_mix_path: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub lyrics: Vec<LyricLine>,
}

fn usable(path: Option<&String>) -> Option<&str> {
    path.map(|p| p.trim()).filter(|p| !p.is_empty())
}

impl SongDetail {
    #[must_use]
    pub fn final_mix(&self) -> Option<&str> {
        usable(self.final_mix_path.as_ref())
    }

    #[must_use]
    pub fn instrumental(&self) -> Option<&str> {
        usable(self.instrumental_path.as_ref())
    }

    #[must_use]
    pub fn vocal(&self) -> Option<&str> {
        usable(self.vocal_path.as_ref())
    }

    #[must_use]
    pub fn midi(&self) -> Option<&str> {
        usable(self.midi_path.as_ref())
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        usable(self.image_path.as_ref())
    }

    /// Resolve the cover art URL, if the song has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined onto `base`.
    pub fn image_url(&self, base: &Url) -> Result<Option<Url>> {
        self.image().map(|p| resolve_asset(base, p)).transpose()
    }
}

/// Resolve a service-relative asset path against the base URL.
///
/// Paths are appended to the base rather than URL-joined so that a base with
/// a path prefix (e.g. behind a reverse proxy) keeps that prefix.
///
/// # Errors
///
/// Returns an error if the combined string is not a valid URL.
pub fn resolve_asset(base: &Url, path: &str) -> Result<Url> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(Url::parse(path)?);
    }
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}

/// Parameters of a single catalogue page request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub seed: String,
    pub language: Language,
    pub like_filter: LikeFilter,
    pub skip: u64,
    pub take: u32,
}

impl PageQuery {
    /// Build the query for a 1-based page number.
    #[must_use]
    pub fn for_page(
        seed: impl Into<String>,
        language: Language,
        like_filter: LikeFilter,
        page: u32,
        page_size: u32,
    ) -> Self {
        Self {
            seed: seed.into(),
            language,
            like_filter,
            skip: u64::from(page.saturating_sub(1)) * u64::from(page_size),
            take: page_size,
        }
    }
}

/// The external catalogue/generation service.
#[async_trait]
pub trait CatalogueApi: Send + Sync {
    /// Base URL that asset paths are resolved against.
    fn base_url(&self) -> &Url;

    /// Fetch one page of song summaries.
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<SongSummary>>;

    /// Generate (or look up) full detail for one song.
    async fn generate_song(&self, seed: &str, language: Language) -> Result<SongDetail>;

    /// Fetch the raw bytes of an asset.
    async fn fetch_asset(&self, url: &Url) -> Result<Vec<u8>>;
}
