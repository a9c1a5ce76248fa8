//! Song list state: paged and infinite-scroll accumulation.
//!
//! The controller never performs I/O itself. Every transition that needs
//! data returns a [`PageRequest`]; the front-end runs it against a
//! [`CatalogueApi`] and feeds the [`PageResponse`] back through
//! [`CatalogueListController::apply_response`]. Each request carries a token
//! and only the most recent one is applied, so a slow response to an old
//! filter can never overwrite newer state.

use crate::catalogue::{
    CatalogueApi, Language, LikeFilter, PageQuery, SongSummary, ViewMode, PAGED_TOTAL_ROWS,
};
use crate::error::{CoreError, Result};
use crate::seed;
use std::collections::HashSet;
use std::ops::Range;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "seedwave::listing";

/// Default distance from the bottom at which the next page is requested.
pub const DEFAULT_SCROLL_THRESHOLD: f64 = 50.0;

/// Page size used in table mode unless configured otherwise
pub const DEFAULT_TABLE_PAGE_SIZE: u32 = 10;
/// Page size used in scroll mode unless configured otherwise
pub const DEFAULT_SCROLL_PAGE_SIZE: u32 = 15;

/// Whether a scroll position is close enough to the end of the content to
/// load more rows.
#[must_use]
pub fn is_near_bottom(
    content_height: f64,
    scroll_top: f64,
    visible_height: f64,
    threshold: f64,
) -> bool {
    content_height - scroll_top - visible_height <= threshold
}

/// Scroll position over a list of equal-height rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollViewport {
    row_height: f64,
    visible_rows: usize,
    threshold: f64,
    top: usize,
}

impl ScrollViewport {
    #[must_use]
    pub const fn new(row_height: f64, visible_rows: usize, threshold: f64) -> Self {
        Self {
            row_height,
            visible_rows,
            threshold,
            top: 0,
        }
    }

    /// Index of the first row in view.
    #[must_use]
    pub const fn top(&self) -> usize {
        self.top
    }

    #[must_use]
    pub const fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    pub fn scroll_down(&mut self, rows: usize, total: usize) {
        let last_top = total.saturating_sub(self.visible_rows);
        self.top = self.top.saturating_add(rows).min(last_top);
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.top = self.top.saturating_sub(rows);
    }

    pub fn reset(&mut self) {
        self.top = 0;
    }

    /// Row indices currently in view out of `total`.
    #[must_use]
    pub fn visible(&self, total: usize) -> Range<usize> {
        let start = self.top.min(total);
        start..start.saturating_add(self.visible_rows).min(total)
    }

    /// Whether the view is within the threshold of the end of `total` rows.
    #[must_use]
    pub fn is_near_bottom(&self, total: usize) -> bool {
        is_near_bottom(
            self.height(total),
            self.height(self.top),
            self.height(self.visible_rows),
            self.threshold,
        )
    }

    fn height(&self, rows: usize) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let rows = rows as f64;
        rows * self.row_height
    }
}

/// Look up the song shown as table row `row` (1-based) of a catalogue.
///
/// # Errors
///
/// Returns [`CoreError::RowNotFound`] when the page has no such row, or the
/// fetch error.
pub async fn fetch_row(
    api: &dyn CatalogueApi,
    filter: &CatalogueFilter,
    page_size: u32,
    row: u64,
) -> Result<SongSummary> {
    let not_found = || CoreError::RowNotFound {
        seed: filter.seed.clone(),
        row,
    };
    let page_size = page_size.max(1);
    let offset = row.checked_sub(1).ok_or_else(not_found)?;
    let page = u32::try_from(offset / u64::from(page_size))
        .ok()
        .and_then(|page| page.checked_add(1))
        .ok_or_else(not_found)?;
    let index = usize::try_from(offset % u64::from(page_size)).map_err(|_| not_found())?;

    let query = PageQuery::for_page(
        filter.seed.clone(),
        filter.language,
        filter.like_filter,
        page,
        page_size,
    );
    debug!(target: LOG_TARGET, "Looking up row {} on page {}", row, page);
    api.fetch_page(&query)
        .await?
        .into_iter()
        .nth(index)
        .ok_or_else(not_found)
}

/// The user-editable inputs that select a catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueFilter {
    pub seed: String,
    pub language: Language,
    pub like_filter: LikeFilter,
}

impl CatalogueFilter {
    #[must_use]
    pub fn new(seed: impl Into<String>, language: Language) -> Self {
        Self {
            seed: seed.into(),
            language,
            like_filter: LikeFilter::Any,
        }
    }
}

/// Page size applied when entering each view mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizes {
    pub table: u32,
    pub scroll: u32,
}

impl PageSizes {
    #[must_use]
    pub const fn for_mode(self, mode: ViewMode) -> u32 {
        match mode {
            ViewMode::Table => self.table,
            ViewMode::Scroll => self.scroll,
        }
    }
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE_PAGE_SIZE,
            scroll: DEFAULT_SCROLL_PAGE_SIZE,
        }
    }
}

/// Identifies one issued request. Tokens increase monotonically per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// How a response is merged into the row list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// Rows become exactly the response
    Replace,
    /// Response rows with unseen seeds are appended
    Append,
}

/// A page fetch the front-end should run.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub token: RequestToken,
    pub query: PageQuery,
    pub merge: Merge,
}

impl PageRequest {
    /// Run this request against the catalogue service.
    pub async fn execute(self, api: &dyn CatalogueApi) -> PageResponse {
        let result = api.fetch_page(&self.query).await;
        PageResponse {
            token: self.token,
            result,
        }
    }
}

/// Outcome of a [`PageRequest`], tagged with the token it was issued under.
#[derive(Debug)]
pub struct PageResponse {
    pub token: RequestToken,
    pub result: Result<Vec<SongSummary>>,
}

/// What [`CatalogueListController::apply_response`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Rows were replaced; holds the new row count
    Replaced { rows: usize },
    /// Rows were appended; holds how many were new
    Appended { added: usize },
    /// The fetch failed; rows are unchanged
    Failed,
    /// A newer request superseded this one; ignored
    Stale,
    /// The controller was closed; ignored
    Closed,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    token: RequestToken,
    merge: Merge,
    /// Page whose rows are on screen, restored if a page change fails
    restore_page: Option<u32>,
}

/// Owns the rows shown for one catalogue view.
#[derive(Debug)]
pub struct CatalogueListController {
    filter: CatalogueFilter,
    view_mode: ViewMode,
    page_sizes: PageSizes,
    page: u32,
    page_size: u32,
    rows: Vec<SongSummary>,
    seen: HashSet<String>,
    pending: Option<Pending>,
    next_token: u64,
    closed: bool,
}

impl CatalogueListController {
    /// Create an empty controller. Call [`Self::reload`] to issue the first fetch.
    #[must_use]
    pub fn new(filter: CatalogueFilter, view_mode: ViewMode, page_sizes: PageSizes) -> Self {
        Self {
            filter,
            view_mode,
            page_sizes,
            page: 1,
            page_size: page_sizes.for_mode(view_mode).max(1),
            rows: Vec::new(),
            seen: HashSet::new(),
            pending: None,
            next_token: 0,
            closed: false,
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[SongSummary] {
        &self.rows
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub const fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    #[must_use]
    pub const fn filter(&self) -> &CatalogueFilter {
        &self.filter
    }

    /// True while a request is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// True when more rows are being fetched below existing scroll rows.
    #[must_use]
    pub fn is_loading_more(&self) -> bool {
        self.is_loading() && self.view_mode == ViewMode::Scroll && !self.rows.is_empty()
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// 1-based number shown next to the row at `index`.
    #[must_use]
    pub fn row_number(&self, index: usize) -> u64 {
        let index = u64::try_from(index).unwrap_or(u64::MAX);
        match self.view_mode {
            ViewMode::Scroll => index.saturating_add(1),
            ViewMode::Table => (u64::from(self.page) - 1)
                .saturating_mul(u64::from(self.page_size))
                .saturating_add(index)
                .saturating_add(1),
        }
    }

    /// Number of pages offered by paged page controls.
    #[must_use]
    pub fn page_count(&self) -> u64 {
        PAGED_TOTAL_ROWS.div_ceil(u64::from(self.page_size))
    }

    /// Hard reset: drop all rows and fetch page 1.
    pub fn reload(&mut self) -> PageRequest {
        self.rows.clear();
        self.seen.clear();
        self.page = 1;
        self.issue(Merge::Replace, None)
    }

    /// Replace the whole filter. Returns `None` if nothing changed.
    pub fn set_filter(&mut self, filter: CatalogueFilter) -> Option<PageRequest> {
        if filter == self.filter {
            return None;
        }
        self.filter = filter;
        Some(self.reload())
    }

    pub fn set_seed(&mut self, seed: impl Into<String>) -> Option<PageRequest> {
        let filter = CatalogueFilter {
            seed: seed.into(),
            ..self.filter.clone()
        };
        self.set_filter(filter)
    }

    /// Pick a fresh random seed and reload.
    pub fn randomize_seed(&mut self) -> PageRequest {
        self.filter.seed = seed::generate();
        info!(target: LOG_TARGET, "Randomized seed to {}", self.filter.seed);
        self.reload()
    }

    pub fn set_language(&mut self, language: Language) -> Option<PageRequest> {
        let filter = CatalogueFilter {
            language,
            ..self.filter.clone()
        };
        self.set_filter(filter)
    }

    pub fn set_like_filter(&mut self, like_filter: LikeFilter) -> Option<PageRequest> {
        let filter = CatalogueFilter {
            like_filter,
            ..self.filter.clone()
        };
        self.set_filter(filter)
    }

    /// Switch view mode, adopting that mode's page size, and reload.
    pub fn set_view_mode(&mut self, view_mode: ViewMode) -> Option<PageRequest> {
        if view_mode == self.view_mode {
            return None;
        }
        self.view_mode = view_mode;
        self.page_size = self.page_sizes.for_mode(view_mode).max(1);
        Some(self.reload())
    }

    pub fn set_page_size(&mut self, page_size: u32) -> Option<PageRequest> {
        let page_size = page_size.max(1);
        if page_size == self.page_size {
            return None;
        }
        self.page_size = page_size;
        Some(self.reload())
    }

    /// Paged mode: show exactly `page`. Ignored in scroll mode.
    pub fn go_to_page(&mut self, page: u32) -> Option<PageRequest> {
        if self.view_mode != ViewMode::Table {
            debug!(target: LOG_TARGET, "Ignoring page change to {page} in scroll mode");
            return None;
        }
        let page = page.max(1);
        if page == self.page {
            return None;
        }
        // A page change superseding another one still falls back to the rows on screen
        let shown_page = self
            .pending
            .and_then(|pending| pending.restore_page)
            .unwrap_or(self.page);
        self.page = page;
        Some(self.issue(Merge::Replace, Some(shown_page)))
    }

    /// Scroll mode: the view reached the bottom. Ignored while loading.
    pub fn scrolled_near_bottom(&mut self) -> Option<PageRequest> {
        if self.view_mode != ViewMode::Scroll || self.closed {
            return None;
        }
        if self.is_loading() {
            debug!(target: LOG_TARGET, "Fetch in flight, ignoring near-bottom trigger");
            return None;
        }
        let shown_page = self.page;
        self.page = self.page.saturating_add(1);
        Some(self.issue(Merge::Append, Some(shown_page)))
    }

    /// Merge a finished fetch into the rows.
    pub fn apply_response(&mut self, response: PageResponse) -> ApplyOutcome {
        if self.closed {
            return ApplyOutcome::Closed;
        }
        let pending = match self.pending {
            Some(pending) if pending.token == response.token => pending,
            _ => {
                debug!(target: LOG_TARGET, "Dropping stale response {:?}", response.token);
                return ApplyOutcome::Stale;
            }
        };
        self.pending = None;

        let songs = match response.result {
            Ok(songs) => songs,
            Err(e) => {
                warn!(target: LOG_TARGET, "Failed to fetch page {}: {}", self.page, e);
                // The page was never received; re-triggering asks for it again.
                if let Some(page) = pending.restore_page {
                    self.page = page;
                }
                return ApplyOutcome::Failed;
            }
        };

        match pending.merge {
            Merge::Replace => {
                self.rows.clear();
                self.seen.clear();
                if self.view_mode == ViewMode::Scroll {
                    self.append_unseen(songs);
                } else {
                    self.seen.extend(songs.iter().map(|s| s.seed.clone()));
                    self.rows = songs;
                }
                debug!(target: LOG_TARGET, "Page {} loaded with {} rows", self.page, self.rows.len());
                ApplyOutcome::Replaced {
                    rows: self.rows.len(),
                }
            }
            Merge::Append => {
                let added = self.append_unseen(songs);
                debug!(target: LOG_TARGET, "Page {} appended {} new rows", self.page, added);
                ApplyOutcome::Appended { added }
            }
        }
    }

    /// Stop reacting to responses. Outstanding requests are abandoned.
    pub fn close(&mut self) {
        self.closed = true;
        self.pending = None;
    }

    fn append_unseen(&mut self, songs: Vec<SongSummary>) -> usize {
        let before = self.rows.len();
        for song in songs {
            if self.seen.insert(song.seed.clone()) {
                self.rows.push(song);
            }
        }
        self.rows.len() - before
    }

    fn issue(&mut self, merge: Merge, restore_page: Option<u32>) -> PageRequest {
        let token = RequestToken(self.next_token);
        self.next_token += 1;
        if let Some(old) = self.pending.replace(Pending {
            token,
            merge,
            restore_page,
        }) {
            debug!(target: LOG_TARGET, "Request {:?} superseded by {:?}", old.token, token);
        }
        let query = PageQuery::for_page(
            self.filter.seed.clone(),
            self.filter.language,
            self.filter.like_filter,
            self.page,
            self.page_size,
        );
        debug!(
            target: LOG_TARGET,
            "Requesting page {} (skip={}, take={}, seed={}, language={}, likeFilter={})",
            self.page,
            query.skip,
            query.take,
            query.seed,
            query.language,
            query.like_filter.query_value()
        );
        PageRequest {
            token,
            query,
            merge,
        }
    }
}
