pub mod catalogue;
pub mod config;
pub mod debounce;
pub mod download;
pub mod error;
pub mod listing;
pub mod paths;
pub mod playback;
pub mod preferences;
pub mod seed;
pub mod session;
pub mod sync;
pub mod time;

#[cfg(test)]
mod test_support;

pub use catalogue::{
    resolve_asset, CatalogueApi, Language, LikeFilter, LyricLine, PageQuery, SongDetail,
    SongSummary, ViewMode, DEFAULT_SERVICE_URL, PAGED_TOTAL_ROWS,
};
pub use config::{
    CatalogueConfig, LoggingConfig, LyricsConfig, SeedwaveConfig, ServiceConfig, API_URL_ENV,
};
pub use debounce::{Debouncer, DEFAULT_LIKE_FILTER_DEBOUNCE};
pub use download::{download_audio, sanitize_file_name};
pub use error::{CoreError, Result};
pub use listing::{
    fetch_row, is_near_bottom, ApplyOutcome, CatalogueFilter, CatalogueListController, Merge,
    PageRequest, PageResponse, PageSizes, RequestToken, ScrollViewport, DEFAULT_SCROLL_THRESHOLD,
};
pub use paths::{
    config_dir, config_path, log_file_path, preferences_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
    CONFIG_PATH_ENV, LOG_FILE_NAME, PREFERENCES_FILE_NAME,
};
pub use playback::{
    AudioElement, AudioEvent, AudioSources, PlayRejected, PlaybackController, PlaybackPhase,
    PlaybackState, PlaybackWarning,
};
pub use preferences::{PreferenceStore, Preferences};
pub use session::{DetailState, ExpandedSong, GENERATION_FAILED_MESSAGE};
pub use sync::{active_index, is_active, LyricLayout, LyricPosition};
pub use time::{format_time, secs_to_duration};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
