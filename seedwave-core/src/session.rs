//! An expanded catalogue row: generated detail, player and lyrics for one song.

use crate::catalogue::{CatalogueApi, Language, LyricLine, SongDetail, SongSummary};
use crate::download::download_audio;
use crate::error::{CoreError, Result};
use crate::playback::{AudioElement, AudioSources, PlaybackController};
use crate::sync::{LyricLayout, LyricPosition};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use url::Url;

const LOG_TARGET: &str = "seedwave::session";

/// Message shown when the service could not generate a song
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate song.";

/// Where the song's generated detail stands.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Generating,
    Ready(SongDetail),
    Failed(String),
}

/// Everything owned by one expanded row. Dropping it releases the player.
pub struct ExpandedSong<A: AudioElement> {
    song: SongSummary,
    language: Language,
    detail: DetailState,
    player: Option<PlaybackController<A>>,
    cover_url: Option<Url>,
}

impl<A: AudioElement> ExpandedSong<A> {
    #[must_use]
    pub const fn new(song: SongSummary, language: Language) -> Self {
        Self {
            song,
            language,
            detail: DetailState::Generating,
            player: None,
            cover_url: None,
        }
    }

    /// Expand a row: request generation once and start playback when ready.
    pub async fn open(
        api: &dyn CatalogueApi,
        song: SongSummary,
        language: Language,
        audio: A,
    ) -> Self {
        let mut expanded = Self::new(song, language);
        let result = api.generate_song(&expanded.song.seed, language).await;
        expanded.finish_generation(result, api.base_url(), audio);
        expanded
    }

    /// Apply the outcome of the generation request. Only the first call has
    /// any effect.
    pub fn finish_generation(&mut self, result: Result<SongDetail>, base: &Url, audio: A) {
        if self.detail != DetailState::Generating {
            return;
        }
        let detail = match result {
            Ok(detail) => detail,
            Err(e) => {
                error!(target: LOG_TARGET, "Generation failed for {}: {}", self.song.seed, e);
                self.detail = DetailState::Failed(GENERATION_FAILED_MESSAGE.to_string());
                return;
            }
        };

        info!(
            target: LOG_TARGET,
            "Generated {} - {} ({} lyric lines)",
            self.song.artist_name,
            self.song.music_name,
            detail.lyrics.len()
        );

        self.cover_url = detail.image_url(base).unwrap_or_else(|e| {
            warn!(target: LOG_TARGET, "Unusable cover art path: {}", e);
            None
        });

        match AudioSources::from_detail(&detail, base) {
            Ok(sources) => {
                let mut player = PlaybackController::new(audio, sources);
                if !player.start() {
                    warn!(target: LOG_TARGET, "Song {} has no audio", self.song.seed);
                }
                self.player = Some(player);
            }
            Err(e) => warn!(target: LOG_TARGET, "Unusable audio paths: {}", e),
        }
        self.detail = DetailState::Ready(detail);
    }

    #[must_use]
    pub const fn song(&self) -> &SongSummary {
        &self.song
    }

    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub const fn detail(&self) -> &DetailState {
        &self.detail
    }

    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.detail == DetailState::Generating
    }

    /// Error to show instead of the player, if generation failed.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.detail {
            DetailState::Failed(message) => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn lyrics(&self) -> &[LyricLine] {
        match &self.detail {
            DetailState::Ready(detail) => &detail.lyrics,
            _ => &[],
        }
    }

    /// Cover art URL; `None` means the default artwork should be shown.
    #[must_use]
    pub const fn cover_url(&self) -> Option<&Url> {
        self.cover_url.as_ref()
    }

    #[must_use]
    pub const fn player(&self) -> Option<&PlaybackController<A>> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut PlaybackController<A>> {
        self.player.as_mut()
    }

    /// Active lyric line for the current playback time. `None` without lyrics.
    #[must_use]
    pub fn lyric_position(&self, layout: &LyricLayout) -> Option<LyricPosition> {
        let lines = self.lyrics();
        if lines.is_empty() {
            return None;
        }
        let time = self.player.as_ref().map_or(0.0, |p| p.state().current_time);
        Some(layout.position(time, lines))
    }

    /// Save the audio currently loaded in the player to `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is loaded or the download fails.
    pub async fn download(&self, api: &dyn CatalogueApi, dir: &Path) -> Result<PathBuf> {
        let src = self
            .player
            .as_ref()
            .and_then(|p| p.state().current_src.clone())
            .ok_or_else(|| CoreError::NoAudioSource {
                seed: self.song.seed.clone(),
            })?;
        download_audio(api, &src, &self.song, dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{AudioEvent, PlayRejected, PlaybackPhase};
    use crate::test_support::{song, FakeCatalogue};

    #[derive(Default)]
    struct SilentAudio;

    impl AudioElement for SilentAudio {
        fn load(&mut self, _src: &Url) {}
        fn play(&mut self) -> std::result::Result<(), PlayRejected> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn seek(&mut self, _time: f64) {}
    }

    fn detail(seed: &str) -> SongDetail {
        SongDetail {
            seed: seed.to_string(),
            genre: "Synthwave".to_string(),
            final_mix_path: Some(format!("/files/{seed}_mix.mp3")),
            instrumental_path: Some(format!("/files/{seed}_inst.mp3")),
            image_path: Some(format!("/files/{seed}.png")),
            lyrics: vec![
                LyricLine::new(0.0, "first"),
                LyricLine::new(10.0, "second"),
                LyricLine::new(20.0, "third"),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_open_starts_final_mix() {
        let api = FakeCatalogue::new().with_detail(detail("5"));
        let expanded = ExpandedSong::open(&api, song("5"), Language::En, SilentAudio).await;

        assert!(matches!(expanded.detail(), DetailState::Ready(_)));
        let state = expanded.player().unwrap().state();
        assert_eq!(state.phase, PlaybackPhase::Loading);
        assert_eq!(
            state.current_src.as_ref().map(Url::as_str),
            Some("http://catalogue.test/files/5_mix.mp3")
        );
        assert_eq!(
            expanded.cover_url().map(Url::as_str),
            Some("http://catalogue.test/files/5.png")
        );
    }

    #[tokio::test]
    async fn test_generation_failure_message() {
        let api = FakeCatalogue::new();
        let expanded = ExpandedSong::open(&api, song("6"), Language::Ru, SilentAudio).await;
        assert_eq!(expanded.error_message(), Some(GENERATION_FAILED_MESSAGE));
        assert!(expanded.player().is_none());
        assert!(expanded.lyrics().is_empty());
        assert!(expanded.cover_url().is_none());
    }

    #[test]
    fn test_generation_applied_once() {
        let base = Url::parse("http://catalogue.test").unwrap();
        let mut expanded: ExpandedSong<SilentAudio> = ExpandedSong::new(song("5"), Language::En);
        assert!(expanded.is_generating());
        expanded.finish_generation(Ok(detail("5")), &base, SilentAudio);
        expanded.finish_generation(
            Err(CoreError::GenerationFailed {
                seed: "5".to_string(),
                reason: "late".to_string(),
            }),
            &base,
            SilentAudio,
        );
        assert!(matches!(expanded.detail(), DetailState::Ready(_)));
    }

    #[tokio::test]
    async fn test_lyric_position_follows_playback() {
        let api = FakeCatalogue::new().with_detail(detail("5"));
        let mut expanded = ExpandedSong::open(&api, song("5"), Language::En, SilentAudio).await;
        let layout = LyricLayout::new(120.0, 40.0);

        assert_eq!(expanded.lyric_position(&layout).unwrap().index, 0);
        let player = expanded.player_mut().unwrap();
        player.handle_event(AudioEvent::MetadataLoaded { duration: 30.0 });
        player.handle_event(AudioEvent::TimeUpdate { current_time: 12.0 });
        let pos = expanded.lyric_position(&layout).unwrap();
        assert_eq!(pos.index, 1);
        assert!((pos.offset - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_download_current_source() {
        let api = FakeCatalogue::new()
            .with_detail(detail("5"))
            .with_asset("http://catalogue.test/files/5_inst.mp3", b"inst");
        let mut expanded = ExpandedSong::open(&api, song("5"), Language::En, SilentAudio).await;
        expanded.player_mut().unwrap().handle_event(AudioEvent::Error);

        let dir = tempfile::tempdir().unwrap();
        let path = expanded.download(&api, dir.path()).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"inst");
    }

    #[tokio::test]
    async fn test_download_without_source() {
        let api = FakeCatalogue::new();
        let expanded = ExpandedSong::open(&api, song("6"), Language::En, SilentAudio).await;
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            expanded.download(&api, dir.path()).await,
            Err(CoreError::NoAudioSource { .. })
        ));
    }
}
