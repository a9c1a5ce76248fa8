use crate::catalogue::{resolve_asset, SongDetail};
use crate::error::Result;
use crate::time::format_time;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

const LOG_TARGET: &str = "seedwave::playback";

/// The host's audio output: whatever actually decodes and plays a URL.
///
/// The controller drives it through these calls and learns about progress
/// through [`AudioEvent`]s the host feeds back.
pub trait AudioElement {
    /// Start loading `src`, discarding whatever was loaded before.
    fn load(&mut self, src: &Url);

    /// Start or resume playback. Hosts may refuse (e.g. autoplay policies).
    ///
    /// # Errors
    ///
    /// Returns [`PlayRejected`] if the host refused to start playback.
    fn play(&mut self) -> std::result::Result<(), PlayRejected>;

    fn pause(&mut self);

    /// Move the playhead to `time` seconds.
    fn seek(&mut self, time: f64);
}

/// The host refused to start playback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("playback rejected: {reason}")]
pub struct PlayRejected {
    pub reason: String,
}

/// Lifecycle callbacks from an [`AudioElement`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioEvent {
    /// Metadata is available; `duration` in seconds
    MetadataLoaded { duration: f64 },
    /// Periodic playhead report
    TimeUpdate { current_time: f64 },
    /// Playback reached the end of the stream
    Ended,
    /// The source failed to load or play
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    /// No source
    #[default]
    Idle,
    /// Source set, waiting for metadata
    Loading,
    Paused,
    Playing,
    /// Finished; stays here until a new source is set
    Ended,
    /// The source failed and there is nothing left to fall back to
    Errored,
}

/// User-facing playback problems. None of them are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackWarning {
    /// The vocal mix could not be played; the instrumental is used instead
    FinalMixUnavailable,
    /// The current source could not be played at all
    LoadFailed,
}

impl PlaybackWarning {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::FinalMixUnavailable => {
                "Vocal generation quota is exhausted, the song with no lyrics is playing"
            }
            Self::LoadFailed => "Failed to load audio source.",
        }
    }
}

impl std::fmt::Display for PlaybackWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Resolved audio URLs for one song.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioSources {
    pub final_mix: Option<Url>,
    pub instrumental: Option<Url>,
}

impl AudioSources {
    /// Resolve the detail's audio paths against the service base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if a path cannot be turned into a URL.
    pub fn from_detail(detail: &SongDetail, base: &Url) -> Result<Self> {
        Ok(Self {
            final_mix: detail.final_mix().map(|p| resolve_asset(base, p)).transpose()?,
            instrumental: detail
                .instrumental()
                .map(|p| resolve_asset(base, p))
                .transpose()?,
        })
    }

    /// Source to start with: the final mix if there is one.
    #[must_use]
    pub fn initial(&self) -> Option<&Url> {
        self.final_mix.as_ref().or(self.instrumental.as_ref())
    }
}

/// Snapshot of what the player shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackState {
    pub phase: PlaybackPhase,
    pub current_src: Option<Url>,
    pub is_playing: bool,
    /// Seconds from the start of the track
    pub current_time: f64,
    /// Seconds, once metadata has loaded
    pub duration: Option<f64>,
    pub last_error: Option<PlaybackWarning>,
}

impl PlaybackState {
    /// Elapsed and total time, e.g. `1:05 / 3:20`.
    #[must_use]
    pub fn time_label(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.current_time),
            format_time(self.duration.unwrap_or(0.0))
        )
    }
}

/// Drives an [`AudioElement`] for one song and tracks its state.
pub struct PlaybackController<A: AudioElement> {
    audio: A,
    sources: AudioSources,
    state: PlaybackState,
}

impl<A: AudioElement> PlaybackController<A> {
    #[must_use]
    pub fn new(audio: A, sources: AudioSources) -> Self {
        Self {
            audio,
            sources,
            state: PlaybackState::default(),
        }
    }

    /// Load the initial source. Returns false when the song has no audio.
    pub fn start(&mut self) -> bool {
        match self.sources.initial().cloned() {
            Some(src) => {
                self.set_source(src);
                true
            }
            None => {
                debug!(target: LOG_TARGET, "No audio source to start");
                false
            }
        }
    }

    #[must_use]
    pub const fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[must_use]
    pub const fn sources(&self) -> &AudioSources {
        &self.sources
    }

    #[must_use]
    pub const fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    /// Switch to a new source: back to loading, time reset, not playing.
    pub fn set_source(&mut self, src: Url) {
        info!(target: LOG_TARGET, "Loading audio source {}", src);
        self.audio.load(&src);
        self.state.current_src = Some(src);
        self.state.phase = PlaybackPhase::Loading;
        self.state.current_time = 0.0;
        self.state.duration = None;
        self.state.is_playing = false;
    }

    /// Play if paused, pause if playing. Ignored in every other phase.
    pub fn toggle_play(&mut self) {
        match self.state.phase {
            PlaybackPhase::Playing => {
                self.audio.pause();
                self.state.phase = PlaybackPhase::Paused;
                self.state.is_playing = false;
            }
            PlaybackPhase::Paused => self.try_play(),
            phase => debug!(target: LOG_TARGET, "Toggle ignored in {:?}", phase),
        }
    }

    /// Move the playhead without changing whether audio is playing.
    pub fn seek(&mut self, time: f64) {
        if self.state.current_src.is_none() {
            return;
        }
        let time = self.clamp_time(time);
        self.audio.seek(time);
        self.state.current_time = time;
    }

    /// Apply an event reported by the audio element.
    pub fn handle_event(&mut self, event: AudioEvent) {
        if self.state.current_src.is_none() {
            debug!(target: LOG_TARGET, "Ignoring {:?} without a source", event);
            return;
        }
        match event {
            AudioEvent::MetadataLoaded { duration } => self.on_metadata(duration),
            AudioEvent::TimeUpdate { current_time } => {
                self.state.current_time = self.clamp_time(current_time);
            }
            AudioEvent::Ended => {
                self.state.phase = PlaybackPhase::Ended;
                self.state.is_playing = false;
                if let Some(duration) = self.state.duration {
                    self.state.current_time = duration;
                }
            }
            AudioEvent::Error => self.on_error(),
        }
    }

    fn on_metadata(&mut self, duration: f64) {
        if self.state.phase != PlaybackPhase::Loading {
            debug!(target: LOG_TARGET, "Metadata outside of loading, ignoring");
            return;
        }
        self.state.duration = (duration.is_finite() && duration >= 0.0).then_some(duration);
        self.state.current_time = self.clamp_time(self.state.current_time);
        self.state.phase = PlaybackPhase::Paused;
        self.try_play();
    }

    fn on_error(&mut self) {
        let on_final_mix = self.state.current_src.is_some()
            && self.state.current_src == self.sources.final_mix;
        let fallback = self
            .sources
            .instrumental
            .clone()
            .filter(|inst| Some(inst) != self.state.current_src.as_ref());

        match (on_final_mix, fallback) {
            (true, Some(instrumental)) => {
                warn!(
                    target: LOG_TARGET,
                    "Final mix unavailable, falling back to instrumental {}", instrumental
                );
                self.state.last_error = Some(PlaybackWarning::FinalMixUnavailable);
                self.set_source(instrumental);
            }
            _ => {
                warn!(
                    target: LOG_TARGET,
                    "Failed to load audio source {:?}",
                    self.state.current_src.as_ref().map(Url::as_str)
                );
                self.state.last_error = Some(PlaybackWarning::LoadFailed);
                self.state.phase = PlaybackPhase::Errored;
                self.state.is_playing = false;
            }
        }
    }

    fn try_play(&mut self) {
        match self.audio.play() {
            Ok(()) => {
                self.state.phase = PlaybackPhase::Playing;
                self.state.is_playing = true;
            }
            Err(e) => {
                // Autoplay refusal is expected on some hosts; the user can press play.
                debug!(target: LOG_TARGET, "{}", e);
                self.state.phase = PlaybackPhase::Paused;
                self.state.is_playing = false;
            }
        }
    }

    fn clamp_time(&self, time: f64) -> f64 {
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        self.state.duration.map_or(time, |d| time.min(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeAudio {
        loads: Vec<String>,
        playing: bool,
        reject_play: bool,
        seeks: Vec<f64>,
    }

    impl AudioElement for FakeAudio {
        fn load(&mut self, src: &Url) {
            self.loads.push(src.to_string());
            self.playing = false;
        }

        fn play(&mut self) -> std::result::Result<(), PlayRejected> {
            if self.reject_play {
                return Err(PlayRejected {
                    reason: "autoplay blocked".to_string(),
                });
            }
            self.playing = true;
            Ok(())
        }

        fn pause(&mut self) {
            self.playing = false;
        }

        fn seek(&mut self, time: f64) {
            self.seeks.push(time);
        }
    }

    const FINAL: &str = "http://svc.test/a/final.mp3";
    const INST: &str = "http://svc.test/a/inst.mp3";

    fn sources() -> AudioSources {
        AudioSources {
            final_mix: Some(Url::parse(FINAL).unwrap()),
            instrumental: Some(Url::parse(INST).unwrap()),
        }
    }

    fn started() -> PlaybackController<FakeAudio> {
        let mut c = PlaybackController::new(FakeAudio::default(), sources());
        assert!(c.start());
        c
    }

    #[test]
    fn test_idle_until_started() {
        let mut c = PlaybackController::new(FakeAudio::default(), sources());
        assert_eq!(c.state().phase, PlaybackPhase::Idle);
        c.toggle_play();
        c.seek(10.0);
        c.handle_event(AudioEvent::Error);
        assert_eq!(c.state(), &PlaybackState::default());
        assert!(c.audio().loads.is_empty());
    }

    #[test]
    fn test_start_without_sources() {
        let mut c = PlaybackController::new(FakeAudio::default(), AudioSources::default());
        assert!(!c.start());
        assert!(!c.state().is_playing);
        assert!(c.state().current_src.is_none());
    }

    #[test]
    fn test_start_prefers_final_mix() {
        let c = started();
        assert_eq!(c.state().phase, PlaybackPhase::Loading);
        assert_eq!(c.audio().loads, vec![FINAL]);
        let only_inst = AudioSources {
            final_mix: None,
            instrumental: Some(Url::parse(INST).unwrap()),
        };
        assert_eq!(only_inst.initial().map(Url::as_str), Some(INST));
    }

    #[test]
    fn test_metadata_autoplays() {
        let mut c = started();
        c.handle_event(AudioEvent::MetadataLoaded { duration: 180.0 });
        assert_eq!(c.state().phase, PlaybackPhase::Playing);
        assert!(c.state().is_playing);
        assert_eq!(c.state().duration, Some(180.0));
        assert!(c.audio().playing);
    }

    #[test]
    fn test_autoplay_rejection_stays_paused_without_warning() {
        let mut c = started();
        c.audio_mut().reject_play = true;
        c.handle_event(AudioEvent::MetadataLoaded { duration: 60.0 });
        assert_eq!(c.state().phase, PlaybackPhase::Paused);
        assert!(!c.state().is_playing);
        assert_eq!(c.state().last_error, None);
    }

    #[test]
    fn test_toggle_play() {
        let mut c = started();
        c.toggle_play();
        assert_eq!(c.state().phase, PlaybackPhase::Loading);
        c.handle_event(AudioEvent::MetadataLoaded { duration: 60.0 });
        c.toggle_play();
        assert_eq!(c.state().phase, PlaybackPhase::Paused);
        assert!(!c.audio().playing);
        c.toggle_play();
        assert_eq!(c.state().phase, PlaybackPhase::Playing);
        assert!(c.audio().playing);
    }

    #[test]
    fn test_new_source_while_playing_resets() {
        let mut c = started();
        c.handle_event(AudioEvent::MetadataLoaded { duration: 60.0 });
        c.handle_event(AudioEvent::TimeUpdate { current_time: 30.0 });
        c.set_source(Url::parse(INST).unwrap());
        let s = c.state();
        assert_eq!(s.phase, PlaybackPhase::Loading);
        assert!((s.current_time).abs() < f64::EPSILON);
        assert_eq!(s.duration, None);
        assert!(!s.is_playing);
    }

    #[test]
    fn test_time_updates_clamped_to_duration() {
        let mut c = started();
        c.handle_event(AudioEvent::MetadataLoaded { duration: 60.0 });
        c.handle_event(AudioEvent::TimeUpdate { current_time: 12.5 });
        assert!((c.state().current_time - 12.5).abs() < f64::EPSILON);
        c.handle_event(AudioEvent::TimeUpdate { current_time: 90.0 });
        assert!((c.state().current_time - 60.0).abs() < f64::EPSILON);
        c.handle_event(AudioEvent::TimeUpdate { current_time: -4.0 });
        assert!(c.state().current_time.abs() < f64::EPSILON);
    }

    #[test]
    fn test_seek_keeps_play_state() {
        let mut c = started();
        c.handle_event(AudioEvent::MetadataLoaded { duration: 60.0 });
        c.seek(42.0);
        assert!(c.state().is_playing);
        assert!((c.state().current_time - 42.0).abs() < f64::EPSILON);
        c.toggle_play();
        c.seek(75.0);
        assert!(!c.state().is_playing);
        assert!((c.state().current_time - 60.0).abs() < f64::EPSILON);
        assert_eq!(c.audio().seeks, vec![42.0, 60.0]);
    }

    #[test]
    fn test_ended_is_terminal_until_new_source() {
        let mut c = started();
        c.handle_event(AudioEvent::MetadataLoaded { duration: 60.0 });
        c.handle_event(AudioEvent::Ended);
        assert_eq!(c.state().phase, PlaybackPhase::Ended);
        assert!(!c.state().is_playing);
        c.toggle_play();
        assert_eq!(c.state().phase, PlaybackPhase::Ended);
        c.set_source(Url::parse(FINAL).unwrap());
        assert_eq!(c.state().phase, PlaybackPhase::Loading);
    }

    #[test]
    fn test_final_mix_error_falls_back_once() {
        let mut c = started();
        c.handle_event(AudioEvent::Error);
        assert_eq!(c.state().last_error, Some(PlaybackWarning::FinalMixUnavailable));
        assert_eq!(c.state().phase, PlaybackPhase::Loading);
        assert_eq!(c.state().current_src.as_ref().map(Url::as_str), Some(INST));
        assert!(!c.state().is_playing);

        c.handle_event(AudioEvent::Error);
        assert_eq!(c.state().last_error, Some(PlaybackWarning::LoadFailed));
        assert_eq!(c.state().phase, PlaybackPhase::Errored);
        assert_eq!(c.audio().loads, vec![FINAL, INST]);

        c.handle_event(AudioEvent::Error);
        assert_eq!(c.audio().loads.len(), 2);
    }

    #[test]
    fn test_fallback_then_autoplay() {
        let mut c = started();
        c.handle_event(AudioEvent::Error);
        c.handle_event(AudioEvent::MetadataLoaded { duration: 30.0 });
        assert_eq!(c.state().phase, PlaybackPhase::Playing);
        assert_eq!(c.state().last_error, Some(PlaybackWarning::FinalMixUnavailable));
    }

    #[test]
    fn test_final_mix_error_without_instrumental() {
        let only_final = AudioSources {
            final_mix: Some(Url::parse(FINAL).unwrap()),
            instrumental: None,
        };
        let mut c = PlaybackController::new(FakeAudio::default(), only_final);
        c.start();
        c.handle_event(AudioEvent::Error);
        assert_eq!(c.state().last_error, Some(PlaybackWarning::LoadFailed));
        assert_eq!(c.state().phase, PlaybackPhase::Errored);
    }

    #[test]
    fn test_sources_from_detail() {
        let detail = SongDetail {
            seed: "1".to_string(),
            final_mix_path: Some("/files/1_mix.mp3".to_string()),
            instrumental_path: Some(String::new()),
            ..Default::default()
        };
        let base = Url::parse("http://svc.test").unwrap();
        let s = AudioSources::from_detail(&detail, &base).unwrap();
        assert_eq!(s.final_mix.as_ref().map(Url::as_str), Some("http://svc.test/files/1_mix.mp3"));
        assert_eq!(s.instrumental, None);
    }

    #[test]
    fn test_time_label() {
        let state = PlaybackState {
            current_time: 65.0,
            duration: Some(200.0),
            ..Default::default()
        };
        assert_eq!(state.time_label(), "1:05 / 3:20");
        assert_eq!(PlaybackState::default().time_label(), "0:00 / 0:00");
    }
}
