//! Clock-driven stand-in for an audio output.
//!
//! The terminal has no decoder, so playback is simulated: the playhead moves
//! with wall-clock time and the controller sees the same events a real audio
//! element would report.

use seedwave_core::{
    AudioElement, AudioEvent, ExpandedSong, LyricLayout, LyricLine, PlayRejected, PlaybackPhase,
};
use std::time::Duration;
use url::Url;

/// Simulated playback clock resolution
pub const TICK: Duration = Duration::from_millis(250);

/// Seconds of outro assumed after the last lyric line
const OUTRO_SECS: f64 = 8.0;
/// Shortest track length used when estimating
const MIN_DURATION_SECS: f64 = 30.0;

#[derive(Debug, Default)]
pub struct SimulatedAudio {
    src: Option<Url>,
    playing: bool,
    position: f64,
}

impl SimulatedAudio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Move the playhead forward by `elapsed` seconds of playback.
    ///
    /// Returns the event the host would report, or `None` while paused.
    pub fn advance(&mut self, elapsed: f64, duration: f64) -> Option<AudioEvent> {
        if !self.playing {
            return None;
        }
        self.position = (self.position + elapsed.max(0.0)).min(duration);
        if self.position >= duration {
            self.playing = false;
            Some(AudioEvent::Ended)
        } else {
            Some(AudioEvent::TimeUpdate {
                current_time: self.position,
            })
        }
    }
}

impl AudioElement for SimulatedAudio {
    fn load(&mut self, src: &Url) {
        self.src = Some(src.clone());
        self.playing = false;
        self.position = 0.0;
    }

    fn play(&mut self) -> Result<(), PlayRejected> {
        if self.src.is_none() {
            return Err(PlayRejected {
                reason: "nothing loaded".to_string(),
            });
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, time: f64) {
        self.position = time.max(0.0);
    }
}

/// Guess a track length from its lyrics.
#[must_use]
pub fn estimate_duration(lines: &[LyricLine]) -> f64 {
    let last = lines
        .iter()
        .map(|l| l.time)
        .filter(|t| t.is_finite())
        .fold(0.0, f64::max);
    (last + OUTRO_SECS).max(MIN_DURATION_SECS)
}

/// What one clock tick changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub phase: PlaybackPhase,
    pub phase_changed: bool,
    /// Active lyric line, when it differs from the last tick
    pub new_line: Option<usize>,
}

/// Moves an expanded song's simulated playback along with wall-clock time.
#[derive(Debug)]
pub struct PlaybackClock {
    speed: f64,
    duration: Option<f64>,
    last_phase: Option<PlaybackPhase>,
    shown_line: Option<usize>,
}

impl PlaybackClock {
    /// `duration` overrides the length estimated from the lyrics.
    #[must_use]
    pub const fn new(speed: f64, duration: Option<f64>) -> Self {
        Self {
            speed,
            duration,
            last_phase: None,
            shown_line: None,
        }
    }

    /// Forget what was shown, for a newly opened song.
    pub fn reset(&mut self) {
        self.last_phase = None;
        self.shown_line = None;
    }

    /// Advance playback by `elapsed`.
    ///
    /// A source still loading gets its metadata first, which starts playback.
    pub fn tick(
        &mut self,
        song: &mut ExpandedSong<SimulatedAudio>,
        elapsed: Duration,
        layout: &LyricLayout,
    ) -> Option<ClockTick> {
        let duration = self
            .duration
            .unwrap_or_else(|| estimate_duration(song.lyrics()));
        let player = song.player_mut()?;
        if player.state().phase == PlaybackPhase::Loading {
            player.handle_event(AudioEvent::MetadataLoaded { duration });
        } else if let Some(event) = player
            .audio_mut()
            .advance(elapsed.as_secs_f64() * self.speed, duration)
        {
            player.handle_event(event);
        }
        let phase = player.state().phase;

        let phase_changed = self.last_phase != Some(phase);
        self.last_phase = Some(phase);
        let new_line = song
            .lyric_position(layout)
            .map(|position| position.index)
            .filter(|&index| self.shown_line != Some(index));
        if new_line.is_some() {
            self.shown_line = new_line;
        }
        Some(ClockTick {
            phase,
            phase_changed,
            new_line,
        })
    }
}
