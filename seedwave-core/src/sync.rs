//! Lyric synchronization against playback time.
//!
//! Everything here is a pure function of the current time and the lyric
//! lines; callers recompute on every time update.

use crate::catalogue::LyricLine;

/// Index of the line that should be highlighted at `time`.
///
/// This is the greatest index whose start time is `<= time`, scanning in
/// order, so out-of-order input resolves to the later line. Returns 0 when no
/// line has started yet, when `lines` is empty, or when `time` is NaN.
#[must_use]
pub fn active_index(time: f64, lines: &[LyricLine]) -> usize {
    lines
        .iter()
        .enumerate()
        .rev()
        .find(|(_, line)| line.time <= time)
        .map_or(0, |(i, _)| i)
}

/// Whether line `index` is the one playing at `time`.
///
/// True when the line has started and either it is the last line or the
/// next line has not started yet. Out-of-range indices are never active.
#[must_use]
pub fn is_active(time: f64, lines: &[LyricLine], index: usize) -> bool {
    let Some(line) = lines.get(index) else {
        return false;
    };
    if time < line.time || time.is_nan() {
        return false;
    }
    lines.get(index + 1).map_or(true, |next| time < next.time)
}

/// Geometry of a fixed-height scrolling lyric list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LyricLayout {
    pub container_height: f64,
    pub line_height: f64,
}

impl LyricLayout {
    #[must_use]
    pub const fn new(container_height: f64, line_height: f64) -> Self {
        Self {
            container_height,
            line_height,
        }
    }

    /// Vertical offset that centres line `index` in the container.
    #[must_use]
    pub fn scroll_offset(&self, index: usize) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let index = index as f64;
        self.container_height / 2.0 - self.line_height / 2.0 - index * self.line_height
    }

    /// Active line and scroll offset for `time`.
    #[must_use]
    pub fn position(&self, time: f64, lines: &[LyricLine]) -> LyricPosition {
        let index = active_index(time, lines);
        LyricPosition {
            index,
            offset: self.scroll_offset(index),
        }
    }
}

/// Result of a layout pass: which line is active and where to scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LyricPosition {
    pub index: usize,
    pub offset: f64,
}
