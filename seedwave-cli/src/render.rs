//! Plain-text views of controller state.

use crate::player::SimulatedAudio;
use seedwave_core::{
    CatalogueListController, ExpandedSong, LyricLine, PlaybackPhase, PlaybackState, ViewMode,
};
use std::fmt::Write;
use std::ops::Range;

/// Lines shown on each side of the active lyric
const LYRIC_CONTEXT: usize = 2;

/// Catalogue rows with their row numbers, plus a footer for the current mode.
#[must_use]
pub fn rows(list: &CatalogueListController) -> String {
    rows_in(list, 0..list.rows().len())
}

/// Like [`rows`], limited to the rows in `window`.
#[must_use]
pub fn rows_in(list: &CatalogueListController, window: Range<usize>) -> String {
    let mut out = String::new();
    let filter = list.filter();
    let _ = writeln!(
        out,
        "seed {} | {} | likes {} | {} mode",
        filter.seed,
        filter.language,
        filter.like_filter.label(),
        list.view_mode()
    );
    let _ = writeln!(
        out,
        "{:>5}  {:<24} {:<28} {:<24} {:<14} {:>5}",
        "#", "Artist", "Song", "Album", "Genre", "Likes"
    );
    let shown = window.start.min(list.rows().len())..window.end.min(list.rows().len());
    for (index, song) in list.rows().iter().enumerate().skip(shown.start).take(shown.len()) {
        let _ = writeln!(
            out,
            "{:>5}  {:<24} {:<28} {:<24} {:<14} {:>5}",
            list.row_number(index),
            clip(&song.artist_name, 24),
            clip(&song.music_name, 28),
            clip(&song.album_title, 24),
            clip(&song.genre, 14),
            song.likes_label()
        );
    }
    if list.rows().is_empty() && !list.is_loading() {
        let _ = writeln!(out, "  (no songs)");
    }
    match list.view_mode() {
        ViewMode::Table => {
            let _ = write!(out, "page {} of {}", list.page(), list.page_count());
        }
        ViewMode::Scroll => {
            if shown.len() < list.rows().len() {
                let _ = write!(out, "rows {}-{} of ", shown.start + 1, shown.end);
            }
            let _ = write!(out, "{} songs loaded", list.rows().len());
            if list.is_loading_more() {
                let _ = write!(out, " | Loading more...");
            }
        }
    }
    out
}

/// A window of lyrics around the active line, which is marked with `>`.
#[must_use]
pub fn lyrics_window(lines: &[LyricLine], active: usize) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let active = active.min(lines.len() - 1);
    let start = active.saturating_sub(LYRIC_CONTEXT);
    let end = (active + LYRIC_CONTEXT + 1).min(lines.len());
    lines[start..end]
        .iter()
        .enumerate()
        .map(|(offset, line)| {
            let marker = if start + offset == active { '>' } else { ' ' };
            format!("{marker} {}", line.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line player status, followed by the warning if there is one.
#[must_use]
pub fn player_status(state: &PlaybackState) -> String {
    let phase = match state.phase {
        PlaybackPhase::Idle => "idle",
        PlaybackPhase::Loading => "loading",
        PlaybackPhase::Paused => "paused",
        PlaybackPhase::Playing => "playing",
        PlaybackPhase::Ended => "ended",
        PlaybackPhase::Errored => "unavailable",
    };
    let mut out = format!("[{phase}] {}", state.time_label());
    if let Some(warning) = state.last_error {
        let _ = write!(out, "\n! {warning}");
    }
    out
}

/// Summary of an expanded row: generation state, cover art and sources.
#[must_use]
pub fn expanded(song: &ExpandedSong<SimulatedAudio>) -> String {
    let summary = song.song();
    let mut out = format!("{} - {}", summary.artist_name, summary.music_name);
    if song.is_generating() {
        out.push_str("\n  generating...");
        return out;
    }
    if let Some(message) = song.error_message() {
        let _ = write!(out, "\n  {message}");
        return out;
    }
    let _ = write!(
        out,
        "\n  album {} | genre {} | likes {}",
        summary.album_title,
        summary.genre,
        summary.likes_label()
    );
    let cover = song
        .cover_url()
        .map_or_else(|| "default artwork".to_string(), ToString::to_string);
    let _ = write!(out, "\n  cover: {cover}");
    match song.player() {
        Some(player) => {
            let sources = player.sources();
            if let Some(mix) = &sources.final_mix {
                let _ = write!(out, "\n  final mix: {mix}");
            }
            if let Some(inst) = &sources.instrumental {
                let _ = write!(out, "\n  instrumental: {inst}");
            }
        }
        None => out.push_str("\n  no audio"),
    }
    let _ = write!(out, "\n  {} lyric lines", song.lyrics().len());
    out
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedwave_core::{
        CatalogueFilter, Language, PageResponse, PageSizes, PlaybackWarning, SongSummary,
    };

    fn song(i: u32) -> SongSummary {
        SongSummary {
            seed: format!("s{i}"),
            artist_name: format!("Artist {i}"),
            music_name: format!("Song {i}"),
            album_title: "Single".to_string(),
            genre: "Pop".to_string(),
            likes: 3.4,
        }
    }

    #[test]
    fn test_table_rows_numbered_by_page() {
        let mut list = CatalogueListController::new(
            CatalogueFilter::new("42", Language::En),
            ViewMode::Table,
            PageSizes::default(),
        );
        let _ = list.reload();
        let request = list.go_to_page(3).unwrap();
        list.apply_response(PageResponse {
            token: request.token,
            result: Ok(vec![song(1), song(2)]),
        });

        let text = rows(&list);
        assert!(text.starts_with("seed 42 | en | likes All | table mode"));
        assert!(text.contains("   21  Artist 1"));
        assert!(text.contains("   22  Artist 2"));
        assert!(text.contains("3.4"));
        assert!(text.ends_with("page 3 of 1000"));
    }

    #[test]
    fn test_scroll_footer_shows_loading_more() {
        let mut list = CatalogueListController::new(
            CatalogueFilter::new("42", Language::En),
            ViewMode::Scroll,
            PageSizes::default(),
        );
        let request = list.reload();
        list.apply_response(PageResponse {
            token: request.token,
            result: Ok(vec![song(1)]),
        });
        let _ = list.scrolled_near_bottom().unwrap();
        assert!(rows(&list).ends_with("1 songs loaded | Loading more..."));
    }

    #[test]
    fn test_scroll_window_shows_slice() {
        let mut list = CatalogueListController::new(
            CatalogueFilter::new("42", Language::En),
            ViewMode::Scroll,
            PageSizes::default(),
        );
        let request = list.reload();
        list.apply_response(PageResponse {
            token: request.token,
            result: Ok((1..=15).map(song).collect()),
        });

        let text = rows_in(&list, 5..10);
        assert!(!text.contains("Artist 5 "));
        assert!(text.contains("    6  Artist 6"));
        assert!(text.contains("   10  Artist 10"));
        assert!(!text.contains("Artist 11"));
        assert!(text.ends_with("rows 6-10 of 15 songs loaded"));
        assert!(rows(&list).ends_with("\n15 songs loaded"));
    }

    #[test]
    fn test_lyrics_window() {
        let lines: Vec<_> = (0..6)
            .map(|i| LyricLine::new(f64::from(i), format!("line {i}")))
            .collect();
        assert_eq!(lyrics_window(&lines, 0), "> line 0\n  line 1\n  line 2");
        assert_eq!(
            lyrics_window(&lines, 3),
            "  line 1\n  line 2\n> line 3\n  line 4\n  line 5"
        );
        assert_eq!(lyrics_window(&lines, 9), "  line 3\n  line 4\n> line 5");
        assert_eq!(lyrics_window(&[], 0), "");
    }

    #[test]
    fn test_player_status_with_warning() {
        let state = PlaybackState {
            phase: PlaybackPhase::Playing,
            current_time: 65.0,
            duration: Some(200.0),
            last_error: Some(PlaybackWarning::FinalMixUnavailable),
            ..PlaybackState::default()
        };
        assert_eq!(
            player_status(&state),
            "[playing] 1:05 / 3:20\n! Vocal generation quota is exhausted, the song with no lyrics is playing"
        );
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("abcdefghij", 5), "abcd…");
    }
}
