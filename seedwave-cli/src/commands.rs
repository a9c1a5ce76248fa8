use crate::browse::{Browser, ROW_HEIGHT, VISIBLE_ROWS};
use crate::cli::{BrowseArgs, DownloadArgs, FilterArgs, ListArgs, SongArgs, SongTarget};
use crate::player::{PlaybackClock, SimulatedAudio, TICK};
use crate::render;
use seedwave_catalogue_http::HttpCatalogue;
use seedwave_core::{
    download_audio, fetch_row, seed, ApplyOutcome, CatalogueFilter, CatalogueListController,
    CoreError, Debouncer, ExpandedSong, LikeFilter, PageRequest, PlaybackPhase, PreferenceStore,
    Result, ScrollViewport, SeedwaveConfig, SongSummary, ViewMode,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "seedwave::cli";

/// Everything a command needs from start-up.
pub struct Context {
    pub config: SeedwaveConfig,
    pub api: Arc<HttpCatalogue>,
    pub cancel: CancellationToken,
}

pub fn print_seed() {
    println!("{}", seed::generate());
}

fn catalogue_filter(args: &FilterArgs, config: &SeedwaveConfig) -> CatalogueFilter {
    let seed = args.seed.clone().unwrap_or_else(seed::generate);
    let language = args.language.unwrap_or(config.catalogue.default_language);
    CatalogueFilter {
        like_filter: args.likes.map_or(LikeFilter::Any, LikeFilter::from_slider),
        ..CatalogueFilter::new(seed, language)
    }
}

/// Run one request, unless shutdown is requested first.
async fn fetch(
    ctx: &Context,
    list: &mut CatalogueListController,
    request: PageRequest,
) -> Option<ApplyOutcome> {
    tokio::select! {
        () = ctx.cancel.cancelled() => None,
        response = request.execute(ctx.api.as_ref()) => Some(list.apply_response(response)),
    }
}

pub async fn list(ctx: &Context, args: ListArgs) {
    let mode = args.mode.unwrap_or_default();
    let mut sizes = ctx.config.page_sizes();
    if let Some(size) = args.page_size {
        match mode {
            ViewMode::Table => sizes.table = size,
            ViewMode::Scroll => sizes.scroll = size,
        }
    }

    let mut list =
        CatalogueListController::new(catalogue_filter(&args.filter, &ctx.config), mode, sizes);
    let request = match mode {
        ViewMode::Table if args.page > 1 => list.go_to_page(args.page),
        _ => None,
    }
    .unwrap_or_else(|| list.reload());

    let mut outcome = fetch(ctx, &mut list, request).await;
    if mode == ViewMode::Scroll {
        for _ in 1..args.pages {
            if !matches!(outcome, Some(ApplyOutcome::Replaced { .. } | ApplyOutcome::Appended { .. })) {
                break;
            }
            let Some(request) = list.scrolled_near_bottom() else {
                break;
            };
            outcome = fetch(ctx, &mut list, request).await;
        }
    }

    match outcome {
        Some(ApplyOutcome::Failed) => println!("Could not load songs."),
        None => return,
        Some(_) => {}
    }
    println!("{}", render::rows(&list));
}

pub async fn browse(ctx: &Context, args: BrowseArgs) {
    let preferences = PreferenceStore::open_default();
    let mode = args.mode.unwrap_or_else(|| preferences.view_mode());
    let list = CatalogueListController::new(
        catalogue_filter(&args.filter, &ctx.config),
        mode,
        ctx.config.page_sizes(),
    );
    let slider = Debouncer::new(ctx.config.like_filter_debounce());
    let viewport = ScrollViewport::new(
        ROW_HEIGHT,
        VISIBLE_ROWS,
        ctx.config.catalogue.scroll_threshold,
    );
    Browser::new(
        Arc::clone(&ctx.api),
        list,
        slider,
        preferences,
        viewport,
        ctx.config.lyric_layout(),
    )
    .run(ctx.cancel.clone())
    .await;
}

/// Stand-in row for a song opened by its own seed; the service only knows
/// names through catalogue rows.
fn direct_summary(seed: &str) -> SongSummary {
    SongSummary {
        seed: seed.to_string(),
        artist_name: "Seedwave".to_string(),
        music_name: format!("Song {seed}"),
        album_title: "Single".to_string(),
        genre: String::new(),
        likes: 0.0,
    }
}

/// Find the row a [`SongTarget`] names.
async fn target_summary(ctx: &Context, target: &SongTarget) -> Result<SongSummary> {
    if let (Some(row), Some(catalogue)) = (target.row, &target.catalogue) {
        let filter = CatalogueFilter {
            like_filter: target.likes.map_or(LikeFilter::Any, LikeFilter::from_slider),
            ..CatalogueFilter::new(catalogue.clone(), target_language(ctx, target))
        };
        return fetch_row(ctx.api.as_ref(), &filter, ctx.config.page_sizes().table, row).await;
    }
    // clap requires a seed whenever no row is given
    Ok(direct_summary(target.seed.as_deref().unwrap_or_default()))
}

fn target_language(ctx: &Context, target: &SongTarget) -> seedwave_core::Language {
    target
        .language
        .unwrap_or(ctx.config.catalogue.default_language)
}

/// Generate the targeted song. `Ok(None)` when shutdown was requested.
async fn open_song(
    ctx: &Context,
    target: &SongTarget,
) -> Result<Option<ExpandedSong<SimulatedAudio>>> {
    let open = async {
        let summary = target_summary(ctx, target).await?;
        info!(target: LOG_TARGET, "Opening {} - {} ({})", summary.artist_name, summary.music_name, summary.seed);
        let expanded = ExpandedSong::open(
            ctx.api.as_ref(),
            summary,
            target_language(ctx, target),
            SimulatedAudio::new(),
        )
        .await;
        Ok::<_, CoreError>(expanded)
    };
    tokio::select! {
        () = ctx.cancel.cancelled() => Ok(None),
        expanded = open => expanded.map(Some),
    }
}

pub async fn song(ctx: &Context, args: SongArgs) {
    let mut expanded = match open_song(ctx, &args.target).await {
        Ok(Some(expanded)) => expanded,
        Ok(None) => return,
        Err(e) => {
            tracing::error!(target: LOG_TARGET, "Could not open song: {}", e);
            return;
        }
    };
    println!("{}", render::expanded(&expanded));
    if expanded.error_message().is_some() {
        return;
    }

    let speed = if args.speed.is_finite() && args.speed > 0.0 {
        args.speed
    } else {
        warn!(target: LOG_TARGET, "Ignoring playback speed {}, using 1.0", args.speed);
        1.0
    };
    if expanded.player().is_none() {
        return;
    }
    let layout = ctx.config.lyric_layout();
    let mut clock = PlaybackClock::new(speed, args.duration);
    info!(target: LOG_TARGET, "Playing {} at {}x", expanded.song().seed, speed);

    let mut ticker = tokio::time::interval(TICK);
    loop {
        tokio::select! {
            () = ctx.cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(tick) = clock.tick(&mut expanded, TICK, &layout) else {
            break;
        };
        if let Some(line) = tick.new_line {
            debug!(target: LOG_TARGET, "Lyric {} of {}", line, expanded.lyrics().len());
            println!("{}\n", render::lyrics_window(expanded.lyrics(), line));
        }
        if matches!(tick.phase, PlaybackPhase::Ended | PlaybackPhase::Errored) {
            break;
        }
    }

    if let Some(player) = expanded.player() {
        println!("{}", render::player_status(player.state()));
    }
}

pub async fn download(ctx: &Context, args: DownloadArgs) {
    if let Err(e) = try_download(ctx, &args).await {
        tracing::error!(target: LOG_TARGET, "Download failed: {}", e);
    }
}

async fn try_download(ctx: &Context, args: &DownloadArgs) -> Result<()> {
    let Some(expanded) = open_song(ctx, &args.target).await? else {
        return Ok(());
    };
    let seed = expanded.song().seed.clone();
    if let Some(message) = expanded.error_message() {
        return Err(CoreError::GenerationFailed {
            seed,
            reason: message.to_string(),
        });
    }

    let saved = if args.instrumental {
        let src = expanded
            .player()
            .and_then(|p| p.sources().instrumental.clone())
            .ok_or(CoreError::NoAudioSource { seed })?;
        tokio::select! {
            () = ctx.cancel.cancelled() => return Ok(()),
            saved = download_audio(ctx.api.as_ref(), &src, expanded.song(), &args.dir) => saved?,
        }
    } else {
        tokio::select! {
            () = ctx.cancel.cancelled() => return Ok(()),
            saved = expanded.download(ctx.api.as_ref(), &args.dir) => saved?,
        }
    };
    println!("saved {}", saved.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedwave_core::Language;

    #[test]
    fn test_catalogue_filter_from_args() {
        let mut config = SeedwaveConfig::default();
        config.catalogue.default_language = Language::Ru;

        let args = FilterArgs {
            seed: Some("42".to_string()),
            language: None,
            likes: Some(0.0),
        };
        let filter = catalogue_filter(&args, &config);
        assert_eq!(filter.seed, "42");
        assert_eq!(filter.language, Language::Ru);
        assert_eq!(filter.like_filter, LikeFilter::Any);

        let args = FilterArgs {
            seed: None,
            language: Some(Language::En),
            likes: Some(3.5),
        };
        let filter = catalogue_filter(&args, &config);
        assert!(filter.seed.parse::<u64>().is_ok());
        assert_eq!(filter.like_filter, LikeFilter::AtLeast(3.5));
    }

    #[test]
    fn test_direct_summary_names_download() {
        assert_eq!(direct_summary("77").download_stem(), "Seedwave - Song 77");
    }
}
