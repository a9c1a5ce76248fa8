//! Interactive catalogue browser driven by stdin commands.

use crate::player::{PlaybackClock, SimulatedAudio, TICK};
use crate::render;
use seedwave_catalogue_http::HttpCatalogue;
use seedwave_core::{
    ApplyOutcome, CatalogueApi, CatalogueListController, Debouncer, ExpandedSong, Language,
    LikeFilter, LyricLayout, PageRequest, PageResponse, PlaybackController, PreferenceStore,
    Result, ScrollViewport, SongDetail, ViewMode,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const LOG_TARGET: &str = "seedwave::browse";

/// Rows printed at once in scroll mode
pub const VISIBLE_ROWS: usize = 10;
/// Nominal height of one row, in the units of `catalogue.scroll_threshold`
pub const ROW_HEIGHT: f64 = 40.0;

const HELP: &str = "\
commands:
  n | next              next page (table mode)
  p | prev              previous page (table mode)
  page <n>              jump to page n (table mode)
  down [n] | up [n]     scroll n rows, a screen by default (scroll mode)
  more                  load the next page (scroll mode)
  seed <value>          switch catalogue seed
  random                switch to a random seed
  lang [en|ru]          switch language (toggles when omitted)
  likes <0-10>          minimum likes, applied once you stop adjusting (0 = any)
  clear                 remove the likes filter now
  mode [table|scroll]   switch view mode (toggles when omitted)
  size <n>              page size for the current mode
  open <row>            expand a row and generate its song
  close                 collapse the expanded row
  t | toggle            play or pause the expanded song
  seek <secs>           jump to a time in the expanded song
  download [dir]        save the expanded song's audio
  show                  print the current rows again
  help                  this text
  q | quit              exit";

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowseCommand {
    NextPage,
    PrevPage,
    GoToPage(u32),
    More,
    Down(Option<u32>),
    Up(Option<u32>),
    Seed(String),
    RandomSeed,
    Language(Option<Language>),
    Likes(f64),
    ClearLikes,
    Mode(Option<ViewMode>),
    PageSize(u32),
    Open(u64),
    Close,
    TogglePlay,
    Seek(f64),
    Download(Option<PathBuf>),
    Show,
    Help,
    Quit,
}

/// Parse a line typed at the browser prompt.
///
/// # Errors
///
/// Returns a message for the user if the line is not a known command.
pub fn parse_command(line: &str) -> std::result::Result<BrowseCommand, String> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(BrowseCommand::Show);
    };
    let arg = words.next();
    let command = match (name.to_ascii_lowercase().as_str(), arg) {
        ("n" | "next", None) => BrowseCommand::NextPage,
        ("p" | "prev", None) => BrowseCommand::PrevPage,
        ("page", Some(n)) => BrowseCommand::GoToPage(number(n)?),
        ("more", None) => BrowseCommand::More,
        ("down" | "d", rows) => BrowseCommand::Down(rows.map(number).transpose()?),
        ("up" | "u", rows) => BrowseCommand::Up(rows.map(number).transpose()?),
        ("seed", Some(seed)) => BrowseCommand::Seed(seed.to_string()),
        ("random", None) => BrowseCommand::RandomSeed,
        ("lang", lang) => {
            BrowseCommand::Language(lang.map(str::parse).transpose().map_err(|e| format!("{e}"))?)
        }
        ("likes", Some(value)) => {
            let likes: f64 = value.parse().map_err(|_| format!("not a number: {value}"))?;
            if !(0.0..=LikeFilter::SLIDER_MAX).contains(&likes) {
                return Err(format!("likes must be between 0 and {}", LikeFilter::SLIDER_MAX));
            }
            BrowseCommand::Likes(likes)
        }
        ("clear", None) => BrowseCommand::ClearLikes,
        ("mode", mode) => {
            BrowseCommand::Mode(mode.map(str::parse).transpose().map_err(|e| format!("{e}"))?)
        }
        ("size", Some(n)) => BrowseCommand::PageSize(number(n)?),
        ("open", Some(n)) => BrowseCommand::Open(number(n)?.into()),
        ("close", None) => BrowseCommand::Close,
        ("t" | "toggle" | "play" | "pause", None) => BrowseCommand::TogglePlay,
        ("seek", Some(value)) => match value.parse::<f64>() {
            Ok(secs) if secs.is_finite() && secs >= 0.0 => BrowseCommand::Seek(secs),
            _ => return Err(format!("expected seconds, got {value}")),
        },
        ("download", dir) => BrowseCommand::Download(dir.map(PathBuf::from)),
        ("show", None) => BrowseCommand::Show,
        ("help" | "?", None) => BrowseCommand::Help,
        ("q" | "quit" | "exit", None) => BrowseCommand::Quit,
        _ => return Err(format!("unknown command: {line} (type help)")),
    };
    if words.next().is_some() {
        return Err(format!("too many arguments: {line}"));
    }
    Ok(command)
}

fn number(value: &str) -> std::result::Result<u32, String> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("expected a positive number, got {value}")),
    }
}

type Generated = (String, Result<SongDetail>);

/// State of one browsing session.
pub struct Browser {
    api: Arc<HttpCatalogue>,
    list: CatalogueListController,
    slider: Debouncer<LikeFilter>,
    preferences: PreferenceStore,
    viewport: ScrollViewport,
    expanded: Option<ExpandedSong<SimulatedAudio>>,
    clock: PlaybackClock,
    layout: LyricLayout,
    responses_tx: mpsc::UnboundedSender<PageResponse>,
    responses_rx: mpsc::UnboundedReceiver<PageResponse>,
    generated_tx: mpsc::UnboundedSender<Generated>,
    generated_rx: mpsc::UnboundedReceiver<Generated>,
}

impl Browser {
    #[must_use]
    pub fn new(
        api: Arc<HttpCatalogue>,
        list: CatalogueListController,
        slider: Debouncer<LikeFilter>,
        preferences: PreferenceStore,
        viewport: ScrollViewport,
        layout: LyricLayout,
    ) -> Self {
        let (responses_tx, responses_rx) = mpsc::unbounded_channel();
        let (generated_tx, generated_rx) = mpsc::unbounded_channel();
        Self {
            api,
            list,
            slider,
            preferences,
            viewport,
            expanded: None,
            clock: PlaybackClock::new(1.0, None),
            layout,
            responses_tx,
            responses_rx,
            generated_tx,
            generated_rx,
        }
    }

    /// Run until the user quits, stdin closes or `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        println!("{HELP}");
        let request = self.list.reload();
        self.spawn_fetch(request);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut ticker = tokio::time::interval(TICK);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if !self.handle_line(&line, &cancel).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!(target: LOG_TARGET, "Failed to read input: {}", e);
                        break;
                    }
                },
                like_filter = self.slider.settled() => {
                    info!(target: LOG_TARGET, "Likes filter settled at {}", like_filter.label());
                    let request = self.list.set_like_filter(like_filter);
                    self.after_filter_change(request);
                },
                Some(response) = self.responses_rx.recv() => self.on_response(response),
                Some((seed, result)) = self.generated_rx.recv() => self.on_generated(&seed, result),
                _ = ticker.tick(), if self.expanded.is_some() => self.on_tick(),
            }
        }

        self.list.close();
        self.expanded = None;
        info!(target: LOG_TARGET, "Browser closed");
    }

    /// Apply one line of input. Returns false when the user asked to quit.
    async fn handle_line(&mut self, line: &str, cancel: &CancellationToken) -> bool {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                return true;
            }
        };
        debug!(target: LOG_TARGET, "Command {:?}", command);

        match command {
            BrowseCommand::NextPage => {
                let page = self.list.page().saturating_add(1);
                self.page_change(page);
            }
            BrowseCommand::PrevPage => {
                let page = self.list.page().saturating_sub(1).max(1);
                self.page_change(page);
            }
            BrowseCommand::GoToPage(page) => self.page_change(page),
            BrowseCommand::Down(rows) => self.scroll(rows, true),
            BrowseCommand::Up(rows) => self.scroll(rows, false),
            BrowseCommand::More => match self.list.scrolled_near_bottom() {
                Some(request) => self.spawn_fetch(request),
                None if self.list.view_mode() == ViewMode::Table => {
                    println!("'more' works in scroll mode; use next/prev in table mode");
                }
                None => println!("still loading..."),
            },
            BrowseCommand::Seed(seed) => {
                let request = self.list.set_seed(seed);
                self.after_filter_change(request);
            }
            BrowseCommand::RandomSeed => {
                let request = self.list.randomize_seed();
                self.after_filter_change(Some(request));
            }
            BrowseCommand::Language(language) => {
                let language = language.unwrap_or_else(|| self.list.filter().language.toggled());
                let request = self.list.set_language(language);
                self.after_filter_change(request);
            }
            BrowseCommand::Likes(value) => {
                let like_filter = LikeFilter::from_slider(value);
                println!("likes {} (applies when you stop adjusting)", like_filter.label());
                self.slider.push(like_filter);
            }
            BrowseCommand::ClearLikes => {
                self.slider.cancel();
                let request = self.list.set_like_filter(LikeFilter::Any);
                self.after_filter_change(request);
            }
            BrowseCommand::Mode(mode) => {
                let mode = mode.unwrap_or_else(|| self.list.view_mode().toggled());
                if let Some(request) = self.list.set_view_mode(mode) {
                    self.preferences.set_view_mode(mode);
                    self.after_filter_change(Some(request));
                }
            }
            BrowseCommand::PageSize(size) => {
                let request = self.list.set_page_size(size);
                self.after_filter_change(request);
            }
            BrowseCommand::Open(number) => self.open_row(number),
            BrowseCommand::Close => {
                if self.expanded.take().is_some() {
                    println!("collapsed");
                }
            }
            BrowseCommand::TogglePlay => self.control_player(PlaybackController::toggle_play),
            BrowseCommand::Seek(secs) => self.control_player(|player| player.seek(secs)),
            BrowseCommand::Download(dir) => self.download(dir, cancel).await,
            BrowseCommand::Show => self.print_rows(),
            BrowseCommand::Help => println!("{HELP}"),
            BrowseCommand::Quit => return false,
        }
        true
    }

    fn page_change(&mut self, page: u32) {
        if self.list.view_mode() != ViewMode::Table {
            println!("paging works in table mode; use 'more' in scroll mode");
            return;
        }
        if let Some(request) = self.list.go_to_page(page) {
            self.expanded = None;
            self.spawn_fetch(request);
        }
    }

    /// A filter-like input changed: the old rows and any expanded song are gone.
    fn after_filter_change(&mut self, request: Option<PageRequest>) {
        if let Some(request) = request {
            self.expanded = None;
            self.viewport.reset();
            self.spawn_fetch(request);
        }
    }

    /// Move the scroll-mode view; reaching the bottom loads the next page.
    fn scroll(&mut self, rows: Option<u32>, down: bool) {
        if self.list.view_mode() != ViewMode::Scroll {
            println!("scrolling works in scroll mode; use next/prev in table mode");
            return;
        }
        let rows = rows.map_or(self.viewport.visible_rows(), |n| {
            usize::try_from(n).unwrap_or(usize::MAX)
        });
        let total = self.list.rows().len();
        if down {
            self.viewport.scroll_down(rows, total);
        } else {
            self.viewport.scroll_up(rows);
        }
        if down && self.viewport.is_near_bottom(total) {
            if let Some(request) = self.list.scrolled_near_bottom() {
                self.spawn_fetch(request);
            }
        }
        self.print_rows();
    }

    fn print_rows(&self) {
        match self.list.view_mode() {
            ViewMode::Table => println!("{}", render::rows(&self.list)),
            ViewMode::Scroll => {
                let window = self.viewport.visible(self.list.rows().len());
                println!("{}", render::rows_in(&self.list, window));
            }
        }
    }

    /// Apply a play/pause or seek to the expanded song's player.
    fn control_player(&mut self, action: impl FnOnce(&mut PlaybackController<SimulatedAudio>)) {
        match self.expanded.as_mut().and_then(ExpandedSong::player_mut) {
            Some(player) => {
                action(player);
                println!("{}", render::player_status(player.state()));
            }
            None => println!("nothing is playing; open a row first"),
        }
    }

    fn on_tick(&mut self) {
        let Some(expanded) = self.expanded.as_mut() else {
            return;
        };
        let Some(tick) = self.clock.tick(expanded, TICK, &self.layout) else {
            return;
        };
        if let Some(line) = tick.new_line {
            println!("{}\n", render::lyrics_window(expanded.lyrics(), line));
        }
        if tick.phase_changed {
            if let Some(player) = expanded.player() {
                println!("{}", render::player_status(player.state()));
            }
        }
    }

    fn spawn_fetch(&self, request: PageRequest) {
        let api = Arc::clone(&self.api);
        let tx = self.responses_tx.clone();
        tokio::spawn(async move {
            let response = request.execute(api.as_ref()).await;
            // The receiver only goes away when the browser is shutting down.
            let _ = tx.send(response);
        });
    }

    fn on_response(&mut self, response: PageResponse) {
        match self.list.apply_response(response) {
            ApplyOutcome::Replaced { .. } | ApplyOutcome::Appended { .. } => self.print_rows(),
            ApplyOutcome::Failed => println!("Could not load songs; try again."),
            ApplyOutcome::Stale | ApplyOutcome::Closed => {}
        }
    }

    fn open_row(&mut self, number: u64) {
        let Some(song) = (0..self.list.rows().len())
            .find(|&i| self.list.row_number(i) == number)
            .map(|i| self.list.rows()[i].clone())
        else {
            println!("no row {number} on screen");
            return;
        };

        let language = self.list.filter().language;
        let seed = song.seed.clone();
        let expanded = ExpandedSong::new(song, language);
        println!("{}", render::expanded(&expanded));
        self.expanded = Some(expanded);
        self.clock.reset();

        let api = Arc::clone(&self.api);
        let tx = self.generated_tx.clone();
        tokio::spawn(async move {
            let result = api.generate_song(&seed, language).await;
            let _ = tx.send((seed, result));
        });
    }

    fn on_generated(&mut self, seed: &str, result: Result<SongDetail>) {
        let Some(expanded) = self.expanded.as_mut().filter(|e| e.song().seed == seed) else {
            debug!(target: LOG_TARGET, "Dropping generated song {} for a collapsed row", seed);
            return;
        };
        expanded.finish_generation(result, self.api.base_url(), SimulatedAudio::new());
        println!("{}", render::expanded(expanded));
    }

    async fn download(&self, dir: Option<PathBuf>, cancel: &CancellationToken) {
        let Some(expanded) = self.expanded.as_ref() else {
            println!("open a row first");
            return;
        };
        let dir = dir.unwrap_or_else(|| PathBuf::from("."));
        tokio::select! {
            () = cancel.cancelled() => {}
            result = expanded.download(self.api.as_ref(), &dir) => match result {
                Ok(path) => println!("saved {}", path.display()),
                Err(e) => error!(target: LOG_TARGET, "Download failed: {}", e),
            },
        }
    }
}
