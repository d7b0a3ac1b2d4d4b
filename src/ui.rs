use std::cell::Cell;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::{self, LoadError};
use crate::browser::Browser;
use crate::catalog::Item;
use crate::data::{CatalogService, RelatedService};
use crate::hierarchy;
use crate::panel::{ItemAction, ItemPanel, RenderedPanel, ViewMode};
use crate::player::{Launched, Launcher};
use crate::related::{RelatedPanel, RelatedTicket};

const COLOR_BG: Color = Color::Rgb(30, 30, 46);
const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
const COLOR_PANEL_FOCUSED_BG: Color = Color::Rgb(49, 50, 68);
const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
const COLOR_BORDER_IDLE: Color = Color::Rgb(49, 50, 68);
const COLOR_BORDER_FOCUSED: Color = Color::Rgb(137, 180, 250);
const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
const COLOR_SUCCESS: Color = Color::Rgb(166, 227, 161);
const COLOR_ERROR: Color = Color::Rgb(243, 139, 168);

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TILE_WIDTH: u16 = 22;
const TILE_HEIGHT: u16 = 4;
const HEADER_HEIGHT: u16 = 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Pane {
    Library,
    Related,
}

impl Pane {
    fn title(self) -> &'static str {
        match self {
            Pane::Library => "Library",
            Pane::Related => "Related",
        }
    }

    fn other(self) -> Self {
        match self {
            Pane::Library => Pane::Related,
            Pane::Related => Pane::Library,
        }
    }
}

struct PendingCatalog {
    request_id: u64,
}

enum AsyncResponse {
    Catalog {
        request_id: u64,
        result: Result<Vec<Item>, LoadError>,
    },
    Related {
        ticket: RelatedTicket,
        result: Result<Vec<Item>, LoadError>,
    },
}

struct Spinner {
    index: usize,
    last_tick: Instant,
}

impl Spinner {
    fn new() -> Self {
        Self {
            index: 0,
            last_tick: Instant::now(),
        }
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.index % SPINNER_FRAMES.len()]
    }

    fn advance(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) >= Duration::from_millis(120) {
            self.index = (self.index + 1) % SPINNER_FRAMES.len();
            self.last_tick = now;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.last_tick = Instant::now();
    }
}

pub struct Options {
    pub catalog_service: Option<Arc<dyn CatalogService + Send + Sync>>,
    pub related_service: Option<Arc<dyn RelatedService + Send + Sync>>,
    /// Builds play/stream URLs. Without it, playing only updates the
    /// related panel.
    pub play_client: Option<Arc<api::Client>>,
    pub launcher: Launcher,
    pub default_view: ViewMode,
    pub related_view: ViewMode,
    pub now_playing: Option<String>,
    pub server_label: String,
    pub config_path: String,
}

pub struct Model {
    browser: Browser,
    related: RelatedPanel,
    focused_pane: Pane,
    search_input: Option<String>,
    now_playing: Option<String>,
    status_message: String,
    server_label: String,
    config_path: String,
    catalog_service: Option<Arc<dyn CatalogService + Send + Sync>>,
    related_service: Option<Arc<dyn RelatedService + Send + Sync>>,
    play_client: Option<Arc<api::Client>>,
    launcher: Launcher,
    library_columns: Cell<usize>,
    related_columns: Cell<usize>,
    spinner: Spinner,
    needs_redraw: bool,
    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
    next_request_id: u64,
    pending_catalog: Option<PendingCatalog>,
}

impl Model {
    pub fn new(options: Options) -> Self {
        let (response_tx, response_rx) = unbounded();
        Self {
            browser: Browser::new(options.default_view),
            related: RelatedPanel::new(options.related_view),
            focused_pane: Pane::Library,
            search_input: None,
            now_playing: options.now_playing,
            status_message: format!("Connecting to {}…", options.server_label),
            server_label: options.server_label,
            config_path: options.config_path,
            catalog_service: options.catalog_service,
            related_service: options.related_service,
            play_client: options.play_client,
            launcher: options.launcher,
            library_columns: Cell::new(1),
            related_columns: Cell::new(1),
            spinner: Spinner::new(),
            needs_redraw: true,
            response_tx,
            response_rx,
            next_request_id: 1,
            pending_catalog: None,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        self.start();
        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Kicks off the catalog load and, when started on a media item, the
    /// related fetch for its folder.
    fn start(&mut self) {
        self.load_catalog();
        if let Some(path) = self.now_playing.clone() {
            self.load_related(&RelatedPanel::scope_for(&path));
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(120);

        loop {
            if self.poll_async() {
                self.mark_dirty();
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(key.code) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                tracing::warn!(error = %err, "key handler failed");
                                self.status_message = format!("Error: {}", err);
                                self.mark_dirty();
                            }
                        }
                    }
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
                if self.is_loading() {
                    if self.spinner.advance() {
                        self.mark_dirty();
                    }
                } else {
                    self.spinner.reset();
                }
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn is_loading(&self) -> bool {
        self.pending_catalog.is_some() || self.related.is_loading()
    }

    fn load_catalog(&mut self) {
        self.browser.begin_load();
        let Some(service) = self.catalog_service.clone() else {
            self.pending_catalog = None;
            self.browser
                .apply_catalog(Err(LoadError::Unavailable("no catalog source".into())));
            self.status_message = "Library source unavailable.".to_string();
            return;
        };

        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.pending_catalog = Some(PendingCatalog { request_id });
        self.status_message = format!("Loading library from {}…", self.server_label);

        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let result = service.load_structure();
            let _ = tx.send(AsyncResponse::Catalog { request_id, result });
        });
    }

    fn load_related(&mut self, scope: &str) {
        let Some(ticket) = self.related.request(scope) else {
            return;
        };
        let Some(service) = self.related_service.clone() else {
            self.related.apply(
                &ticket,
                Err(LoadError::Unavailable("no related source".into())),
            );
            return;
        };

        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let result = service.load_related(&ticket.scope);
            let _ = tx.send(AsyncResponse::Related { ticket, result });
        });
    }

    fn poll_async(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.response_rx.try_recv() {
            self.handle_async_response(message);
            changed = true;
        }
        changed
    }

    fn handle_async_response(&mut self, message: AsyncResponse) {
        match message {
            AsyncResponse::Catalog { request_id, result } => {
                let Some(pending) = &self.pending_catalog else {
                    return;
                };
                if pending.request_id != request_id {
                    return;
                }
                self.pending_catalog = None;
                let failed = result.is_err();
                self.browser.apply_catalog(result);
                self.status_message = if failed {
                    "Library unavailable.".to_string()
                } else {
                    format!(
                        "{} items in library. Enter opens, / searches, Tab switches panel.",
                        self.browser.catalog().len()
                    )
                };
                self.mark_dirty();
            }
            AsyncResponse::Related { ticket, result } => {
                if self.related.apply(&ticket, result) {
                    self.mark_dirty();
                }
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if self.search_input.is_some() {
            self.handle_search_key(code);
            return Ok(false);
        }

        let mut dirty = true;
        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc => {
                if !self.browser.clear_search() {
                    return Ok(true);
                }
                self.status_message = "Search cleared.".to_string();
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.other();
                self.status_message = format!("{} panel focused.", self.focused_pane.title());
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_rows(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_rows(-1),
            KeyCode::Char('h') | KeyCode::Left => self.focused_panel_mut().move_columns(-1),
            KeyCode::Char('l') | KeyCode::Right => self.focused_panel_mut().move_columns(1),
            KeyCode::Home => self.focused_panel_mut().select(0),
            KeyCode::End => self.focused_panel_mut().select(usize::MAX),
            KeyCode::Enter => self.activate_selected()?,
            KeyCode::Backspace | KeyCode::Char('b') => {
                self.focused_pane = Pane::Library;
                if self.browser.back() {
                    self.status_message = self.location_status();
                } else {
                    self.status_message = "Already at the top.".to_string();
                }
            }
            KeyCode::Char('~') => {
                self.focused_pane = Pane::Library;
                self.browser.home();
                self.status_message = "Back to the library root.".to_string();
            }
            KeyCode::Char('/') => {
                self.focused_pane = Pane::Library;
                self.search_input = Some(self.browser.search_term().unwrap_or("").to_string());
                self.status_message = "Type to search, Enter to apply, Esc to cancel.".to_string();
            }
            KeyCode::Char('c') => {
                if self.browser.clear_search() {
                    self.status_message = "Search cleared.".to_string();
                }
            }
            KeyCode::Char('g') => self.set_focused_mode(ViewMode::Grid),
            KeyCode::Char('t') => self.set_focused_mode(ViewMode::List),
            KeyCode::Char('v') => {
                let mode = self.focused_panel().mode().toggled();
                self.set_focused_mode(mode);
            }
            _ => dirty = false,
        }

        if dirty {
            self.mark_dirty();
        }
        Ok(false)
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        let Some(input) = self.search_input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.search_input = None;
                self.status_message = "Search cancelled.".to_string();
            }
            KeyCode::Enter => {
                let term = input.clone();
                self.search_input = None;
                self.browser.search(&term);
                self.status_message = match self.browser.search_term() {
                    Some(term) => format!(
                        "{} matches for \"{}\" across the library.",
                        self.browser.panel().items().len(),
                        term
                    ),
                    None => self.location_status(),
                };
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(ch) => input.push(ch),
            _ => return,
        }
        self.mark_dirty();
    }

    fn focused_panel(&self) -> &ItemPanel {
        match self.focused_pane {
            Pane::Library => self.browser.panel(),
            Pane::Related => self.related.panel(),
        }
    }

    fn focused_panel_mut(&mut self) -> &mut ItemPanel {
        match self.focused_pane {
            Pane::Library => self.browser.panel_mut(),
            Pane::Related => self.related.panel_mut(),
        }
    }

    fn move_rows(&mut self, rows: isize) {
        let columns = match self.focused_pane {
            Pane::Library => self.library_columns.get(),
            Pane::Related => self.related_columns.get(),
        };
        self.focused_panel_mut().move_rows(rows, columns);
    }

    fn set_focused_mode(&mut self, mode: ViewMode) {
        match self.focused_pane {
            Pane::Library => self.browser.set_mode(mode),
            Pane::Related => self.related.set_mode(mode),
        }
        self.status_message = format!("{} panel: {} view.", self.focused_pane.title(), mode.label());
    }

    fn activate_selected(&mut self) -> Result<()> {
        let action = match self.focused_pane {
            Pane::Library => self.browser.activate_selected()?,
            Pane::Related => self.related.panel().selected_action(),
        };
        match action {
            Some(ItemAction::OpenFolder(_)) => {
                self.status_message = self.location_status();
            }
            Some(ItemAction::Play(item)) => self.play(&item),
            None => {}
        }
        Ok(())
    }

    fn play(&mut self, item: &Item) {
        self.now_playing = Some(item.path.clone());
        self.status_message = match &self.play_client {
            Some(client) => {
                let play_url = client.play_url(&item.path);
                let stream_url = client.stream_url(&item.path);
                match self.launcher.launch(&play_url, &stream_url) {
                    Ok(Launched::Browser(_)) => format!("Opened {} in your browser.", item.name),
                    Ok(Launched::Command { program, .. }) => {
                        format!("Playing {} with {}.", item.name, program)
                    }
                    Err(err) => {
                        tracing::warn!(path = %item.path, error = %err, "play failed");
                        format!("Failed to play {}: {err}", item.name)
                    }
                }
            }
            None => format!("Now playing {}.", item.name),
        };
        self.load_related(&RelatedPanel::scope_for(&item.path));
    }

    fn location_status(&self) -> String {
        match self.browser.current_folder() {
            Some(folder) => format!("In {}.", folder.path),
            None => "At the library root.".to_string(),
        }
    }

    fn draw(&self, frame: &mut Frame<'_>) {
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        let status_text = if self.is_loading() {
            format!("{} {}", self.spinner.frame(), self.status_message)
                .trim()
                .to_string()
        } else {
            self.status_message.clone()
        };
        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .fg(COLOR_TEXT_PRIMARY)
                .bg(COLOR_PANEL_FOCUSED_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, layout[0]);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(layout[1]);

        self.draw_library(frame, main_chunks[0]);
        self.draw_related(frame, main_chunks[1]);

        let footer = Paragraph::new(self.footer_text())
            .style(
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .bg(COLOR_PANEL_BG)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(footer, layout[2]);
    }

    fn pane_block(&self, pane: Pane, mode: ViewMode) -> Block<'static> {
        let focused = self.focused_pane == pane;
        let border_style = if focused {
            Style::default().fg(COLOR_BORDER_FOCUSED)
        } else {
            Style::default().fg(COLOR_BORDER_IDLE)
        };
        let title_style = if focused {
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(COLOR_TEXT_SECONDARY)
        };
        Block::default()
            .title(Span::styled(
                format!(" {} · {} ", pane.title(), mode.label()),
                title_style,
            ))
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(COLOR_PANEL_BG))
            .padding(Padding::horizontal(1))
    }

    fn draw_library(&self, frame: &mut Frame<'_>, area: Rect) {
        let panel = self.browser.panel();
        let block = self.pane_block(Pane::Library, panel.mode());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
            .split(inner);

        let header = Paragraph::new(Text::from(self.library_header()));
        frame.render_widget(header, chunks[0]);

        let columns = draw_panel_body(
            frame,
            chunks[1],
            panel,
            self.focused_pane == Pane::Library,
        );
        self.library_columns.set(columns);
    }

    fn library_header(&self) -> Vec<Line<'static>> {
        let mut location: Vec<Span<'static>> = Vec::new();
        if let Some(input) = &self.search_input {
            location.push(Span::styled(
                "Search: ",
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD),
            ));
            location.push(Span::styled(
                format!("{input}▏"),
                Style::default().fg(COLOR_TEXT_PRIMARY),
            ));
        } else if let Some(term) = self.browser.search_term() {
            location.push(Span::styled(
                format!("Results for \"{term}\" (whole library)"),
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            let mut crumbs = vec!["Library".to_string()];
            crumbs.extend(hierarchy::breadcrumb(self.browser.current_folder()));
            location.push(Span::styled(
                crumbs.join(" › "),
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let chrome = self.browser.chrome();
        let mut controls: Vec<Span<'static>> = Vec::new();
        if chrome.visible {
            let style_for = |enabled: bool| {
                if enabled {
                    Style::default().fg(COLOR_SUCCESS)
                } else {
                    Style::default()
                        .fg(COLOR_BORDER_IDLE)
                        .add_modifier(Modifier::DIM)
                }
            };
            if chrome.back_enabled {
                controls.push(Span::styled("⌫ Back", style_for(true)));
                controls.push(Span::raw("   "));
            }
            if chrome.home_enabled {
                controls.push(Span::styled("~ Home", style_for(true)));
            }
        }

        vec![Line::from(location), Line::from(controls)]
    }

    fn draw_related(&self, frame: &mut Frame<'_>, area: Rect) {
        let panel = self.related.panel();
        let block = self.pane_block(Pane::Related, panel.mode());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
            .split(inner);

        let scope_line = match self.related.scope() {
            Some("") => "Folder: library root".to_string(),
            Some(scope) => format!("Folder: {scope}"),
            None => String::new(),
        };
        let playing_line = self
            .now_playing
            .as_deref()
            .map(|path| format!("▶ {path}"))
            .unwrap_or_default();
        let header = Paragraph::new(Text::from(vec![
            Line::from(Span::styled(
                playing_line,
                Style::default()
                    .fg(COLOR_SUCCESS)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                scope_line,
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )),
        ]));
        frame.render_widget(header, chunks[0]);

        let columns = draw_panel_body(
            frame,
            chunks[1],
            panel,
            self.focused_pane == Pane::Related,
        );
        self.related_columns.set(columns);
    }

    fn footer_text(&self) -> String {
        if self.search_input.is_some() {
            return "Search: type a name · Enter apply · Esc cancel".to_string();
        }

        let mut parts: Vec<String> = Vec::new();
        match self.focused_pane {
            Pane::Library => {
                parts.push("j/k/h/l move · Enter open/play".to_string());
                let chrome = self.browser.chrome();
                if chrome.back_enabled {
                    parts.push("⌫/b back".to_string());
                }
                if chrome.home_enabled {
                    parts.push("~ home".to_string());
                }
                parts.push("/ search".to_string());
                if self.browser.search_term().is_some() {
                    parts.push("c clear search".to_string());
                }
            }
            Pane::Related => {
                parts.push("j/k/h/l move · Enter play".to_string());
            }
        }
        parts.push("g grid · t list · v toggle".to_string());
        parts.push("Tab switch panel".to_string());
        parts.push("q quit".to_string());
        parts.push(format!("config: {}", self.config_path));

        parts.join(" · ")
    }
}

/// Draws a panel's tiles (or its status message) and returns how many
/// tiles fit on one row.
fn draw_panel_body(frame: &mut Frame<'_>, area: Rect, panel: &ItemPanel, focused: bool) -> usize {
    if let Some(message) = panel.status().message() {
        let color = if panel.status().is_failure() {
            COLOR_ERROR
        } else {
            COLOR_TEXT_SECONDARY
        };
        let paragraph = Paragraph::new(message.to_string())
            .style(
                Style::default()
                    .fg(color)
                    .bg(COLOR_PANEL_BG)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return grid_columns(area.width);
    }

    let rendered = panel.render();
    match rendered.mode {
        ViewMode::List => {
            draw_list(frame, area, &rendered, panel.selected(), focused);
            1
        }
        ViewMode::Grid => draw_grid(frame, area, &rendered, panel.selected(), focused),
    }
}

fn draw_list(frame: &mut Frame<'_>, area: Rect, rendered: &RenderedPanel, selected: usize, focused: bool) {
    let rows = area.height.max(1) as usize;
    let first = visible_start(selected, 1, rows);
    let width = area.width as usize;

    let lines: Vec<Line<'static>> = rendered
        .tiles
        .iter()
        .enumerate()
        .skip(first)
        .take(rows)
        .map(|(idx, tile)| {
            let style = tile_style(idx == selected, focused);
            let label = format!("{} {}", tile.icon, tile.label);
            Line::from(Span::styled(pad_to_width(&truncate_to_width(&label, width), width), style))
        })
        .collect();
    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

fn draw_grid(frame: &mut Frame<'_>, area: Rect, rendered: &RenderedPanel, selected: usize, focused: bool) -> usize {
    let columns = grid_columns(area.width);
    let rows = (area.height / TILE_HEIGHT).max(1) as usize;
    let first_row = visible_start(selected, columns, rows) / columns;
    let label_width = TILE_WIDTH.saturating_sub(4) as usize;

    for (idx, tile) in rendered.tiles.iter().enumerate().skip(first_row * columns) {
        let row = idx / columns - first_row;
        if row >= rows {
            break;
        }
        let col = idx % columns;
        let x = area.x + col as u16 * TILE_WIDTH;
        let y = area.y + row as u16 * TILE_HEIGHT;
        let tile_area = Rect::new(
            x,
            y,
            TILE_WIDTH.min(area.right().saturating_sub(x)),
            TILE_HEIGHT.min(area.bottom().saturating_sub(y)),
        );
        if tile_area.width == 0 || tile_area.height == 0 {
            continue;
        }

        let is_selected = idx == selected;
        let border = if is_selected && focused {
            COLOR_BORDER_FOCUSED
        } else {
            COLOR_BORDER_IDLE
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(tile_style(is_selected, focused));
        let body = Paragraph::new(Text::from(vec![
            Line::from(Span::raw(tile.icon)),
            Line::from(Span::raw(truncate_to_width(&tile.label, label_width))),
        ]))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(body, tile_area);
    }

    columns
}

fn tile_style(selected: bool, focused: bool) -> Style {
    match (selected, focused) {
        (true, true) => Style::default()
            .fg(COLOR_TEXT_PRIMARY)
            .bg(COLOR_PANEL_SELECTED_BG)
            .add_modifier(Modifier::BOLD),
        (true, false) => Style::default()
            .fg(COLOR_TEXT_PRIMARY)
            .bg(COLOR_PANEL_FOCUSED_BG),
        _ => Style::default().fg(COLOR_TEXT_SECONDARY).bg(COLOR_PANEL_BG),
    }
}

fn grid_columns(width: u16) -> usize {
    (width / TILE_WIDTH).max(1) as usize
}

/// Index of the first tile to draw so that `selected` stays on screen.
fn visible_start(selected: usize, per_row: usize, rows: usize) -> usize {
    let per_row = per_row.max(1);
    let rows = rows.max(1);
    let selected_row = selected / per_row;
    selected_row.saturating_sub(rows - 1) * per_row
}

fn truncate_to_width(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn pad_to_width(text: &str, width: usize) -> String {
    let current = UnicodeWidthStr::width(text);
    if current >= width {
        return text.to_string();
    }
    format!("{text}{}", " ".repeat(width - current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::data::{MockCatalogService, MockRelatedService};
    use crate::panel::PanelStatus;
    use crate::related::RELATED_ERROR_MESSAGE;
    use ratatui::backend::TestBackend;

    fn model_with(catalog: MockCatalogService, related: MockRelatedService) -> Model {
        Model::new(Options {
            catalog_service: Some(Arc::new(catalog)),
            related_service: Some(Arc::new(related)),
            play_client: None,
            launcher: Launcher::new(&PlayerConfig::default()),
            default_view: ViewMode::Grid,
            related_view: ViewMode::List,
            now_playing: None,
            server_label: "mock".into(),
            config_path: "~/.config/vidtree/config.yaml".into(),
        })
    }

    fn settle(model: &mut Model) {
        while model.is_loading() {
            let message = model
                .response_rx
                .recv_timeout(Duration::from_secs(5))
                .expect("async response");
            model.handle_async_response(message);
        }
    }

    fn screen(model: &Model) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| model.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn library_names(model: &Model) -> Vec<String> {
        model
            .browser
            .panel()
            .items()
            .iter()
            .map(|item| item.name.clone())
            .collect()
    }

    #[test]
    fn loads_catalog_and_draws_roots() {
        let mut model = model_with(MockCatalogService::default(), MockRelatedService::default());
        model.start();
        settle(&mut model);
        assert_eq!(library_names(&model), ["Movies", "Shows", "Welcome.mp4"]);
        let text = screen(&model);
        assert!(text.contains("Movies"));
        assert!(text.contains("Play something to see related videos."));
    }

    #[test]
    fn failed_catalog_shows_fixed_error() {
        let mut model = model_with(MockCatalogService::failing(), MockRelatedService::default());
        model.start();
        settle(&mut model);
        assert!(screen(&model).contains("Error loading directory structure"));
    }

    #[test]
    fn stale_catalog_response_is_ignored() {
        let mut model = model_with(MockCatalogService::default(), MockRelatedService::default());
        model.start();
        settle(&mut model);
        model.handle_async_response(AsyncResponse::Catalog {
            request_id: 999,
            result: Ok(Vec::new()),
        });
        assert_eq!(library_names(&model).len(), 3);
    }

    #[test]
    fn keys_drive_drill_down_and_back() {
        let mut model = model_with(MockCatalogService::default(), MockRelatedService::default());
        model.start();
        settle(&mut model);

        model.handle_key(KeyCode::Enter).unwrap();
        assert_eq!(library_names(&model), ["Arrival.mp4", "Heat.mkv", "Classics"]);
        assert!(screen(&model).contains("Library › Movies"));

        model.handle_key(KeyCode::Backspace).unwrap();
        assert_eq!(library_names(&model), ["Movies", "Shows", "Welcome.mp4"]);

        model.handle_key(KeyCode::Enter).unwrap();
        model.handle_key(KeyCode::Char('~')).unwrap();
        assert!(model.browser.current_folder().is_none());
        assert!(!model.browser.chrome().visible);
    }

    #[test]
    fn playing_a_file_scopes_related_panel() {
        let mut model = model_with(MockCatalogService::default(), MockRelatedService::default());
        model.start();
        settle(&mut model);

        model.handle_key(KeyCode::Enter).unwrap();
        model.handle_key(KeyCode::Right).unwrap();
        model.handle_key(KeyCode::Enter).unwrap();
        assert_eq!(model.now_playing.as_deref(), Some("Movies/Heat.mkv"));
        settle(&mut model);

        assert_eq!(model.related.scope(), Some("Movies"));
        let related: Vec<_> = model
            .related
            .panel()
            .items()
            .iter()
            .map(|item| item.name.clone())
            .collect();
        assert_eq!(related, ["Arrival.mp4", "Heat.mkv"]);
        assert!(screen(&model).contains("Folder: Movies"));
    }

    #[test]
    fn related_view_toggle_does_not_refetch() {
        let mut model = model_with(MockCatalogService::default(), MockRelatedService::default());
        model.now_playing = Some("Shows/Pilot.mkv".into());
        model.start();
        settle(&mut model);

        model.handle_key(KeyCode::Tab).unwrap();
        model.handle_key(KeyCode::Char('v')).unwrap();
        assert!(!model.related.is_loading());
        assert_eq!(model.related.panel().mode(), ViewMode::Grid);
        assert_eq!(model.related.panel().items().len(), 1);
        assert_eq!(model.browser.panel().mode(), ViewMode::Grid);
    }

    #[test]
    fn search_input_applies_global_filter() {
        let mut model = model_with(MockCatalogService::default(), MockRelatedService::default());
        model.start();
        settle(&mut model);

        model.handle_key(KeyCode::Char('/')).unwrap();
        for ch in "MKV".chars() {
            model.handle_key(KeyCode::Char(ch)).unwrap();
        }
        assert!(screen(&model).contains("Search: MKV"));
        model.handle_key(KeyCode::Enter).unwrap();
        assert_eq!(library_names(&model), ["Heat.mkv", "Pilot.mkv"]);

        model.handle_key(KeyCode::Char('t')).unwrap();
        assert_eq!(library_names(&model), ["Heat.mkv", "Pilot.mkv"]);

        assert!(!model.handle_key(KeyCode::Esc).unwrap());
        assert_eq!(model.browser.search_term(), None);
        assert!(model.handle_key(KeyCode::Esc).unwrap());
    }

    #[test]
    fn back_from_related_focus_returns_to_library() {
        let mut model = model_with(MockCatalogService::default(), MockRelatedService::default());
        model.start();
        settle(&mut model);

        model.handle_key(KeyCode::Enter).unwrap();
        model.handle_key(KeyCode::Tab).unwrap();
        assert_eq!(model.focused_pane, Pane::Related);
        model.handle_key(KeyCode::Char('b')).unwrap();
        assert_eq!(model.focused_pane, Pane::Library);
        assert!(model.browser.current_folder().is_none());

        model.handle_key(KeyCode::Tab).unwrap();
        model.handle_key(KeyCode::Char('~')).unwrap();
        assert_eq!(model.focused_pane, Pane::Library);
    }

    #[test]
    fn back_with_search_at_root_reports_view_change() {
        let mut model = model_with(MockCatalogService::default(), MockRelatedService::default());
        model.start();
        settle(&mut model);

        model.handle_key(KeyCode::Char('/')).unwrap();
        model.handle_key(KeyCode::Char('h')).unwrap();
        model.handle_key(KeyCode::Enter).unwrap();
        model.handle_key(KeyCode::Backspace).unwrap();
        assert_eq!(model.browser.search_term(), None);
        assert_eq!(model.status_message, "At the library root.");
    }

    #[test]
    fn missing_related_source_shows_error_state() {
        let mut model = Model::new(Options {
            catalog_service: Some(Arc::new(MockCatalogService::default())),
            related_service: None,
            play_client: None,
            launcher: Launcher::new(&PlayerConfig::default()),
            default_view: ViewMode::List,
            related_view: ViewMode::List,
            now_playing: Some("Movies/Heat.mkv".into()),
            server_label: "mock".into(),
            config_path: "config.yaml".into(),
        });
        model.start();
        settle(&mut model);
        assert_eq!(
            model.related.panel().status(),
            &PanelStatus::Failed(RELATED_ERROR_MESSAGE.into())
        );
    }

    #[test]
    fn visible_start_keeps_selection_on_screen() {
        assert_eq!(visible_start(0, 4, 3), 0);
        assert_eq!(visible_start(11, 4, 3), 0);
        assert_eq!(visible_start(12, 4, 3), 4);
        assert_eq!(visible_start(9, 1, 5), 5);
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(UnicodeWidthStr::width(truncate_to_width("🎬🎬🎬🎬", 5).as_str()), 5);
        assert_eq!(pad_to_width("ab", 4), "ab  ");
    }

    #[test]
    fn grid_has_at_least_one_column() {
        assert_eq!(grid_columns(0), 1);
        assert_eq!(grid_columns(TILE_WIDTH * 3 + 5), 3);
    }
}
