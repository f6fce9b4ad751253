use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    fs::{self, File},
    io::{Stdout, stdout},
    path::PathBuf,
    process,
    sync::Arc,
    time::Duration,
};
use studydesk_config::{BusyPolicy, Config, GenerationConfig, SyncConfig};
use studydesk_engine::ai::{
    AiContext, AssistError, HttpGenerationClient, Keyword, NoteAssistant, Palette,
};
use studydesk_engine::editing::markup::is_blank;
use studydesk_engine::editing::{
    DocumentWidget, EditorSession, GatePolicy, MemoryEditor, SettleOptions, SyncOptions,
    SyncOutcome,
};
use studydesk_engine::io;
use studydesk_engine::models::{Block as NoteBlock, BlockContent, BlockId, ListStyle, NoteFile};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

type Session = Arc<EditorSession<MemoryEditor>>;
type AssistTask = JoinHandle<Result<Option<SyncOutcome>, AssistError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Files,
    Editor,
}

struct OpenNote {
    note: NoteFile,
    file_id: u64,
    session: Session,
    /// Edited since the last write to disk
    dirty: bool,
}

/// A keypress applied to the stored HTML of a text block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Insert(char),
    DeleteBack,
}

struct App {
    runtime: Runtime,
    notes_path: PathBuf,
    notes: Vec<NoteFile>,
    file_list_state: ListState,
    open: Option<OpenNote>,
    generator: Arc<HttpGenerationClient>,
    sync_options: SyncOptions,
    palette: Palette,
    pane: Pane,
    pending: Option<AssistTask>,
    status: Option<String>,
}

impl App {
    fn new(
        notes_path: PathBuf,
        generation: &GenerationConfig,
        sync_options: SyncOptions,
    ) -> Result<Self> {
        let index = io::build_note_index(&notes_path)?;
        let notes: Vec<NoteFile> = index.notes().cloned().collect();
        let generator = HttpGenerationClient::new(&generation.base_url, generation.timeout())?;

        let mut app = Self {
            runtime: Runtime::new()?,
            notes_path,
            notes,
            file_list_state: ListState::default(),
            open: None,
            generator: Arc::new(generator),
            sync_options,
            palette: Palette::new(AiContext::Notes),
            pane: Pane::Files,
            pending: None,
            status: None,
        };

        // Select first note if available
        if !app.notes.is_empty() {
            app.file_list_state.select(Some(0));
            app.open_selected();
        }

        Ok(app)
    }

    fn next_file(&mut self) {
        if self.notes.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(i) => (i + 1) % self.notes.len(),
            None => 0,
        };
        self.file_list_state.select(Some(i));
        self.open_selected();
    }

    fn previous_file(&mut self) {
        if self.notes.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(0) | None => self.notes.len() - 1,
            Some(i) => i - 1,
        };
        self.file_list_state.select(Some(i));
        self.open_selected();
    }

    fn open_selected(&mut self) {
        if self.pending.is_some() {
            self.status = Some("Wait for the assistant to finish first".to_string());
            return;
        }
        let Some(index) = self.file_list_state.selected() else {
            return;
        };
        let Some(note) = self.notes.get(index).cloned() else {
            return;
        };
        self.save_if_dirty();

        match io::read_note(note.relative_path(), &self.notes_path) {
            Ok(document) => {
                let session = Arc::new(EditorSession::mount(
                    MemoryEditor::from_document(document),
                    self.sync_options.clone(),
                ));
                // Autofocus after mount so the tracker hears it
                if let Some(mut widget) = session.try_widget() {
                    widget.autofocus();
                }
                self.runtime.block_on(session.refresh_focus());
                log::info!("opened {}", note.relative_path());
                self.open = Some(OpenNote {
                    note,
                    file_id: index as u64 + 1,
                    session,
                    dirty: false,
                });
                self.palette.close();
                self.status = None;
            }
            Err(e) => {
                log::warn!("failed to open {}: {e}", note.relative_path());
                self.open = None;
                self.status = Some(format!("Error reading note: {e}"));
            }
        }
    }

    fn enter_editor(&mut self) {
        if self.open.is_some() {
            self.pane = Pane::Editor;
        }
    }

    fn session(&self) -> Option<Session> {
        self.open.as_ref().map(|open| open.session.clone())
    }

    /// Run `f` against the open editor, then pick up any focus change it caused
    fn with_editor<R>(&mut self, f: impl FnOnce(&mut MemoryEditor) -> R) -> Option<R> {
        let session = self.session()?;
        if self.pending.is_some() {
            self.status = Some("Still inserting generated content".to_string());
            return None;
        }
        let result = {
            let mut widget = session.try_widget()?;
            f(&mut widget)
        };
        self.runtime.block_on(session.refresh_focus());
        Some(result)
    }

    fn focused_block(&self) -> Option<BlockId> {
        self.open.as_ref()?.session.focus_state().block
    }

    fn focused_is_empty(&self) -> bool {
        self.open
            .as_ref()
            .is_some_and(|open| open.session.focus_state().is_empty)
    }

    fn mark_dirty(&mut self) {
        if let Some(open) = self.open.as_mut() {
            open.dirty = true;
        }
    }

    fn move_focus(&mut self, delta: isize) {
        let focused = self.focused_block();
        self.with_editor(|editor| {
            let ids = editor.ids();
            if ids.is_empty() {
                return;
            }
            let current = focused
                .and_then(|id| editor.position(&id))
                .unwrap_or(0);
            let target = current.saturating_add_signed(delta).min(ids.len() - 1);
            if let Err(e) = editor.focus(&ids[target]) {
                log::warn!("focus failed: {e}");
            }
        });
    }

    fn open_line_below(&mut self) {
        let focused = self.focused_block();
        let result = self.with_editor(|editor| match focused {
            Some(focused) => {
                let blank = editor.insert_empty_after(&focused)?;
                editor.focus(&blank)
            }
            None => {
                let blank = NoteBlock::generated(BlockContent::paragraph(""));
                let id = blank.id.clone();
                editor.push_block(blank);
                editor.focus(&id)
            }
        });
        match result {
            Some(Ok(())) => self.mark_dirty(),
            Some(Err(e)) => log::warn!("could not open a new line: {e}"),
            None => {}
        }
    }

    fn edit_focused(&mut self, edit: Edit) {
        let Some(focused) = self.focused_block() else {
            return;
        };
        let changed = self.with_editor(|editor| {
            let Some(block) = editor.blocks().iter().find(|block| block.id == focused) else {
                return false;
            };
            let Some(content) = edited_content(&block.content, edit) else {
                return false;
            };
            match editor.set_content(&focused, content) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("edit failed: {e}");
                    false
                }
            }
        });
        if changed == Some(true) {
            self.mark_dirty();
        }
    }

    fn type_char(&mut self, ch: char) {
        if self.palette.is_visible() {
            self.palette.type_char(ch);
        } else if ch == ' ' && self.focused_is_empty() {
            self.palette.on_space(true);
        } else {
            self.edit_focused(Edit::Insert(ch));
        }
    }

    fn backspace(&mut self) {
        if self.palette.is_visible() {
            self.palette.backspace();
        } else {
            self.edit_focused(Edit::DeleteBack);
        }
    }

    fn enter(&mut self) {
        if !self.palette.is_visible() {
            self.open_line_below();
            return;
        }
        let keyword = if self.palette.filtered().is_empty() {
            self.palette.submit()
        } else {
            self.palette.choose()
        };
        if let Some(keyword) = keyword {
            self.start_assist(keyword);
        }
    }

    fn start_assist(&mut self, keyword: Keyword) {
        if self.pending.is_some() {
            self.status = Some("Still inserting the previous answer".to_string());
            return;
        }
        let Some(open) = &self.open else {
            return;
        };

        let mut assistant = NoteAssistant::new(self.generator.clone(), open.file_id);
        assistant.attach(open.session.clone(), open.file_id);
        log::info!("asking for {keyword:?} on {}", open.note.relative_path());
        self.pending = Some(self.runtime.spawn(async move { assistant.run(keyword).await }));
        self.status = Some("Asking the assistant...".to_string());
    }

    fn poll_pending(&mut self) {
        if !self.pending.as_ref().is_some_and(|task| task.is_finished()) {
            return;
        }
        let Some(task) = self.pending.take() else {
            return;
        };

        match self.runtime.block_on(task) {
            Ok(Ok(Some(outcome))) => {
                let mut status = format!("Inserted {} blocks", outcome.generated);
                if !outcome.settled {
                    status.push_str(" (editor was slow to update)");
                }
                self.status = Some(status);
                self.save_note();
            }
            Ok(Ok(None)) => self.status = None,
            Ok(Err(e)) => self.status = Some(e.notice()),
            Err(e) => {
                log::error!("assistant task failed: {e}");
                self.status = Some("The assistant stopped unexpectedly".to_string());
            }
        }

        if let Some(session) = self.session() {
            self.runtime.block_on(session.refresh_focus());
        }
    }

    fn save_note(&mut self) {
        let Some(open) = &self.open else {
            return;
        };
        let session = open.session.clone();
        let path = open.note.relative_path().to_owned();
        let saved = self
            .runtime
            .block_on(async { session.widget().await.save().await });

        let result = saved
            .map_err(anyhow::Error::from)
            .and_then(|document| {
                io::write_note(&path, &self.notes_path, &document)?;
                Ok(())
            });
        match result {
            Ok(()) => {
                log::info!("saved {path}");
                if let Some(open) = self.open.as_mut() {
                    open.dirty = false;
                }
            }
            Err(e) => {
                log::error!("failed to save {path}: {e}");
                self.status = Some(format!("Error saving note: {e}"));
            }
        }
    }

    /// Write the open note if it has unsaved edits
    fn save_if_dirty(&mut self) {
        if self.open.as_ref().is_some_and(|open| open.dirty) {
            self.save_note();
        }
    }

    fn leave_editor(&mut self) {
        self.save_if_dirty();
        self.pane = Pane::Files;
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('s') {
                self.save_note();
                self.status = Some("Saved".to_string());
            }
            return;
        }

        match key.code {
            KeyCode::Esc if self.palette.is_visible() => self.palette.close(),
            KeyCode::Esc => self.leave_editor(),
            KeyCode::Up if self.palette.is_visible() => self.palette.select_previous(),
            KeyCode::Down if self.palette.is_visible() => self.palette.select_next(),
            KeyCode::Up => self.move_focus(-1),
            KeyCode::Down => self.move_focus(1),
            KeyCode::Enter => self.enter(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(ch) => self.type_char(ch),
            _ => {}
        }
    }
}

/// `content` after `edit`; only paragraphs and headers are editable here
fn edited_content(content: &BlockContent, edit: Edit) -> Option<BlockContent> {
    match content {
        BlockContent::Paragraph { text } => Some(BlockContent::Paragraph {
            text: edited_html(text, edit),
        }),
        BlockContent::Header { text, level } => Some(BlockContent::Header {
            text: edited_html(text, edit),
            level: *level,
        }),
        _ => None,
    }
}

/// Apply `edit` to inline HTML, keeping existing tags and entities intact
fn edited_html(html: &str, edit: Edit) -> String {
    match edit {
        Edit::Insert(ch) => {
            let mut out = if is_blank(html) {
                String::new()
            } else {
                html.to_string()
            };
            out.push_str(&html_escape::encode_text(ch.encode_utf8(&mut [0; 4])));
            out
        }
        Edit::DeleteBack => {
            let mut out = html.to_string();
            let mut end = out.len();
            while out[..end].ends_with('>') {
                match out[..end].rfind('<') {
                    Some(start) => end = start,
                    None => break,
                }
            }
            let head = &out[..end];
            let start = trailing_entity(head)
                .or_else(|| head.char_indices().next_back().map(|(i, _)| i));
            if let Some(start) = start {
                out.replace_range(start..end, "");
            }
            out
        }
    }
}

/// Start of a character reference such as `&amp;` ending `head`
fn trailing_entity(head: &str) -> Option<usize> {
    let body = head.strip_suffix(';')?;
    let amp = body.rfind('&')?;
    let name = &body[amp + 1..];
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#');
    valid.then_some(amp)
}

fn block_lines(content: &BlockContent) -> Vec<String> {
    match content {
        BlockContent::Paragraph { .. } => vec![content.text()],
        BlockContent::Header { level, .. } => {
            vec![format!("{} {}", "#".repeat(*level as usize), content.text())]
        }
        BlockContent::List { style, .. } => content
            .text()
            .lines()
            .enumerate()
            .map(|(i, item)| match style {
                ListStyle::Unordered => format!("• {item}"),
                ListStyle::Ordered => format!("{}. {item}", i + 1),
            })
            .collect(),
        BlockContent::Checklist { items } => items
            .iter()
            .map(|item| {
                let mark = if item.checked { "x" } else { " " };
                format!("[{mark}] {}", item.text)
            })
            .collect(),
        BlockContent::CodeBox { code, language } => {
            let mut lines = vec![format!("```{}", language.as_deref().unwrap_or(""))];
            lines.extend(code.lines().map(str::to_string));
            lines.push("```".to_string());
            lines
        }
        BlockContent::Other { kind, .. } => {
            let text = content.text();
            let mut lines = text.lines();
            let first = format!("[{kind}] {}", lines.next().unwrap_or(""));
            std::iter::once(first)
                .chain(lines.map(|line| format!("  {line}")))
                .collect()
        }
    }
}

fn sync_options(config: &SyncConfig) -> SyncOptions {
    SyncOptions {
        settle: SettleOptions {
            poll_interval: config.poll_interval(),
            timeout: config.settle_timeout(),
        },
        gate: match config.on_busy {
            BusyPolicy::Queue => GatePolicy::Queue,
            BusyPolicy::Drop => GatePolicy::Drop,
        },
    }
}

fn init_logging() {
    let log_path = Config::log_path();
    let file = log_path
        .parent()
        .map(fs::create_dir_all)
        .transpose()
        .and_then(|_| File::create(&log_path));

    match file {
        Ok(file) => {
            env_logger::Builder::from_default_env()
                .filter_level(log::LevelFilter::Info)
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        Err(e) => eprintln!("Warning: logging disabled, cannot open {}: {e}", log_path.display()),
    }
}

fn main() -> Result<()> {
    init_logging();
    log::info!("studydesk starting up");

    // Determine notes path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Usage: {} <notes-folder-path>", args[0]);
            process::exit(1);
        }
    };

    let from_config = args.len() == 1;
    let config = match (args.len(), config) {
        (2, Some(config)) => Config {
            notes_path: PathBuf::from(&args[1]),
            ..config
        },
        (2, None) => Config::new(&args[1]),
        (1, Some(config)) => config,
        (1, None) => {
            eprintln!("Error: No notes path provided and no config file found");
            eprintln!("Usage: {} <notes-folder-path>", args[0]);
            eprintln!("Or create a config file at {}", config_path.display());
            process::exit(1);
        }
        _ => {
            eprintln!("Usage: {} [notes-folder-path]", args[0]);
            process::exit(1);
        }
    };

    if let Err(e) = io::validate_notes_dir(&config.notes_path) {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!(
            "Error: Notes path '{}'{} is invalid: {e}",
            config.notes_path.display(),
            source
        );
        process::exit(1);
    }

    let mut app = App::new(
        config.notes_path.clone(),
        &config.generation,
        sync_options(&config.sync),
    )?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("{err:?}");
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.poll_pending();
        terminal.draw(|f| ui(f, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.pane {
            Pane::Files => match key.code {
                KeyCode::Char('q') => {
                    app.save_if_dirty();
                    return Ok(());
                }
                KeyCode::Down | KeyCode::Char('j') => app.next_file(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_file(),
                KeyCode::Enter | KeyCode::Right => app.enter_editor(),
                _ => {}
            },
            Pane::Editor => app.handle_editor_key(key),
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(f.area());
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(rows[0]);

    // Note list panel
    let file_items: Vec<ListItem> = app
        .notes
        .iter()
        .map(|note| ListItem::new(Line::from(vec![Span::raw(format!("📄 {}", note.title()))])))
        .collect();
    let files_border = if app.pane == Pane::Files {
        Color::Yellow
    } else {
        Color::Reset
    };
    let files_list = List::new(file_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(files_border))
                .title("Notes"),
        )
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
    f.render_stateful_widget(files_list, chunks[0], &mut app.file_list_state);

    draw_editor(f, app, chunks[1]);

    let help = match app.pane {
        Pane::Files => "q: Quit | ↑/k ↓/j: Select note | Enter/→: Edit",
        Pane::Editor if app.palette.is_visible() => {
            "Type to filter | ↑/↓: Choose | Enter: Run | Backspace on empty: Close | Esc: Close"
        }
        Pane::Editor => {
            "↑/↓: Move | Enter: New line | Space on empty line: Ask AI | Ctrl+S: Save | Esc: Notes"
        }
    };
    let mut footer = vec![Line::from(help)];
    if let Some(status) = &app.status {
        footer.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Cyan),
        )));
    }
    f.render_widget(Paragraph::new(footer), rows[1]);
}

fn draw_editor(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let palette_height = if app.palette.is_visible() {
        app.palette.filtered().len() as u16 + 2
    } else {
        0
    };
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(palette_height)])
        .split(area);

    let title = app
        .open
        .as_ref()
        .map(|open| open.note.title().to_string())
        .unwrap_or_else(|| "Editor".to_string());
    let border = if app.pane == Pane::Editor {
        Color::Yellow
    } else {
        Color::Reset
    };
    let frame = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title);

    let Some(session) = app.session() else {
        f.render_widget(
            Paragraph::new("Select a note to edit it").block(frame),
            parts[0],
        );
        return;
    };
    let Some(editor) = session.try_widget() else {
        f.render_widget(
            Paragraph::new("Inserting generated content...").block(frame),
            parts[0],
        );
        return;
    };

    let focused = session.focus_state().block;
    let mut state = ListState::default();
    let items: Vec<ListItem> = editor
        .blocks()
        .iter()
        .enumerate()
        .map(|(i, block)| {
            if focused.as_ref() == Some(&block.id) {
                state.select(Some(i));
            }
            let lines: Vec<Line> = block_lines(&block.content)
                .into_iter()
                .map(Line::from)
                .collect();
            ListItem::new(lines)
        })
        .collect();
    let blocks = List::new(items)
        .block(frame)
        .highlight_symbol("▌")
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_stateful_widget(blocks, parts[0], &mut state);

    if app.palette.is_visible() {
        let suggestions: Vec<ListItem> = app
            .palette
            .filtered()
            .iter()
            .map(|suggestion| {
                let mut spans = vec![Span::raw(suggestion.name)];
                if !suggestion.category.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", suggestion.category),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        let mut palette_state = ListState::default();
        palette_state.select(Some(app.palette.selected()));
        let palette = List::new(suggestions)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Ask AI: {}", app.palette.search_term())),
            )
            .highlight_style(Style::default().bg(Color::Cyan).fg(Color::Black));
        f.render_stateful_widget(palette, parts[1], &mut palette_state);
    }
}
