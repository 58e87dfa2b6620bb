mod form;

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use form::{FormAction, FormState};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};
use snipkit_config::Library;
use snipkit_engine::{
    ClipboardError, ClipboardSource, Collaborators, DialogResult, ExpansionPipeline,
    InMemoryTemplateStore, InputDialog, InputFieldDefinition, Key, KeyDisposition,
    NativeFieldSurface, PipelineOutcome, TextSurface, surface,
};
use std::{
    env,
    fs::OpenOptions,
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
    time::{Duration, Instant},
};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// System clipboard, opened on first use so a headless terminal still works.
#[derive(Default)]
struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl ClipboardSource for SystemClipboard {
    fn read(&mut self) -> Result<String, ClipboardError> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(clipboard);
        }
        let Some(clipboard) = self.inner.as_mut() else {
            return Err(ClipboardError::Unavailable("clipboard not open".to_string()));
        };
        clipboard
            .get_text()
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

/// Shows the interactive fields as a modal form over the editor.
struct TuiDialog<'a> {
    terminal: &'a mut Tui,
    backdrop: String,
}

impl InputDialog for TuiDialog<'_> {
    fn show(&mut self, fields: &[InputFieldDefinition]) -> DialogResult {
        let mut form = FormState::new(fields);
        loop {
            let backdrop = &self.backdrop;
            if let Err(e) = self.terminal.draw(|f| {
                let editor = Paragraph::new(backdrop.as_str())
                    .style(Style::default().fg(Color::DarkGray))
                    .block(Block::default().borders(Borders::ALL).title("Editor"));
                f.render_widget(editor, f.area());
                form.render(f);
            }) {
                log::error!("failed to draw input form: {e}");
                return DialogResult::Cancelled;
            }

            let key = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
                Ok(_) => continue,
                Err(e) => {
                    log::error!("failed to read terminal event: {e}");
                    return DialogResult::Cancelled;
                }
            };
            match form.handle_key(key) {
                FormAction::Continue => {}
                FormAction::Submit => return DialogResult::Submitted(form.values()),
                FormAction::Cancel => return DialogResult::Cancelled,
            }
        }
    }
}

struct App {
    library_source: String,
    library: Library,
    store: InMemoryTemplateStore,
    field: NativeFieldSurface,
    pipeline: ExpansionPipeline,
    clipboard: SystemClipboard,
    status: String,
}

impl App {
    fn new(library: Library, library_source: String) -> Result<Self> {
        let store = library.template_store()?;
        let pipeline = ExpansionPipeline::new(library.settings.pipeline_settings());
        Ok(Self {
            library_source,
            library,
            store,
            field: NativeFieldSurface::textarea(""),
            pipeline,
            clipboard: SystemClipboard::default(),
            status: "Type a trigger followed by the trigger key".to_string(),
        })
    }

    fn describe(&mut self, outcome: PipelineOutcome) {
        self.status = match outcome {
            PipelineOutcome::NoTrigger => return,
            PipelineOutcome::NoTemplate { trigger } => format!("No template for {trigger}"),
            PipelineOutcome::Cancelled => "Expansion cancelled".to_string(),
            PipelineOutcome::Stale => "Text changed, expansion skipped".to_string(),
            PipelineOutcome::Expanded {
                trigger, tab_stops, ..
            } if tab_stops > 0 => format!(
                "Expanded {trigger}: Tab/Shift+Tab through {tab_stops} stops, Enter or Esc to finish"
            ),
            PipelineOutcome::Expanded { trigger, .. } => {
                format!("Expanded {trigger} (Ctrl+Z to undo)")
            }
        };
    }

    fn undo(&mut self) {
        self.status = if self.pipeline.undo(&mut self.field) {
            "Expansion undone".to_string()
        } else {
            "Nothing to undo".to_string()
        };
    }

    /// Applies the default editing action for a key the pipeline passed
    /// through. Returns whether text was typed.
    fn edit(&mut self, key: &KeyEvent) -> bool {
        let field = &mut self.field;
        let caret = field.selection_start();
        let value = field.value();
        match key.code {
            KeyCode::Char(c) => {
                field.type_text(c.encode_utf8(&mut [0; 4]));
                true
            }
            KeyCode::Enter => {
                field.type_text("\n");
                true
            }
            KeyCode::Tab => {
                field.type_text("\t");
                true
            }
            KeyCode::Backspace => {
                field.delete_backward();
                false
            }
            KeyCode::Left => {
                let prev = value[..caret].char_indices().next_back().map_or(0, |(i, _)| i);
                field.set_caret(prev);
                false
            }
            KeyCode::Right => {
                let next = value[caret..]
                    .chars()
                    .next()
                    .map_or(caret, |c| caret + c.len_utf8());
                field.set_caret(next);
                false
            }
            KeyCode::Home => {
                let start = value[..caret].rfind('\n').map_or(0, |i| i + 1);
                field.set_caret(start);
                false
            }
            KeyCode::End => {
                let end = value[caret..].find('\n').map_or(value.len(), |i| caret + i);
                field.set_caret(end);
                false
            }
            _ => false,
        }
    }
}

fn engine_key(key: &KeyEvent) -> surface::KeyEvent {
    let mapped = match key.code {
        KeyCode::Tab | KeyCode::BackTab => Key::Tab,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    };
    surface::KeyEvent {
        key: mapped,
        shift: key.modifiers.contains(KeyModifiers::SHIFT) || key.code == KeyCode::BackTab,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
    }
}

fn init_logging(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    // The terminal belongs to the TUI, so logs go to a file
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    // Determine the template library from CLI args or the config file
    let args: Vec<String> = env::args().collect();
    let config_path = Library::config_path();

    let (library, library_source) = if args.len() == 2 {
        let library_path = PathBuf::from(&args[1]);
        let library_path = Library::expand_path(&library_path).unwrap_or(library_path);
        match Library::load_from_path(&library_path) {
            Ok(Some(library)) => (library, library_path.display().to_string()),
            Ok(None) => {
                eprintln!(
                    "Error: Library file '{}' does not exist",
                    library_path.display()
                );
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    } else if args.len() == 1 {
        match Library::load() {
            Ok(Some(library)) => (library, config_path.display().to_string()),
            Ok(None) => (Library::sample(), "built-in sample".to_string()),
            Err(e) => {
                eprintln!("Error: Failed to load library file: {e}");
                eprintln!("Usage: {} [library.toml]", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [library.toml]", args[0]);
        process::exit(1);
    };

    init_logging(&library.log_path())?;
    log::info!("loaded {} templates from {}", library.templates.len(), library_source);

    let mut app = App::new(library, library_source)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("{err:?}");
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Tui, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if key.modifiers.contains(KeyModifiers::CONTROL) {
                        match key.code {
                            KeyCode::Char('q') => return Ok(()),
                            KeyCode::Char('z') => app.undo(),
                            _ => {}
                        }
                        continue;
                    }
                    handle_key(terminal, app, &key);
                }
                Event::FocusLost => {
                    app.field.blur();
                    app.pipeline.on_blur(Instant::now());
                }
                Event::FocusGained => app.field.focus(),
                _ => {}
            }
        }

        app.pipeline.tick(&app.field, Instant::now());
    }
}

fn handle_key(terminal: &mut Tui, app: &mut App, key: &KeyEvent) {
    if app.pipeline.on_keydown(&mut app.field, &engine_key(key)) == KeyDisposition::Consumed {
        if !app.pipeline.tab_stops().is_active() {
            app.status = "Done".to_string();
        }
        return;
    }
    if !app.edit(key) {
        return;
    }

    let mut dialog = TuiDialog {
        terminal,
        backdrop: app.field.value().to_string(),
    };
    let mut collaborators = Collaborators {
        templates: &app.store,
        clipboard: &mut app.clipboard,
        dialog: &mut dialog,
    };
    let outcome = app.pipeline.on_input(&mut app.field, &mut collaborators);
    app.describe(outcome);
}

/// Splits the field into display lines, highlighting `selection`.
fn field_lines(value: &str, selection: (usize, usize)) -> Vec<Line<'static>> {
    let highlight = Style::default().bg(Color::Yellow).fg(Color::Black);
    let mut lines = Vec::new();
    let mut line_start = 0;
    for raw in value.split('\n') {
        let line_end = line_start + raw.len();
        let sel_start = selection.0.clamp(line_start, line_end) - line_start;
        let sel_end = selection.1.clamp(line_start, line_end) - line_start;
        let spans = [
            (&raw[..sel_start], Style::default()),
            (&raw[sel_start..sel_end], highlight),
            (&raw[sel_end..], Style::default()),
        ]
        .into_iter()
        .filter(|(text, _)| !text.is_empty())
        .map(|(text, style)| Span::styled(text.replace('\t', "→"), style))
        .collect::<Vec<_>>();
        lines.push(Line::from(spans));
        line_start = line_end + 1;
    }
    lines
}

/// Row and column of `offset`, one column per character.
fn caret_position(value: &str, offset: usize) -> (u16, u16) {
    let before = &value[..offset.min(value.len())];
    let row = before.matches('\n').count();
    let col = before.rsplit('\n').next().map_or(0, |line| line.chars().count());
    (row as u16, col as u16)
}

fn ui(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(rows[0]);

    // Template list panel
    let mut templates: Vec<_> = app.library.templates.iter().collect();
    templates.sort_by(|a, b| a.trigger.cmp(&b.trigger));
    let items: Vec<ListItem> = templates
        .iter()
        .map(|template| {
            let category = template
                .category_id
                .and_then(|id| app.library.category(id))
                .map(|c| format!(" [{}]", c.name))
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(
                    template.trigger.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(" {}{}", template.name, category)),
            ]))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Templates ({})", app.library_source)),
    );
    f.render_widget(list, chunks[0]);

    // Editor panel
    let value = app.field.value();
    let selection = (app.field.selection_start(), app.field.selection_end());
    let title = match app.pipeline.tab_stops().state() {
        Some(state) => format!(
            "Editor: tab stop {}/{}",
            state.current_index() + 1,
            state.tab_stops().len()
        ),
        None => "Editor".to_string(),
    };
    let editor = Paragraph::new(field_lines(value, selection))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(editor, chunks[1]);

    if app.field.has_focus() {
        let (row, col) = caret_position(value, selection.0);
        f.set_cursor_position(Position::new(
            chunks[1].x + 1 + col,
            chunks[1].y + 1 + row,
        ));
    }

    // Status and instructions
    let help = Paragraph::new(vec![
        Line::from(app.status.as_str()),
        Line::from(vec![
            Span::raw("Ctrl+Q: Quit | "),
            Span::raw("Ctrl+Z: Undo expansion | "),
            Span::raw(format!("Trigger key: {:?}", app.library.settings.trigger_key)),
        ]),
    ])
    .block(Block::default());
    f.render_widget(help, rows[1]);
}
