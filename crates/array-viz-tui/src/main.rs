//! Terminal demo for `array-viz`
//!
//! Records a bubble sort over a random array, rewinds it, and lets you walk through the
//! recorded steps as a bar chart built with crossterm and ratatui.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p array-viz-tui -- [size]
//! ```
//!
//! Set `ARRAY_VIZ_LOG` (e.g. `ARRAY_VIZ_LOG=array_viz=debug`) to write structured logs to
//! `array-viz-tui.log` in the current directory.
//!
//! # Keys
//!
//! - Right / Left: step forward / backward
//! - Home / End: rewind / fast-forward
//! - Space: toggle play
//! - +/-: faster / slower
//! - q: quit

use array_viz::{
    ARROW, ArrayOptions, ArrayResult, Geometry, HIGHLIGHT, OperationKind, PlaybackMode, Renderer,
    TracingLogger, TransitionOptions, VisualArray,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use rand::Rng;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
};
use std::{
    cell::RefCell,
    env,
    fs::File,
    io::{self, stdout},
    process,
    rc::Rc,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_SIZE: usize = 16;
const MAX_SIZE: usize = 64;
const BAR_EXTENT: u32 = 20;
const LOG_FILE: &str = "array-viz-tui.log";

/// What the renderer last received.
#[derive(Debug, Default)]
struct Screen {
    geometry: Option<Geometry>,
    last_kind: Option<OperationKind>,
    /// Start and duration of the running animation.
    animation: Option<(Instant, Duration)>,
}

impl Screen {
    /// Animation progress in percent, or `None` when nothing is animating.
    fn progress(&self) -> Option<u32> {
        let (started, speed) = self.animation?;
        if speed.is_zero() {
            return None;
        }
        let ratio = started.elapsed().as_secs_f64() / speed.as_secs_f64();
        (ratio < 1.0).then(|| (ratio * 100.0) as u32)
    }
}

/// Renderer that hands geometry to the draw loop.
#[derive(Clone, Default)]
struct TerminalRenderer {
    screen: Rc<RefCell<Screen>>,
}

impl Renderer for TerminalRenderer {
    fn apply_transition(
        &mut self,
        kind: OperationKind,
        _old: &Geometry,
        new: &Geometry,
        options: TransitionOptions,
    ) {
        let mut screen = self.screen.borrow_mut();
        screen.geometry = Some(new.clone());
        screen.last_kind = Some(kind);
        screen.animation = options.animate.then(|| (Instant::now(), options.speed));
    }

    fn reset(&mut self, visual: &Geometry) {
        let mut screen = self.screen.borrow_mut();
        screen.geometry = Some(visual.clone());
        screen.animation = None;
    }
}

/// Application state
struct App {
    array: VisualArray,
    screen: Rc<RefCell<Screen>>,
    playing: bool,
    last_tick: Instant,
    should_quit: bool,
    status_message: String,
}

impl App {
    fn new(size: usize) -> ArrayResult<Self> {
        let mut rng = rand::thread_rng();
        let values: Vec<i32> = (0..size).map(|_| rng.gen_range(1..=99)).collect();

        let mut options = ArrayOptions::default().with_layout("bar").with_indexed(true);
        options.metrics.bar_max_extent = BAR_EXTENT;

        let renderer = TerminalRenderer::default();
        let screen = renderer.screen.clone();
        let mut array =
            VisualArray::with_renderer(values, options, renderer).with_logger(TracingLogger);

        record_bubble_sort(&mut array)?;
        array.rewind()?;

        Ok(Self {
            array,
            screen,
            playing: false,
            last_tick: Instant::now(),
            should_quit: false,
            status_message: String::new(),
        })
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        self.last_tick = Instant::now();
        self.array.set_playback_mode(if playing {
            PlaybackMode::Play
        } else {
            PlaybackMode::Scrub
        });
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.status_message.clear();

        let result = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                Ok(())
            }
            KeyCode::Char(' ') => {
                self.set_playing(!self.playing);
                Ok(())
            }
            KeyCode::Right => {
                self.set_playing(false);
                self.array.step_forward().map(|_| ())
            }
            KeyCode::Left => {
                self.set_playing(false);
                self.array.step_backward().map(|_| ())
            }
            KeyCode::Home => {
                self.set_playing(false);
                self.array.rewind()
            }
            KeyCode::End => {
                self.set_playing(false);
                self.array.fast_forward()
            }
            KeyCode::Char('+') => {
                let speed = self.array.speed() / 2;
                self.array.set_speed(speed.max(Duration::from_millis(25)));
                Ok(())
            }
            KeyCode::Char('-') => {
                let speed = self.array.speed() * 2;
                self.array.set_speed(speed.min(Duration::from_secs(4)));
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(err) = result {
            self.status_message = format!("error: {err}");
        }
    }

    /// Advance playback once the current step's animation time has elapsed.
    fn tick(&mut self) {
        if !self.playing || self.last_tick.elapsed() < self.array.speed() {
            return;
        }
        self.last_tick = Instant::now();
        match self.array.step_forward() {
            Ok(true) => {}
            Ok(false) => {
                self.set_playing(false);
                self.status_message = "end of recording".to_string();
            }
            Err(err) => {
                self.set_playing(false);
                self.status_message = format!("error: {err}");
            }
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.render_chart(frame, chunks[0]);
        self.render_status_line(frame, chunks[1]);
        self.render_shortcuts(frame, chunks[2]);
    }

    fn render_chart(&self, frame: &mut Frame, area: Rect) {
        let screen = self.screen.borrow();
        let block = Block::default().borders(Borders::ALL).title(" bubble sort ");
        let Some(geometry) = screen.geometry.as_ref() else {
            frame.render_widget(Paragraph::new("no geometry").block(block), area);
            return;
        };

        let bars: Vec<Bar> = geometry
            .cells
            .iter()
            .map(|cell| {
                let color = if cell.decorations.iter().any(|d| d == HIGHLIGHT) {
                    Color::Yellow
                } else if cell.decorations.iter().any(|d| d == ARROW) {
                    Color::Green
                } else {
                    Color::Cyan
                };
                Bar::default()
                    .value(u64::from(cell.bar_extent.unwrap_or(0)))
                    .text_value(cell.label.clone())
                    .label(Line::from(cell.caption.clone().unwrap_or_default()))
                    .style(Style::default().fg(color))
            })
            .collect();

        let count = u16::try_from(bars.len().max(1)).unwrap_or(u16::MAX);
        let bar_width = (area.width.saturating_sub(2) / count).saturating_sub(1).max(1);

        let chart = BarChart::default()
            .block(block)
            .bar_width(bar_width)
            .bar_gap(1)
            .max(u64::from(BAR_EXTENT))
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect) {
        let screen = self.screen.borrow();
        let timeline = self.array.timeline();

        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let animation = screen
                .progress()
                .map(|p| format!(" | animating {p}%"))
                .unwrap_or_default();
            format!(
                "step {}/{} | {} | {}ms | last: {}{}",
                timeline.cursor(),
                timeline.len(),
                if self.playing { "playing" } else { "paused" },
                self.array.speed().as_millis(),
                screen
                    .last_kind
                    .map(|kind| kind.as_str())
                    .unwrap_or("-"),
                animation
            )
        };

        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, area);
    }

    fn render_shortcuts(&self, frame: &mut Frame, area: Rect) {
        let shortcuts = "Left/Right:step  Home/End:rewind/end  Space:play/pause  +/-:speed  q:quit";
        let shortcuts_line =
            Paragraph::new(shortcuts).style(Style::default().bg(Color::Blue).fg(Color::White));
        frame.render_widget(shortcuts_line, area);
    }
}

/// Bubble sort through the recorded surface. Compared pairs are highlighted and every settled
/// position gets an arrow.
fn record_bubble_sort(array: &mut VisualArray) -> ArrayResult<()> {
    let len = array.size();
    for pass in 0..len.saturating_sub(1) {
        for i in 0..len - 1 - pass {
            array.highlight(vec![i, i + 1])?;
            let a = array.value(i)?.as_number().unwrap_or_default();
            let b = array.value(i + 1)?.as_number().unwrap_or_default();
            if a > b {
                array.swap(i, i + 1)?;
            }
            array.unhighlight(vec![i, i + 1])?;
        }
        array.toggle_arrow(len - 1 - pass)?;
    }
    if len > 0 {
        array.toggle_arrow(0)?;
    }
    Ok(())
}

fn init_logging() -> io::Result<()> {
    let Ok(directives) = env::var("ARRAY_VIZ_LOG") else {
        return Ok(());
    };
    let file = File::create(LOG_FILE)?;
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .init();
    Ok(())
}

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();
    let size = match args.get(1).map(|raw| raw.parse::<usize>()) {
        None => DEFAULT_SIZE,
        Some(Ok(size)) if (1..=MAX_SIZE).contains(&size) => size,
        Some(_) => {
            eprintln!("usage: {} [size (1..={MAX_SIZE})]", args[0]);
            process::exit(1);
        }
    };

    init_logging()?;
    let mut app = App::new(size).map_err(io::Error::other)?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("error: {}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
        {
            app.handle_key_event(key);
        }

        app.tick();
    }

    Ok(())
}
