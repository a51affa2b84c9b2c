use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::File,
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use spinseq::app::App;
use spinseq::audio::{AudioEngine, SynthVoice};
use spinseq::command::Command;
use spinseq::config;
use spinseq::input::InputMode;
use spinseq::sequencer::{AudioVoice, SilentVoice};
use spinseq::synth::Synth;
use spinseq::ui;

#[derive(Parser)]
#[command(name = "spinseq")]
#[command(about = "Step sequencer on a rotating polar timeline", long_about = None)]
struct Cli {
    /// Tempo scalar; the head moves 1 / (4 * tempo) per frame
    #[arg(short, long)]
    tempo: Option<f64>,

    /// Config file to use instead of the one in the user config dir
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load the preset on start
    #[arg(short, long)]
    preset: bool,

    /// Run without opening an audio device
    #[arg(long)]
    no_audio: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) -> Result<()> {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = config::config_dir().join("spinseq.log");
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&log_path)
        .or_else(|_| File::create(std::env::temp_dir().join("spinseq.log")))
        .context("Cannot create log file")?;

    WriteLogger::init(log_level, Config::default(), log_file)
        .context("Failed to initialize logger")?;

    info!("spinseq starting (log level: {:?})", log_level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = config::Config::load(cli.config.as_deref());
    let mut app = App::from_config(&config);
    if let Some(tempo) = cli.tempo {
        if !app.clock.set_tempo(tempo) {
            warn!("ignoring tempo {}: must be positive", tempo);
        }
    }
    if cli.preset {
        app.submit(Command::LoadPreset);
    }

    let synth = Arc::new(Mutex::new(Synth::new(44100.0)));
    let mut _audio: Option<AudioEngine> = None;
    let mut voice: Box<dyn AudioVoice> = Box::new(SilentVoice);
    if !cli.no_audio {
        match AudioEngine::new(Arc::clone(&synth)) {
            Ok(engine) => {
                _audio = Some(engine);
                voice = Box::new(SynthVoice::new(Arc::clone(&synth)));
            }
            Err(e) => {
                warn!("audio unavailable, running silent: {:#}", e);
                app.status_msg = "No audio device — running silent".to_string();
            }
        }
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let frame = Duration::from_millis(config.frame_ms());
    let result = run(&mut terminal, &mut app, voice.as_mut(), frame);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    if let Err(e) = result { eprintln!("Error: {:?}", e); }
    info!("spinseq exiting");
    Ok(())
}

/// One tick and one redraw per frame; key events are turned into commands in between.
fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app:      &mut App,
    voice:    &mut dyn AudioVoice,
    frame:    Duration,
) -> Result<()> {
    loop {
        app.tick(voice);
        terminal.draw(|f| ui::draw(f, app))?;

        let deadline = Instant::now() + frame;
        loop {
            let now = Instant::now();
            if now >= deadline { break; }
            if event::poll(deadline - now)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press { handle_key(app, key); }
                }
            }
        }
        if app.should_quit { break; }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let idle = app.mode() == InputMode::Idle;
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.should_quit = true,

        // ── Global ────────────────────────────────────────────────────────
        KeyCode::Char(' ') => app.submit(Command::TogglePlay),
        KeyCode::PageUp    => app.submit(Command::TempoUp),
        KeyCode::PageDown  => app.submit(Command::TempoDown),
        KeyCode::Esc => {
            app.entry.clear();
            app.submit(Command::Escape);
        }

        // ── Idle hotkeys ──────────────────────────────────────────────────
        KeyCode::Char(c) if idle => match c.to_ascii_lowercase() {
            'a' => app.submit(Command::EnterAddMode),
            'e' => app.submit(Command::EnterEditMode),
            'd' => app.submit(Command::EnterDeleteMode),
            'r' => app.submit(Command::Reset),
            'c' => app.submit(Command::Clear),
            'p' => app.submit(Command::LoadPreset),
            'q' => app.should_quit = true,
            '+' | '=' => app.submit(Command::VolumeUp),
            '-' => app.submit(Command::VolumeDown),
            _ => {}
        },

        // ── Picking / editing ─────────────────────────────────────────────
        KeyCode::Char(c)   => app.type_char(c),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Enter     => app.confirm_entry(),
        KeyCode::Delete    => app.submit(Command::DeleteSelected),
        KeyCode::Tab       => app.focus_next_field(),
        KeyCode::BackTab   => app.focus_prev_field(),
        KeyCode::Up        => app.nudge(1),
        KeyCode::Down      => app.nudge(-1),
        _ => {}
    }
}
