use std::collections::VecDeque;

use log::{info, warn};

use crate::command::Command;
use crate::config::Config;
use crate::error::CommandError;
use crate::input::{InputMode, InputModeController, Outcome};
use crate::note::NoteField;
use crate::sequencer::{AudioVoice, Scheduler, TimelineClock, TriggerMatch};
use crate::store::NoteStore;

const TEMPO_MIN:  f64 = 20.0;
const TEMPO_MAX:  f64 = 300.0;
const TEMPO_STEP: f64 = 5.0;
const VOLUME_STEP: f64 = 0.05;

// ── App state ─────────────────────────────────────────────────────────────────

/// The whole session: every piece of mutable sequencer state lives here and
/// is changed only through [`App::submit`] + [`App::tick`].
pub struct App {
    pub store:         NoteStore,
    pub clock:         TimelineClock,
    pub scheduler:     Scheduler,
    pub input:         InputModeController,
    pub master_volume: f64,
    pub preset:        Vec<(u8, i8)>,
    pub status_msg:    String,
    pub should_quit:   bool,

    // Front-end cursors; never read by the engine.
    pub field_cursor: NoteField,
    pub entry:        String,

    pending: VecDeque<Command>,
}

impl App {
    pub fn new(tempo: f64, policy: TriggerMatch, master_volume: f64, preset: Vec<(u8, i8)>) -> Self {
        Self {
            store:         NoteStore::new(),
            clock:         TimelineClock::new(tempo),
            scheduler:     Scheduler::new(policy),
            input:         InputModeController::new(),
            master_volume: master_volume.clamp(0.0, 1.0),
            preset,
            status_msg:    String::new(),
            should_quit:   false,
            field_cursor:  NoteField::Start,
            entry:         String::new(),
            pending:       VecDeque::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tempo(), config.trigger_match(), config.master_volume(), config.preset())
    }

    pub fn mode(&self) -> InputMode { self.input.mode() }

    // ── Frame loop ────────────────────────────────────────────────────────

    /// Queue a command for the next tick.
    pub fn submit(&mut self, cmd: Command) {
        self.pending.push_back(cmd);
    }

    /// One frame: apply queued commands, advance the clock, fire matching notes.
    /// Never fails; the first rejected command of the frame owns the status line.
    pub fn tick(&mut self, voice: &mut dyn AudioVoice) -> usize {
        let mut rejected = false;
        while let Some(cmd) = self.pending.pop_front() {
            match self.apply(&cmd) {
                Ok(Outcome::Done(msg)) if !rejected => self.status_msg = msg,
                Ok(_) => {}
                Err(e) => {
                    warn!("rejected {:?}: {}", cmd, e);
                    if !rejected {
                        self.status_msg = e.to_string();
                        rejected = true;
                    }
                }
            }
        }

        let sweep = self.clock.advance();
        self.scheduler.check(&self.store, &self.clock, sweep, self.master_volume, voice)
    }

    fn apply(&mut self, cmd: &Command) -> Result<Outcome, CommandError> {
        if cmd.is_edit() {
            return self.input.handle(cmd, &mut self.store);
        }
        let msg = match cmd {
            Command::Pause  => { self.clock.pause(); "Paused".to_string() }
            Command::Resume => { self.clock.resume(); "Playing".to_string() }
            Command::TogglePlay => {
                self.clock.toggle_run();
                if self.clock.running() { "Playing".to_string() } else { "Paused".to_string() }
            }
            Command::Reset => {
                self.reset();
                "Reset to time 0".to_string()
            }
            Command::Clear => {
                self.clear();
                info!("cleared all notes");
                "Cleared all notes".to_string()
            }
            Command::LoadPreset => {
                let n = self.store.load_preset(&self.preset)?;
                self.reset();
                self.input.escape();
                info!("loaded preset ({} notes)", n);
                format!("Loaded preset: {} notes", n)
            }
            Command::TempoUp | Command::TempoDown => {
                let delta = if *cmd == Command::TempoUp { TEMPO_STEP } else { -TEMPO_STEP };
                let tempo = (self.clock.tempo() + delta).clamp(TEMPO_MIN, TEMPO_MAX);
                self.clock.set_tempo(tempo);
                format!("Tempo: {:.0}", tempo)
            }
            Command::VolumeUp | Command::VolumeDown => {
                let delta = if *cmd == Command::VolumeUp { VOLUME_STEP } else { -VOLUME_STEP };
                self.master_volume = (self.master_volume + delta).clamp(0.0, 1.0);
                format!("Volume: {:.0}%", self.master_volume * 100.0)
            }
            _ => return Ok(Outcome::Ignored),
        };
        Ok(Outcome::Done(msg))
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.scheduler.reset();
    }

    /// Empty the store and rewind the clock.
    fn clear(&mut self) {
        self.store.clear();
        self.reset();
        self.input.escape();
    }

    // ── Entry line (front end) ────────────────────────────────────────────

    pub fn type_char(&mut self, c: char) {
        if self.entry.len() < 16 { self.entry.push(c); }
    }

    pub fn backspace(&mut self) {
        self.entry.pop();
    }

    /// Turn the entry line into a command: `#n` or a bare index while picking
    /// selects a note, anything else while editing sets the focused field.
    pub fn confirm_entry(&mut self) {
        let text = std::mem::take(&mut self.entry);
        let text = text.trim();
        if text.is_empty() { return; }

        let mode = self.mode();
        if let Some(rest) = text.strip_prefix('#') {
            self.submit_index(rest);
        } else if mode.is_editing() {
            self.submit(Command::SetField(self.field_cursor, text.to_string()));
        } else if mode.is_choosing() {
            self.submit_index(text);
        }
    }

    fn submit_index(&mut self, raw: &str) {
        match raw.trim().parse::<usize>() {
            Ok(i)  => self.submit(Command::SelectNote(i)),
            Err(_) => {
                warn!("not a note index: {:?}", raw);
                self.status_msg = format!("Not a note index: {}", raw);
            }
        }
    }

    pub fn focus_next_field(&mut self) { self.field_cursor = self.field_cursor.next(); }
    pub fn focus_prev_field(&mut self) { self.field_cursor = self.field_cursor.prev(); }

    pub fn nudge(&mut self, steps: i32) {
        self.submit(Command::NudgeField(self.field_cursor, steps));
    }

    /// Index of the selected note in list order, for display.
    pub fn selected_index(&self) -> Option<usize> {
        self.input.selected().and_then(|id| self.store.index_of(id))
    }
}
