//! Step sequencer on a rotating polar timeline.
//!
//! The engine is frame-driven: the front end queues [`command::Command`]s on
//! an [`app::App`] and calls [`app::App::tick`] once per rendered frame.  Each
//! tick applies the queued commands, advances the [`sequencer::TimelineClock`]
//! and lets the [`sequencer::Scheduler`] trigger any note whose start the head
//! has reached.

pub mod app;
pub mod audio;
pub mod command;
pub mod config;
pub mod dial;
pub mod error;
pub mod input;
pub mod note;
pub mod sequencer;
pub mod store;
pub mod synth;
pub mod ui;
