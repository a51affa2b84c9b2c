use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine},
        Block, Borders, Paragraph, Wrap,
    },
    Frame,
};

use crate::app::App;
use crate::dial;
use crate::input::InputMode;
use crate::note::NoteField;

/// Canvas units from centre to outer ring.
const DIAL_RADIUS: f64 = 100.0;

/// violet, indigo, blue, turquoise, green, lime green, yellow, orange, red
const OCTAVE_COLORS: [Color; 9] = [
    Color::Rgb(238, 130, 238),
    Color::Rgb(75, 0, 130),
    Color::Rgb(0, 0, 255),
    Color::Rgb(64, 224, 208),
    Color::Rgb(0, 128, 0),
    Color::Rgb(50, 205, 50),
    Color::Rgb(255, 255, 0),
    Color::Rgb(255, 165, 0),
    Color::Rgb(255, 0, 0),
];

fn octave_color(octave: i8) -> Color {
    OCTAVE_COLORS[octave.clamp(0, OCTAVE_COLORS.len() as i8 - 1) as usize]
}

// ── Top-level routing ─────────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title bar
            Constraint::Min(12),   // dial + side panel
            Constraint::Length(3), // status
            Constraint::Length(4), // help
        ])
        .split(area);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(40)])
        .split(rows[1]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(9)])
        .split(middle[1]);

    draw_title(f, rows[0], app);
    draw_dial(f, middle[0], app);
    draw_note_list(f, side[0], app);
    draw_editor(f, side[1], app);
    draw_status(f, rows[2], app);
    draw_help(f, rows[3], app);
}

// ── Title bar ─────────────────────────────────────────────────────────────────

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let play = if app.clock.running() { "▶" } else { "❚❚" };
    let text = format!(
        "  spinseq  ─  {}  ─  mode: {}  ─  match: {}",
        play,
        app.mode().name(),
        app.scheduler.policy.name(),
    );
    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

// ── Dial ──────────────────────────────────────────────────────────────────────

fn draw_dial(f: &mut Frame, area: Rect, app: &App) {
    let head     = app.clock.head_time();
    let rings    = dial::rings(DIAL_RADIUS);
    let spokes   = dial::spokes(head, DIAL_RADIUS);
    let notes    = dial::place_notes(&app.store, head, DIAL_RADIUS);
    let selected = app.input.selected();

    let canvas = Canvas::default()
        .block(Block::default().title(format!(" t = {:.4} ", head)).borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds([-DIAL_RADIUS * 1.05, DIAL_RADIUS * 1.05])
        .y_bounds([-DIAL_RADIUS * 1.05, DIAL_RADIUS * 1.05])
        .paint(move |ctx| {
            for ring in &rings {
                let color = match ring.label {
                    None                   => Color::Red,
                    Some(_) if ring.sharp  => Color::Rgb(40, 40, 40),
                    Some(_)                => Color::DarkGray,
                };
                ctx.draw(&Circle { x: 0.0, y: 0.0, radius: ring.radius, color });
            }
            for spoke in &spokes {
                let (c, s) = (spoke.angle.cos(), spoke.angle.sin());
                ctx.draw(&CanvasLine {
                    x1: c * spoke.inner, y1: s * spoke.inner,
                    x2: c * spoke.outer, y2: s * spoke.outer,
                    color: if spoke.major { Color::Gray } else { Color::DarkGray },
                });
            }
            ctx.layer();

            for note in &notes {
                let color = if Some(note.id) == selected { Color::White } else { octave_color(note.octave) };
                for slice in &note.slices {
                    let (x1, y1) = slice.point(note.radius - slice.length / 2.0);
                    let (x2, y2) = slice.point(note.radius + slice.length / 2.0);
                    ctx.draw(&CanvasLine { x1, y1, x2, y2, color });
                }
            }
            ctx.layer();

            // Playhead
            ctx.draw(&CanvasLine { x1: 0.0, y1: 0.0, x2: DIAL_RADIUS, y2: 0.0, color: Color::White });
            for ring in &rings {
                if let Some(label) = ring.label {
                    ctx.print(ring.radius, 1.5, Span::styled(label, Style::default().fg(Color::Gray)));
                }
            }
        });
    f.render_widget(canvas, area);
}

// ── Note list ─────────────────────────────────────────────────────────────────

fn draw_note_list(f: &mut Frame, area: Rect, app: &App) {
    let mode     = app.mode();
    let choosing = mode.is_choosing();
    let selected = app.selected_index();
    let head     = app.clock.head_time();

    let mut lines: Vec<Line> = Vec::new();
    if app.store.is_empty() {
        lines.push(Line::styled("  (no notes)", Style::default().fg(Color::DarkGray)));
    }
    for (i, (_, note)) in app.store.iter().enumerate() {
        let is_sel = selected == Some(i);
        // Head is inside the note's span.
        let sounding = app.clock.running()
            && head >= note.start()
            && head < note.start() + note.duration();
        let style = if is_sel {
            Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if sounding {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(octave_color(note.octave()))
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:>3} ", i), Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!(
                    "{:<4} t={:<6.3} d={:<5.3} v={:.2}",
                    note.name(), note.start(), note.duration(), note.volume()
                ),
                style,
            ),
        ]));
    }

    // Keep the selection in view.
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = selected.map(|s| s.saturating_sub(visible.saturating_sub(1))).unwrap_or(0);

    let title = match mode {
        InputMode::DeletingNotes(_) => " ► Notes — pick one to delete ",
        InputMode::EditingNote(_)   => " ► Notes — pick one to edit ",
        _                           => " Notes ",
    };
    f.render_widget(
        Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .block(
                Block::default().title(title).borders(Borders::ALL)
                    .border_style(if choosing {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    }),
            ),
        area,
    );
}

// ── Field editor ──────────────────────────────────────────────────────────────

fn draw_editor(f: &mut Frame, area: Rect, app: &App) {
    let editing = app.mode().is_editing();
    let note = app.input.selected().and_then(|id| app.store.by_id(id));

    let mut lines: Vec<Line> = Vec::new();
    for field in NoteField::ALL {
        let value = match (note, field) {
            (None, _)                        => "—".to_string(),
            (Some(n), NoteField::PitchClass) => n.name(),
            (Some(n), NoteField::Octave)     => n.octave().to_string(),
            (Some(n), _)                     => format!("{}", n.get(field)),
        };
        let focused = editing && field == app.field_cursor;
        let marker = if focused { "► " } else { "  " };
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(vec![
            Span::styled(marker, style),
            Span::styled(format!("{:<9}", field.name()), style),
            Span::styled(value, style),
        ]));
    }
    if let Some(n) = note {
        lines.push(Line::styled(
            format!("  {:.2} Hz", n.frequency()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines.push(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::styled(format!("{}_", app.entry), Style::default().fg(Color::White)),
    ]));

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default().title(" Note ").borders(Borders::ALL)
                .border_style(if editing {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::DarkGray)
                }),
        ),
        area,
    );
}

// ── Status bar ────────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let extra = if app.status_msg.is_empty() { String::new() } else { format!("  │  {}", app.status_msg) };
    let text = Line::from(vec![
        Span::styled("Tempo: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{:.0}", app.clock.tempo()),
                     Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw("  │  "),
        Span::styled("Vol: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{:.0}%", app.master_volume * 100.0),
                     Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
        Span::raw("  │  "),
        Span::styled("Notes: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.store.len().to_string(), Style::default().fg(Color::Cyan)),
        Span::styled(extra, Style::default().fg(Color::Yellow)),
    ]);

    f.render_widget(
        Paragraph::new(text)
            .block(Block::default().title(" Status ").borders(Borders::ALL))
            .wrap(Wrap { trim: false }),
        area,
    );
}

// ── Help ──────────────────────────────────────────────────────────────────────

fn draw_help(f: &mut Frame, area: Rect, app: &App) {
    let w = Style::default().fg(Color::White);

    let global = Line::from(vec![
        Span::styled("[Space] ", w), Span::raw("Play/Pause  │  "),
        Span::styled("[PgUp/Dn] ", w), Span::raw("Tempo  │  "),
        Span::styled("[+/-] ", w), Span::raw("Volume  │  "),
        Span::styled("[Esc] ", w), Span::raw("Back  │  "),
        Span::styled("[Ctrl-C] ", w), Span::raw("Quit"),
    ]);

    let mode_line = match app.mode() {
        InputMode::Idle => Line::from(vec![
            Span::styled("[A] ", w), Span::raw("Add  "),
            Span::styled("[E] ", w), Span::raw("Edit  "),
            Span::styled("[D] ", w), Span::raw("Delete  │  "),
            Span::styled("[R] ", w), Span::raw("Reset  "),
            Span::styled("[C] ", w), Span::raw("Clear  "),
            Span::styled("[P] ", w), Span::raw("Preset  "),
            Span::styled("[Q] ", w), Span::raw("Quit"),
        ]),
        InputMode::DeletingNotes(_) => Line::from(vec![
            Span::raw("Type index  "),
            Span::styled("[Enter] ", w), Span::raw("Select  "),
            Span::styled("[Del] ", w), Span::raw("Delete selected"),
        ]),
        mode if mode.is_editing() => Line::from(vec![
            Span::styled("[Tab] ", w), Span::raw("Field  "),
            Span::styled("[↑↓] ", w), Span::raw("Step value  "),
            Span::raw("Type value  "),
            Span::styled("[Enter] ", w), Span::raw("Apply  "),
            Span::styled("#n ", w), Span::raw("Other note  "),
            Span::styled("[Del] ", w), Span::raw("Delete"),
        ]),
        _ => Line::from(vec![
            Span::raw("Type index  "),
            Span::styled("[Enter] ", w), Span::raw("Select"),
        ]),
    };

    f.render_widget(
        Paragraph::new(vec![global, mode_line])
            .block(Block::default().title(" Help ").borders(Borders::ALL))
            .style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
