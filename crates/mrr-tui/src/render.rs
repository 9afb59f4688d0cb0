// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use mrr_app::{Entry, EntryKind, StatusTone, format_cents};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Table};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::controller::Controller;

const TITLE: &str = "💰 MRR Tracker";
const HELP: &str = "j/k: navigate | a: add | e: edit | d: delete | r: refresh | q: quit";
const MARGIN: u16 = 2;
/// Column where notes start: margin + ID + Date + Amount + Source + Type.
pub const NOTE_COLUMN: u16 = 56;
const COLUMN_WIDTHS: [u16; 6] = [MARGIN, 6, 12, 12, 12, 12];
const HEADERS: [&str; 7] = ["", "ID", "Date", "Amount", "Source", "Type", "Note"];

fn header_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn selected_style() -> Style {
    Style::default().bg(Color::Blue).fg(Color::White)
}

pub fn render(frame: &mut Frame<'_>, controller: &Controller) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_title(frame, layout[0], controller);
    render_column_headers(frame, layout[2]);
    render_separator(frame, layout[3]);
    render_rows(frame, layout[4], controller);
    render_footer(frame, layout[6], controller);
    render_status_bar(frame, layout[7], controller);
}

fn render_title(frame: &mut Frame<'_>, area: Rect, controller: &Controller) {
    let inner = inset(area);
    frame.render_widget(
        Paragraph::new(Span::styled(TITLE, header_style())),
        inner,
    );

    let mrr = format!("MRR: {}", format_cents(controller.recurring_total()));
    frame.render_widget(
        Paragraph::new(Span::styled(
            mrr,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Right),
        inner,
    );
}

fn render_column_headers(frame: &mut Frame<'_>, area: Rect) {
    let header = Row::new(HEADERS).style(header_style());
    frame.render_widget(Table::new([header], column_constraints()).column_spacing(0), area);
}

fn render_separator(frame: &mut Frame<'_>, area: Rect) {
    let inner = inset(area);
    let line = "─".repeat(usize::from(inner.width));
    frame.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::DarkGray)),
        inner,
    );
}

fn render_rows(frame: &mut Frame<'_>, area: Rect, controller: &Controller) {
    let note_width = usize::from(controller.size().0.saturating_sub(NOTE_COLUMN));
    let selected = controller.selected();
    let rows = controller
        .entries()
        .iter()
        .enumerate()
        .skip(controller.offset())
        .take(controller.visible_rows())
        .map(|(index, entry)| entry_row(entry, selected == Some(index), note_width));

    frame.render_widget(Table::new(rows, column_constraints()).column_spacing(0), area);
}

fn entry_row(entry: &Entry, is_selected: bool, note_width: usize) -> Row<'static> {
    let note = truncate_note(&entry.note, note_width);
    let cells = [
        String::new(),
        entry.id.to_string(),
        format_date(entry),
        format_cents(entry.amount_cents),
        entry.source.to_string(),
        entry.kind.to_string(),
        note,
    ];

    if is_selected {
        // One uniform style for the whole row, across the full width.
        return Row::new(cells).style(selected_style());
    }

    let [margin, id, date, amount, source, kind, note] = cells;
    let kind_style = if entry.kind == EntryKind::OneTime {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Row::new([
        Cell::from(margin),
        Cell::from(id),
        Cell::from(date),
        Cell::from(amount).style(Style::default().fg(Color::Green)),
        Cell::from(source).style(Style::default().fg(Color::Magenta)),
        Cell::from(kind).style(kind_style),
        Cell::from(note),
    ])
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, controller: &Controller) {
    let mode = controller.mode();
    let line = if mode.is_input() {
        Line::from(format!("{}{}_", mode.prompt(), controller.input()))
    } else if let Some(status) = controller.status() {
        Line::styled(status.text.clone(), tone_style(status.tone))
    } else {
        Line::styled(HELP, Style::default().fg(Color::Gray))
    };
    frame.render_widget(Paragraph::new(line), inset(area));
}

fn render_status_bar(frame: &mut Frame<'_>, area: Rect, controller: &Controller) {
    frame.render_widget(
        Paragraph::new(status_bar_text(controller))
            .style(Style::default().bg(Color::DarkGray).fg(Color::White)),
        area,
    );
}

pub fn status_bar_text(controller: &Controller) -> String {
    let total = controller.entries().len();
    let mut text = format!(" {total} entries ");
    if let Some(selected) = controller.selected() {
        text.push_str(&format!("| {}/{total} ", selected + 1));
    }
    text
}

fn tone_style(tone: StatusTone) -> Style {
    match tone {
        StatusTone::Info => Style::default(),
        StatusTone::Success => Style::default().fg(Color::Green),
        StatusTone::Error => Style::default().fg(Color::Red),
    }
}

fn column_constraints() -> Vec<Constraint> {
    let mut widths = COLUMN_WIDTHS
        .iter()
        .map(|width| Constraint::Length(*width))
        .collect::<Vec<_>>();
    widths.push(Constraint::Fill(1));
    widths
}

fn format_date(entry: &Entry) -> String {
    let date = entry.occurred_on;
    format!("{:04}-{:02}-{:02}", date.year(), date.month() as u8, date.day())
}

/// Cuts `note` to `max_width` terminal cells, ending in `...` when
/// something was dropped. Wide characters count as two cells.
pub fn truncate_note(note: &str, max_width: usize) -> String {
    const ELLIPSIS: &str = "...";
    if note.width() <= max_width {
        return note.to_owned();
    }
    if max_width < ELLIPSIS.len() {
        return ".".repeat(max_width);
    }

    let budget = max_width - ELLIPSIS.len();
    let mut used = 0;
    let mut kept = String::new();
    for ch in note.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width > budget {
            break;
        }
        used += width;
        kept.push(ch);
    }
    format!("{kept}{ELLIPSIS}")
}

fn inset(area: Rect) -> Rect {
    Rect {
        x: area.x + MARGIN.min(area.width),
        width: area.width.saturating_sub(MARGIN * 2),
        ..area
    }
}
