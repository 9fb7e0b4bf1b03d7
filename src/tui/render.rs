use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::model::{GistId, GistRecord, PendingState};
use crate::nav::NavState;

use super::app::{App, Filter};
use super::time_fmt::fmt_ts;

pub(super) fn draw(frame: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(frame.area());

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(26), Constraint::Min(30)])
        .split(outer[0]);

    draw_sidebar(frame, cols[0], app);

    let panes = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(cols[1]);

    let ids = app.visible_ids();
    draw_list(frame, panes[0], app, &ids);
    draw_preview(frame, panes[1], app, &ids);
    draw_status(frame, outer[1], app);
}

fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let index = app.engine.cache().index();
    let pinned = app
        .store
        .read_state()
        .map(|s| s.pinned_tags)
        .unwrap_or_default();

    let mut rows: Vec<ListItem> = Vec::new();
    rows.push(ListItem::new(Line::from(Span::styled(
        "Languages",
        Style::default().add_modifier(Modifier::BOLD),
    ))));
    for (lang, count) in index.all_languages() {
        let marker = if app.filter == Filter::Language(lang.clone()) {
            "> "
        } else {
            "  "
        };
        rows.push(ListItem::new(format!("{marker}{lang} ({count})")));
    }

    rows.push(ListItem::new(""));
    rows.push(ListItem::new(Line::from(Span::styled(
        "Tags",
        Style::default().add_modifier(Modifier::BOLD),
    ))));
    let mut tags = index.all_tags();
    // Pinned tags surface first, in their pinned order.
    tags.sort_by_key(|(tag, _)| {
        pinned
            .iter()
            .position(|p| p == tag)
            .unwrap_or(usize::MAX)
    });
    for (tag, count) in tags {
        let pin = if pinned.contains(&tag) { "*" } else { " " };
        let marker = if app.filter == Filter::Tag(tag.clone()) {
            ">"
        } else {
            " "
        };
        rows.push(ListItem::new(format!("{marker}{pin}{tag} ({count})")));
    }

    let block = Block::default().borders(Borders::ALL).title("Filter");
    frame.render_widget(List::new(rows).block(block), area);
}

fn draw_list(frame: &mut Frame, area: Rect, app: &App, ids: &[GistId]) {
    let cache = app.engine.cache();
    let now = time::OffsetDateTime::now_utc();
    let active = app.nav.active_selection();

    let rows: Vec<ListItem> = ids
        .iter()
        .filter_map(|id| cache.get(id))
        .map(|rec| gist_row(rec, active, now))
        .collect();

    let mut state = ListState::default();
    if let Some(i) = app.nav.focused_index() {
        if !ids.is_empty() {
            state.select(Some(i.min(ids.len() - 1)));
        }
    }

    let focused = matches!(app.nav.state(), NavState::ListFocused(_));
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let title = format!("Gists ({})", ids.len());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);

    let list = List::new(rows)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut state);
}

fn gist_row<'a>(
    rec: &'a GistRecord,
    active: Option<&GistId>,
    now: time::OffsetDateTime,
) -> ListItem<'a> {
    let mut spans = Vec::new();
    if active == Some(&rec.id) {
        spans.push(Span::styled("* ", Style::default().fg(Color::Green)));
    } else {
        spans.push(Span::raw("  "));
    }

    let title = if rec.description.is_empty() {
        rec.files
            .first()
            .map(|f| f.filename.clone())
            .unwrap_or_else(|| rec.id.to_string())
    } else {
        rec.description.clone()
    };
    spans.push(Span::raw(title));

    match rec.pending {
        PendingState::PendingCreate => {
            spans.push(Span::styled(" [creating]", Style::default().fg(Color::Yellow)));
        }
        PendingState::PendingUpdate => {
            spans.push(Span::styled(" [saving]", Style::default().fg(Color::Yellow)));
        }
        // A delete leaves the cache at submit time; no row survives to mark.
        PendingState::Committed | PendingState::PendingDelete => {}
    }

    spans.push(Span::styled(
        format!("  {} · {}", rec.primary_language(), fmt_ts(&rec.updated_at, now)),
        Style::default().fg(Color::DarkGray),
    ));

    if !rec.tags.is_empty() {
        let tags: Vec<&str> = rec.tags.iter().map(|t| t.as_str()).collect();
        spans.push(Span::styled(
            format!("  #{}", tags.join(" #")),
            Style::default().fg(Color::Magenta),
        ));
    }

    ListItem::new(Line::from(spans))
}

fn draw_preview(frame: &mut Frame, area: Rect, app: &App, ids: &[GistId]) {
    let focused = matches!(app.nav.state(), NavState::PreviewFocused(_));
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title("Preview");

    let rec = app
        .nav
        .focused_index()
        .and_then(|i| ids.get(i))
        .and_then(|id| app.engine.cache().get(id));

    let Some(rec) = rec else {
        frame.render_widget(
            Paragraph::new("No gist focused. Press j/k to navigate.").block(block),
            area,
        );
        return;
    };

    let mut lines = Vec::new();
    for file in &rec.files {
        lines.push(Line::from(Span::styled(
            format!("-- {} ({}, {} bytes)", file.filename, file.language, file.size),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        match &file.content {
            Some(content) => {
                for l in content.lines().take(12) {
                    lines.push(Line::from(l.to_string()));
                }
            }
            None => lines.push(Line::from(Span::styled(
                "(content not fetched)",
                Style::default().fg(Color::DarkGray),
            ))),
        }
        lines.push(Line::from(""));
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let line = if app.input.active {
        format!("/{}", app.input.buf)
    } else {
        let filter = match &app.filter {
            Filter::All => String::new(),
            Filter::Language(l) => format!(" [lang:{l}]"),
            Filter::Tag(t) => format!(" [tag:{t}]"),
        };
        let pending = if app.engine.has_pending() {
            " [syncing...]"
        } else {
            ""
        };
        format!(
            "{}{}{}  (q quit, s sync, / filter, d delete)",
            app.status.clone().unwrap_or_default(),
            filter,
            pending
        )
    };
    frame.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
