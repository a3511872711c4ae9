use crate::model::result::percentage;
use crate::model::ProgressResult;
use crate::ui::app::{App, SortOrder};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame,
};

const BRAND_DARK: Color = Color::Rgb(0x1F, 0x2F, 0x3C);
const BRAND_SELECT_BG: Color = Color::Rgb(0xC3, 0xD3, 0xE0);
const BRAND_GREEN: Color = Color::Rgb(0x82, 0x9A, 0x68);
const BRAND_ORANGE: Color = Color::Rgb(0x9E, 0x68, 0x3C);
const BRAND_MUTED: Color = Color::Rgb(0x71, 0x65, 0x65);

const HEADER_STYLE: Style = Style::new().fg(BRAND_DARK).add_modifier(Modifier::BOLD);
const SELECTED_STYLE: Style = Style::new()
    .bg(BRAND_SELECT_BG)
    .fg(BRAND_DARK)
    .add_modifier(Modifier::BOLD);

pub fn draw_dashboard(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(10),   // Main content
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);

    let main = Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);
    draw_areas(frame, main[0], app);
    draw_area_detail(frame, main[1], app);

    draw_footer(frame, chunks[2], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let (achieved, expected) = app.overall();
    let title = format!(
        " Metro Progress | {} | {} areas | {achieved}/{expected} elements ({:.2}%) ",
        app.source,
        app.areas.len(),
        percentage(achieved, expected)
    );

    let header = Paragraph::new(title)
        .style(HEADER_STYLE)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn progress_color(pct: f64) -> Color {
    if pct >= 100.0 {
        BRAND_GREEN
    } else if pct >= 50.0 {
        BRAND_DARK
    } else {
        BRAND_ORANGE
    }
}

fn draw_areas(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .areas
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let is_selected = i == app.selected_area;
            let style = if is_selected {
                SELECTED_STYLE
            } else {
                Style::default()
            };
            let marker = if is_selected { " ◄" } else { "" };

            ListItem::new(Line::from(vec![
                Span::styled(&a.area_id, style),
                Span::raw(" "),
                Span::styled(
                    format!("{:.1}%", a.percentage_overall),
                    Style::default().fg(progress_color(a.percentage_overall)),
                ),
                Span::styled(marker, Style::default().fg(BRAND_ORANGE)),
            ]))
        })
        .collect();

    let sort = match app.sort {
        SortOrder::Name => "name",
        SortOrder::Progress => "progress",
    };
    let title = format!(" Areas ({}) by {sort} ", app.areas.len());
    let list = List::new(items).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BRAND_ORANGE)),
    );

    frame.render_widget(list, area);
}

fn draw_area_detail(frame: &mut Frame, area: Rect, app: &App) {
    let Some(selected) = app.selected() else {
        let empty = Paragraph::new(" No base plans found. Run `metro-progress plan` first. ")
            .style(Style::default().fg(BRAND_MUTED))
            .block(Block::default().title(" Progress ").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let block = Block::default()
        .title(format!(" {} ", selected.area_id))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints = vec![Constraint::Length(3)];
    constraints.extend(selected.expected.keys().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Min(0));
    let rows = Layout::vertical(constraints).split(inner);

    frame.render_widget(
        gauge(
            "Overall",
            selected.achieved_total,
            selected.expected_total,
            selected.percentage_overall,
        )
        .style(Style::default().add_modifier(Modifier::BOLD)),
        rows[0],
    );

    for (row, (class, achieved, expected)) in rows[1..].iter().zip(class_rows(selected)) {
        frame.render_widget(
            gauge(class, achieved, expected, percentage(achieved, expected)),
            *row,
        );
    }
}

fn class_rows(result: &ProgressResult) -> impl Iterator<Item = (&str, u64, u64)> {
    result.expected.iter().map(|(class, &expected)| {
        let achieved = result.achieved.get(class).copied().unwrap_or(0);
        (class.as_str(), achieved, expected)
    })
}

fn gauge(title: &str, achieved: u64, expected: u64, pct: f64) -> Gauge<'static> {
    Gauge::default()
        .block(
            Block::default()
                .title(format!(" {title} "))
                .borders(Borders::ALL),
        )
        .gauge_style(Style::default().fg(progress_color(pct)))
        .ratio((pct / 100.0).clamp(0.0, 1.0))
        .label(format!("{achieved}/{expected} ({pct:.2}%)"))
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let help = match &app.status {
        Some(status) => format!(" ↑↓ Area | s Sort | r Reload | q Quit | {status} "),
        None => " ↑↓ Area | s Sort | r Reload | q Quit ".to_string(),
    };
    let footer = Paragraph::new(help)
        .style(Style::default().fg(BRAND_MUTED))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}
