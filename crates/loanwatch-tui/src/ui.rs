// UI rendering logic
use crate::App;
use loanwatch_core::classify::{classify, status_color_code};
use loanwatch_core::format::{format_amount, format_date, format_risk_percent, summary_line};
use loanwatch_core::{LoanApplication, StatusCounts, StatusFilter, SyncState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

const COLUMN_HEADERS: [&str; 8] = [
    "ID",
    "Applicant Name",
    "Credit Score",
    "Amount Requested",
    "Risk Factor",
    "Risk Level",
    "Status",
    "Created At",
];

pub fn render(frame: &mut Frame, app: &mut App) {
    let store = app.session.store();

    // Loading wins over error, error wins over the table
    if store.is_loading() {
        render_loading(frame, frame.area());
        return;
    }
    if let Some(error) = store.error() {
        let error = error.to_string();
        render_error(frame, &error, frame.area());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Length(3), // Filter tabs
            Constraint::Min(3),    // Table
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_filter_tabs(frame, app, chunks[1]);
    render_table(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new("Loading applications...")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("LoanWatch"));
    frame.render_widget(paragraph, area);
}

fn render_error(frame: &mut Frame, message: &str, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "Error",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "r: retry | q: quit",
            Style::default().fg(Color::Yellow),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("LoanWatch"));
    frame.render_widget(paragraph, area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.session.store().applications().len();
    let lines = vec![
        Line::from(Span::styled(
            "LoanWatch - Loan Applications",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            summary_line(total),
            Style::default().fg(Color::Gray),
        )),
    ];

    let header = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

/// `All (3)`, `Approved (1)`, ... in tab order
pub fn filter_tab_labels(counts: &StatusCounts) -> Vec<String> {
    StatusFilter::ALL
        .iter()
        .map(|filter| format!("{} ({})", filter.label(), counts.get(*filter)))
        .collect()
}

fn render_filter_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let counts = app.session.store().counts();
    let selected = StatusFilter::ALL
        .iter()
        .position(|f| *f == app.filter())
        .unwrap_or(0);

    let tabs = Tabs::new(filter_tab_labels(&counts))
        .block(Block::default().borders(Borders::ALL).title("Filter"))
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

/// Text for each column of one row
pub fn row_cells(app: &LoanApplication) -> [String; 8] {
    let classification = classify(app);
    [
        app.id.to_string(),
        app.applicant_name.clone(),
        app.credit_score.to_string(),
        format_amount(app.amount_requested),
        format_risk_percent(app.risk_factor),
        classification.risk_label.to_string(),
        classification.status_label,
        format_date(&app.created_at),
    ]
}

fn color_from_code(code: &str) -> Color {
    match code {
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "red" => Color::Red,
        _ => Color::Gray,
    }
}

fn render_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let store = app.session.store();
    let rows_data = store.filtered_view();

    if rows_data.is_empty() {
        let empty = Paragraph::new("No applications found")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Applications"));
        frame.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = rows_data
        .iter()
        .map(|application| {
            let classification = classify(application);
            let risk_color = color_from_code(classification.risk_level.color_code());
            let status_color = color_from_code(status_color_code(&application.status));

            let cells: Vec<Cell> = row_cells(application)
                .into_iter()
                .enumerate()
                .map(|(i, text)| match i {
                    5 => Cell::from(Span::styled(text, Style::default().fg(risk_color))),
                    6 => Cell::from(Span::styled(text, Style::default().fg(status_color))),
                    _ => Cell::from(text),
                })
                .collect();
            Row::new(cells)
        })
        .collect();

    let header = Row::new(COLUMN_HEADERS.iter().map(|h| Cell::from(*h))).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let widths = [
        Constraint::Length(6),
        Constraint::Min(16),
        Constraint::Length(12),
        Constraint::Length(16),
        Constraint::Length(11),
        Constraint::Length(10),
        Constraint::Length(16),
        Constraint::Length(13),
    ];

    let title = format!("Applications ({})", rows.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let sync_state = app.sync_state();
    let sync_color = match sync_state {
        SyncState::Polling => Color::Green,
        SyncState::Backoff => Color::Yellow,
        SyncState::Stopped => Color::DarkGray,
    };

    let status = vec![
        Span::styled(format!("● {}", sync_state), Style::default().fg(sync_color)),
        Span::raw(" | TAB/1-4: filter | j/k: navigate | r: refresh | q: quit"),
    ];

    frame.render_widget(Paragraph::new(Line::from(status)), area);
}
