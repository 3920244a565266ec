use std::borrow::Cow;

use super::state::{AppState, Controls, MessageKind};
use crate::dashboard::DashboardFigure;
use crate::engine::AlertLevel;
use crate::pipeline::{ForecastHorizon, RunState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Wrap},
    Frame,
};

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn draw(f: &mut Frame, state: &AppState, controls: &Controls, spinner_frame: u8) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, state, chunks[0], spinner_frame);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(40)])
        .split(chunks[1]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(6),
        ])
        .split(body[0]);

    draw_topic_input(f, state, controls, sidebar[0]);
    draw_horizon_selector(f, controls, sidebar[1]);
    draw_messages(f, state, sidebar[2], spinner_frame);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(10)])
        .split(body[1]);

    match &state.figure {
        Some(figure) => draw_chart(f, figure, main[0]),
        None => draw_chart_placeholder(f, state, main[0]),
    }

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(20)])
        .split(main[1]);

    draw_forecast_table(f, state, bottom[0]);
    draw_logs(f, state, bottom[1]);
    draw_footer(f, state, chunks[2]);
}

fn state_color(run_state: RunState) -> Color {
    match run_state {
        RunState::Idle => Color::DarkGray,
        RunState::Done => Color::Green,
        RunState::Failed => Color::Red,
        _ => Color::Yellow,
    }
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect, spinner_frame: u8) {
    let spinner = SPINNER_FRAMES[spinner_frame as usize % SPINNER_FRAMES.len()];
    let status = match state.run_state.step() {
        Some(step) => format!("{} {} ({}/4)", spinner, state.run_state.label(), step),
        None => state.run_state.label().to_string(),
    };

    let mut spans = vec![
        Span::styled(
            " Chimera Sentiment Dashboard ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(status, Style::default().fg(state_color(state.run_state))),
    ];

    if let Some(active) = &state.active {
        spans.push(Span::styled(" | Topic: ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(active.topic.clone()));
        spans.push(Span::styled(" | Horizon: ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(active.horizon.to_string()));
    }
    if let Some(secs) = state.last_run_secs {
        spans.push(Span::styled(" | Last run: ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(format!("{:.1}s", secs)));
    }
    spans.push(Span::styled(" | Up: ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::raw(state.uptime()));

    let block = Block::default().borders(Borders::ALL);
    let para = Paragraph::new(Line::from(spans)).block(block);
    f.render_widget(para, area);
}

fn draw_topic_input(f: &mut Frame, state: &AppState, controls: &Controls, area: Rect) {
    let max_width = area.width.saturating_sub(3) as usize;
    let style = if state.run_state.is_running() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };
    let topic = truncate_tail(&controls.topic, max_width);
    let line = Line::from(vec![
        Span::styled(topic.into_owned(), style),
        Span::styled("_", Style::default().fg(Color::Yellow).add_modifier(Modifier::SLOW_BLINK)),
    ]);
    let block = Block::default()
        .title(" Topic ")
        .borders(Borders::ALL);
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_horizon_selector(f: &mut Frame, controls: &Controls, area: Rect) {
    let mut spans = Vec::with_capacity(ForecastHorizon::ALL.len() * 2);
    for horizon in ForecastHorizon::ALL {
        let style = if horizon == controls.horizon {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!(" {} ", horizon.days()), style));
    }
    spans.push(Span::styled(" days", Style::default().fg(Color::DarkGray)));

    let block = Block::default()
        .title(" Forecast horizon ")
        .borders(Borders::ALL);
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_messages(f: &mut Frame, state: &AppState, area: Rect, spinner_frame: u8) {
    let spinner = SPINNER_FRAMES[spinner_frame as usize % SPINNER_FRAMES.len()];
    let mut lines: Vec<Line> = state
        .messages
        .iter()
        .map(|m| {
            let (prefix, color) = match m.kind {
                MessageKind::Info => ("i".to_string(), Color::Cyan),
                MessageKind::Progress => (spinner.to_string(), Color::Yellow),
                MessageKind::Success => ("✓".to_string(), Color::Green),
                MessageKind::Error => ("✗".to_string(), Color::Red),
            };
            Line::from(vec![
                Span::styled(format!("{} ", prefix), Style::default().fg(color)),
                Span::styled(m.text.clone(), Style::default().fg(color)),
            ])
        })
        .collect();

    if let Some(figure) = &state.figure {
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("Articles: ", Style::default().fg(Color::DarkGray)),
            Span::raw(figure.article_count.to_string()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("+", Style::default().fg(Color::Green)),
            Span::raw(format!("{}  ", figure.label_counts.positive)),
            Span::styled("=", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{}  ", figure.label_counts.neutral)),
            Span::styled("-", Style::default().fg(Color::Red)),
            Span::raw(figure.label_counts.negative.to_string()),
        ]));
        let (alert_text, alert_color) = match figure.alert {
            AlertLevel::Positive => ("POSITIVE ALERT", Color::Green),
            AlertLevel::Negative => ("NEGATIVE ALERT", Color::Red),
            AlertLevel::None => ("no alert", Color::DarkGray),
        };
        lines.push(Line::from(vec![
            Span::styled("Outlook: ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{:+.3} ", figure.aggregate)),
            Span::styled(alert_text, Style::default().fg(alert_color).add_modifier(Modifier::BOLD)),
        ]));
    }

    let block = Block::default()
        .title(" Status ")
        .borders(Borders::ALL);
    let para = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(para, area);
}

fn draw_chart(f: &mut Frame, figure: &DashboardFigure, area: Rect) {
    let datasets = vec![
        Dataset::default()
            .name("observed")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&figure.observed),
        Dataset::default()
            .name("forecast")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&figure.forecast),
        Dataset::default()
            .name("95% band")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&figure.upper),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&figure.lower),
    ];

    let y_labels = [figure.y_bounds[0], 0.0, figure.y_bounds[1]]
        .iter()
        .map(|y| Line::from(format!("{:+.1}", y)))
        .collect::<Vec<_>>();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(format!(" {} ", figure.title))
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("date")
                .style(Style::default().fg(Color::DarkGray))
                .bounds(figure.x_bounds)
                .labels(figure.x_labels.iter().map(|l| Line::from(l.clone())).collect::<Vec<_>>()),
        )
        .y_axis(
            Axis::default()
                .title("sentiment")
                .style(Style::default().fg(Color::DarkGray))
                .bounds(figure.y_bounds)
                .labels(y_labels),
        );
    f.render_widget(chart, area);
}

fn draw_chart_placeholder(f: &mut Frame, state: &AppState, area: Rect) {
    let text = if state.run_state.is_running() {
        "Generating report..."
    } else if state.run_state == RunState::Failed {
        "No dashboard for this run."
    } else {
        "No report yet."
    };
    let block = Block::default()
        .title(" Sentiment forecast ")
        .borders(Borders::ALL);
    let para = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(para, area);
}

fn draw_forecast_table(f: &mut Frame, state: &AppState, area: Rect) {
    let header = Row::new(vec!["Date", "yhat", "lower", "upper"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let visible = area.height.saturating_sub(3) as usize;
    let rows: Vec<Row> = state
        .forecast_rows
        .iter()
        .take(visible)
        .map(|p| {
            let color = if p.yhat > 0.0 {
                Color::Green
            } else if p.yhat < 0.0 {
                Color::Red
            } else {
                Color::White
            };
            Row::new(vec![
                Cell::from(p.date.format("%Y-%m-%d").to_string()),
                Cell::from(format!("{:+.3}", p.yhat)).style(Style::default().fg(color)),
                Cell::from(format!("{:+.3}", p.yhat_lower)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(format!("{:+.3}", p.yhat_upper)).style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let title = if state.forecast_rows.len() > visible {
        format!(" Forecast [{}/{} days] ", visible, state.forecast_rows.len())
    } else {
        " Forecast ".to_string()
    };

    let widths = [
        Constraint::Length(11),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(7),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(table, area);
}

fn draw_logs(f: &mut Frame, state: &AppState, area: Rect) {
    let max_width = area.width.saturating_sub(2) as usize; // borders
    let visible_lines = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(visible_lines)
        .map(|l| {
            let color = match l.level.as_str() {
                "ERROR" => Color::Red,
                "WARN" => Color::Yellow,
                _ => Color::DarkGray,
            };
            let prefix = format!(" {} [{}] ", l.time, l.level);
            let msg_max = max_width.saturating_sub(prefix.len());
            let msg = truncate_with_ellipsis(&l.message, msg_max);
            Line::from(vec![
                Span::styled(prefix, Style::default().fg(color)),
                Span::raw(msg.into_owned()),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" Run Log ")
        .borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_footer(f: &mut Frame, state: &AppState, area: Rect) {
    let enter_hint = if state.run_state.is_running() {
        Span::styled(" running  ", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(" generate report  ")
    };
    let line = Line::from(vec![
        Span::styled("  [Enter]", Style::default().fg(Color::Yellow)),
        enter_hint,
        Span::styled("[Tab/↑↓]", Style::default().fg(Color::Yellow)),
        Span::raw(" horizon  "),
        Span::styled("[type]", Style::default().fg(Color::Yellow)),
        Span::raw(" topic  "),
        Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
        Span::raw(" quit  "),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Keep the end of the text visible, the part being typed.
fn truncate_tail(s: &str, max_width: usize) -> Cow<'_, str> {
    let char_count = s.chars().count();
    if char_count <= max_width {
        return Cow::Borrowed(s);
    }
    let skip = char_count - max_width;
    let start = s.char_indices().nth(skip).map(|(i, _)| i).unwrap_or(s.len());
    Cow::Borrowed(&s[start..])
}

fn truncate_with_ellipsis(s: &str, max_width: usize) -> Cow<'_, str> {
    let char_count = s.chars().count();
    if char_count <= max_width {
        Cow::Borrowed(s)
    } else if max_width <= 3 {
        Cow::Owned(".".repeat(max_width))
    } else {
        let end = s
            .char_indices()
            .nth(max_width - 3)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        Cow::Owned(format!("{}...", &s[..end]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("a longer message", 8), "a lon...");
        assert_eq!(truncate_with_ellipsis("abcdef", 2), "..");
    }

    #[test]
    fn test_truncate_tail_keeps_cursor_end() {
        assert_eq!(truncate_tail("artificial intelligence", 5), "gence");
        assert_eq!(truncate_tail("ai", 5), "ai");
    }

    #[test]
    fn test_idle_screen_renders_prompt() {
        let backend = TestBackend::new(120, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let state = AppState::new();
        let controls = Controls::new("artificial intelligence", ForecastHorizon::Week);
        terminal.draw(|f| draw(f, &state, &controls, 0)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Topic"));
        assert!(text.contains("No report yet."));
        assert!(text.contains("artificial intelligence"));
    }
}
