use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Tabs, Widget},
};
use time_humanize::HumanTime;

use crate::{
    app::App,
    session::GameType,
    stats::GameStats,
    ui::charting::{compute_chart_params, format_label},
};

fn format_metric(game_type: GameType, value: f64) -> String {
    match game_type {
        GameType::ReactionTime => format!("{value:.0} ms"),
        GameType::CircleTarget => format!("{value:.1}"),
    }
}

/// "3 hours ago" style age of a timestamp
pub fn humanize_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(then).num_seconds().max(0);
    HumanTime::from_seconds(-secs).to_string()
}

fn improvement_span(improvement: f64) -> Span<'static> {
    let color = if improvement > 0.0 {
        Color::Green
    } else if improvement < 0.0 {
        Color::Red
    } else {
        Color::Gray
    };
    Span::styled(
        format!("{improvement:+.1}%"),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

pub fn render_statistics(app: &App, area: Rect, buf: &mut Buffer) {
    let state = &app.stats;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // tabs
            Constraint::Length(2), // summary
            Constraint::Min(6),    // chart + best list
            Constraint::Length(1), // legend
        ])
        .split(area);

    let selected = GameType::ALL
        .iter()
        .position(|g| *g == state.tab)
        .unwrap_or(0);
    Tabs::new(GameType::ALL.iter().map(|g| g.title()))
        .select(selected)
        .block(Block::default().borders(Borders::ALL).title("My Statistics"))
        .highlight_style(bold.fg(Color::Cyan))
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        "(←/→) switch game / (r)eload / (b)ack",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[3], buf);

    if let Some(error) = &state.error {
        Paragraph::new(Span::styled(error.as_str(), Style::default().fg(Color::Red)))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
        return;
    }

    let stats = match &state.stats {
        Some(stats) if stats.total_games > 0 => stats,
        _ => {
            Paragraph::new("No sessions yet. Play a round to see your progress!")
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);
            return;
        }
    };

    render_summary(state.tab, stats, chunks[1], buf);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[2]);

    render_chart(state.tab, stats, body[0], buf);
    render_best(app, body[1], buf);
}

fn render_summary(game_type: GameType, stats: &GameStats, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let metric = |v: Option<f64>| {
        v.map(|v| format_metric(game_type, v))
            .unwrap_or_else(|| "-".to_string())
    };

    let mut spans = vec![
        Span::raw("Games "),
        Span::styled(stats.total_games.to_string(), bold),
        Span::raw("   Average "),
        Span::styled(metric(stats.average_score), bold),
        Span::raw("   Best "),
        Span::styled(metric(stats.best_score), bold),
        Span::raw("   Improvement "),
        improvement_span(stats.improvement),
    ];
    if let Some(last) = stats.chart_data.last() {
        spans.push(Span::raw("   Last played "));
        spans.push(Span::styled(humanize_since(last.date, Utc::now()), bold));
    }

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_chart(game_type: GameType, stats: &GameStats, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let (sessions, ceiling) = compute_chart_params(&stats.chart_data);

    let values: Vec<(f64, f64)> = stats
        .chart_data
        .iter()
        .map(|p| (p.game as f64, p.value))
        .collect();
    let accuracy: Vec<(f64, f64)> = stats
        .chart_data
        .iter()
        .filter_map(|p| p.accuracy.map(|a| (p.game as f64, a / 100.0 * ceiling)))
        .collect();

    let mut datasets = vec![Dataset::default()
        .name(match game_type {
            GameType::ReactionTime => "reaction ms",
            GameType::CircleTarget => "score",
        })
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&values)];
    if !accuracy.is_empty() {
        datasets.push(
            Dataset::default()
                .name("accuracy (scaled)")
                .marker(symbols::Marker::Dot)
                .style(Style::default().fg(Color::Cyan))
                .graph_type(GraphType::Scatter)
                .data(&accuracy),
        );
    }

    Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Last sessions"),
        )
        .x_axis(
            Axis::default()
                .title("session")
                .bounds([1.0, sessions])
                .labels(vec![
                    Span::styled("1", bold),
                    Span::styled(format_label(sessions), bold),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, ceiling])
                .labels(vec![
                    Span::styled("0", bold),
                    Span::styled(format_label(ceiling), bold),
                ]),
        )
        .render(area, buf);
}

fn render_best(app: &App, area: Rect, buf: &mut Buffer) {
    let state = &app.stats;
    let now = Utc::now();

    let lines: Vec<Line> = state
        .best
        .iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            let value = record.summary.metric(state.tab)?;
            let mut spans = vec![
                Span::styled(
                    format!("{:>2}. ", idx + 1),
                    Style::default().add_modifier(Modifier::DIM),
                ),
                Span::styled(
                    format_metric(state.tab, value),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ];
            if let Some(acc) = record.summary.accuracy() {
                spans.push(Span::raw(format!("  {acc:.0}%")));
            }
            spans.push(Span::styled(
                format!("  {}", humanize_since(record.timestamp, now)),
                Style::default().fg(Color::Gray),
            ));
            Some(Line::from(spans))
        })
        .collect();

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Top 10"))
        .render(area, buf);
}
