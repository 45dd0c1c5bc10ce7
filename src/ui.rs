pub mod charting;
pub mod crosshair;
pub mod screen;
pub mod statistics;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    aim::{AimPhase, Target, TARGET_SIZE},
    app::{App, AIM_HUD_ROWS, CELL_HEIGHT_PX, CELL_WIDTH_PX},
    navigation::View,
    session::AIM_GAME_SECS,
};

/// Seconds left at which the countdown turns red
const TIMER_WARNING_SECS: u32 = 10;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(self.view).render(self, area, buf);

        // the crosshair sits above everything else in the play area
        if self.view == View::AimGame && self.aim.phase() == AimPhase::Active {
            let (_, play) = split_aim(area);
            self.crosshair.draw(play, buf);
        }
    }
}

/// Rect of `width` x `height` centred in `area`, clipped to it
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn split_aim(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(AIM_HUD_ROWS), Constraint::Min(0)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Cells covered by a target's footprint inside the play area
pub fn target_rect(target: &Target, play: Rect) -> Rect {
    let col = (target.x / CELL_WIDTH_PX).floor() as u16;
    let row = (target.y / CELL_HEIGHT_PX).floor() as u16;
    let width = (TARGET_SIZE / CELL_WIDTH_PX).ceil() as u16;
    let height = (TARGET_SIZE / CELL_HEIGHT_PX).ceil() as u16;
    Rect::new(
        play.x.saturating_add(col),
        play.y.saturating_add(row),
        width,
        height,
    )
    .intersection(play)
}

pub(crate) fn render_aim(app: &App, area: Rect, buf: &mut Buffer) {
    let aim = &app.aim;
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    match aim.phase() {
        AimPhase::Idle => {
            let settings = &app.menu.settings;
            let lines = vec![
                Line::from(Span::styled("Circle Target", bold.fg(Color::Magenta))),
                Line::default(),
                Line::from(format!(
                    "Sensitivity {}   Effective DPI {:.1}   {} seconds",
                    aim.sensitivity(),
                    settings.effective_dpi(),
                    AIM_GAME_SECS
                )),
                Line::from("Hit as many circles as you can. Your mouse is captured while you play."),
                Line::default(),
                Line::from(Span::styled("(enter) start / (m)enu / (esc)ape", italic)),
            ];
            render_centered_lines(lines, area, buf);
        }
        AimPhase::Active => {
            let (hud, play) = split_aim(area);

            let timer_style = if aim.time_left() < TIMER_WARNING_SECS {
                bold.fg(Color::Red)
            } else {
                bold
            };
            Paragraph::new(Line::from(vec![
                Span::raw("Score "),
                Span::styled(aim.score().to_string(), bold.fg(Color::Green)),
                Span::raw("   Time "),
                Span::styled(format!("{}s", aim.time_left()), timer_style),
                Span::raw("   Shots "),
                Span::styled(aim.total_shots().to_string(), bold),
                Span::raw("   Missed "),
                Span::styled(aim.missed_shots().to_string(), bold),
            ]))
            .render(hud, buf);

            for target in aim.targets() {
                let rect = target_rect(target, play);
                if rect.is_empty() {
                    continue;
                }
                let color = if target.breaking {
                    Color::Red
                } else {
                    Color::LightMagenta
                };
                Paragraph::new("●")
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_type(BorderType::Rounded)
                            .border_style(Style::default().fg(color)),
                    )
                    .render(rect, buf);
            }

            if aim.overlay_visible() {
                let message = "Click or press (enter) to capture the mouse";
                let rect = centered(play, message.width() as u16 + 4, 3);
                Clear.render(rect, buf);
                Paragraph::new(Span::styled(message, bold.fg(Color::Yellow)))
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL))
                    .render(rect, buf);
            }
        }
        AimPhase::Finished => {
            let mut lines = vec![
                Line::from(Span::styled("Time's up!", bold.fg(Color::Magenta))),
                Line::default(),
            ];
            if let Some(summary) = aim.last_summary() {
                lines.push(Line::from(vec![
                    Span::raw("Final score "),
                    Span::styled(summary.score.to_string(), bold.fg(Color::Green)),
                ]));
                lines.push(Line::from(format!(
                    "Accuracy {:.1}%   Shots {}   Missed {}",
                    summary.accuracy, summary.total_shots, summary.missed_shots
                )));
            }
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "(enter) play again / (m)enu / (esc)ape",
                italic,
            )));
            render_centered_lines(lines, area, buf);
        }
    }
}

fn render_centered_lines(lines: Vec<Line>, area: Rect, buf: &mut Buffer) {
    let width = lines.iter().map(Line::width).max().unwrap_or(0) as u16;
    let height = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(centered(area, width.max(1), height), buf);
}
