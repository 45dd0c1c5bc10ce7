use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::App,
    auth::{AuthField, AuthMode},
    navigation::{MenuEntry, View},
    reaction::{ReactionPhase, EARLY_RECOVERY_MS},
    ui::{centered, render_aim, statistics::render_statistics},
};

/// A UI screen boundary, one per view
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

pub struct AuthScreen;

impl Screen for AuthScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let form = &app.auth_form;
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let focused = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

        let title = match form.mode {
            AuthMode::Login => "Sign in",
            AuthMode::Register => "Create account",
        };

        let mut lines = vec![
            Line::from(Span::styled("aimdrill", bold.fg(Color::Magenta))),
            Line::from(Span::styled(title, bold)),
            Line::default(),
        ];

        for field in form.fields() {
            let label = match field {
                AuthField::Email => "Email",
                AuthField::Password => "Password",
                AuthField::DisplayName => "Display name",
                AuthField::ConfirmPassword => "Confirm password",
            };
            let raw = form.value(*field);
            let shown = match field {
                AuthField::Password | AuthField::ConfirmPassword => {
                    "•".repeat(raw.chars().count())
                }
                _ => raw.to_string(),
            };
            let is_focused = form.focus == *field;
            let marker = if is_focused { "> " } else { "  " };
            let cursor = if is_focused { "_" } else { "" };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{marker}{label:<17}"),
                    if is_focused { focused } else { bold },
                ),
                Span::raw(format!("{shown}{cursor}")),
            ]));
        }

        lines.push(Line::default());
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.as_str(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::default());
        }

        let switch = match form.mode {
            AuthMode::Login => "(F2) create an account",
            AuthMode::Register => "(F2) sign in instead",
        };
        lines.push(Line::from(Span::styled(
            format!("(tab) next field / (enter) submit / {switch} / (esc)ape"),
            Style::default().add_modifier(Modifier::ITALIC),
        )));

        let width = lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 4;
        let height = lines.len() as u16 + 2;
        let boxed = centered(area, width, height);

        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .render(boxed, buf);
    }
}

pub struct MenuScreen;

impl Screen for MenuScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let menu = &app.menu;
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().add_modifier(Modifier::DIM);
        let highlight = Style::default().fg(Color::Black).bg(Color::Cyan);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        let header = match app.current_user() {
            Some(user) => Line::from(vec![
                Span::styled(format!(" {} ", user.initial()), highlight),
                Span::styled(format!("  {}", user.label()), bold),
            ]),
            None => Line::default(),
        };
        Paragraph::new(header)
            .block(Block::default().borders(Borders::BOTTOM).title("aimdrill"))
            .render(chunks[0], buf);

        let lines: Vec<Line> = MenuEntry::ALL
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let value = match entry {
                    MenuEntry::Sensitivity => Some(edit_value(
                        app,
                        *entry,
                        menu.settings.sensitivity.to_string(),
                    )),
                    MenuEntry::Dpi => Some(edit_value(app, *entry, menu.settings.dpi.to_string())),
                    _ => None,
                };
                let label_style = if idx == menu.selected { highlight } else { bold };
                let mut spans = vec![Span::styled(format!(" {:<15}", entry.label()), label_style)];
                if let Some(value) = value {
                    spans.push(Span::styled(format!(" {value:<10}"), bold.fg(Color::Yellow)));
                }
                spans.push(Span::styled(format!(" {}", entry.description()), dim));
                Line::from(spans)
            })
            .collect();
        Paragraph::new(lines).render(chunks[1], buf);

        let status = match &menu.error {
            Some(error) => Span::styled(error.as_str(), Style::default().fg(Color::Red)),
            None => Span::styled(
                format!("Effective DPI: {:.1}", menu.settings.effective_dpi()),
                Style::default().fg(Color::Cyan),
            ),
        };
        Paragraph::new(status).render(chunks[2], buf);

        let legend = if menu.editing.is_some() {
            "(enter) save / (esc) cancel"
        } else {
            "(↑/↓) move / (enter) select / (esc)ape"
        };
        Paragraph::new(Span::styled(
            legend,
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[3], buf);
    }
}

fn edit_value(app: &App, entry: MenuEntry, current: String) -> String {
    if app.menu.editing == Some(entry) {
        format!("{}_", app.menu.input)
    } else {
        current
    }
}

pub struct AimScreen;

impl Screen for AimScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_aim(app, area, buf);
    }
}

pub struct ReactionScreen;

impl Screen for ReactionScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let session = &app.reaction;
        let big = Style::default().add_modifier(Modifier::BOLD);
        let best = match session.best_time() {
            Some(ms) => format!("Best: {ms} ms"),
            None => "No best time yet".to_string(),
        };

        let (bg, fg, lines): (Color, Color, Vec<String>) = match session.phase() {
            ReactionPhase::Start => (
                Color::Reset,
                Color::Reset,
                vec![
                    "Reaction Time Test".into(),
                    String::new(),
                    "Wait for the screen to turn blue, then click or hit space.".into(),
                    best,
                    String::new(),
                    "(enter) start / (m)enu / (esc)ape".into(),
                ],
            ),
            ReactionPhase::Waiting => (
                Color::White,
                Color::Black,
                vec!["Wait for blue...".into()],
            ),
            ReactionPhase::Stimulus => (Color::Blue, Color::White, vec!["CLICK!".into()]),
            ReactionPhase::Early => (
                Color::Red,
                Color::White,
                vec![
                    "Too early!".into(),
                    format!("Try again in {} seconds", EARLY_RECOVERY_MS / 1000),
                ],
            ),
            ReactionPhase::Result => {
                let mut lines = vec![format!(
                    "{} ms",
                    session.reaction_time().unwrap_or_default()
                )];
                if session.last_was_record() {
                    lines.push("New record!".into());
                }
                lines.push(best);
                lines.push(String::new());
                lines.push("(enter) try again / (m)enu / (esc)ape".into());
                (Color::Reset, Color::Reset, lines)
            }
        };

        Block::default()
            .style(Style::default().bg(bg).fg(fg))
            .render(area, buf);

        let height = lines.len() as u16;
        let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
        let text: Vec<Line> = lines
            .into_iter()
            .map(|l| {
                let style = if l == "New record!" {
                    big.fg(Color::Green)
                } else {
                    big
                };
                Line::from(Span::styled(l, style))
            })
            .collect();

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(centered(area, width.max(1), height), buf);
    }
}

pub struct StatisticsScreen;

impl Screen for StatisticsScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_statistics(app, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current view
pub fn current_screen(view: View) -> Box<dyn Screen> {
    match view {
        View::Auth => Box::new(AuthScreen),
        View::Menu => Box::new(MenuScreen),
        View::AimGame => Box::new(AimScreen),
        View::ReactionGame => Box::new(ReactionScreen),
        View::Statistics => Box::new(StatisticsScreen),
    }
}
