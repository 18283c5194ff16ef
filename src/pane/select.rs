use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::model::theme::UserTheme;
use crate::msg::Action;
use crate::pane::move_selection;

/// Home pane: one zone per entry point.
pub struct SelectPane {
    theme: UserTheme,
    selected: usize,
    remove_enabled: bool,
}

impl SelectPane {
    /// `remove_enabled` is false when the registry has no services.
    pub fn new(theme: UserTheme, remove_enabled: bool) -> Self {
        Self {
            theme,
            selected: 0,
            remove_enabled,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        move_selection(&mut self.selected, Action::ALL.len(), delta);
    }

    pub fn select(&mut self, action: Action) {
        if let Some(idx) = Action::ALL.iter().position(|a| *a == action) {
            self.selected = idx;
        }
    }

    pub fn is_enabled(&self, action: Action) -> bool {
        action != Action::RemoveExtension || self.remove_enabled
    }

    /// The highlighted entry point, unless it is insensitive.
    pub fn selected_action(&self) -> Option<Action> {
        let action = Action::ALL[self.selected];
        self.is_enabled(action).then_some(action)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let zones = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(area);

        for (idx, action) in Action::ALL.into_iter().enumerate() {
            self.render_zone(frame, zones[idx], action, idx == self.selected);
        }
    }

    fn render_zone(&self, frame: &mut Frame, area: Rect, action: Action, selected: bool) {
        let enabled = self.is_enabled(action);
        let label_style = if enabled {
            Style::default().fg(self.theme.fill).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.stroke).add_modifier(Modifier::DIM)
        };

        let border_style = match (selected, enabled) {
            (true, true) => Style::default().fg(self.theme.stroke),
            (true, false) => Style::default().fg(Color::Gray),
            _ => Style::default().fg(Color::DarkGray),
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(format!("[ {} ]", action.icon_name()), label_style)),
            Line::from(""),
            Line::from(Span::styled(action.label(), label_style)),
        ];
        if !enabled {
            lines.push(Line::from(Span::styled(
                "(nothing installed)",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(if selected {
                BorderType::Thick
            } else {
                BorderType::Plain
            })
            .border_style(border_style);

        let top_pad = area.height.saturating_sub(lines.len() as u16 + 2) / 2;
        let mut padded = vec![Line::from(""); top_pad as usize];
        padded.extend(lines);

        frame.render_widget(
            Paragraph::new(padded)
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
    }
}
