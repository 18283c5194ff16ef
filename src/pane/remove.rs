use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::extension::InstalledExtension;
use crate::model::theme::UserTheme;
use crate::pane::move_selection;

/// Installed extensions as listed when the pane was opened.
pub struct RemovePane {
    theme: UserTheme,
    extensions: Vec<InstalledExtension>,
    selected: usize,
}

impl RemovePane {
    pub fn new(theme: UserTheme, extensions: Vec<InstalledExtension>) -> Self {
        Self {
            theme,
            extensions,
            selected: 0,
        }
    }

    pub fn extensions(&self) -> &[InstalledExtension] {
        &self.extensions
    }

    pub fn move_selection(&mut self, delta: isize) {
        move_selection(&mut self.selected, self.extensions.len(), delta);
    }

    pub fn selected(&self) -> Option<&InstalledExtension> {
        self.extensions.get(self.selected)
    }

    /// Drops the row for `name` without consulting the registry again.
    pub fn remove_row(&mut self, name: &str) {
        self.extensions.retain(|ext| ext.name != name);
        move_selection(&mut self.selected, self.extensions.len(), 0);
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Remove installed extensions ")
            .border_style(Style::default().fg(self.theme.stroke));

        if self.extensions.is_empty() {
            frame.render_widget(
                Paragraph::new("no extensions installed")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(block),
                area,
            );
            return;
        }

        let items: Vec<ListItem> = self
            .extensions
            .iter()
            .map(|ext| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("[{}] ", ext.icon_name),
                        Style::default().fg(self.theme.stroke),
                    ),
                    Span::styled(
                        ext.name.clone(),
                        Style::default()
                            .fg(self.theme.fill)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {}", ext.payload_path.display()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("✕ ");
        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}
