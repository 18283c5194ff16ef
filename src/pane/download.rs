use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use crate::extension::{Catalog, DownloadJob, JobStatus};
use crate::model::theme::UserTheme;
use crate::pane::move_selection;

/// One row per catalog entry, each owning its download job.
pub struct DownloadPane {
    theme: UserTheme,
    jobs: Vec<DownloadJob>,
    selected: usize,
}

impl DownloadPane {
    pub fn new(theme: UserTheme, catalog: Catalog) -> Self {
        let jobs = catalog
            .into_iter()
            .map(|(id, entry)| DownloadJob::new(id, entry))
            .collect();

        Self {
            theme,
            jobs,
            selected: 0,
        }
    }

    pub fn jobs(&self) -> &[DownloadJob] {
        &self.jobs
    }

    pub fn move_selection(&mut self, delta: isize) {
        move_selection(&mut self.selected, self.jobs.len(), delta);
    }

    pub fn selected_job_mut(&mut self) -> Option<&mut DownloadJob> {
        self.jobs.get_mut(self.selected)
    }

    pub fn job_mut(&mut self, id: &str) -> Option<&mut DownloadJob> {
        self.jobs.iter_mut().find(|job| job.id == id)
    }

    /// Stops every running worker; called when the pane is left.
    pub fn cancel_all(&mut self) {
        for job in self.jobs.iter_mut().filter(|job| job.status.is_active()) {
            tracing::info!("cancelling download of {}", job.id);
            job.cancel();
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Download from internet ")
            .border_style(Style::default().fg(self.theme.stroke));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.jobs.is_empty() {
            frame.render_widget(
                Paragraph::new("catalog is empty").style(Style::default().fg(Color::DarkGray)),
                inner,
            );
            return;
        }

        let visible = inner.height.max(1) as usize;
        let first = self.selected.saturating_sub(visible - 1);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Length(1); visible])
            .split(inner);

        for (row, (idx, job)) in rows.iter().zip(self.jobs.iter().enumerate().skip(first)) {
            self.render_row(frame, *row, job, idx == self.selected);
        }
    }

    fn render_row(&self, frame: &mut Frame, area: Rect, job: &DownloadJob, selected: bool) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Length(14),
                Constraint::Min(10),
            ])
            .split(area);

        let name_style = if selected {
            Style::default()
                .fg(self.theme.fill)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(self.theme.fill)
        };
        let marker = if selected { "▸ " } else { "  " };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("{marker}{}", job.id),
                name_style,
            ))),
            cols[0],
        );

        let status_style = match job.status {
            JobStatus::Installed => Style::default().fg(Color::Green),
            JobStatus::Failed(_) => Style::default().fg(Color::Red),
            JobStatus::Pending => Style::default().fg(Color::DarkGray),
            _ => Style::default().fg(Color::Yellow),
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {} ", job.status.label()), status_style)),
            cols[1],
        );

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(self.theme.fill).bg(Color::Rgb(20, 20, 30)))
            .ratio(job.progress.clamp(0.0, 1.0))
            .label(format!("{:>3}%", (job.progress * 100.0).round() as u32));
        frame.render_widget(gauge, cols[2]);
    }
}

impl Drop for DownloadPane {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
