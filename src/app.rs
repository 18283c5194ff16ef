use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::extension::{
    Fetcher, FsRegistry, HttpFetcher, JobEvent, Pipeline, Registry, install, list_installed,
    load_catalog, remove_extension,
};
use crate::model::alert::Alert;
use crate::model::config::{AppConfig, expand_tilde};
use crate::model::mode::Mode;
use crate::model::theme::UserTheme;
use crate::msg::{Action, Msg};
use crate::pane::{DownloadPane, Pane, RemovePane, SelectPane};

const MAX_ALERTS: usize = 8;
const VISIBLE_ALERTS: usize = 3;
const INSTALLED_ALERT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct App {
    pub mode: Mode,
    pane: Pane,
    pub config: AppConfig,
    theme: UserTheme,
    registry: FsRegistry,
    pipeline: Arc<Pipeline>,
    alerts: VecDeque<Alert>,
    journal_input: String,
    pub should_quit: bool,
    event_tx: mpsc::Sender<Msg>,
}

impl App {
    pub fn new(config: AppConfig, event_tx: mpsc::Sender<Msg>) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.download_timeout(), &config.download.user_agent)?;
        Self::with_fetcher(config, Arc::new(fetcher), event_tx)
    }

    pub fn with_fetcher(
        config: AppConfig,
        fetcher: Arc<dyn Fetcher>,
        event_tx: mpsc::Sender<Msg>,
    ) -> Result<Self> {
        std::fs::create_dir_all(config.profile_path())?;

        let theme = UserTheme::from_config(&config.theme.xo_color);
        let registry = FsRegistry::new(config.webservice_dir(), config.webaccount_dir());
        let pipeline = Arc::new(Pipeline::new(
            fetcher,
            config.profile_path(),
            config.scratch_dir(),
            config.verify_policy(),
        ));

        let mut app = Self {
            mode: Mode::Normal,
            pane: Pane::Select(SelectPane::new(theme, false)),
            config,
            theme,
            registry,
            pipeline,
            alerts: VecDeque::new(),
            journal_input: String::new(),
            should_quit: false,
            event_tx,
        };
        app.pane = Pane::Select(app.select_pane());
        Ok(app)
    }

    fn select_pane(&self) -> SelectPane {
        let has_services = match self.registry.list_services() {
            Ok(services) => !services.is_empty(),
            Err(err) => {
                tracing::warn!("registry lookup failed: {err}");
                false
            }
        };
        SelectPane::new(self.theme, has_services)
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::Action(action) => self.dispatch(action),
            Msg::Home => self.go_home(),
            Msg::Job {
                id,
                generation,
                event,
            } => self.handle_job_event(&id, generation, event),
            Msg::Tick => self.expire_alerts(Instant::now()),
            Msg::Quit => self.quit(),
            Msg::Resize(..) => {}
        }
    }

    fn dispatch(&mut self, action: Action) {
        tracing::info!("action: {}", action.icon_name());
        match action {
            Action::LoadFromJournal => {
                self.journal_input.clear();
                self.mode = Mode::JournalPrompt;
            }
            Action::Download => match load_catalog(&self.config.catalog_path()) {
                Ok(catalog) => {
                    self.leave_pane();
                    self.pane = Pane::Download(DownloadPane::new(self.theme, catalog));
                }
                Err(err) => {
                    tracing::error!("{err}");
                    self.push_alert(Alert::notify("Error", err.to_string()));
                }
            },
            Action::RemoveExtension => match list_installed(&self.registry) {
                Ok(extensions) => {
                    self.leave_pane();
                    self.pane = Pane::Remove(RemovePane::new(self.theme, extensions));
                }
                Err(err) => {
                    tracing::error!("{err}");
                    self.push_alert(Alert::notify("Error", err.to_string()));
                }
            },
        }
    }

    fn go_home(&mut self) {
        self.mode = Mode::Normal;
        self.leave_pane();
        self.pane = Pane::Select(self.select_pane());
    }

    fn quit(&mut self) {
        self.leave_pane();
        self.should_quit = true;
    }

    /// Tears down pane-owned work before the pane is replaced.
    fn leave_pane(&mut self) {
        if let Pane::Download(pane) = &mut self.pane {
            pane.cancel_all();
        }
    }

    fn handle_job_event(&mut self, id: &str, generation: u64, event: JobEvent) {
        let Pane::Download(pane) = &mut self.pane else {
            tracing::debug!("dropping {event:?} for {id}: download pane closed");
            return;
        };
        let Some(job) = pane.job_mut(id) else {
            return;
        };
        if !job.apply(generation, event.clone()) {
            return;
        }

        match event {
            JobEvent::Installed => {
                self.alerts
                    .retain(|alert| alert.source.as_deref() != Some(id));
                self.push_alert(
                    Alert::with_timeout(
                        "Downloaded",
                        "The extension has been downloaded and installed.",
                        INSTALLED_ALERT_TIMEOUT,
                    )
                    .for_job(id),
                );
            }
            JobEvent::Failed(reason) => {
                self.push_alert(Alert::notify("Error", reason).for_job(id));
            }
            JobEvent::Progress(_) | JobEvent::Verifying => {}
        }
    }

    fn start_selected_download(&mut self) {
        let Pane::Download(pane) = &mut self.pane else {
            return;
        };
        let Some(job) = pane.selected_job_mut() else {
            return;
        };

        let id = job.id.clone();
        let tx = self.event_tx.clone();
        let started = job.start(&self.pipeline, move |generation, event| {
            let _ = tx.send(Msg::Job {
                id: id.clone(),
                generation,
                event,
            });
        });

        if let Err(err) = started {
            tracing::error!("could not start download: {err}");
            self.push_alert(Alert::notify("Error", err.to_string()));
        }
    }

    fn confirm_remove(&mut self) {
        self.mode = Mode::Normal;
        let Pane::Remove(pane) = &mut self.pane else {
            return;
        };
        let Some(ext) = pane.selected().cloned() else {
            return;
        };

        match remove_extension(&ext) {
            Ok(()) => {
                pane.remove_row(&ext.name);
                self.push_alert(Alert::notify(
                    "Removed",
                    "Extension removed. Please restart the desktop to see the effects.",
                ));
            }
            Err(err) => {
                self.push_alert(Alert::notify(
                    "Error",
                    format!("Error removing extension: {err}"),
                ));
            }
        }
    }

    fn install_from_journal(&mut self) {
        self.mode = Mode::Normal;
        let input = self.journal_input.trim();
        let path = expand_tilde(input);

        let installed = if input.is_empty() {
            false
        } else {
            match install(&path, &self.config.profile_path()) {
                Ok(()) => true,
                Err(err) => {
                    tracing::error!("{err}");
                    false
                }
            }
        };

        let alert = if installed {
            tracing::info!("installed {} from journal", path.display());
            Alert::notify("Success", "The extension has been installed.")
        } else {
            Alert::notify("Error", "Error extracting the extension.")
        };
        self.push_alert(alert);

        if let Pane::Select(_) = self.pane {
            let mut pane = self.select_pane();
            pane.select(Action::LoadFromJournal);
            self.pane = Pane::Select(pane);
        }
    }

    fn push_alert(&mut self, alert: Alert) {
        self.alerts.push_back(alert);
        while self.alerts.len() > MAX_ALERTS {
            self.alerts.pop_front();
        }
    }

    fn expire_alerts(&mut self, now: Instant) {
        self.alerts.retain(|alert| !alert.is_expired(now));
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return;
        }

        match self.mode {
            Mode::Normal => self.handle_key_normal(key),
            Mode::JournalPrompt => self.handle_key_journal(key),
            Mode::ConfirmRemove => self.handle_key_confirm_remove(key),
        }
    }

    fn handle_key_normal(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => return self.update(Msg::Quit),
            KeyCode::Esc | KeyCode::Home | KeyCode::Backspace => return self.update(Msg::Home),
            KeyCode::Char('x') => {
                self.alerts.clear();
                return;
            }
            _ => {}
        }

        match &mut self.pane {
            Pane::Select(pane) => match key.code {
                KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => pane.move_selection(-1),
                KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => pane.move_selection(1),
                KeyCode::Char(ch @ '1'..='3') => {
                    let action = Action::ALL[(ch as u8 - b'1') as usize];
                    pane.select(action);
                    if pane.is_enabled(action) {
                        self.update(Msg::Action(action));
                    }
                }
                KeyCode::Enter | KeyCode::Char(' ') => {
                    if let Some(action) = pane.selected_action() {
                        self.update(Msg::Action(action));
                    }
                }
                _ => {}
            },
            Pane::Download(pane) => match key.code {
                KeyCode::Up | KeyCode::Char('k') => pane.move_selection(-1),
                KeyCode::Down | KeyCode::Char('j') => pane.move_selection(1),
                KeyCode::Enter | KeyCode::Char(' ') => self.start_selected_download(),
                _ => {}
            },
            Pane::Remove(pane) => match key.code {
                KeyCode::Up | KeyCode::Char('k') => pane.move_selection(-1),
                KeyCode::Down | KeyCode::Char('j') => pane.move_selection(1),
                KeyCode::Enter | KeyCode::Delete | KeyCode::Char('d') => {
                    if pane.selected().is_some() {
                        self.mode = Mode::ConfirmRemove;
                    }
                }
                _ => {}
            },
        }
    }

    fn handle_key_journal(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Enter => self.install_from_journal(),
            KeyCode::Backspace => {
                self.journal_input.pop();
            }
            KeyCode::Char(ch) => self.journal_input.push(ch),
            _ => {}
        }
    }

    fn handle_key_confirm_remove(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.confirm_remove(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.mode = Mode::Normal,
            _ => {}
        }
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&mut self, frame: &mut Frame) {
        let alert_rows = self.alerts.len().min(VISIBLE_ALERTS) as u16;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),          // toolbar
                Constraint::Min(1),             // pane
                Constraint::Length(alert_rows), // alerts
                Constraint::Length(1),          // status bar
            ])
            .split(frame.area());

        self.render_toolbar(frame, chunks[0]);

        match &self.pane {
            Pane::Select(pane) => pane.render(frame, chunks[1]),
            Pane::Download(pane) => pane.render(frame, chunks[1]),
            Pane::Remove(pane) => pane.render(frame, chunks[1]),
        }

        self.render_alerts(frame, chunks[2]);
        self.render_status_bar(frame, chunks[3]);

        match self.mode {
            Mode::JournalPrompt => self.render_journal_overlay(frame),
            Mode::ConfirmRemove => self.render_confirm_overlay(frame),
            Mode::Normal => {}
        }
    }

    fn render_toolbar(&self, frame: &mut Frame, area: Rect) {
        let help = match self.pane {
            Pane::Select(_) => "  ←/→: Choose  Enter: Open  1-3: Jump  x: Dismiss  q: Quit ",
            Pane::Download(_) => "  ↑/↓: Choose  Enter: Download  Esc: Home  x: Dismiss  q: Quit ",
            Pane::Remove(_) => "  ↑/↓: Choose  d: Remove  Esc: Home  x: Dismiss  q: Quit ",
        };

        let line = Line::from(vec![
            Span::styled(
                " webinstall ",
                Style::default()
                    .bg(self.theme.fill)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {} ", self.pane.title()),
                Style::default()
                    .bg(Color::Rgb(30, 30, 45))
                    .fg(self.theme.stroke)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                help,
                Style::default()
                    .bg(Color::Rgb(20, 20, 30))
                    .fg(Color::DarkGray),
            ),
        ]);

        frame.render_widget(
            Paragraph::new(line).style(Style::default().bg(Color::Rgb(20, 20, 30))),
            area,
        );
    }

    fn render_alerts(&self, frame: &mut Frame, area: Rect) {
        if area.height == 0 {
            return;
        }

        let lines: Vec<Line> = self
            .alerts
            .iter()
            .rev()
            .take(VISIBLE_ALERTS)
            .map(|alert| {
                let title_color = if alert.title == "Error" {
                    Color::Red
                } else {
                    self.theme.fill
                };
                Line::from(vec![
                    Span::styled(
                        format!(" {} ", alert.title),
                        Style::default()
                            .fg(Color::Black)
                            .bg(title_color)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!(" {}", alert.message)),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mode_style = match self.mode {
            Mode::Normal => Style::default()
                .fg(Color::Black)
                .bg(self.theme.stroke)
                .add_modifier(Modifier::BOLD),
            _ => Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        };
        let mode_span = Span::styled(format!(" {} ", self.mode.label()), mode_style);

        let detail = match &self.pane {
            Pane::Download(pane) => {
                let active = pane
                    .jobs()
                    .iter()
                    .filter(|job| job.status.is_active())
                    .count();
                format!(" | {} extensions, {active} downloading", pane.jobs().len())
            }
            Pane::Remove(pane) => format!(" | {} installed", pane.extensions().len()),
            Pane::Select(_) => String::new(),
        };

        let info = Span::styled(
            format!(" profile: {}{detail} ", self.config.profile_path().display()),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        );

        let bar = Line::from(vec![mode_span, info]);
        frame.render_widget(
            Paragraph::new(bar).style(Style::default().bg(Color::DarkGray)),
            area,
        );
    }

    fn render_journal_overlay(&self, frame: &mut Frame) {
        let area = centered_rect(70, 20, frame.area());
        frame.render_widget(Clear, area);

        let prompt = Paragraph::new(self.journal_input.as_str()).block(
            Block::default()
                .title(" Load from Journal: archive path ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.stroke))
                .style(Style::default().bg(Color::Rgb(15, 15, 24))),
        );
        frame.render_widget(prompt, area);

        let cursor_x = area.x + 1 + self.journal_input.chars().count() as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn render_confirm_overlay(&self, frame: &mut Frame) {
        let Pane::Remove(pane) = &self.pane else {
            return;
        };
        let name = pane
            .selected()
            .map(|ext| ext.name.as_str())
            .unwrap_or_default();

        let area = centered_rect(50, 25, frame.area());
        frame.render_widget(Clear, area);

        let body = vec![
            Line::from(Span::styled(
                format!("Remove {name}?"),
                Style::default()
                    .fg(self.theme.fill)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Sure? (y/n)"),
        ];
        let dialog = Paragraph::new(body).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(" Remove extension? ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.stroke))
                .style(Style::default().bg(Color::Rgb(15, 15, 24))),
        );
        frame.render_widget(dialog, area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::JobStatus;
    use crate::extension::installer::tests::tar_bytes;
    use crate::extension::job::tests::StaticFetcher;
    use crate::extension::verifier::{ChecksumKind, checksum};
    use std::fs;
    use std::path::{Path, PathBuf};

    struct Harness {
        root: tempfile::TempDir,
        app: App,
        rx: mpsc::Receiver<Msg>,
    }

    impl Harness {
        fn new(body: Vec<u8>) -> Self {
            let root = tempfile::tempdir().unwrap();
            let mut config = AppConfig::layered(None).unwrap();
            config.general.profile_path = path_str(&root.path().join("profile"));
            config.general.catalog_path = path_str(&root.path().join("extensions.json"));
            config.general.scratch_dir = path_str(&root.path().join("tmp"));
            config.download.verify_attempts = 1;
            fs::create_dir_all(root.path().join("profile")).unwrap();

            let (tx, rx) = mpsc::channel();
            let app = App::with_fetcher(config, Arc::new(StaticFetcher(body)), tx).unwrap();
            Self { root, app, rx }
        }

        fn profile(&self) -> PathBuf {
            self.root.path().join("profile")
        }

        fn write_catalog(&self, body: &str) {
            fs::write(self.root.path().join("extensions.json"), body).unwrap();
        }

        fn press(&mut self, code: KeyCode) {
            self.app
                .update(Msg::Key(KeyEvent::new(code, KeyModifiers::NONE)));
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        /// Feeds worker messages back until `id` stops being active.
        fn drain_job(&mut self, id: &str) -> JobStatus {
            loop {
                let msg = self.rx.recv_timeout(Duration::from_secs(5)).unwrap();
                self.app.update(msg);
                let Pane::Download(pane) = &mut self.app.pane else {
                    panic!("download pane closed");
                };
                let status = pane.job_mut(id).unwrap().status.clone();
                if !status.is_active() {
                    return status;
                }
            }
        }

        fn alert_titles(&self) -> Vec<&str> {
            self.app
                .alerts
                .iter()
                .map(|alert| alert.title.as_str())
                .collect()
        }
    }

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().to_string()
    }

    fn chat_archive() -> Vec<u8> {
        tar_bytes(&[
            ("extensions/webservice/chat/service.py", b"SERVICE = 'chat'\n"),
            ("extensions/cpsection/webaccount/services/chat/account.py", b"A = 1\n"),
        ])
    }

    fn md5_of(bytes: &[u8]) -> String {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bytes");
        fs::write(&path, bytes).unwrap();
        checksum(&path, ChecksumKind::Md5).unwrap()
    }

    #[test]
    fn verified_download_installs_into_profile() {
        let archive = chat_archive();
        let mut h = Harness::new(archive.clone());
        h.write_catalog(&format!(
            r#"{{"chat": ["http://x/chat.tar", "{}"]}}"#,
            md5_of(&archive)
        ));

        h.press(KeyCode::Char('2'));
        assert!(matches!(h.app.pane, Pane::Download(_)));
        h.press(KeyCode::Enter);

        assert_eq!(h.drain_job("chat"), JobStatus::Installed);
        assert!(
            h.profile()
                .join("extensions/webservice/chat/service.py")
                .is_file()
        );
        assert_eq!(h.alert_titles(), vec!["Downloaded"]);
    }

    #[test]
    fn mismatched_download_leaves_profile_unchanged() {
        let mut h = Harness::new(chat_archive());
        h.write_catalog(&format!(
            r#"{{"chat": ["http://x/chat.tar", "{}"]}}"#,
            md5_of(b"different bytes")
        ));

        h.app.update(Msg::Action(Action::Download));
        h.press(KeyCode::Enter);

        assert!(matches!(h.drain_job("chat"), JobStatus::Failed(_)));
        assert_eq!(fs::read_dir(h.profile()).unwrap().count(), 0);
        assert_eq!(h.alert_titles(), vec!["Error"]);
    }

    #[test]
    fn events_from_a_previous_pane_do_not_drive_a_restarted_job() {
        let mut h = Harness::new(chat_archive());
        h.write_catalog(&format!(
            r#"{{"chat": ["http://x/chat.tar", "{}"]}}"#,
            md5_of(b"different bytes")
        ));

        h.app.update(Msg::Action(Action::Download));
        h.press(KeyCode::Enter);
        let first = h.rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let Msg::Job { generation: stale, .. } = first else {
            panic!("expected a job message, got {first:?}");
        };
        h.app.update(first);
        assert!(matches!(h.drain_job("chat"), JobStatus::Failed(_)));

        h.press(KeyCode::Esc);
        h.app.update(Msg::Action(Action::Download));
        h.press(KeyCode::Enter);
        for event in [JobEvent::Verifying, JobEvent::Installed] {
            h.app.update(Msg::Job {
                id: "chat".into(),
                generation: stale,
                event,
            });
        }

        let Pane::Download(pane) = &mut h.app.pane else {
            panic!("download pane closed");
        };
        assert_eq!(pane.job_mut("chat").unwrap().status, JobStatus::Downloading);
        assert!(!h.alert_titles().contains(&"Downloaded"));

        assert!(matches!(h.drain_job("chat"), JobStatus::Failed(_)));
        assert_eq!(fs::read_dir(h.profile()).unwrap().count(), 0);
    }

    #[test]
    fn unsupported_checksum_row_is_not_downloaded() {
        let mut h = Harness::new(chat_archive());
        h.write_catalog(r#"{"chat": ["http://x/chat.tar", "abc123"]}"#);

        h.app.update(Msg::Action(Action::Download));
        h.press(KeyCode::Enter);

        assert_eq!(h.alert_titles(), vec!["Error"]);
        assert!(h.rx.try_recv().is_err());
        let Pane::Download(pane) = &mut h.app.pane else {
            panic!("download pane closed");
        };
        assert!(matches!(pane.job_mut("chat").unwrap().status, JobStatus::Failed(_)));
        assert_eq!(fs::read_dir(h.profile()).unwrap().count(), 0);
    }

    #[test]
    fn missing_catalog_keeps_select_pane() {
        let mut h = Harness::new(Vec::new());
        h.app.update(Msg::Action(Action::Download));

        assert!(matches!(h.app.pane, Pane::Select(_)));
        assert_eq!(h.alert_titles(), vec!["Error"]);
    }

    fn install_chat(profile: &Path) {
        fs::create_dir_all(profile.join("extensions/webservice/chat")).unwrap();
        fs::create_dir_all(profile.join("extensions/cpsection/webaccount/services/chat")).unwrap();
    }

    #[test]
    fn confirmed_removal_deletes_trees_and_row() {
        let mut h = Harness::new(Vec::new());
        install_chat(&h.profile());

        h.app.update(Msg::Home);
        h.press(KeyCode::Char('3'));
        let Pane::Remove(pane) = &h.app.pane else {
            panic!("remove pane not shown");
        };
        assert_eq!(pane.extensions().len(), 1);

        h.press(KeyCode::Char('d'));
        assert_eq!(h.app.mode, Mode::ConfirmRemove);
        h.press(KeyCode::Char('y'));

        assert_eq!(h.app.mode, Mode::Normal);
        assert!(!h.profile().join("extensions/webservice/chat").exists());
        assert!(
            !h.profile()
                .join("extensions/cpsection/webaccount/services/chat")
                .exists()
        );
        let Pane::Remove(pane) = &h.app.pane else {
            panic!("remove pane not shown");
        };
        assert!(pane.extensions().is_empty());
        assert_eq!(h.alert_titles(), vec!["Removed"]);
    }

    #[test]
    fn declined_removal_keeps_everything() {
        let mut h = Harness::new(Vec::new());
        install_chat(&h.profile());

        h.app.update(Msg::Action(Action::RemoveExtension));
        h.press(KeyCode::Enter);
        h.press(KeyCode::Char('n'));

        assert_eq!(h.app.mode, Mode::Normal);
        assert!(h.profile().join("extensions/webservice/chat").is_dir());
        assert!(h.alerts_empty());
    }

    #[test]
    fn failed_removal_is_reported_not_raised() {
        let mut h = Harness::new(Vec::new());
        install_chat(&h.profile());
        h.app.update(Msg::Action(Action::RemoveExtension));
        fs::remove_dir_all(h.profile().join("extensions/webservice/chat")).unwrap();

        h.press(KeyCode::Char('d'));
        h.press(KeyCode::Char('y'));

        assert_eq!(h.alert_titles(), vec!["Error"]);
        let Pane::Remove(pane) = &h.app.pane else {
            panic!("remove pane not shown");
        };
        assert_eq!(pane.extensions().len(), 1);
    }

    #[test]
    fn remove_zone_is_disabled_without_extensions() {
        let mut h = Harness::new(Vec::new());
        h.press(KeyCode::Char('3'));
        assert!(matches!(h.app.pane, Pane::Select(_)));
    }

    #[test]
    fn journal_archive_is_installed() {
        let mut h = Harness::new(Vec::new());
        let archive = h.root.path().join("chat.tar");
        fs::write(&archive, chat_archive()).unwrap();

        h.press(KeyCode::Char('1'));
        assert_eq!(h.app.mode, Mode::JournalPrompt);
        h.type_text(&path_str(&archive));
        h.press(KeyCode::Enter);

        assert_eq!(h.app.mode, Mode::Normal);
        assert_eq!(h.alert_titles(), vec!["Success"]);
        assert!(
            h.profile()
                .join("extensions/webservice/chat/service.py")
                .is_file()
        );

        let Pane::Select(pane) = &h.app.pane else {
            panic!("select pane not shown");
        };
        assert!(pane.is_enabled(Action::RemoveExtension));
    }

    #[test]
    fn bad_journal_path_is_an_error_alert() {
        let mut h = Harness::new(Vec::new());
        h.app.update(Msg::Action(Action::LoadFromJournal));
        h.type_text("/definitely/not/here.tar");
        h.press(KeyCode::Enter);

        assert_eq!(h.alert_titles(), vec!["Error"]);
    }

    #[test]
    fn alerts_expire_on_tick() {
        let mut h = Harness::new(Vec::new());
        h.app.push_alert(Alert::notify("Error", "boom"));
        h.app.expire_alerts(Instant::now());
        assert_eq!(h.alert_titles(), vec!["Error"]);

        h.app.expire_alerts(Instant::now() + Duration::from_secs(6));
        assert!(h.alerts_empty());
    }

    #[test]
    fn quit_sets_flag() {
        let mut h = Harness::new(Vec::new());
        h.app.update(Msg::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(h.app.should_quit);
    }

    impl Harness {
        fn alerts_empty(&self) -> bool {
            self.app.alerts.is_empty()
        }
    }
}
