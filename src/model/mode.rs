/// Application interaction modes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    /// Navigation within the active pane.
    #[default]
    Normal,
    /// Typing the path of an archive to install from the journal.
    JournalPrompt,
    /// "Remove extension?" awaiting y/n for the selected row.
    ConfirmRemove,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::JournalPrompt => "JOURNAL",
            Mode::ConfirmRemove => "CONFIRM",
        }
    }
}
