use crossterm::event::KeyEvent;

use crate::extension::JobEvent;

/// Entry points offered on the select pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    LoadFromJournal,
    Download,
    RemoveExtension,
}

impl Action {
    pub const ALL: [Action; 3] = [
        Action::LoadFromJournal,
        Action::Download,
        Action::RemoveExtension,
    ];

    pub fn icon_name(self) -> &'static str {
        match self {
            Action::LoadFromJournal => "load-from-journal",
            Action::Download => "download",
            Action::RemoveExtension => "remove-extension",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::LoadFromJournal => "Load from Journal",
            Action::Download => "Download from internet",
            Action::RemoveExtension => "Remove installed extensions",
        }
    }
}

/// All possible messages that drive state transitions.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Resize(u16, u16),

    // -- Navigation
    Action(Action),
    Home,

    // -- Download workers
    Job {
        id: String,
        generation: u64,
        event: JobEvent,
    },

    // -- System
    Tick,
    Quit,
}
