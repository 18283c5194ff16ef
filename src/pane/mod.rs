pub mod download;
pub mod remove;
pub mod select;

pub use download::DownloadPane;
pub use remove::RemovePane;
pub use select::SelectPane;

/// The content currently shown below the toolbar.
pub enum Pane {
    Select(SelectPane),
    Download(DownloadPane),
    Remove(RemovePane),
}

impl Pane {
    pub fn title(&self) -> &'static str {
        match self {
            Pane::Select(_) => "Extensions",
            Pane::Download(_) => "Download",
            Pane::Remove(_) => "Remove",
        }
    }
}

/// Moves `selected` by `delta`, clamped to a list of `len` rows.
pub(crate) fn move_selection(selected: &mut usize, len: usize, delta: isize) {
    if len == 0 {
        *selected = 0;
        return;
    }

    let max = len.saturating_sub(1) as isize;
    *selected = (*selected as isize + delta).clamp(0, max) as usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_is_clamped() {
        let mut selected = 0;
        move_selection(&mut selected, 3, -1);
        assert_eq!(selected, 0);
        move_selection(&mut selected, 3, 5);
        assert_eq!(selected, 2);
        move_selection(&mut selected, 0, 1);
        assert_eq!(selected, 0);
    }
}
