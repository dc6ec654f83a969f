use crate::intent::FocusDirection;
use crate::state::ViewId;
use crate::state::histlist::HistList;

const JUMP_LIST_SIZE: usize = 64;

/// A tiled region of the window. Owns a jump list of the views it has
/// shown; the current view is the jump list's cursor element.
#[derive(Debug, Clone)]
pub struct Pane {
    jump_list: HistList<ViewId>,
}

impl Pane {
    pub fn new(initial: ViewId) -> Self {
        Self {
            jump_list: HistList::with_initial(JUMP_LIST_SIZE, initial),
        }
    }

    pub fn current_view(&self) -> ViewId {
        *self.jump_list.current()
    }

    /// Shows `view` in this pane, recording it in the jump list. Focusing
    /// the already-current view is a no-op so repeated `:join` commands do
    /// not pollute the history.
    pub fn focus_view(&mut self, view: ViewId) {
        if self.current_view() == view {
            return;
        }
        self.jump_list.append(view);
    }

    /// Walks the jump list and returns the view that became current.
    pub fn focus_history(&mut self, direction: FocusDirection, count: u32) -> ViewId {
        let count = count.max(1) as usize;
        match direction {
            FocusDirection::Next => *self.jump_list.next(count),
            _ => *self.jump_list.prev(count),
        }
    }

    pub fn jump_list_len(&self) -> usize {
        self.jump_list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::Pane;
    use crate::intent::FocusDirection;
    use crate::state::ViewId;
    use slotmap::SlotMap;

    fn view_ids(count: usize) -> Vec<ViewId> {
        let mut map: SlotMap<ViewId, ()> = SlotMap::with_key();
        (0..count).map(|_| map.insert(())).collect()
    }

    #[test]
    fn focus_view_should_append_to_jump_list() {
        let ids = view_ids(3);
        let mut pane = Pane::new(ids[0]);
        pane.focus_view(ids[1]);
        pane.focus_view(ids[2]);
        assert_eq!(pane.current_view(), ids[2]);
        assert_eq!(pane.jump_list_len(), 3);
    }

    #[test]
    fn focus_view_should_skip_the_current_view() {
        let ids = view_ids(2);
        let mut pane = Pane::new(ids[0]);
        pane.focus_view(ids[1]);
        pane.focus_view(ids[1]);
        assert_eq!(pane.jump_list_len(), 2);
    }

    #[test]
    fn focus_history_should_walk_back_and_forward() {
        let ids = view_ids(3);
        let mut pane = Pane::new(ids[0]);
        pane.focus_view(ids[1]);
        pane.focus_view(ids[2]);

        assert_eq!(pane.focus_history(FocusDirection::Previous, 2), ids[0]);
        assert_eq!(pane.focus_history(FocusDirection::Next, 1), ids[1]);
        assert_eq!(pane.current_view(), ids[1]);
    }

    #[test]
    fn clone_should_deep_copy_the_jump_list() {
        let ids = view_ids(2);
        let mut pane = Pane::new(ids[0]);
        pane.focus_view(ids[1]);

        let mut copy = pane.clone();
        copy.focus_history(FocusDirection::Previous, 1);
        assert_eq!(copy.current_view(), ids[0]);
        assert_eq!(pane.current_view(), ids[1]);
    }
}
