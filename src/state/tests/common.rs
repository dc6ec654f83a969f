use crate::state::{AppState, ViewId};

pub(super) fn state_with_rooms(rooms: &[&str]) -> (AppState, Vec<ViewId>) {
    let mut state = AppState::new();
    let ids = rooms
        .iter()
        .map(|room| state.ensure_view(&format!("!{room}"), room))
        .collect();
    (state, ids)
}
