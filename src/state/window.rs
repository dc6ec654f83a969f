use crate::intent::FocusDirection;
use crate::state::pane::Pane;

pub const MIN_PANE_HEIGHT: u16 = 4;

#[derive(Debug)]
pub struct PaneSlot {
    pub pane: Pane,
    pub height: Option<u16>,
    pub width: Option<u16>,
}

/// Horizontal stack of panes with a focus index. Two display states: tile
/// (all panes laid out top to bottom) and zoom (the focused pane fills the
/// window).
#[derive(Debug)]
pub struct Window {
    panes: Vec<PaneSlot>,
    index: usize,
    zoomed: bool,
}

impl Window {
    pub fn new(pane: Pane) -> Self {
        Self {
            panes: vec![PaneSlot {
                pane,
                height: None,
                width: None,
            }],
            index: 0,
            zoomed: false,
        }
    }

    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    pub fn focus_index(&self) -> usize {
        self.index
    }

    pub fn zoomed(&self) -> bool {
        self.zoomed
    }

    pub fn focused(&self) -> &Pane {
        &self.panes[self.index].pane
    }

    pub fn focused_mut(&mut self) -> &mut Pane {
        &mut self.panes[self.index].pane
    }

    pub fn panes(&self) -> impl Iterator<Item = &PaneSlot> {
        self.panes.iter()
    }

    pub fn panes_mut(&mut self) -> impl Iterator<Item = &mut PaneSlot> {
        self.panes.iter_mut()
    }

    /// Focus transition. `count == 0` means unspecified; for next/previous a
    /// positive count jumps to that absolute pane number.
    pub fn focus(&mut self, direction: FocusDirection, count: u32) -> Result<(), String> {
        let n = self.panes.len();
        match direction {
            FocusDirection::Next => {
                if count > 0 {
                    self.index = (count as usize).min(n) - 1;
                } else {
                    self.index = (self.index + 1) % n;
                }
            }
            FocusDirection::Previous => {
                if count > 0 {
                    self.index = (count as usize).min(n) - 1;
                } else {
                    self.index = (self.index + n - 1) % n;
                }
            }
            FocusDirection::Top => self.index = 0,
            FocusDirection::Bottom => self.index = n - 1,
            FocusDirection::Up => self.index = self.index.saturating_sub(count.max(1) as usize),
            FocusDirection::Down => {
                self.index = (self.index + count.max(1) as usize).min(n - 1);
            }
            FocusDirection::Left | FocusDirection::Right => {
                return Err("Vertical splits not yet supported".to_string());
            }
            FocusDirection::Zoom => self.zoomed = !self.zoomed,
        }
        Ok(())
    }

    /// Horizontal split: a clone of the focused pane is inserted at the
    /// focus position. Refuses when the panes would drop below the minimum
    /// height.
    pub fn hsplit(&mut self, window_height: u16, height: Option<u16>) -> Result<(), String> {
        let next_count = self.panes.len() as u16 + 1;
        if window_height / next_count < MIN_PANE_HEIGHT {
            return Err("Not enough room".to_string());
        }
        let clone = self.panes[self.index].pane.clone();
        self.panes.insert(
            self.index,
            PaneSlot {
                pane: clone,
                height: height.map(|h| h.max(MIN_PANE_HEIGHT)),
                width: None,
            },
        );
        Ok(())
    }

    pub fn vsplit(&mut self) -> Result<(), String> {
        Err("Vertical splits not yet supported".to_string())
    }

    /// Grows or shrinks the focused pane, pinning its height.
    pub fn hresize(&mut self, delta: i32, window_height: u16) {
        let current = i32::from(self.layout(window_height)[self.index]);
        let next = (current + delta).max(i32::from(MIN_PANE_HEIGHT)) as u16;
        self.panes[self.index].height = Some(next);
    }

    /// Clears every fixed size, returning to equal distribution.
    pub fn eresize(&mut self) {
        for slot in &mut self.panes {
            slot.height = None;
            slot.width = None;
        }
    }

    /// Rotates the pane list; the focus follows its pane.
    pub fn rotate(&mut self, up: bool, count: u32) {
        let n = self.panes.len();
        let k = count as usize % n;
        if k == 0 {
            return;
        }
        if up {
            self.panes.rotate_left(k);
            self.index = (self.index + n - k) % n;
        } else {
            self.panes.rotate_right(k);
            self.index = (self.index + k) % n;
        }
    }

    /// Removes the focused pane. Returns true when that was the last pane,
    /// which terminates the process.
    pub fn close(&mut self) -> bool {
        if self.panes.len() == 1 {
            return true;
        }
        self.panes.remove(self.index);
        self.index = self.index.min(self.panes.len() - 1);
        false
    }

    /// Tile-state heights: fixed sizes are honored, the remainder is split
    /// evenly. In zoom the caller gives the focused pane the whole area.
    pub fn layout(&self, window_height: u16) -> Vec<u16> {
        let n = self.panes.len() as u16;
        let fixed_total: u16 = self.panes.iter().filter_map(|slot| slot.height).sum();
        let flexible = self.panes.iter().filter(|slot| slot.height.is_none()).count() as u16;
        let remaining = window_height.saturating_sub(fixed_total);
        let share = if flexible == 0 {
            0
        } else {
            (remaining / flexible).max(MIN_PANE_HEIGHT)
        };

        let mut heights = Vec::with_capacity(n as usize);
        let mut used = 0u16;
        for (i, slot) in self.panes.iter().enumerate() {
            let height = match slot.height {
                Some(fixed) => fixed.max(MIN_PANE_HEIGHT),
                None => {
                    if i == self.panes.len() - 1 {
                        window_height.saturating_sub(used).max(MIN_PANE_HEIGHT)
                    } else {
                        share
                    }
                }
            };
            used = used.saturating_add(height);
            heights.push(height);
        }
        heights
    }
}

#[cfg(test)]
mod tests {
    use super::{MIN_PANE_HEIGHT, Window};
    use crate::intent::FocusDirection;
    use crate::state::ViewId;
    use crate::state::pane::Pane;
    use slotmap::SlotMap;

    fn window_with_panes(count: usize) -> (Window, Vec<ViewId>) {
        let mut map: SlotMap<ViewId, ()> = SlotMap::with_key();
        let ids: Vec<ViewId> = (0..count).map(|_| map.insert(())).collect();
        let mut window = Window::new(Pane::new(ids[0]));
        for id in ids.iter().skip(1) {
            window.panes.push(super::PaneSlot {
                pane: Pane::new(*id),
                height: None,
                width: None,
            });
        }
        (window, ids)
    }

    #[test]
    fn focus_next_should_cycle_through_panes() {
        let (mut window, _) = window_with_panes(3);
        assert_eq!(window.focus_index(), 0);
        window.focus(FocusDirection::Next, 0).expect("focusable");
        assert_eq!(window.focus_index(), 1);
        window.focus(FocusDirection::Next, 0).expect("focusable");
        window.focus(FocusDirection::Next, 0).expect("focusable");
        assert_eq!(window.focus_index(), 0);
    }

    #[test]
    fn focus_next_with_count_should_jump_to_absolute_index() {
        let (mut window, _) = window_with_panes(3);
        window.focus(FocusDirection::Next, 2).expect("focusable");
        assert_eq!(window.focus_index(), 1);
        window.focus(FocusDirection::Next, 99).expect("focusable");
        assert_eq!(window.focus_index(), 2);
    }

    #[test]
    fn focus_up_down_should_clamp_into_range() {
        let (mut window, _) = window_with_panes(3);
        window.focus(FocusDirection::Down, 10).expect("focusable");
        assert_eq!(window.focus_index(), 2);
        window.focus(FocusDirection::Up, 1).expect("focusable");
        assert_eq!(window.focus_index(), 1);
        window.focus(FocusDirection::Up, 10).expect("focusable");
        assert_eq!(window.focus_index(), 0);
    }

    #[test]
    fn focus_sideways_should_report_missing_vertical_splits() {
        let (mut window, _) = window_with_panes(2);
        assert!(window.focus(FocusDirection::Left, 0).is_err());
        assert_eq!(window.focus_index(), 0);
    }

    #[test]
    fn zoom_should_toggle() {
        let (mut window, _) = window_with_panes(2);
        assert!(!window.zoomed());
        window.focus(FocusDirection::Zoom, 0).expect("focusable");
        assert!(window.zoomed());
        window.focus(FocusDirection::Zoom, 0).expect("focusable");
        assert!(!window.zoomed());
    }

    #[test]
    fn hsplit_should_refuse_when_panes_would_get_too_short() {
        let (mut window, _) = window_with_panes(2);
        // 10 rows over 3 panes is under the 4-row minimum
        let result = window.hsplit(10, None);
        assert_eq!(result, Err("Not enough room".to_string()));
        assert_eq!(window.pane_count(), 2);

        window.hsplit(12, None).expect("3 panes of 4 rows fit");
        assert_eq!(window.pane_count(), 3);
    }

    #[test]
    fn hsplit_should_clone_the_focused_pane() {
        let (mut window, ids) = window_with_panes(2);
        window.focus(FocusDirection::Bottom, 0).expect("focusable");
        window.hsplit(100, None).expect("split fits");
        assert_eq!(window.pane_count(), 3);
        assert_eq!(window.focused().current_view(), ids[1]);
    }

    #[test]
    fn rotate_up_then_down_should_be_identity() {
        let (mut window, ids) = window_with_panes(3);
        window.focus(FocusDirection::Next, 2).expect("focusable");
        let focused_before = window.focused().current_view();

        window.rotate(true, 2);
        assert_eq!(window.focused().current_view(), focused_before);
        window.rotate(false, 2);
        assert_eq!(window.focused().current_view(), focused_before);
        assert_eq!(window.focus_index(), 1);

        let order: Vec<ViewId> = window
            .panes()
            .map(|slot| slot.pane.current_view())
            .collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn hresize_should_pin_height_with_minimum() {
        let (mut window, _) = window_with_panes(2);
        window.hresize(1, 10);
        let heights = window.layout(10);
        assert_eq!(heights[0], 6);

        window.hresize(-100, 10);
        let heights = window.layout(10);
        assert_eq!(heights[0], MIN_PANE_HEIGHT);
    }

    #[test]
    fn eresize_should_restore_equal_distribution() {
        let (mut window, _) = window_with_panes(2);
        window.hresize(2, 10);
        window.eresize();
        let heights = window.layout(10);
        assert_eq!(heights, vec![5, 5]);
    }

    #[test]
    fn close_should_report_last_pane_and_clamp_focus() {
        let (mut window, _) = window_with_panes(3);
        window.focus(FocusDirection::Bottom, 0).expect("focusable");
        assert!(!window.close());
        assert_eq!(window.focus_index(), 1);
        assert!(!window.close());
        assert!(window.close());
    }
}
