use crate::backend::BackendEvent;
use crate::input::KeyInput;

/// Envelope delivered on the event bus. Key presses, resize notifications,
/// the redraw tick, and backend completions all funnel through one channel
/// so state mutation stays on the event-loop thread.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyInput),
    Resize { width: u16, height: u16 },
    Tick,
    Backend(BackendEvent),
}
