//! Touch drag recognition for the definition list. Tells a reorder drag apart
//! from an ordinary scroll using the same thresholds the detail page uses.

/// Pointer travel that commits a press to being a drag.
const DRAG_DISTANCE_PX: f32 = 10.0;
/// Mostly-vertical travel beyond this is treated as scrolling.
const SCROLL_DISTANCE_PX: f32 = 15.0;
/// Holding still this long also commits to a drag.
const HOLD_DELAY_MS: u64 = 150;

#[derive(Debug, Clone, Copy)]
struct Press {
    x: f32,
    y: f32,
    at_ms: u64,
}

/// Tracks one finger across the definition list and decides whether the
/// gesture should reorder anything.
#[derive(Debug, Default)]
pub struct DragTracker {
    pressed: Option<Press>,
    dragging: bool,
    dragged: Option<usize>,
    hovered: Option<usize>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A finger lands on the row at `index`.
    pub fn press(&mut self, index: usize, x: f32, y: f32, now_ms: u64) {
        self.reset();
        self.pressed = Some(Press { x, y, at_ms: now_ms });
        self.dragged = Some(index);
    }

    /// Grabbing the row's drag handle skips the thresholds entirely.
    pub fn press_handle(&mut self, index: usize) {
        self.reset();
        self.dragged = Some(index);
        self.dragging = true;
    }

    /// The finger moved; `hovered` is the row currently under it. The drop
    /// target sticks to the last row hovered that is not the grabbed one.
    pub fn moved(&mut self, x: f32, y: f32, now_ms: u64, hovered: Option<usize>) {
        if !self.dragging {
            let Some(press) = self.pressed else {
                return;
            };
            if now_ms.saturating_sub(press.at_ms) >= HOLD_DELAY_MS {
                self.dragging = true;
            } else {
                let delta_x = (x - press.x).abs();
                let delta_y = (y - press.y).abs();
                if delta_y > SCROLL_DISTANCE_PX && delta_y > delta_x {
                    // the list is scrolling, stand down
                    self.reset();
                    return;
                }
                if delta_x > DRAG_DISTANCE_PX || delta_y > DRAG_DISTANCE_PX {
                    self.dragging = true;
                } else {
                    return;
                }
            }
        }
        if let Some(row) = hovered {
            if Some(row) != self.dragged {
                self.hovered = Some(row);
            }
        }
    }

    /// The finger lifted. Returns the `(from, to)` pair when the gesture
    /// should reorder, and resets either way.
    pub fn release(&mut self) -> Option<(usize, usize)> {
        let reorder = match (self.dragging, self.dragged, self.hovered) {
            (true, Some(from), Some(to)) if from != to => Some((from, to)),
            _ => None,
        };
        self.reset();
        reorder
    }

    /// The gesture was interrupted.
    pub fn cancel(&mut self) {
        self.reset();
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn dragged_index(&self) -> Option<usize> {
        self.dragged
    }

    pub fn hovered_index(&self) -> Option<usize> {
        self.hovered
    }

    fn reset(&mut self) {
        self.pressed = None;
        self.dragging = false;
        self.dragged = None;
        self.hovered = None;
    }
}
