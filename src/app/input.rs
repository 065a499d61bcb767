use winit::event::{MouseButton, MouseScrollDelta};

/// Pixels of trackpad scroll treated as one wheel notch.
const PIXELS_PER_SCROLL_STEP: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerDrag {
    pub mode: DragMode,
    pub dx: f32,
    pub dy: f32,
}

/// Mouse state for the orbit controls.
#[derive(Debug, Default, Clone, Copy)]
pub struct PointerState {
    position: Option<(f32, f32)>,
    drag: Option<DragMode>,
}

impl PointerState {
    /// Starts or ends a drag. Presses the UI has claimed should not reach here.
    pub fn handle_button(&mut self, button: MouseButton, pressed: bool) {
        let mode = match button {
            MouseButton::Left => DragMode::Rotate,
            MouseButton::Right => DragMode::Pan,
            _ => return,
        };
        if pressed {
            self.drag.get_or_insert(mode);
        } else if self.drag == Some(mode) {
            self.drag = None;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn handle_cursor_moved(&mut self, x: f32, y: f32) -> Option<PointerDrag> {
        let previous = self.position.replace((x, y));
        let mode = self.drag?;
        let (px, py) = previous?;
        Some(PointerDrag {
            mode,
            dx: x - px,
            dy: y - py,
        })
    }

    pub fn handle_cursor_left(&mut self) {
        self.position = None;
        self.drag = None;
    }
}

/// Wheel delta in notches, positive when scrolling away from the user.
pub fn scroll_steps(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_SCROLL_STEP,
    }
}
