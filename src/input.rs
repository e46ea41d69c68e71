use std::collections::HashSet;

use sdl2::event::Event;
use sdl2::keyboard::Scancode;
use sdl2::mouse::MouseButton;

/// Keyboard and mouse state accumulated from SDL events, passed into the
/// per-frame update instead of living in globals.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashSet<Scancode>,
    mouse_buttons: [bool; 5],
    pub mouse_x: i32,
    pub mouse_y: i32,
    /// Relative mouse motion since the last [`InputState::end_frame`].
    pub mouse_dx: i32,
    pub mouse_dy: i32,
}

impl InputState {
    pub fn new() -> InputState {
        InputState::default()
    }

    pub fn handle_event(&mut self, event: &Event) {
        match *event {
            Event::KeyDown {
                scancode: Some(scancode),
                ..
            } => {
                self.keys.insert(scancode);
            }
            Event::KeyUp {
                scancode: Some(scancode),
                ..
            } => {
                self.keys.remove(&scancode);
            }
            Event::MouseButtonDown { mouse_btn, x, y, .. } => {
                self.set_button(mouse_btn, true);
                self.mouse_x = x;
                self.mouse_y = y;
            }
            Event::MouseButtonUp { mouse_btn, x, y, .. } => {
                self.set_button(mouse_btn, false);
                self.mouse_x = x;
                self.mouse_y = y;
            }
            Event::MouseMotion {
                x, y, xrel, yrel, ..
            } => {
                self.mouse_x = x;
                self.mouse_y = y;
                self.mouse_dx += xrel;
                self.mouse_dy += yrel;
            }
            _ => {}
        }
    }

    pub fn is_key_down(&self, scancode: Scancode) -> bool {
        self.keys.contains(&scancode)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        button_slot(button).map_or(false, |slot| self.mouse_buttons[slot])
    }

    /// Clears the per-frame deltas; held keys and buttons stay down.
    pub fn end_frame(&mut self) {
        self.mouse_dx = 0;
        self.mouse_dy = 0;
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        if let Some(slot) = button_slot(button) {
            self.mouse_buttons[slot] = down;
        }
    }
}

fn button_slot(button: MouseButton) -> Option<usize> {
    match button {
        MouseButton::Left => Some(0),
        MouseButton::Middle => Some(1),
        MouseButton::Right => Some(2),
        MouseButton::X1 => Some(3),
        MouseButton::X2 => Some(4),
        MouseButton::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdl2::keyboard::Mod;
    use sdl2::mouse::MouseState;

    fn key_down(scancode: Scancode) -> Event {
        Event::KeyDown {
            timestamp: 0,
            window_id: 0,
            keycode: None,
            scancode: Some(scancode),
            keymod: Mod::NOMOD,
            repeat: false,
        }
    }

    fn key_up(scancode: Scancode) -> Event {
        Event::KeyUp {
            timestamp: 0,
            window_id: 0,
            keycode: None,
            scancode: Some(scancode),
            keymod: Mod::NOMOD,
            repeat: false,
        }
    }

    fn motion(xrel: i32, yrel: i32) -> Event {
        Event::MouseMotion {
            timestamp: 0,
            window_id: 0,
            which: 0,
            mousestate: MouseState::from_sdl_state(0),
            x: 100,
            y: 50,
            xrel,
            yrel,
        }
    }

    #[test]
    fn keys_stay_down_until_released() {
        let mut input = InputState::new();
        input.handle_event(&key_down(Scancode::W));
        input.end_frame();
        assert!(input.is_key_down(Scancode::W));
        assert!(!input.is_key_down(Scancode::S));
        input.handle_event(&key_up(Scancode::W));
        assert!(!input.is_key_down(Scancode::W));
    }

    #[test]
    fn mouse_motion_accumulates_until_end_of_frame() {
        let mut input = InputState::new();
        input.handle_event(&motion(3, -2));
        input.handle_event(&motion(4, 1));
        assert_eq!((7, -1), (input.mouse_dx, input.mouse_dy));
        assert_eq!((100, 50), (input.mouse_x, input.mouse_y));
        input.end_frame();
        assert_eq!((0, 0), (input.mouse_dx, input.mouse_dy));
    }

    #[test]
    fn mouse_buttons_track_press_and_release() {
        let mut input = InputState::new();
        input.handle_event(&Event::MouseButtonDown {
            timestamp: 0,
            window_id: 0,
            which: 0,
            mouse_btn: MouseButton::Left,
            clicks: 1,
            x: 10,
            y: 20,
        });
        assert!(input.is_button_down(MouseButton::Left));
        assert!(!input.is_button_down(MouseButton::Right));
        input.handle_event(&Event::MouseButtonUp {
            timestamp: 0,
            window_id: 0,
            which: 0,
            mouse_btn: MouseButton::Left,
            clicks: 1,
            x: 10,
            y: 20,
        });
        assert!(!input.is_button_down(MouseButton::Left));
    }
}
