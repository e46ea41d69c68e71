use glam::{Mat4, Quat, Vec3};
use sdl2::keyboard::Scancode;
use sdl2::mouse::MouseButton;

use crate::input::InputState;

/// A look-at camera described by its position, the point it looks at and
/// its up vector.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, center: Vec3) -> Camera {
        Camera {
            position,
            center,
            up: Vec3::Y,
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    fn forward(&self) -> Vec3 {
        (self.center - self.position).normalize_or_zero()
    }

    /// Moves position and center along the view direction.
    pub fn move_forward(&mut self, distance: f32) {
        let offset = self.forward() * distance;
        self.position += offset;
        self.center += offset;
    }

    /// Moves position and center sideways, positive distances to the left.
    pub fn move_side(&mut self, distance: f32) {
        let left = self.up.cross(self.forward()).normalize_or_zero();
        self.position += left * distance;
        self.center += left * distance;
    }

    /// Turns the view direction around the up vector.
    pub fn rotate_around_up(&mut self, angle: f32) {
        let rotation = Quat::from_axis_angle(self.up.normalize(), angle);
        self.center = self.position + rotation * (self.center - self.position);
    }

    /// Tilts the view direction up or down. Rotations that would point the
    /// camera straight along the up vector are dropped.
    pub fn rotate_around_side(&mut self, angle: f32) {
        let right = self.forward().cross(self.up).normalize_or_zero();
        if right == Vec3::ZERO {
            return;
        }
        let rotated = Quat::from_axis_angle(right, angle) * (self.center - self.position);
        if rotated.normalize().dot(self.up.normalize()).abs() > 0.999 {
            return;
        }
        self.center = self.position + rotated;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.center, self.up)
    }

    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_y_degrees.to_radians(),
            aspect_ratio,
            self.near,
            self.far,
        )
    }
}

/// WASD dollying (left shift for slow) and left-mouse-drag rotation.
#[derive(Clone, Debug)]
pub struct CameraController {
    pub move_speed: f32,
    pub mouse_sensitivity: f32,
}

impl Default for CameraController {
    fn default() -> CameraController {
        CameraController {
            move_speed: 1.0,
            mouse_sensitivity: 0.005,
        }
    }
}

impl CameraController {
    pub fn update(&self, camera: &mut Camera, input: &InputState) {
        let speed = if input.is_key_down(Scancode::LShift) {
            self.move_speed * 0.1
        } else {
            self.move_speed
        };
        if input.is_key_down(Scancode::W) {
            camera.move_forward(speed);
        }
        if input.is_key_down(Scancode::S) {
            camera.move_forward(-speed);
        }
        if input.is_key_down(Scancode::A) {
            camera.move_side(speed);
        }
        if input.is_key_down(Scancode::D) {
            camera.move_side(-speed);
        }
        if input.is_button_down(MouseButton::Left) {
            camera.rotate_around_up(-input.mouse_dx as f32 * self.mouse_sensitivity);
            camera.rotate_around_side(input.mouse_dy as f32 * self.mouse_sensitivity);
        }
    }
}
