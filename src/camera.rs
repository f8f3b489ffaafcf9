use crate::geometry::{try_normalize, Fp, Ray, Vec3f};

// Degrees. Keeps front away from world up.
pub const PITCH_LIMIT: Fp = 89.0;
pub const MAX_RESOLUTION_EXP: u32 = 14;

#[derive(Clone, Debug, PartialEq)]
pub struct CameraSettings {
    pub position: Vec3f,
    pub yaw: Fp,
    pub pitch: Fp,
    pub near_plane: Fp,
    pub far_plane: Fp,
    // The image is 2^width_exp by 2^height_exp pixels.
    pub width_exp: u32,
    pub height_exp: u32,
    pub pixel_width: Fp,
    pub pixel_height: Fp,
    pub perspective: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        CameraSettings {
            position: Vec3f::new(0.0, 5.0, -20.0),
            yaw: 90.0,
            pitch: 0.0,
            near_plane: 10.0,
            far_plane: 15.0,
            width_exp: 9,
            height_exp: 9,
            pixel_width: 0.1,
            pixel_height: 0.1,
            perspective: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3f,
    pub front: Vec3f,
    pub side: Vec3f,
    pub up: Vec3f,
    pub yaw: Fp,
    pub pitch: Fp,
    pub near_plane: Fp,
    pub far_plane: Fp,
    pub width: u32,
    pub height: u32,
    pub pixel_width: Fp,
    pub pixel_height: Fp,
    pub perspective: bool,
}

fn resolution_from_exp(exp: u32) -> u32 {
    if exp > MAX_RESOLUTION_EXP {
        log::warn!(
            "resolution exponent {} clamped to {}",
            exp,
            MAX_RESOLUTION_EXP
        );
    }
    1 << exp.min(MAX_RESOLUTION_EXP)
}

pub fn compute_basis(yaw: Fp, pitch: Fp) -> (Vec3f, Vec3f, Vec3f) {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    let front = Vec3f::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
    let side = front.cross(&Vec3f::y()).normalize();
    let up = side.cross(&front).normalize();
    (front, side, up)
}

impl Camera {
    pub fn new(settings: &CameraSettings) -> Self {
        let pitch = settings.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let (front, side, up) = compute_basis(settings.yaw, pitch);
        Camera {
            position: settings.position,
            front,
            side,
            up,
            yaw: settings.yaw,
            pitch,
            near_plane: settings.near_plane,
            far_plane: settings.far_plane,
            width: resolution_from_exp(settings.width_exp),
            height: resolution_from_exp(settings.height_exp),
            pixel_width: settings.pixel_width,
            pixel_height: settings.pixel_height,
            perspective: settings.perspective,
        }
    }

    pub fn apply_look(&mut self, delta_x: Fp, delta_y: Fp, sensitivity: Fp) {
        self.yaw -= delta_x * sensitivity;
        self.pitch = (self.pitch - delta_y * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let (front, side, up) = compute_basis(self.yaw, self.pitch);
        self.front = front;
        self.side = side;
        self.up = up;
    }

    pub fn apply_move(&mut self, direction: MoveDirection, magnitude: Fp) {
        let offset = match direction {
            MoveDirection::Forward => self.front,
            MoveDirection::Backward => -self.front,
            MoveDirection::Left => -self.side,
            MoveDirection::Right => self.side,
            MoveDirection::Up => self.up,
            MoveDirection::Down => -self.up,
        };
        self.position += offset * magnitude;
    }

    // Up is re-derived as side x front; yaw and pitch follow the new front.
    pub fn set_pose(&mut self, position: Vec3f, front: Vec3f, side: Vec3f) {
        self.position = position;
        self.front = front;
        self.side = side;
        self.up = side.cross(&front);
        self.pitch = front.y.clamp(-1.0, 1.0).asin().to_degrees();
        self.yaw = front.z.atan2(front.x).to_degrees();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }

    pub fn toggle_perspective(&mut self) {
        self.perspective = !self.perspective;
    }

    // y = 0 is the top row. Rays start on the near plane.
    pub fn primary_ray(&self, x: u32, y: u32) -> Ray {
        let dx = (1.0 - self.width as Fp) * 0.5 * self.pixel_width + x as Fp * self.pixel_width;
        let dy = -(1.0 - self.height as Fp) * 0.5 * self.pixel_height - y as Fp * self.pixel_height;
        let on_near_plane =
            self.position + self.front * self.near_plane + self.side * dx + self.up * dy;
        let direction = if self.perspective {
            try_normalize(&(on_near_plane - self.position)).unwrap_or(self.front)
        } else {
            self.front
        };
        Ray {
            origin: on_near_plane,
            direction,
        }
    }
}
