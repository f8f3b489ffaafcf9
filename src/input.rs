use arrayvec::ArrayVec;

use crate::camera::MoveDirection;
use crate::geometry::Fp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    ToggleMotion,
    ToggleRecording,
    TogglePlayback,
    ToggleExport,
    TogglePerspective,
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    Quit,
}

pub const ACTION_COUNT: usize = 12;

impl Action {
    pub const ALL: [Action; ACTION_COUNT] = [
        Action::ToggleMotion,
        Action::ToggleRecording,
        Action::TogglePlayback,
        Action::ToggleExport,
        Action::TogglePerspective,
        Action::Forward,
        Action::Backward,
        Action::Left,
        Action::Right,
        Action::Up,
        Action::Down,
        Action::Quit,
    ];

    pub fn is_toggle(self) -> bool {
        matches!(
            self,
            Action::ToggleMotion
                | Action::ToggleRecording
                | Action::TogglePlayback
                | Action::ToggleExport
                | Action::TogglePerspective
        )
    }

    pub fn move_direction(self) -> Option<MoveDirection> {
        match self {
            Action::Forward => Some(MoveDirection::Forward),
            Action::Backward => Some(MoveDirection::Backward),
            Action::Left => Some(MoveDirection::Left),
            Action::Right => Some(MoveDirection::Right),
            Action::Up => Some(MoveDirection::Up),
            Action::Down => Some(MoveDirection::Down),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
    pressed: [bool; ACTION_COUNT],
    pub mouse_delta: (Fp, Fp),
}

impl InputFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(mut self, action: Action) -> Self {
        self.pressed[action as usize] = true;
        self
    }

    pub fn with_mouse(mut self, dx: Fp, dy: Fp) -> Self {
        self.mouse_delta = (dx, dy);
        self
    }

    pub fn is_pressed(&self, action: Action) -> bool {
        self.pressed[action as usize]
    }
}

pub fn released(previous: bool, current: bool) -> bool {
    previous && !current
}

#[derive(Clone, Debug, Default)]
pub struct InputState {
    previous: [bool; ACTION_COUNT],
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, frame: &InputFrame) -> ArrayVec<Action, ACTION_COUNT> {
        let fired = Action::ALL
            .into_iter()
            .filter(|a| a.is_toggle())
            .filter(|a| released(self.previous[*a as usize], frame.is_pressed(*a)))
            .collect();
        self.previous = frame.pressed;
        fired
    }
}
