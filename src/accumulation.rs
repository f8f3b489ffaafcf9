use crate::camera::Camera;
use crate::rendering::{Image, SampleBackend};
use crate::scene::Scene;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccumulationStep {
    Reset,
    Accumulated { frame_counter: u32 },
}

/// Progressive refinement state: the displayed (accumulated) image, the
/// scratch (working) image and the running-average counter.
///
/// After a reset the counter is 1. Each accumulating step blends with
/// `1 / counter` and then increments it, so after N accumulating steps the
/// accumulated image is the mean of those N sample passes.
pub struct Accumulator {
    accumulated: Image,
    working: Image,
    frame_counter: u32,
    frame_id: u64,
    reset_requested: bool,
}

impl Accumulator {
    pub fn new(width: u32, height: u32) -> Self {
        Accumulator {
            accumulated: Image::new(width, height),
            working: Image::new(width, height),
            frame_counter: 1,
            frame_id: 1,
            reset_requested: true,
        }
    }

    pub fn image(&self) -> &Image {
        &self.accumulated
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    /// Identifier handed to the next sample pass. It never goes back, even on
    /// reset, so every pass draws different random numbers.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    pub fn reset_pending(&self) -> bool {
        self.reset_requested
    }

    fn next_frame_id(&mut self) -> u64 {
        let id = self.frame_id;
        self.frame_id = self.frame_id.wrapping_add(1);
        id
    }

    fn matches(&self, camera: &Camera) -> bool {
        self.accumulated.width() == camera.width && self.accumulated.height() == camera.height
    }

    pub fn step(&mut self, scene: &Scene, camera: &Camera, backend: &dyn SampleBackend) -> AccumulationStep {
        if scene.moving || self.reset_requested || !self.matches(camera) {
            self.reset(scene, camera, backend);
            AccumulationStep::Reset
        } else {
            self.accumulate(scene, camera, backend)
        }
    }

    pub fn reset(&mut self, scene: &Scene, camera: &Camera, backend: &dyn SampleBackend) {
        if !self.matches(camera) {
            self.accumulated = Image::new(camera.width, camera.height);
            self.working = Image::new(camera.width, camera.height);
        }
        self.frame_counter = 1;
        self.reset_requested = false;
        let frame_id = self.next_frame_id();
        let view = scene.view();
        backend.render_pass(&view, camera, frame_id, &mut self.accumulated);
        log::trace!("reset with frame {}", frame_id);
    }

    pub fn accumulate(&mut self, scene: &Scene, camera: &Camera, backend: &dyn SampleBackend) -> AccumulationStep {
        if !self.matches(camera) {
            self.reset(scene, camera, backend);
            return AccumulationStep::Reset;
        }
        let frame_id = self.next_frame_id();
        let view = scene.view();
        backend.render_pass(&view, camera, frame_id, &mut self.working);
        let frame_counter = self.frame_counter;
        backend.blend(&mut self.accumulated, &self.working, frame_counter);
        self.frame_counter = self.frame_counter.saturating_add(1);
        log::trace!("accumulated frame {} with weight 1/{}", frame_id, frame_counter);
        AccumulationStep::Accumulated { frame_counter }
    }
}
