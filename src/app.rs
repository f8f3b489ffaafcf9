use std::path::PathBuf;
use std::time::Duration;

use crate::accumulation::{AccumulationStep, Accumulator};
use crate::camera::Camera;
use crate::error::Result;
use crate::geometry::Fp;
use crate::input::{Action, InputFrame, InputState};
use crate::rendering::SampleBackend;
use crate::scene::Scene;
use crate::video::{export_path, Clock, ExportSummary, SinkConfig, VideoSink, VideoState};

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub mouse_sensitivity: Fp,
    pub move_speed: Fp,
    pub export_path: PathBuf,
    pub export_codec: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            mouse_sensitivity: 0.7,
            move_speed: 1.0,
            export_path: PathBuf::from("video"),
            export_codec: "png".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub step: Option<AccumulationStep>,
    pub captured: bool,
    pub played: bool,
    pub export: Option<ExportSummary>,
    pub quit: bool,
}

pub struct App {
    pub scene: Scene,
    pub camera: Camera,
    pub accumulator: Accumulator,
    pub video: VideoState,
    pub config: AppConfig,
    backend: Box<dyn SampleBackend>,
    sink: Box<dyn VideoSink>,
    clock: Box<dyn Clock>,
    input: InputState,
    export_progress: Option<Box<dyn FnMut(usize, usize)>>,
}

impl App {
    pub fn new(
        scene: Scene,
        camera: Camera,
        video: VideoState,
        config: AppConfig,
        backend: Box<dyn SampleBackend>,
        sink: Box<dyn VideoSink>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let accumulator = Accumulator::new(camera.width, camera.height);
        App {
            scene,
            camera,
            accumulator,
            video,
            config,
            backend,
            sink,
            clock,
            input: InputState::new(),
            export_progress: None,
        }
    }

    pub fn set_export_progress(&mut self, progress: Box<dyn FnMut(usize, usize)>) {
        self.export_progress = Some(progress);
    }

    pub fn tick(&mut self, frame: &InputFrame, elapsed: Duration) -> Result<TickReport> {
        let mut report = TickReport::default();
        self.apply_input(frame);
        report.quit = frame.is_pressed(Action::Quit);

        if self.video.is_exporting() {
            report.export = self.export();
        }

        if self.video.playback_tick(&mut self.camera) {
            self.accumulator.request_reset();
            report.played = true;
        }

        report.step = Some(
            self.accumulator
                .step(&self.scene, &self.camera, self.backend.as_ref()),
        );
        report.captured = self.video.record_tick(elapsed, &self.camera)?;
        Ok(report)
    }

    fn apply_input(&mut self, frame: &InputFrame) {
        for action in self.input.update(frame) {
            match action {
                Action::ToggleMotion => {
                    self.scene.moving = !self.scene.moving;
                    self.accumulator.request_reset();
                    log::info!("camera {}", if self.scene.moving { "unlocked" } else { "locked" });
                }
                Action::ToggleRecording => self.video.toggle_recording(),
                Action::TogglePlayback => self.video.toggle_playback(),
                Action::ToggleExport => self.video.toggle_export(),
                Action::TogglePerspective => {
                    self.camera.toggle_perspective();
                    self.accumulator.request_reset();
                }
                _ => {}
            }
        }

        if !self.scene.moving {
            return;
        }
        for action in Action::ALL {
            if let Some(direction) = action.move_direction() {
                if frame.is_pressed(action) {
                    self.camera.apply_move(direction, self.config.move_speed);
                }
            }
        }
        let (dx, dy) = frame.mouse_delta;
        if dx != 0.0 || dy != 0.0 {
            self.camera.apply_look(dx, dy, self.config.mouse_sensitivity);
        }
    }

    fn export(&mut self) -> Option<ExportSummary> {
        self.video.finish_export();
        if self.video.path.is_empty() {
            log::warn!("export requested but no camera path was recorded");
            return None;
        }
        self.scene.moving = false;
        let config = SinkConfig {
            path: self.config.export_path.clone(),
            codec: self.config.export_codec.clone(),
            fps: self.video.settings.frames_per_second,
            width: self.camera.width,
            height: self.camera.height,
        };
        log::info!(
            "exporting {} frames to {}",
            self.video.path.len(),
            config.path.display()
        );
        let mut progress = self.export_progress.take();
        let result = export_path(
            &self.video.path,
            &self.video.settings,
            &self.scene,
            &mut self.camera,
            &mut self.accumulator,
            self.backend.as_ref(),
            self.sink.as_mut(),
            &config,
            self.clock.as_ref(),
            |done, total| {
                if let Some(progress) = progress.as_mut() {
                    progress(done, total);
                }
            },
        );
        self.export_progress = progress;
        self.accumulator.request_reset();
        match result {
            Ok(summary) => {
                log::info!("export finished: {} frames", summary.frames);
                Some(summary)
            }
            Err(e) => {
                log::warn!("export abandoned: {}", e);
                None
            }
        }
    }
}
