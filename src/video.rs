use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::{ImageFormat, RgbImage};

use crate::accumulation::Accumulator;
use crate::buffer::AppendBuffer;
use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::geometry::Vec3f;
use crate::rendering::{Image, SampleBackend};
use crate::scene::Scene;
use crate::utils::to_byte;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoSettings {
    pub frames_per_second: u32,
    pub seconds_per_render: f64,
}

impl Default for VideoSettings {
    fn default() -> Self {
        VideoSettings {
            frames_per_second: 20,
            seconds_per_render: 5.0,
        }
    }
}

impl VideoSettings {
    pub fn capture_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frames_per_second.max(1) as f64)
    }

    pub fn render_budget(&self) -> Duration {
        Duration::from_secs_f64(self.seconds_per_render.max(0.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSample {
    pub position: Vec3f,
    pub front: Vec3f,
    pub side: Vec3f,
}

#[derive(Debug, Default)]
pub struct CameraPath {
    positions: AppendBuffer<Vec3f>,
    fronts: AppendBuffer<Vec3f>,
    sides: AppendBuffer<Vec3f>,
}

impl CameraPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, camera: &Camera) -> Result<usize> {
        self.positions.push_value(camera.position)?;
        self.fronts.push_value(camera.front)?;
        self.sides.push_value(camera.side)
    }

    pub fn len(&self) -> usize {
        self.positions.count()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.fronts.clear();
        self.sides.clear();
    }

    pub fn get(&self, index: usize) -> Option<CameraSample> {
        Some(CameraSample {
            position: *self.positions.get(index)?,
            front: *self.fronts.get(index)?,
            side: *self.sides.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = CameraSample> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }
}

pub trait Clock {
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowOrder {
    TopDown,
    BottomUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameLayout {
    pub row_order: RowOrder,
    pub channel_order: ChannelOrder,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub layout: FrameLayout,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn from_image(image: &Image, layout: FrameLayout) -> Frame {
        let (width, height) = (image.width(), image.height());
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for row in 0..height {
            let y = match layout.row_order {
                RowOrder::TopDown => row,
                RowOrder::BottomUp => height - 1 - row,
            };
            for x in 0..width {
                let p = image.pixel(x, y);
                let (r, g, b) = (to_byte(p.x), to_byte(p.y), to_byte(p.z));
                match layout.channel_order {
                    ChannelOrder::Rgb => data.extend_from_slice(&[r, g, b]),
                    ChannelOrder::Bgr => data.extend_from_slice(&[b, g, r]),
                }
            }
        }
        Frame {
            width,
            height,
            layout,
            data,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SinkConfig {
    pub path: PathBuf,
    pub codec: String,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

pub trait VideoSink {
    fn open(&mut self, config: &SinkConfig) -> Result<()>;
    fn layout(&self) -> FrameLayout;
    fn write(&mut self, frame: &Frame) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct PngSequenceSink {
    directory: Option<PathBuf>,
    next_index: usize,
}

impl PngSequenceSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VideoSink for PngSequenceSink {
    fn open(&mut self, config: &SinkConfig) -> Result<()> {
        if !config.codec.eq_ignore_ascii_case("png") {
            return Err(Error::SinkUnavailable(format!(
                "codec {:?} is not supported by the PNG sequence writer",
                config.codec
            )));
        }
        fs::create_dir_all(&config.path).map_err(|e| {
            Error::SinkUnavailable(format!("cannot create {}: {}", config.path.display(), e))
        })?;
        log::debug!(
            "writing {}x{} frames at {} fps to {}",
            config.width,
            config.height,
            config.fps,
            config.path.display()
        );
        self.directory = Some(config.path.clone());
        self.next_index = 0;
        Ok(())
    }

    fn layout(&self) -> FrameLayout {
        FrameLayout {
            row_order: RowOrder::TopDown,
            channel_order: ChannelOrder::Rgb,
        }
    }

    fn write(&mut self, frame: &Frame) -> Result<()> {
        let directory = self
            .directory
            .as_ref()
            .ok_or_else(|| Error::SinkUnavailable("sink is not open".to_string()))?;
        let image = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| Error::SinkUnavailable("frame size does not match its data".to_string()))?;
        let path = directory.join(format!("frame_{:05}.png", self.next_index));
        image.save_with_format(&path, ImageFormat::Png)?;
        self.next_index += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.directory = None;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct VideoState {
    pub settings: VideoSettings,
    pub path: CameraPath,
    recording: bool,
    playing: bool,
    exporting: bool,
    play_index: usize,
    since_capture: Duration,
}

impl VideoState {
    pub fn new(settings: VideoSettings) -> Self {
        VideoState {
            settings,
            ..Default::default()
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn play_index(&self) -> usize {
        self.play_index
    }

    pub fn toggle_recording(&mut self) {
        self.recording = !self.recording;
        if self.recording {
            self.path.clear();
            self.since_capture = Duration::ZERO;
        }
        log::info!("recording {}", if self.recording { "started" } else { "stopped" });
    }

    pub fn toggle_playback(&mut self) {
        self.playing = !self.playing;
        self.play_index = 0;
        log::info!("playback {}", if self.playing { "started" } else { "stopped" });
    }

    pub fn toggle_export(&mut self) {
        self.exporting = !self.exporting;
    }

    pub fn finish_export(&mut self) {
        self.exporting = false;
    }

    pub fn record_tick(&mut self, elapsed: Duration, camera: &Camera) -> Result<bool> {
        self.since_capture += elapsed;
        if !self.recording || self.since_capture < self.settings.capture_interval() {
            return Ok(false);
        }
        self.since_capture = Duration::ZERO;
        let index = self.path.push(camera)?;
        log::debug!("captured camera sample {}", index);
        Ok(true)
    }

    pub fn playback_tick(&mut self, camera: &mut Camera) -> bool {
        if !self.playing || self.path.is_empty() {
            return false;
        }
        let Some(sample) = self.path.get(self.play_index) else {
            self.play_index = 0;
            return false;
        };
        camera.set_pose(sample.position, sample.front, sample.side);
        self.play_index = (self.play_index + 1) % self.path.len();
        true
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportSummary {
    pub frames: usize,
    pub passes_per_frame: Vec<u32>,
}

/// Re-renders every recorded pose until it has used the render budget and
/// hands the converged images to the sink, in recorded order.
///
/// The sink is opened with `config` first; if that fails nothing is rendered.
#[allow(clippy::too_many_arguments)]
pub fn export_path(
    path: &CameraPath,
    settings: &VideoSettings,
    scene: &Scene,
    camera: &mut Camera,
    accumulator: &mut Accumulator,
    backend: &dyn SampleBackend,
    sink: &mut dyn VideoSink,
    config: &SinkConfig,
    clock: &dyn Clock,
    mut on_frame: impl FnMut(usize, usize),
) -> Result<ExportSummary> {
    sink.open(config)?;
    let budget = settings.render_budget();
    let layout = sink.layout();
    let mut summary = ExportSummary::default();

    for (index, sample) in path.iter().enumerate() {
        camera.set_pose(sample.position, sample.front, sample.side);
        let started = clock.now();
        accumulator.reset(scene, camera, backend);
        let mut passes = 1;
        while clock.now().saturating_sub(started) < budget {
            accumulator.accumulate(scene, camera, backend);
            passes += 1;
        }

        let frame = Frame::from_image(accumulator.image(), layout);
        if let Err(e) = sink.write(&frame) {
            let _ = sink.close();
            return Err(e);
        }
        log::debug!("exported frame {} from {} passes", index, passes);
        summary.frames += 1;
        summary.passes_per_frame.push(passes);
        on_frame(index + 1, path.len());
    }

    sink.close()?;
    Ok(summary)
}
