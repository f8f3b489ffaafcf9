use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use progressive_tracer::accumulation::Accumulator;
use progressive_tracer::app::{App, AppConfig};
use progressive_tracer::camera::{Camera, CameraSettings, MAX_RESOLUTION_EXP};
use progressive_tracer::input::{Action, InputFrame};
use progressive_tracer::rendering::CpuBackend;
use progressive_tracer::scene::Scene;
use progressive_tracer::scene_file::{demo_scene, load_scene, SceneDescription};
use progressive_tracer::video::{PngSequenceSink, SystemClock, VideoSettings, VideoState};

#[derive(Parser, Debug)]
#[command(about = "Progressive path tracer with camera path export")]
struct Args {
    /// Scene description file; the built-in demo scene when omitted
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Image width is 2^width_exp
    #[arg(
        long,
        default_value_t = 9,
        value_parser = clap::value_parser!(u32).range(0..=MAX_RESOLUTION_EXP as i64)
    )]
    width_exp: u32,

    /// Image height is 2^height_exp
    #[arg(
        long,
        default_value_t = 9,
        value_parser = clap::value_parser!(u32).range(0..=MAX_RESOLUTION_EXP as i64)
    )]
    height_exp: u32,

    #[arg(long)]
    max_bounce: Option<u32>,

    /// Add the sky gradient to paths that leave the scene
    #[arg(long)]
    sky: bool,

    /// Worker threads, all cores by default
    #[arg(long)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Accumulate from the scene camera and save a PNG of the converged image
    Still {
        #[arg(long, default_value_t = 64)]
        frames: u32,

        /// Accumulate for this many seconds instead of a fixed frame count
        #[arg(long)]
        seconds: Option<f64>,

        #[arg(long, default_value = "render.png")]
        output: PathBuf,
    },
    /// Record an orbiting camera path and export it as a converged image sequence
    Flythrough {
        /// Recorded ticks of camera motion
        #[arg(long, default_value_t = 40)]
        ticks: u32,

        #[arg(long, default_value_t = 20)]
        fps: u32,

        #[arg(long, default_value_t = 5.0)]
        seconds_per_render: f64,

        /// Degrees of yaw per recorded tick
        #[arg(long, default_value_t = 2.0)]
        turn: f32,

        #[arg(long, default_value = "video")]
        output: PathBuf,

        #[arg(long, default_value = "png")]
        codec: String,
    },
}

fn progress_bar(len: u64, unit: &str) -> ProgressBar {
    let progress = ProgressBar::new(len);
    progress.set_style(
        ProgressStyle::with_template(&format!(
            "[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} {}",
            unit
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress
}

fn render_still(
    scene: &Scene,
    camera: &Camera,
    frames: u32,
    seconds: Option<f64>,
    output: &Path,
) -> Result<()> {
    let backend = CpuBackend;
    let mut accumulator = Accumulator::new(camera.width, camera.height);
    accumulator.reset(scene, camera, &backend);
    match seconds {
        Some(seconds) => {
            let budget = Duration::from_secs_f64(seconds.max(0.0));
            let progress = ProgressBar::new_spinner();
            let started = Instant::now();
            while started.elapsed() < budget {
                accumulator.accumulate(scene, camera, &backend);
                progress.set_message(format!("{} frames", accumulator.frame_counter() - 1));
                progress.tick();
            }
            progress.finish_and_clear();
        }
        None => {
            let progress = progress_bar(frames as u64, "frames");
            for _ in 0..frames {
                accumulator.accumulate(scene, camera, &backend);
                progress.inc(1);
            }
            progress.finish_and_clear();
        }
    }
    accumulator
        .image()
        .save_png(output)
        .with_context(|| format!("saving {}", output.display()))?;
    log::info!(
        "saved {} after {} sample passes",
        output.display(),
        accumulator.frame_counter()
    );
    Ok(())
}

fn tap(app: &mut App, action: Action, elapsed: Duration) -> Result<()> {
    app.tick(&InputFrame::new().press(action), elapsed)?;
    app.tick(&InputFrame::new(), elapsed)?;
    Ok(())
}

fn run_flythrough(mut app: App, ticks: u32, turn: f32) -> Result<()> {
    let interval = app.video.settings.capture_interval();
    let progress = progress_bar(0, "exported");
    let bar = progress.clone();
    app.set_export_progress(Box::new(move |done, total| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
    }));

    tap(&mut app, Action::ToggleMotion, interval)?;
    tap(&mut app, Action::ToggleRecording, interval)?;
    let sensitivity = app.config.mouse_sensitivity;
    for _ in 0..ticks {
        let frame = InputFrame::new()
            .press(Action::Right)
            .with_mouse(-turn / sensitivity, 0.0);
        app.tick(&frame, interval)?;
    }
    tap(&mut app, Action::ToggleRecording, interval)?;
    tap(&mut app, Action::ToggleMotion, interval)?;
    log::info!("recorded {} camera samples", app.video.path.len());

    app.tick(&InputFrame::new().press(Action::ToggleExport), interval)?;
    let report = app.tick(&InputFrame::new(), interval)?;
    progress.finish_and_clear();
    match report.export {
        Some(summary) => log::info!("wrote {} frames", summary.frames),
        None => anyhow::bail!("export did not produce any frames"),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring the worker pool")?;
    }

    let SceneDescription {
        mut scene,
        camera: camera_settings,
    } = match &args.scene {
        Some(path) => load_scene(path).with_context(|| format!("loading {}", path.display()))?,
        None => demo_scene().context("building the demo scene")?,
    };
    if let Some(max_bounce) = args.max_bounce {
        scene.settings.max_bounce = max_bounce;
    }
    scene.settings.sky |= args.sky;
    let camera = Camera::new(&CameraSettings {
        width_exp: args.width_exp,
        height_exp: args.height_exp,
        ..camera_settings
    });
    log::info!(
        "{} spheres, {} meshes, {} triangles, {}x{} pixels",
        scene.spheres().len(),
        scene.meshes().len(),
        scene.triangles().len(),
        camera.width,
        camera.height
    );

    match args.command {
        Command::Still {
            frames,
            seconds,
            output,
        } => render_still(&scene, &camera, frames, seconds, &output),
        Command::Flythrough {
            ticks,
            fps,
            seconds_per_render,
            turn,
            output,
            codec,
        } => {
            let video = VideoState::new(VideoSettings {
                frames_per_second: fps,
                seconds_per_render,
            });
            let config = AppConfig {
                export_path: output,
                export_codec: codec,
                ..AppConfig::default()
            };
            let app = App::new(
                scene,
                camera,
                video,
                config,
                Box::new(CpuBackend),
                Box::new(PngSequenceSink::new()),
                Box::new(SystemClock::default()),
            );
            run_flythrough(app, ticks, turn)
        }
    }
}
