use std::error::Error;
use std::fmt::Display;
use std::path::PathBuf;

use anyhow::Context;
use sdl2::event::{Event, WindowEvent};
use sdl2::video::{GLContext, GLProfile, Window};
use sdl2::EventPump;

mod camera;
mod config;
mod error;
mod input;
mod renderer;

use camera::{Camera, CameraController};
use config::Config;
use input::InputState;
use renderer::Renderer;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            Config::load(&path).with_context(|| format!("reading {}", path.display()))?
        }
        None => Config::default(),
    };

    let sdl_context = sdl2::init().map_err(SdlErr)?;
    let video_subsystem = sdl_context.video().map_err(SdlErr)?;
    let gl_attr = video_subsystem.gl_attr();
    gl_attr.set_context_profile(GLProfile::Core);
    gl_attr.set_context_version(4, 6);
    let window = video_subsystem
        .window(
            &config.window.title,
            config.window.width,
            config.window.height,
        )
        .resizable()
        .opengl()
        .build()?;
    let gl_context = window.gl_create_context().map_err(SdlErr)?;
    let event_pump = sdl_context.event_pump().map_err(SdlErr)?;

    let resource_dir = match &config.resource_dir {
        Some(dir) => dir.clone(),
        None => PathBuf::from(sdl2::filesystem::base_path().map_err(SdlErr)?),
    };
    log::info!("Loading resources from {}", resource_dir.display());
    let renderer = Renderer::new(&video_subsystem, &window, &config, &resource_dir)
        .context("setting up the renderer")?;

    let mut camera = Camera::new(config.camera.position, config.camera.target);
    camera.fov_y_degrees = config.camera.fov_degrees;
    camera.near = config.camera.near;
    camera.far = config.camera.far;
    let mut state = State {
        renderer,
        _gl_context: gl_context,
        window,
        event_pump,
        input: InputState::new(),
        camera,
        camera_controller: CameraController {
            move_speed: config.camera.move_speed,
            mouse_sensitivity: config.camera.mouse_sensitivity,
        },
    };

    while run_frame(&mut state) {}
    Ok(())
}

// The renderer is declared first so it is dropped while the GL context is
// still alive.
struct State {
    renderer: Renderer,
    _gl_context: GLContext,
    window: Window,
    event_pump: EventPump,
    input: InputState,
    camera: Camera,
    camera_controller: CameraController,
}

/// Polls events, updates the camera and draws. Returns false once the
/// window has been closed.
fn run_frame(state: &mut State) -> bool {
    let State {
        renderer,
        window,
        event_pump,
        input,
        camera,
        camera_controller,
        ..
    } = state;

    for event in event_pump.poll_iter() {
        match event {
            Event::Quit { .. } => return false,
            Event::Window {
                win_event: WindowEvent::SizeChanged(..),
                ..
            } => {
                let (w, h) = window.drawable_size();
                renderer.resize(w as i32, h as i32);
            }
            event => input.handle_event(&event),
        }
    }

    camera_controller.update(camera, input);
    input.end_frame();

    renderer.render(camera);
    window.gl_swap_window();
    true
}

#[derive(Debug)]
pub struct SdlErr(String);
impl Display for SdlErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sdl error: {}", self.0)
    }
}
impl Error for SdlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
