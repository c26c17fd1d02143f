//! glbview - GLB model viewer

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::KeyCode,
    window::{Window, WindowId},
};

use glbview::core::logging;
use glbview::viewer::Viewer;

/// One composited frame from the external pixel source. Latest-wins:
/// the producer overwrites, the render thread snapshots under the lock.
#[derive(Default)]
struct PixelFrame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    stride: u32,
}

/// Playback requests queued for the render thread.
enum Command {
    Play { name: String, looping: bool },
    Stop,
}

struct App {
    model_path: PathBuf,
    window_size: (u32, u32),
    window: Option<Arc<Window>>,
    viewer: Option<Viewer>,
    feed: Arc<Mutex<PixelFrame>>,
    feed_scratch: PixelFrame,
    commands: Receiver<Command>,
    command_tx: Sender<Command>,
    playing: bool,
}

impl App {
    fn new(model_path: PathBuf, window_size: (u32, u32), feed: Arc<Mutex<PixelFrame>>) -> Self {
        let (command_tx, commands) = std::sync::mpsc::channel();
        Self {
            model_path,
            window_size,
            window: None,
            viewer: None,
            feed,
            feed_scratch: PixelFrame::default(),
            commands,
            command_tx,
            playing: false,
        }
    }

    fn drain_commands(&mut self) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::Play { name, looping } => {
                    match viewer.play(&name, looping) {
                        Ok(()) => self.playing = true,
                        Err(e) => log::error!("{e}"),
                    }
                }
                Command::Stop => {
                    viewer.stop();
                    self.playing = false;
                }
            }
        }
    }

    /// Snapshot the latest feed frame and upload it. The lock is held
    /// only for the copy into the reused scratch buffer.
    fn upload_feed(&mut self) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        {
            let feed = match self.feed.lock() {
                Ok(feed) => feed,
                Err(poisoned) => poisoned.into_inner(),
            };
            self.feed_scratch.pixels.clear();
            self.feed_scratch.pixels.extend_from_slice(&feed.pixels);
            self.feed_scratch.width = feed.width;
            self.feed_scratch.height = feed.height;
            self.feed_scratch.stride = feed.stride;
        }
        viewer.update_texture(
            &self.feed_scratch.pixels,
            self.feed_scratch.width,
            self.feed_scratch.height,
            self.feed_scratch.stride,
        );
    }

    fn tick(&mut self) {
        self.drain_commands();
        self.upload_feed();
        if let (Some(window), Some(viewer)) = (&self.window, &mut self.viewer) {
            let size = window.inner_size();
            if let Err(e) = viewer.render_frame(size.width, size.height) {
                log::error!("render failed: {e}");
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("glbview")
            .with_inner_size(PhysicalSize::new(self.window_size.0, self.window_size.1));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        let mut viewer = Viewer::new(window.clone()).expect("Failed to create GPU context");
        viewer
            .load(&self.model_path)
            .expect("Failed to load model");

        if let Some(stats) = viewer.stats() {
            log::info!(
                "{} primitives, {} skins, animations: {:?}",
                stats.mesh_count,
                stats.skin_count,
                stats.animation_names
            );
            if let Some(first) = stats.animation_names.first() {
                let _ = self.command_tx.send(Command::Play {
                    name: first.clone(),
                    looping: true,
                });
            }
        }

        self.window = Some(window);
        self.viewer = Some(viewer);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() {
                    if let winit::keyboard::PhysicalKey::Code(code) = event.physical_key {
                        match code {
                            KeyCode::Escape => event_loop.exit(),
                            KeyCode::Space => {
                                // Toggle between stopped and looping the
                                // first animation
                                let command = if self.playing {
                                    Command::Stop
                                } else {
                                    match self
                                        .viewer
                                        .as_ref()
                                        .and_then(|v| v.stats())
                                        .and_then(|s| s.animation_names.first().cloned())
                                    {
                                        Some(name) => Command::Play {
                                            name,
                                            looping: true,
                                        },
                                        None => return,
                                    }
                                };
                                let _ = self.command_tx.send(command);
                            }
                            _ => {}
                        }
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let due = match &mut self.viewer {
                    Some(viewer) => viewer.timer_mut().tick_due(),
                    None => false,
                };
                if due {
                    self.tick();

                    if let (Some(window), Some(viewer)) = (&self.window, &self.viewer) {
                        if viewer.timer().frame_count() % 60 == 0 {
                            window.set_title(&format!(
                                "glbview - {:.1} FPS | Space=play/stop",
                                viewer.timer().fps()
                            ));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(viewer) = &mut self.viewer {
            let wake = std::time::Instant::now() + viewer.timer().until_next_tick();
            event_loop.set_control_flow(ControlFlow::WaitUntil(wake));
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Generate an animated RGBA8 test pattern into the shared feed,
/// with rows padded past `width * 4` so stride handling is exercised.
fn spawn_feed_producer(feed: Arc<Mutex<PixelFrame>>) {
    std::thread::spawn(move || {
        const WIDTH: u32 = 256;
        const HEIGHT: u32 = 256;
        const STRIDE: u32 = WIDTH * 4 + 64;

        let mut buffer = vec![0u8; STRIDE as usize * HEIGHT as usize];
        let mut phase = 0u32;
        loop {
            for y in 0..HEIGHT {
                let row = &mut buffer[(y * STRIDE) as usize..][..(WIDTH * 4) as usize];
                for x in 0..WIDTH {
                    let p = &mut row[(x * 4) as usize..][..4];
                    p[0] = ((x + phase) % 256) as u8;
                    p[1] = ((y + phase) % 256) as u8;
                    p[2] = 128;
                    p[3] = 255;
                }
            }
            phase = phase.wrapping_add(2);

            {
                let mut frame = match feed.lock() {
                    Ok(frame) => frame,
                    Err(poisoned) => poisoned.into_inner(),
                };
                frame.pixels.clear();
                frame.pixels.extend_from_slice(&buffer);
                frame.width = WIDTH;
                frame.height = HEIGHT;
                frame.stride = STRIDE;
            }
            std::thread::sleep(Duration::from_millis(33));
        }
    });
}

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(model_path) = parse_model_arg(&args) else {
        eprintln!("usage: glbview --model <path.glb>");
        std::process::exit(2);
    };
    let width = parse_u32_arg(&args, "--width").unwrap_or(800);
    let height = parse_u32_arg(&args, "--height").unwrap_or(600);
    log::info!("glbview starting, model: {}", model_path.display());

    let feed = Arc::new(Mutex::new(PixelFrame::default()));
    spawn_feed_producer(feed.clone());

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = App::new(model_path, (width, height), feed);
    event_loop.run_app(&mut app).expect("Event loop error");
}

/// Parse --model argument from command line
fn parse_model_arg(args: &[String]) -> Option<PathBuf> {
    for i in 0..args.len() {
        if (args[i] == "--model" || args[i] == "-m") && i + 1 < args.len() {
            return Some(PathBuf::from(&args[i + 1]));
        }
    }
    None
}

/// Parse a numeric argument like --width or --height
fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    for i in 0..args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}
