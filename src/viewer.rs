//! High-level viewer facade
//!
//! Ties the loader, animation player and renderer together behind one
//! handle. A `Viewer` is bound to a window at creation; a model is
//! loaded into it afterwards and can be replaced at any time, which
//! drops every GPU resource of the previous model.

use std::path::Path;
use std::sync::Arc;

use winit::window::Window;

use crate::animation::Player;
use crate::core::error::Error;
use crate::core::time::TickTimer;
use crate::document::Document;
use crate::render::{FrameRenderer, GpuContext};

/// Counts reported for diagnostics and logging.
#[derive(Clone, Debug)]
pub struct ViewerStats {
    pub mesh_count: usize,
    pub skin_count: usize,
    pub animation_names: Vec<String>,
}

struct LoadedModel {
    document: Document,
    renderer: FrameRenderer,
    player: Player,
    rotation: f32,
}

pub struct Viewer {
    gpu: GpuContext,
    timer: TickTimer,
    model: Option<LoadedModel>,
}

impl Viewer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let gpu = pollster::block_on(GpuContext::new(window))?;
        Ok(Self {
            gpu,
            timer: TickTimer::new(),
            model: None,
        })
    }

    /// Load a GLB file, replacing any previously loaded model.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let document = Document::from_file(path.as_ref())?;
        let renderer = FrameRenderer::new(
            &self.gpu.device,
            &self.gpu.queue,
            self.gpu.format(),
            &document,
            self.gpu.size(),
        );
        log::info!(
            "loaded {}: {} nodes, {} skins, animations {:?}",
            path.as_ref().display(),
            document.nodes.len(),
            document.skins.len(),
            document.animation_names(),
        );
        self.model = Some(LoadedModel {
            document,
            renderer,
            player: Player::new(),
            rotation: 0.0,
        });
        Ok(())
    }

    /// Start playback of a named animation.
    pub fn play(&mut self, name: &str, looping: bool) -> Result<(), Error> {
        let now = self.timer.now();
        match &mut self.model {
            Some(model) => model.player.play(&model.document, name, looping, now),
            None => Err(Error::Format("no model loaded".into())),
        }
    }

    /// Stop playback, returning the model to its base pose.
    pub fn stop(&mut self) {
        if let Some(model) = &mut self.model {
            model.player.stop();
        }
    }

    /// Feed one externally composited RGBA8 pixel buffer into the
    /// model's texture. Empty or inconsistent buffers leave it alone.
    pub fn update_texture(&mut self, pixels: &[u8], width: u32, height: u32, stride: u32) {
        if let Some(model) = &mut self.model {
            model
                .renderer
                .update_feed(&self.gpu.device, &self.gpu.queue, pixels, width, height, stride);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    pub fn timer(&self) -> &TickTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut TickTimer {
        &mut self.timer
    }

    /// Advance one tick and draw it at the given viewport size: sample
    /// the current pose, spin the model a little, render into the
    /// surface and present. The surface is reconfigured first if the
    /// viewport changed.
    pub fn render_frame(&mut self, viewport_width: u32, viewport_height: u32) -> Result<(), Error> {
        self.gpu.resize(viewport_width, viewport_height);
        let Some(model) = &mut self.model else {
            return Ok(());
        };

        let now = self.timer.now();
        let pose = model.player.current_pose(&model.document, now);
        model.rotation += 0.01;

        let frame = self.gpu.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        model.renderer.render(
            &self.gpu.device,
            &self.gpu.queue,
            &view,
            self.gpu.size(),
            &model.document,
            &pose,
            model.rotation,
        );
        frame.present();
        Ok(())
    }

    pub fn stats(&self) -> Option<ViewerStats> {
        self.model.as_ref().map(|model| ViewerStats {
            mesh_count: model.renderer.mesh_count(),
            skin_count: model.document.skins.len(),
            animation_names: model.document.animation_names(),
        })
    }
}
