//! The cursor-reactive model row.
//!
//! [`Showcase`] requests every configured asset at start-up. Each one appears
//! as soon as its own load finishes, at the x position given by its place in
//! the request list, and from then on tilts toward the cursor.

pub mod animator;
pub mod cursor;
pub mod gallery;
pub mod layout;
pub mod viewport;

use std::pin::Pin;

use cgmath::Deg;
use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    camera::Camera,
    config::ShowcaseConfig,
    context::{Context, InitContext},
    data_structures::scene_graph::{ContainerNode, SceneNode},
    flow::{EventFuture, FlowConstructor, GraphicsFlow, Out},
    pipelines::light::LightUniform,
    render::Render,
    resources::{self, DecodedModel},
};

use self::{cursor::Cursor, gallery::Gallery, viewport::Viewport};

/// Result of one asset load, tagged with its request index.
#[derive(Debug)]
pub enum ShowcaseEvent {
    Loaded {
        request_index: usize,
        url: String,
        result: anyhow::Result<DecodedModel>,
    },
}

/// State shared between the hooks of the showcase.
#[derive(Debug, Default)]
pub struct ShowcaseState {
    pub cursor: Cursor,
}

pub struct Showcase {
    config: ShowcaseConfig,
    init: InitContext,
    gallery: Gallery<ContainerNode>,
}

impl Showcase {
    pub fn new(config: ShowcaseConfig, init: InitContext) -> Self {
        let gallery = Gallery::new(config.assets.len(), config.spacing, config.gap_after_first);
        Self {
            config,
            init,
            gallery,
        }
    }

    /// Constructor to hand to [`flow::run`](crate::flow::run).
    pub fn constructor(config: ShowcaseConfig) -> FlowConstructor<ShowcaseState, ShowcaseEvent> {
        Box::new(move |init: InitContext| {
            let fut: Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn GraphicsFlow<ShowcaseState, ShowcaseEvent>>>>>> =
                Box::pin(async move {
                    let flow: Box<dyn GraphicsFlow<ShowcaseState, ShowcaseEvent>> =
                        Box::new(Showcase::new(config, init));
                    Ok(flow)
                });
            fut
        })
    }

    fn apply_config(&self, ctx: &mut Context) {
        let camera = &self.config.camera;
        // Yaw -90° looks down -Z.
        ctx.camera.camera = Camera::new(camera.position, Deg(-90.0), Deg(0.0));
        ctx.projection.set_fovy(Deg(camera.fovy_degrees));
        ctx.projection.set_clip_planes(camera.znear, camera.zfar);
        ctx.clear_colour = self.config.clear_colour;
        ctx.light.uniform = LightUniform::from_config(&self.config.lighting);
        ctx.write_uniforms();
    }

    fn requests(&self) -> Vec<EventFuture<ShowcaseEvent>> {
        self.config
            .assets
            .iter()
            .cloned()
            .enumerate()
            .map(|(request_index, url)| {
                let fut: EventFuture<ShowcaseEvent> = Box::pin(async move {
                    let result = resources::load_model(&url).await;
                    ShowcaseEvent::Loaded {
                        request_index,
                        url,
                        result,
                    }
                });
                fut
            })
            .collect()
    }

    fn add_slot(&mut self, request_index: usize, url: &str, decoded: DecodedModel) -> anyhow::Result<()> {
        let mut model = resources::upload_model(request_index as u32, &self.init, decoded, url)?;
        model.recenter();

        let slot = self.gallery.push_container(request_index);
        slot.content.add_child(Box::new(model));
        let position_x = slot.position_x;
        log::info!(
            "Loaded {url} (request {request_index}) at x = {position_x}, {}/{} shown",
            self.gallery.len(),
            self.gallery.requested()
        );
        Ok(())
    }
}

impl GraphicsFlow<ShowcaseState, ShowcaseEvent> for Showcase {
    fn on_init(&mut self, ctx: &mut Context, _state: &mut ShowcaseState) -> Out<ShowcaseEvent> {
        self.apply_config(ctx);
        log::info!("Requesting {} assets", self.config.assets.len());
        Out::FutEvent(self.requests())
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        state: &mut ShowcaseState,
        _dt: Duration,
    ) -> Out<ShowcaseEvent> {
        let viewport = Viewport::from_config(&ctx.config);
        if viewport.is_empty() || self.gallery.is_empty() {
            return Out::Empty;
        }
        self.gallery.animate(
            &ctx.camera.camera,
            &ctx.projection,
            &state.cursor,
            &viewport,
            &self.config.tilt,
        );
        for slot in self.gallery.iter_mut() {
            slot.content.write_to_buffers(&ctx.queue);
        }
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        ctx: &Context,
        state: &mut ShowcaseState,
        event: &WindowEvent,
    ) -> Out<ShowcaseEvent> {
        if let WindowEvent::CursorMoved { position, .. } = event {
            state
                .cursor
                .track(*position, &Viewport::from_config(&ctx.config));
        }
        Out::Empty
    }

    fn on_custom_events(
        &mut self,
        _ctx: &Context,
        _state: &mut ShowcaseState,
        event: ShowcaseEvent,
    ) -> Option<ShowcaseEvent> {
        match event {
            ShowcaseEvent::Loaded {
                request_index,
                url,
                result,
            } => {
                if let Err(e) = result.and_then(|decoded| self.add_slot(request_index, &url, decoded)) {
                    log::error!("Error loading {url}: {e:#}");
                }
            }
        }
        None
    }

    fn on_render(&self) -> Render<'_> {
        Render::Composed(
            self.gallery
                .iter()
                .map(|slot| (&slot.content as &dyn SceneNode).into())
                .collect(),
        )
    }
}
