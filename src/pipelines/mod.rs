//! Render pipelines and their bind group layouts.
//!
//! - `basic` is the lit, textured mesh pipeline every slot is drawn with
//! - `transparent` draws alpha-blended materials with the same shader
//! - `light` holds the ambient + directional light uniform

pub mod basic;
pub mod light;
pub mod transparent;

/// Pipelines created once per [`Context`](crate::context::Context).
#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub transparent: wgpu::RenderPipeline,
    pub material_layout: wgpu::BindGroupLayout,
}
