//! Render composition and pipeline batching.
//!
//! Flows describe what they want drawn with a [`Render`]. The engine flattens
//! every flow's `Render` into one batch per pipeline before recording the pass:
//! opaque and alpha-masked meshes first, then blended ones.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the primary enum describing render operations
//! - [`Instanced<'a>`] contains data for instanced rendering (mesh + material + instance buffer)
//!

use crate::data_structures::model::{AlphaMode, Material, Mesh};

/// Data for instanced mesh rendering.
#[derive(Clone)]
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub mesh: &'a Mesh,
    pub material: &'a Material,
    pub amount: usize,
    pub id: u32,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `Defaults(Vec<Instanced>)` renders a batch of opaque or alpha-masked instanced meshes
/// - `Transparents(Vec<Instanced>)` renders a batch of alpha-blended meshes after the opaque ones
/// - `Composed(Vec<Render>)` recursively renders composition of multiple renders
///
pub enum Render<'a> {
    Defaults(Vec<Instanced<'a>>),
    Transparents(Vec<Instanced<'a>>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Sort draws by material: blended materials go to the transparent batch.
    pub fn split_by_alpha(draws: Vec<Instanced<'a>>) -> Self {
        let (trans, basics): (Vec<_>, Vec<_>) = draws
            .into_iter()
            .partition(|instanced| instanced.material.alpha_mode == AlphaMode::Blend);
        Render::Composed(vec![Render::Defaults(basics), Render::Transparents(trans)])
    }

    pub(crate) fn set_pipelines(self, basics: &mut Vec<Instanced<'a>>, trans: &mut Vec<Instanced<'a>>) {
        match self {
            Render::Defaults(mut vec) => basics.append(&mut vec),
            Render::Transparents(mut vec) => trans.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(basics, trans)),
        }
    }
}
