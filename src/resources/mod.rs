//! Loading meshes and textures from external files.
//!
//! Loading is split in two: [`load_model`] fetches and decodes on any thread,
//! [`upload_model`] turns the result into GPU resources on the render thread.

use wgpu::util::DeviceExt;

use crate::{
    context::InitContext,
    data_structures::{
        model::{self, AlphaMode, Material, Mesh},
        scene_graph::ModelNode,
        texture::Texture,
    },
};

pub mod decode;
pub mod draco;
pub mod fetch;

pub use decode::{DecodedMaterial, DecodedMesh, DecodedModel, decode_model, load_model};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const DEFAULT_BASE_COLOUR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Create buffers, textures and bind groups for a decoded model.
///
/// Meshes without a material use a plain white material appended after the
/// model's own materials.
pub fn upload_model(
    id: u32,
    ctx: &InitContext,
    decoded: DecodedModel,
    label: &str,
) -> anyhow::Result<ModelNode> {
    let DecodedModel {
        meshes,
        materials,
        images,
        bounds,
    } = decoded;
    let device = &ctx.device;

    let textures = images
        .iter()
        .enumerate()
        .map(|(i, img)| {
            Texture::from_rgba(
                device,
                &ctx.queue,
                img,
                Some(&format!("{label} image {i}")),
                ctx.texture_options,
            )
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let white = Texture::solid(device, &ctx.queue, WHITE, &format!("{label} white"))?;

    let mut gpu_materials = materials
        .iter()
        .map(|material| {
            let texture = material
                .base_colour_image
                .and_then(|i| textures.get(i))
                .unwrap_or(&white)
                .clone();
            Material::new(
                device,
                &format!("{label}/{}", material.name),
                texture,
                material.base_colour,
                material.alpha_mode,
                &ctx.material_layout,
            )
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let default_material = gpu_materials.len();
    gpu_materials.push(Material::new(
        device,
        &format!("{label}/default"),
        white,
        DEFAULT_BASE_COLOUR,
        AlphaMode::Opaque,
        &ctx.material_layout,
    )?);

    let mut mesh_transforms = Vec::with_capacity(meshes.len());
    let gpu_meshes = meshes
        .into_iter()
        .map(|mesh| {
            mesh_transforms.push(mesh.transform);
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} {} Vertex Buffer", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} {} Index Buffer", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            let material = mesh
                .material
                .filter(|&i| i < default_material)
                .unwrap_or(default_material);
            Mesh {
                name: mesh.name,
                vertex_buffer,
                index_buffer,
                num_elements: mesh.indices.len() as u32,
                material,
            }
        })
        .collect();

    let model = model::Model {
        meshes: gpu_meshes,
        materials: gpu_materials,
    };
    Ok(ModelNode::new(id, device, model, mesh_transforms, bounds))
}
