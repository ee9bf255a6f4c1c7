//! glTF / GLB decoding into CPU-side geometry.
//!
//! Decoding never touches the GPU so that it can run on a worker thread. The
//! result is uploaded later by [`upload_model`](super::upload_model).

use std::collections::{BTreeSet, HashMap};

use anyhow::{Context as _, bail};
use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Transform, Vector3};
use image::RgbaImage;

use crate::{
    data_structures::{
        bounds::Aabb,
        model::{AlphaMode, ModelVertex},
    },
    resources::{
        draco::{self, DRACO_EXTENSION},
        fetch::{load_binary, resolve_relative},
    },
};

/// A decoded asset: geometry in model space, materials and their images.
#[derive(Debug, Default)]
pub struct DecodedModel {
    pub meshes: Vec<DecodedMesh>,
    pub materials: Vec<DecodedMaterial>,
    pub images: Vec<RgbaImage>,
    /// Covers every vertex after its node transform.
    pub bounds: Aabb,
}

#[derive(Debug)]
pub struct DecodedMesh {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// Index into [`DecodedModel::materials`]; `None` uses the default material.
    pub material: Option<usize>,
    /// Product of the node transforms from the scene root down to this mesh.
    pub transform: Matrix4<f32>,
}

#[derive(Debug, Clone)]
pub struct DecodedMaterial {
    pub name: String,
    pub base_colour: [f32; 4],
    /// Index into [`DecodedModel::images`].
    pub base_colour_image: Option<usize>,
    pub alpha_mode: AlphaMode,
}

/// Raw per-vertex data of one primitive, read from accessors or from a
/// Draco stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeStreams {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    /// `None` draws the vertices in order.
    pub indices: Option<Vec<u32>>,
}

enum BufferSource {
    Bin,
    Uri(String),
}

enum ImageSource {
    View {
        buffer: usize,
        offset: usize,
        length: usize,
        mime_type: String,
    },
    Uri {
        uri: String,
        mime_type: Option<String>,
    },
}

/// Fetch and decode the asset at `location`.
pub async fn load_model(location: &str) -> anyhow::Result<DecodedModel> {
    let bytes = load_binary(location).await?;
    decode_model(location, &bytes).await
}

/// Decode GLB or glTF JSON bytes. External buffers and images are fetched
/// relative to `location`.
pub async fn decode_model(location: &str, bytes: &[u8]) -> anyhow::Result<DecodedModel> {
    let gltf = parse(bytes)?;

    let buffer_sources: Vec<BufferSource> = gltf
        .buffers()
        .map(|buffer| match buffer.source() {
            gltf::buffer::Source::Bin => BufferSource::Bin,
            gltf::buffer::Source::Uri(uri) => BufferSource::Uri(uri.to_string()),
        })
        .collect();
    let mut buffers: Vec<Vec<u8>> = Vec::with_capacity(buffer_sources.len());
    for source in buffer_sources {
        match source {
            BufferSource::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .context("buffer refers to a missing GLB binary chunk")?;
                buffers.push(blob.to_vec());
            }
            BufferSource::Uri(uri) => {
                let resolved = resolve_relative(location, &uri)?;
                let bin = load_binary(&resolved)
                    .await
                    .with_context(|| format!("cannot load buffer {uri}"))?;
                buffers.push(bin);
            }
        }
    }

    // Only base colour maps are sampled, so only those images are decoded.
    let wanted: BTreeSet<usize> = gltf
        .materials()
        .filter_map(|material| {
            material
                .pbr_metallic_roughness()
                .base_color_texture()
                .map(|info| info.texture().source().index())
        })
        .collect();
    let image_sources: Vec<(usize, ImageSource)> = gltf
        .images()
        .filter(|image| wanted.contains(&image.index()))
        .map(|image| {
            let source = match image.source() {
                gltf::image::Source::View { view, mime_type } => ImageSource::View {
                    buffer: view.buffer().index(),
                    offset: view.offset(),
                    length: view.length(),
                    mime_type: mime_type.to_string(),
                },
                gltf::image::Source::Uri { uri, mime_type } => ImageSource::Uri {
                    uri: uri.to_string(),
                    mime_type: mime_type.map(str::to_string),
                },
            };
            (image.index(), source)
        })
        .collect();

    let mut images = Vec::with_capacity(image_sources.len());
    let mut image_slots: HashMap<usize, usize> = HashMap::new();
    for (index, source) in image_sources {
        let decoded = match source {
            ImageSource::View {
                buffer,
                offset,
                length,
                mime_type,
            } => {
                let bytes = offset
                    .checked_add(length)
                    .and_then(|end| buffers.get(buffer)?.get(offset..end))
                    .with_context(|| format!("image {index} points outside its buffer"))?;
                decode_image(bytes, Some(&mime_type))
            }
            ImageSource::Uri { uri, mime_type } => {
                let resolved = resolve_relative(location, &uri)?;
                let bytes = load_binary(&resolved)
                    .await
                    .with_context(|| format!("cannot load image {uri}"))?;
                decode_image(&bytes, mime_type.as_deref())
            }
        }
        .with_context(|| format!("cannot decode image {index}"))?;
        image_slots.insert(index, images.len());
        images.push(decoded);
    }

    let materials = gltf
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            DecodedMaterial {
                name: material
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("material {}", material.index().unwrap_or(0))),
                base_colour: pbr.base_color_factor(),
                base_colour_image: pbr
                    .base_color_texture()
                    .and_then(|info| image_slots.get(&info.texture().source().index()))
                    .copied(),
                alpha_mode: alpha_mode(&material),
            }
        })
        .collect();

    // Compressed primitives are decoded up front so the node walk stays synchronous.
    let mut compressed: HashMap<(usize, usize), AttributeStreams> = HashMap::new();
    for mesh in gltf.meshes() {
        for primitive in mesh.primitives().filter(draco::is_compressed) {
            let streams = draco::decode_primitive(&gltf, &primitive, &buffers)
                .await
                .with_context(|| {
                    format!("cannot decode primitive {} of mesh {}", primitive.index(), mesh.index())
                })?;
            compressed.insert((mesh.index(), primitive.index()), streams);
        }
    }

    let mut model = DecodedModel {
        materials,
        images,
        ..Default::default()
    };
    let Some(scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) else {
        log::warn!("{location} contains no scene");
        return Ok(model);
    };
    let sources = Sources {
        buffers: &buffers,
        compressed,
    };
    for node in scene.nodes() {
        visit_node(&node, &Matrix4::identity(), &sources, &mut model);
    }
    Ok(model)
}

fn parse(bytes: &[u8]) -> anyhow::Result<gltf::Gltf> {
    match gltf::Gltf::from_slice(bytes) {
        Ok(gltf) => Ok(gltf),
        // Validation refuses every required extension it does not implement itself.
        Err(gltf::Error::Validation(errors))
            if errors
                .iter()
                .all(|(path, _)| path.as_str().starts_with("extensionsRequired")) =>
        {
            let gltf = gltf::Gltf::from_slice_without_validation(bytes)
                .context("not a valid glTF or GLB file")?;
            if let Some(ext) = gltf.extensions_required().find(|ext| *ext != DRACO_EXTENSION) {
                bail!("required extension {ext} is not supported");
            }
            Ok(gltf)
        }
        Err(err) => Err(err).context("not a valid glTF or GLB file"),
    }
}

fn alpha_mode(material: &gltf::Material) -> AlphaMode {
    match material.alpha_mode() {
        gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
        gltf::material::AlphaMode::Mask => AlphaMode::Mask {
            cutoff: material.alpha_cutoff().unwrap_or(0.5),
        },
        gltf::material::AlphaMode::Blend => AlphaMode::Blend,
    }
}

fn decode_image(bytes: &[u8], mime_type: Option<&str>) -> anyhow::Result<RgbaImage> {
    let img = match mime_type.and_then(image::ImageFormat::from_mime_type) {
        Some(format) => image::load_from_memory_with_format(bytes, format)?,
        None => image::load_from_memory(bytes)?,
    };
    Ok(img.to_rgba8())
}

/// Where primitive data comes from while walking the node tree.
struct Sources<'a> {
    buffers: &'a [Vec<u8>],
    /// Draco primitives keyed by (mesh index, primitive index).
    compressed: HashMap<(usize, usize), AttributeStreams>,
}

impl Sources<'_> {
    fn streams(&self, mesh: &gltf::Mesh, primitive: &gltf::Primitive) -> Option<AttributeStreams> {
        if draco::is_compressed(primitive) {
            // A mesh placed by several nodes is decoded once.
            let key = (mesh.index(), primitive.index());
            return self.compressed.get(&key).cloned();
        }
        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        Some(AttributeStreams {
            positions: reader.read_positions()?.collect(),
            normals: reader.read_normals().map(Iterator::collect),
            tex_coords: reader.read_tex_coords(0).map(|uv| uv.into_f32().collect()),
            indices: reader.read_indices().map(|indices| indices.into_u32().collect()),
        })
    }
}

fn visit_node(
    node: &gltf::Node,
    parent: &Matrix4<f32>,
    sources: &Sources,
    model: &mut DecodedModel,
) {
    let world = *parent * Matrix4::from(node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or("unnamed_mesh");
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "skipping {:?} primitive {} of mesh {}: only triangle lists are drawn",
                    primitive.mode(),
                    primitive.index(),
                    mesh_name
                );
                continue;
            }
            let Some(streams) = sources.streams(&mesh, &primitive) else {
                log::warn!("skipping primitive {} of mesh {mesh_name}: no positions", primitive.index());
                continue;
            };
            let name = format!("{mesh_name}#{}", primitive.index());
            let Some(decoded) = build_mesh(name, streams, primitive.material().index(), world) else {
                continue;
            };
            decoded
                .vertices
                .iter()
                .for_each(|v| model.bounds.extend(world.transform_point(Point3::from(v.position))));
            model.meshes.push(decoded);
        }
    }
    for child in node.children() {
        visit_node(&child, &world, sources, model);
    }
}

/// Interleave attribute streams into vertices. Missing normals are computed
/// from the triangles.
fn build_mesh(
    name: String,
    streams: AttributeStreams,
    material: Option<usize>,
    transform: Matrix4<f32>,
) -> Option<DecodedMesh> {
    let mut vertices: Vec<ModelVertex> = streams
        .positions
        .into_iter()
        .map(|position| ModelVertex {
            position,
            tex_coords: [0.0; 2],
            normal: [0.0; 3],
        })
        .collect();
    if vertices.is_empty() {
        log::warn!("skipping {name}: no vertices");
        return None;
    }

    let has_normals = match streams.normals {
        Some(normals) => {
            vertices
                .iter_mut()
                .zip(normals)
                .for_each(|(vertex, normal)| vertex.normal = normal);
            true
        }
        None => false,
    };
    if let Some(tex_coords) = streams.tex_coords {
        vertices
            .iter_mut()
            .zip(tex_coords)
            .for_each(|(vertex, uv)| vertex.tex_coords = uv);
    }

    let indices = streams
        .indices
        .unwrap_or_else(|| (0..vertices.len() as u32).collect());
    if indices.iter().any(|&i| i as usize >= vertices.len()) {
        log::warn!("skipping {name}: index out of range");
        return None;
    }
    if !has_normals {
        compute_normals(&mut vertices, &indices);
    }

    Some(DecodedMesh {
        name,
        vertices,
        indices,
        material,
        transform,
    })
}

/// Area-weighted vertex normals for primitives that ship without them.
pub fn compute_normals(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut sums = vec![Vector3::new(0.0_f32, 0.0, 0.0); vertices.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let pa: Vector3<f32> = vertices[a].position.into();
        let pb: Vector3<f32> = vertices[b].position.into();
        let pc: Vector3<f32> = vertices[c].position.into();
        let face = (pb - pa).cross(pc - pa);
        sums[a] += face;
        sums[b] += face;
        sums[c] += face;
    }
    for (vertex, sum) in vertices.iter_mut().zip(sums) {
        if sum.magnitude2() > 0.0 {
            vertex.normal = sum.normalize().into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(position: [f32; 3]) -> ModelVertex {
        ModelVertex {
            position,
            tex_coords: [0.0; 2],
            normal: [0.0; 3],
        }
    }

    #[test]
    fn computed_normals_face_counter_clockwise_side() {
        let mut vertices = vec![
            vertex([0.0, 0.0, 0.0]),
            vertex([1.0, 0.0, 0.0]),
            vertex([0.0, 1.0, 0.0]),
        ];
        compute_normals(&mut vertices, &[0, 1, 2]);
        for v in &vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn degenerate_triangles_leave_normals_untouched() {
        let mut vertices = vec![vertex([0.0; 3]), vertex([0.0; 3]), vertex([0.0; 3])];
        compute_normals(&mut vertices, &[0, 1, 2]);
        assert!(vertices.iter().all(|v| v.normal == [0.0; 3]));
    }

    #[test]
    fn garbage_is_not_a_model() {
        let result = futures::executor::block_on(decode_model("junk.glb", b"definitely not gltf"));
        assert!(result.is_err());
    }
}
