//! Geometry stored with `KHR_draco_mesh_compression`.
//!
//! The decoder writes one flat little-endian stream: the indices first (u16
//! while they fit, u32 otherwise), then each requested attribute in the order
//! of its Draco attribute id.

use anyhow::{Context as _, bail};
use draco_decoder::{AttributeDataType, MeshDecodeConfig, decode_mesh};
use gltf::{accessor::DataType, mesh::Semantic};

use crate::resources::decode::AttributeStreams;

pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Attributes the renderer reads from a compressed primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Position,
    Normal,
    TexCoord,
}

/// Shape of one attribute inside the decoded stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamLayout {
    pub stream: Stream,
    pub components: usize,
    pub data_type: DataType,
}

pub fn is_compressed(primitive: &gltf::Primitive) -> bool {
    primitive.extension_value(DRACO_EXTENSION).is_some()
}

/// Decode a compressed primitive. `buffers` holds the resolved glTF buffers.
pub async fn decode_primitive(
    document: &gltf::Document,
    primitive: &gltf::Primitive<'_>,
    buffers: &[Vec<u8>],
) -> anyhow::Result<AttributeStreams> {
    let extension = primitive
        .extension_value(DRACO_EXTENSION)
        .context("primitive is not Draco compressed")?;
    let view_index = extension
        .get("bufferView")
        .and_then(|v| v.as_u64())
        .context("Draco extension has no bufferView")? as usize;
    let attribute_ids = extension
        .get("attributes")
        .and_then(|v| v.as_object())
        .context("Draco extension has no attributes")?;

    let view = document
        .views()
        .nth(view_index)
        .with_context(|| format!("Draco bufferView {view_index} does not exist"))?;
    let compressed = view
        .offset()
        .checked_add(view.length())
        .and_then(|end| buffers.get(view.buffer().index())?.get(view.offset()..end))
        .with_context(|| format!("Draco bufferView {view_index} points outside its buffer"))?;

    let vertex_count = primitive
        .get(&Semantic::Positions)
        .context("Draco primitive has no POSITION accessor")?
        .count();
    let index_count = primitive.indices().map(|a| a.count()).unwrap_or(0);

    let mut ids: Vec<(u64, Stream, Semantic)> = attribute_ids
        .iter()
        .filter_map(|(name, id)| {
            let (stream, semantic) = match name.as_str() {
                "POSITION" => (Stream::Position, Semantic::Positions),
                "NORMAL" => (Stream::Normal, Semantic::Normals),
                "TEXCOORD_0" => (Stream::TexCoord, Semantic::TexCoords(0)),
                _ => return None,
            };
            Some((id.as_u64()?, stream, semantic))
        })
        .collect();
    ids.sort_by_key(|(id, _, _)| *id);

    let mut layout = Vec::with_capacity(ids.len());
    for (_, stream, semantic) in ids {
        let accessor = primitive
            .get(&semantic)
            .with_context(|| format!("Draco attribute {semantic:?} has no accessor"))?;
        layout.push(StreamLayout {
            stream,
            components: accessor.dimensions().multiplicity(),
            data_type: accessor.data_type(),
        });
    }

    let mut config = MeshDecodeConfig::new(vertex_count as u32, index_count as u32);
    for attribute in &layout {
        config.add_attribute(attribute.components as u32, draco_type(attribute.data_type));
    }

    // The native decoder finishes synchronously; the web one awaits the browser.
    #[cfg(not(target_arch = "wasm32"))]
    let decoded = futures::executor::block_on(decode_mesh(compressed, &config));
    #[cfg(target_arch = "wasm32")]
    let decoded = decode_mesh(compressed, &config).await;
    let decoded = decoded.context("Draco decoder rejected the compressed geometry")?;

    unpack(&decoded, &layout, vertex_count, index_count)
}

fn draco_type(data_type: DataType) -> AttributeDataType {
    match data_type {
        DataType::I8 => AttributeDataType::Int8,
        DataType::U8 => AttributeDataType::UInt8,
        DataType::I16 => AttributeDataType::Int16,
        DataType::U16 => AttributeDataType::UInt16,
        DataType::U32 => AttributeDataType::UInt32,
        DataType::F32 => AttributeDataType::Float32,
    }
}

fn take<'a>(decoded: &'a [u8], cursor: &mut usize, len: usize) -> anyhow::Result<&'a [u8]> {
    let bytes = cursor
        .checked_add(len)
        .and_then(|end| decoded.get(*cursor..end))
        .context("decoded Draco stream is shorter than its layout")?;
    *cursor += len;
    Ok(bytes)
}

/// Split a decoded stream into attribute streams.
pub fn unpack(
    decoded: &[u8],
    layout: &[StreamLayout],
    vertex_count: usize,
    index_count: usize,
) -> anyhow::Result<AttributeStreams> {
    let mut cursor = 0usize;

    let indices = if index_count == 0 {
        None
    } else if index_count <= u16::MAX as usize {
        let bytes = take(decoded, &mut cursor, index_count * 2)?;
        Some(
            bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]) as u32)
                .collect::<Vec<_>>(),
        )
    } else {
        let bytes = take(decoded, &mut cursor, index_count * 4)?;
        Some(
            bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    };

    let mut streams = AttributeStreams {
        indices,
        ..Default::default()
    };
    for attribute in layout {
        let len = attribute.components * vertex_count * attribute.data_type.size();
        let bytes = take(decoded, &mut cursor, len)?;
        if attribute.data_type != DataType::F32 {
            if attribute.stream == Stream::Position {
                bail!("quantized Draco positions are not supported");
            }
            log::warn!("ignoring {:?} {:?} Draco attribute", attribute.data_type, attribute.stream);
            continue;
        }
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let vectors = floats.chunks_exact(attribute.components.max(1));
        match (attribute.stream, attribute.components) {
            (Stream::Position, 3..) => {
                streams.positions = vectors.map(|v| [v[0], v[1], v[2]]).collect();
            }
            (Stream::Normal, 3..) => {
                streams.normals = Some(vectors.map(|v| [v[0], v[1], v[2]]).collect());
            }
            (Stream::TexCoord, 2..) => {
                streams.tex_coords = Some(vectors.map(|v| [v[0], v[1]]).collect());
            }
            (stream, components) => bail!("{stream:?} with {components} components is not supported"),
        }
    }
    if streams.positions.len() != vertex_count {
        bail!("Draco stream carries no positions");
    }
    Ok(streams)
}
