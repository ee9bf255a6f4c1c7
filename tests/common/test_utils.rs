use cgmath::Deg;
use vitrine::{
    camera::{Camera, Projection},
    config::ShowcaseConfig,
    data_structures::scene_graph::ContainerNode,
    showcase::{cursor::Cursor, gallery::Gallery, viewport::Viewport},
};

const JSON_CHUNK: u32 = 0x4E4F_534A;
const BIN_CHUNK: u32 = 0x004E_4942;

/// Wrap a glTF JSON document and its binary buffer into a GLB container.
pub fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let total = 12 + 8 + json.len() + 8 + bin.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&JSON_CHUNK.to_le_bytes());
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(&BIN_CHUNK.to_le_bytes());
    out.extend_from_slice(&bin);
    out
}

/// Vertices (0,0,0), (1,0,0), (0,1,0) followed by the u32 indices 0, 1, 2.
pub fn triangle_bin() -> Vec<u8> {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let indices: [u32; 3] = [0, 1, 2];
    let mut bin = Vec::with_capacity(48);
    positions
        .iter()
        .for_each(|p| bin.extend_from_slice(&p.to_le_bytes()));
    indices
        .iter()
        .for_each(|i| bin.extend_from_slice(&i.to_le_bytes()));
    bin
}

/// glTF JSON for [`triangle_bin`]. `nodes` is spliced in verbatim and must
/// reference mesh 0 somewhere; `extra` is appended to the root object.
pub fn triangle_json(nodes: &str, primitive_extra: &str, extra: &str) -> String {
    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": {nodes},
  "meshes": [{{ "name": "tri", "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1{primitive_extra} }}] }}],
  "buffers": [{{ "byteLength": 48 }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 12, "target": 34963 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] }},
    {{ "bufferView": 1, "componentType": 5125, "count": 3, "type": "SCALAR" }}
  ]{extra}
}}"#
    )
}

/// A single triangle mesh on a node translated by `translation`.
pub fn triangle_glb(translation: [f32; 3]) -> Vec<u8> {
    let [x, y, z] = translation;
    let nodes = format!(r#"[{{ "mesh": 0, "translation": [{x}, {y}, {z}] }}]"#);
    glb(&triangle_json(&nodes, "", ""), &triangle_bin())
}

/// Camera and projection exactly as the showcase configures them.
pub fn showcase_camera(config: &ShowcaseConfig, viewport: &Viewport) -> (Camera, Projection) {
    let camera = Camera::new(config.camera.position, Deg(-90.0), Deg(0.0));
    let projection = Projection::new(
        viewport.width as u32,
        viewport.height as u32,
        Deg(config.camera.fovy_degrees),
        config.camera.znear,
        config.camera.zfar,
    );
    (camera, projection)
}

/// One animation frame over every slot, through the same path the showcase
/// runs each redraw.
pub fn step(
    gallery: &mut Gallery<ContainerNode>,
    cursor: &Cursor,
    config: &ShowcaseConfig,
    viewport: &Viewport,
) {
    let (camera, projection) = showcase_camera(config, viewport);
    gallery.animate(&camera, &projection, cursor, viewport, &config.tilt);
}
