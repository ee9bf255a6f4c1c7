mod common;

use common::test_utils::{glb, triangle_bin, triangle_glb, triangle_json};
use futures::executor::block_on;
use vitrine::{data_structures::model::AlphaMode, resources::decode_model};

#[test]
fn decodes_a_translated_triangle() {
    let model = block_on(decode_model("tri.glb", &triangle_glb([10.0, 0.0, -2.0]))).unwrap();

    assert_eq!(model.meshes.len(), 1);
    let mesh = &model.meshes[0];
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.material, None);
    // No NORMAL attribute: normals come from the winding
    assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));

    assert_eq!(model.bounds.min, cgmath::Point3::new(10.0, 0.0, -2.0));
    assert_eq!(model.bounds.max, cgmath::Point3::new(11.0, 1.0, -2.0));
    assert_eq!(model.bounds.center(), cgmath::Vector3::new(10.5, 0.5, -2.0));
}

#[test]
fn node_transforms_are_baked_parent_first() {
    let nodes = r#"[
        { "translation": [0, 5, 0], "children": [1] },
        { "mesh": 0, "scale": [2, 2, 2] }
    ]"#;
    let bytes = glb(&triangle_json(nodes, "", ""), &triangle_bin());
    let model = block_on(decode_model("nested.glb", &bytes)).unwrap();

    assert_eq!(model.meshes.len(), 1);
    assert_eq!(model.bounds.min, cgmath::Point3::new(0.0, 5.0, 0.0));
    assert_eq!(model.bounds.max, cgmath::Point3::new(2.0, 7.0, 0.0));
}

#[test]
fn non_triangle_primitives_are_skipped() {
    let nodes = r#"[{ "mesh": 0 }]"#;
    let bytes = glb(&triangle_json(nodes, r#", "mode": 1"#, ""), &triangle_bin());
    let model = block_on(decode_model("lines.glb", &bytes)).unwrap();

    assert!(model.meshes.is_empty());
    assert!(model.bounds.is_empty());
}

const DRACO_REQUIRED: &str = r#",
  "extensionsUsed": ["KHR_draco_mesh_compression"],
  "extensionsRequired": ["KHR_draco_mesh_compression"]"#;

#[test]
fn draco_requirement_alone_does_not_block_loading() {
    let nodes = r#"[{ "mesh": 0 }]"#;
    let bytes = glb(&triangle_json(nodes, "", DRACO_REQUIRED), &triangle_bin());

    let model = block_on(decode_model("draco.glb", &bytes)).unwrap();
    assert_eq!(model.meshes.len(), 1);
    assert_eq!(model.meshes[0].indices, vec![0, 1, 2]);
}

#[test]
fn draco_primitives_go_through_the_draco_decoder() {
    let nodes = r#"[{ "mesh": 0 }]"#;
    let compressed = r#", "extensions": { "KHR_draco_mesh_compression": { "attributes": { "POSITION": 0 } } }"#;
    let bytes = glb(&triangle_json(nodes, compressed, DRACO_REQUIRED), &triangle_bin());

    let err = block_on(decode_model("draco.glb", &bytes)).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("primitive 0 of mesh 0"), "{message}");
    assert!(message.contains("Draco extension has no bufferView"), "{message}");
}

#[test]
fn draco_views_outside_the_buffer_are_errors() {
    let nodes = r#"[{ "mesh": 0 }]"#;
    let compressed = r#", "extensions": { "KHR_draco_mesh_compression": { "bufferView": 7, "attributes": { "POSITION": 0 } } }"#;
    let bytes = glb(&triangle_json(nodes, compressed, DRACO_REQUIRED), &triangle_bin());

    let err = block_on(decode_model("draco.glb", &bytes)).unwrap_err();
    assert!(format!("{err:#}").contains("bufferView 7"));
}

#[test]
fn other_required_extensions_are_rejected() {
    let nodes = r#"[{ "mesh": 0 }]"#;
    let extra = r#",
  "extensionsRequired": ["KHR_draco_mesh_compression", "EXT_meshopt_compression"]"#;
    let bytes = glb(&triangle_json(nodes, "", extra), &triangle_bin());

    let err = block_on(decode_model("meshopt.glb", &bytes)).unwrap_err();
    assert!(format!("{err:#}").contains("EXT_meshopt_compression"));
}

#[test]
fn embedded_buffers_are_decoded() {
    use base64::Engine as _;
    let payload = base64::engine::general_purpose::STANDARD.encode(triangle_bin());
    let json = triangle_json(r#"[{ "mesh": 0 }]"#, "", "").replace(
        r#""byteLength": 48 }"#,
        &format!(r#""byteLength": 48, "uri": "data:application/octet-stream;base64,{payload}" }}"#),
    );

    let model = block_on(decode_model("models/embedded.gltf", json.as_bytes())).unwrap();
    assert_eq!(model.meshes.len(), 1);
    assert_eq!(model.meshes[0].vertices[1].position, [1.0, 0.0, 0.0]);
}

#[test]
fn alpha_modes_are_kept() {
    let nodes = r#"[{ "mesh": 0 }]"#;
    let materials = r#",
  "materials": [
    { "name": "glass", "alphaMode": "BLEND" },
    { "name": "leaf", "alphaMode": "MASK", "alphaCutoff": 0.25 },
    { "name": "leaf default", "alphaMode": "MASK" },
    { "name": "wood" }
  ]"#;
    let bytes = glb(&triangle_json(nodes, r#", "material": 1"#, materials), &triangle_bin());

    let model = block_on(decode_model("materials.glb", &bytes)).unwrap();
    let modes: Vec<AlphaMode> = model.materials.iter().map(|m| m.alpha_mode).collect();
    assert_eq!(
        modes,
        vec![
            AlphaMode::Blend,
            AlphaMode::Mask { cutoff: 0.25 },
            AlphaMode::Mask { cutoff: 0.5 },
            AlphaMode::Opaque,
        ]
    );
    assert_eq!(model.meshes[0].material, Some(1));
}

#[test]
fn image_views_with_overflowing_ranges_are_errors() {
    let nodes = r#"[{ "mesh": 0 }]"#;
    let extra = r#",
  "materials": [{ "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } }],
  "textures": [{ "source": 0 }],
  "images": [{ "bufferView": 2, "mimeType": "image/png" }]"#;
    let json = triangle_json(nodes, r#", "material": 0"#, extra).replace(
        r#"{ "buffer": 0, "byteOffset": 36, "byteLength": 12, "target": 34963 }"#,
        r#"{ "buffer": 0, "byteOffset": 36, "byteLength": 12, "target": 34963 },
    { "buffer": 0, "byteOffset": 18446744073709551615, "byteLength": 16 }"#,
    );
    let bytes = glb(&json, &triangle_bin());

    assert!(block_on(decode_model("overflow.glb", &bytes)).is_err());
}

#[test]
fn truncated_files_are_rejected() {
    let bytes = triangle_glb([0.0; 3]);
    assert!(block_on(decode_model("cut.glb", &bytes[..bytes.len() / 2])).is_err());
}

#[test]
fn recentring_moves_the_box_centre_to_the_origin() {
    let model = block_on(decode_model("tri.glb", &triangle_glb([-7.0, 3.0, 12.0]))).unwrap();
    let offset = -model.bounds.center();
    let shifted: vitrine::data_structures::bounds::Aabb = model
        .meshes
        .iter()
        .flat_map(|mesh| {
            mesh.vertices.iter().map(move |v| {
                use cgmath::Transform;
                mesh.transform.transform_point(cgmath::Point3::from(v.position)) + offset
            })
        })
        .collect();
    let centre = shifted.center();
    assert!(centre.x.abs() < 1e-5 && centre.y.abs() < 1e-5 && centre.z.abs() < 1e-5);
}
