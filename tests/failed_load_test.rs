mod common;

use std::path::PathBuf;

use common::test_utils::{glb, triangle_bin, triangle_glb, triangle_json};
use vitrine::{resources::load_model, showcase::gallery::Gallery};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vitrine-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn one_bad_asset_does_not_affect_the_others() {
    let dir = scratch_dir("isolation");
    let good_a = dir.join("a.glb");
    let good_b = dir.join("b.glb");
    let garbage = dir.join("garbage.glb");
    let draco = dir.join("draco.glb");
    std::fs::write(&good_a, triangle_glb([0.0; 3])).unwrap();
    std::fs::write(&good_b, triangle_glb([3.0, 0.0, 0.0])).unwrap();
    std::fs::write(&garbage, b"<html>404</html>").unwrap();
    // Compressed primitive whose extension names no bufferView
    let draco_json = triangle_json(
        r#"[{ "mesh": 0 }]"#,
        r#", "extensions": { "KHR_draco_mesh_compression": { "attributes": { "POSITION": 0 } } }"#,
        r#", "extensionsRequired": ["KHR_draco_mesh_compression"]"#,
    );
    std::fs::write(&draco, glb(&draco_json, &triangle_bin())).unwrap();

    let urls: Vec<String> = [
        good_a,
        dir.join("missing.glb"),
        garbage,
        good_b,
        draco,
    ]
    .iter()
    .map(|path| path.to_string_lossy().into_owned())
    .collect();

    let results = futures::future::join_all(urls.iter().map(|url| load_model(url))).await;

    let mut gallery = Gallery::new(urls.len(), 10.0, 1);
    let mut failures = Vec::new();
    for (request_index, result) in results.into_iter().enumerate() {
        match result {
            Ok(model) => {
                gallery.push(request_index, model);
            }
            Err(e) => failures.push((request_index, format!("{e:#}"))),
        }
    }

    let loaded: Vec<usize> = gallery.iter().map(|slot| slot.request_index).collect();
    assert_eq!(loaded, vec![0, 3]);
    assert_eq!(
        failures.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
        vec![1, 2, 4]
    );
    assert!(failures[2].1.contains("Draco extension has no bufferView"));
    // Survivors keep the positions of their request slots
    let xs: Vec<f32> = gallery.iter().map(|slot| slot.position_x).collect();
    assert_eq!(xs, vec![-25.0, 15.0]);
    assert!(gallery.iter().all(|slot| slot.content.meshes.len() == 1));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn relative_buffers_resolve_next_to_the_model() {
    let dir = scratch_dir("relative");
    let json = triangle_json(r#"[{ "mesh": 0 }]"#, "", "")
        .replace(r#""byteLength": 48 }"#, r#""byteLength": 48, "uri": "tri.bin" }"#);
    std::fs::write(dir.join("tri.gltf"), json).unwrap();
    std::fs::write(dir.join("tri.bin"), triangle_bin()).unwrap();

    let location = dir.join("tri.gltf").to_string_lossy().into_owned();
    let model = load_model(&location).await.unwrap();
    assert_eq!(model.meshes.len(), 1);
    assert_eq!(model.meshes[0].indices, vec![0, 1, 2]);

    std::fs::remove_dir_all(&dir).unwrap();
}
