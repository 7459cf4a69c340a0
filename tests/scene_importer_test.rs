use cgmath::{Matrix4, SquareMatrix};
use scene_viewer::{
    data_structures::scene_graph::{MaterialData, MeshData, SceneDescription, SceneNode},
    error::{GeometryError, ResourceLoadError, SceneLoadError},
    importer::{DrawEntry, ImportOptions, ResourceArena, TextureFailurePolicy},
};

use crate::common::test_utils::{
    StubImageLoader, assert_matrix_eq, flat_material, import, quad_mesh, scene, solid_image,
    textured_material, translation,
};

mod common;

fn fallback() -> ImportOptions {
    ImportOptions {
        texture_failure: TextureFailurePolicy::FlatFallback,
    }
}

#[test]
fn should_accumulate_world_transforms_root_first() {
    let root_local = translation(1.0, 0.0, 0.0);
    let child_local = Matrix4::from_scale(2.0);
    let grandchild_local = translation(0.0, 3.0, 0.0);
    let root = SceneNode::new("root")
        .with_transform(root_local)
        .with_meshes([0])
        .with_child(
            SceneNode::new("child")
                .with_transform(child_local)
                .with_child(
                    SceneNode::new("grandchild")
                        .with_transform(grandchild_local)
                        .with_meshes([0]),
                ),
        );
    let desc = scene(root, vec![quad_mesh("quad", 0)], vec![flat_material("grey", [0.5; 3])]);

    let (result, _) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());
    let imported = result.expect("import failed");

    assert_eq!(imported.nodes.len(), 3);
    assert_matrix_eq(imported.nodes[0].world_transform, root_local);
    assert_matrix_eq(imported.nodes[1].world_transform, root_local * child_local);
    assert_matrix_eq(
        imported.nodes[2].world_transform,
        root_local * child_local * grandchild_local,
    );
    for (idx, node) in imported.nodes.iter().enumerate().skip(1) {
        let parent = node.parent.expect("non-root node without parent");
        assert!(parent < idx, "parent must precede child");
    }
    assert_eq!(imported.nodes[0].parent, None);

    // (0, 0, 0) in the grandchild lands at 1 + 2 * (0, 3, 0)
    let origin = imported.nodes[2].world_transform * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert!((origin.x - 1.0).abs() < 1e-5);
    assert!((origin.y - 6.0).abs() < 1e-5);
}

#[test]
fn should_upload_shared_mesh_once() {
    let root = SceneNode::new("root").with_child(
        SceneNode::new("A")
            .with_transform(translation(1.0, 0.0, 0.0))
            .with_meshes([0])
            .with_child(
                SceneNode::new("B")
                    .with_transform(translation(0.0, 1.0, 0.0))
                    .with_meshes([0]),
            ),
    );
    let desc = scene(root, vec![quad_mesh("quad", 0)], vec![flat_material("red", [1.0, 0.0, 0.0])]);

    let (result, uploader) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());
    let imported = result.expect("import failed");

    assert_eq!(uploader.geometry_uploads, vec!["quad".to_string()]);
    assert_eq!(imported.geometries.len(), 1);
    assert_eq!(imported.draw_list.len(), 2);
    let [first, second] = [imported.draw_list[0], imported.draw_list[1]];
    assert_eq!(first.mesh, second.mesh);
    assert_ne!(first.node, second.node);
    assert_matrix_eq(
        imported.world_transform(&first).expect("first transform"),
        translation(1.0, 0.0, 0.0),
    );
    assert_matrix_eq(
        imported.world_transform(&second).expect("second transform"),
        translation(1.0, 1.0, 0.0),
    );
}

#[test]
fn should_keep_traversal_order_in_draw_list() {
    let root = SceneNode::new("root")
        .with_meshes([2])
        .with_child(SceneNode::new("a").with_meshes([0, 1]).with_child(SceneNode::new("a1").with_meshes([2])))
        .with_child(SceneNode::new("b").with_meshes([1]));
    let desc = scene(
        root,
        vec![quad_mesh("m0", 0), quad_mesh("m1", 1), quad_mesh("m2", 0)],
        vec![flat_material("x", [1.0; 3]), flat_material("y", [0.0; 3])],
    );

    let (result, uploader) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());
    let imported = result.expect("import failed");

    let order: Vec<(usize, usize)> = imported.draw_list.iter().map(|e| (e.node, e.mesh)).collect();
    assert_eq!(order, vec![(0, 2), (1, 0), (1, 1), (2, 2), (3, 1)]);
    assert_eq!(uploader.geometry_uploads, vec!["m2", "m0", "m1"]);
    assert_eq!(
        imported.draw_list[2],
        DrawEntry {
            node: 1,
            mesh: 1,
            material: 1
        }
    );
}

#[test]
fn should_not_draw_nodes_without_meshes() {
    let root = SceneNode::new("empty")
        .with_transform(translation(0.0, 0.0, -5.0))
        .with_child(SceneNode::new("leaf").with_meshes([0]));
    let desc = scene(root, vec![quad_mesh("quad", 0)], vec![flat_material("m", [1.0; 3])]);

    let (result, _) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());
    let imported = result.expect("import failed");

    assert_eq!(imported.nodes.len(), 2);
    assert_eq!(imported.draw_list.len(), 1);
    assert_eq!(imported.draw_list[0].node, 1);
    assert_matrix_eq(imported.nodes[1].world_transform, translation(0.0, 0.0, -5.0));
}

#[test]
fn should_use_flat_colour_for_untextured_material() {
    let desc = scene(
        SceneNode::new("root").with_meshes([0]),
        vec![quad_mesh("quad", 0)],
        vec![flat_material("red", [1.0, 0.0, 0.0])],
    );

    let (result, uploader) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());
    let imported = result.expect("import failed");

    let material = imported.materials.get(0).expect("material 0");
    assert_eq!(material.flat_color(), Some([1.0, 0.0, 0.0, 1.0]));
    assert!(material.image().is_none());
    assert!(uploader.image_uploads.is_empty());
}

#[test]
fn should_default_to_opaque_black_without_texture_or_colour() {
    let desc = scene(
        SceneNode::new("root").with_meshes([0]),
        vec![quad_mesh("quad", 0)],
        vec![MaterialData::default_material()],
    );

    let (result, _) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());
    let imported = result.expect("import failed");

    assert_eq!(
        imported.materials.get(0).and_then(|m| m.flat_color()),
        Some([0.0, 0.0, 0.0, 1.0])
    );
}

#[test]
fn should_use_image_for_textured_material() {
    let desc = scene(
        SceneNode::new("root").with_meshes([0]),
        vec![quad_mesh("quad", 0)],
        vec![textured_material("wood", "wood.png")],
    );
    let images = StubImageLoader::default().with_image("wood.png", 4, 2);

    let (result, uploader) = import(Some(&desc), &images, ImportOptions::default());
    let imported = result.expect("import failed");

    let material = imported.materials.get(0).expect("material 0");
    assert!(material.flat_color().is_none());
    assert_eq!(material.dimensions(), Some((4, 2)));
    assert_eq!(material.override_color(), [0.0; 4]);
    assert_eq!(uploader.image_uploads, vec!["wood".to_string()]);
}

#[test]
fn should_create_each_referenced_material_once_in_ascending_order() {
    let root = SceneNode::new("root")
        .with_meshes([0, 1])
        .with_child(SceneNode::new("again").with_meshes([1, 0]));
    let desc = scene(
        root,
        vec![quad_mesh("a", 3), quad_mesh("b", 1)],
        vec![
            textured_material("unused", "unused.png"),
            textured_material("one", "one.png"),
            flat_material("also unused", [0.0; 3]),
            textured_material("three", "three.png"),
        ],
    );
    let images = StubImageLoader::default()
        .with_image("one.png", 1, 1)
        .with_image("three.png", 1, 1);

    let (result, uploader) = import(Some(&desc), &images, ImportOptions::default());
    let imported = result.expect("import failed");

    assert_eq!(uploader.image_uploads, vec!["one", "three"]);
    assert_eq!(*images.requests.borrow(), vec!["one.png", "three.png"]);
    assert_eq!(imported.materials.len(), 2);
    assert!(!imported.materials.contains(0));
    assert!(!imported.materials.contains(2));
    for (_, material) in imported.materials.iter() {
        assert!(material.image().is_some() != material.flat_color().is_some());
    }
}

#[test]
fn should_fail_on_missing_scene_without_uploads() {
    let (result, uploader) = import(None, &StubImageLoader::default(), ImportOptions::default());

    assert!(matches!(result, Err(SceneLoadError::MissingScene)));
    assert_eq!(uploader.upload_count(), 0);
}

#[test]
fn should_fail_on_incomplete_scene() {
    let mut desc = scene(
        SceneNode::new("root").with_meshes([0]),
        vec![quad_mesh("quad", 0)],
        vec![flat_material("m", [1.0; 3])],
    );
    desc.incomplete = true;

    let (result, uploader) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());

    assert!(matches!(result, Err(SceneLoadError::Incomplete)));
    assert_eq!(uploader.upload_count(), 0);
}

#[test]
fn should_fail_on_scene_without_root() {
    let desc = SceneDescription {
        meshes: vec![quad_mesh("quad", 0)],
        materials: vec![flat_material("m", [1.0; 3])],
        ..Default::default()
    };

    let (result, uploader) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());

    assert!(matches!(result, Err(SceneLoadError::MissingRoot)));
    assert_eq!(uploader.upload_count(), 0);
}

#[test]
fn should_fail_on_dangling_references() {
    let desc = scene(
        SceneNode::new("root").with_meshes([0]).with_child(SceneNode::new("broken").with_meshes([7])),
        vec![quad_mesh("quad", 0)],
        vec![flat_material("m", [1.0; 3])],
    );
    let (result, uploader) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());
    match result {
        Err(SceneLoadError::MissingMesh { node, mesh }) => {
            assert_eq!(node, "broken");
            assert_eq!(mesh, 7);
        }
        other => panic!("unexpected result: {:?}", other.map(|s| s.draw_list)),
    }
    assert_eq!(uploader.upload_count(), 0);

    let desc = scene(
        SceneNode::new("root").with_meshes([0]),
        vec![quad_mesh("quad", 4)],
        vec![flat_material("m", [1.0; 3])],
    );
    let (result, _) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());
    assert!(matches!(
        result,
        Err(SceneLoadError::MissingMaterial {
            mesh: 0,
            material: 4
        })
    ));
}

#[test]
fn should_reject_mesh_without_normals_before_uploading() {
    let mut broken = quad_mesh("broken", 0);
    broken.normals.clear();
    let desc = scene(
        SceneNode::new("root").with_meshes([0, 1]),
        vec![quad_mesh("fine", 0), broken],
        vec![flat_material("m", [1.0; 3])],
    );

    let (result, uploader) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());

    match result {
        Err(SceneLoadError::InvalidMesh { mesh, source }) => {
            assert_eq!(mesh, 1);
            assert_eq!(
                source,
                GeometryError::ChannelLength {
                    channel: "normal",
                    expected: 4,
                    actual: 0
                }
            );
        }
        other => panic!("unexpected result: {:?}", other.map(|s| s.draw_list)),
    }
    assert_eq!(uploader.upload_count(), 0);
}

#[test]
fn should_reject_empty_meshes_before_uploading() {
    let empty = MeshData {
        name: "empty".to_string(),
        ..Default::default()
    };
    let mut no_indices = quad_mesh("no indices", 0);
    no_indices.indices.clear();

    for broken in [empty, no_indices] {
        let vertices = broken.vertex_count();
        let desc = scene(
            SceneNode::new("root").with_meshes([0, 1]),
            vec![quad_mesh("fine", 0), broken],
            vec![flat_material("m", [1.0; 3])],
        );

        let (result, uploader) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());

        match result {
            Err(SceneLoadError::InvalidMesh { mesh, source }) => {
                assert_eq!(mesh, 1);
                assert_eq!(source, GeometryError::Empty { vertices, indices: 0 });
            }
            other => panic!("unexpected result: {:?}", other.map(|s| s.draw_list)),
        }
        assert_eq!(uploader.upload_count(), 0);
    }
}

#[test]
fn should_reject_out_of_range_indices() {
    let mut broken = quad_mesh("broken", 0);
    broken.indices = vec![0, 1, 4];
    let desc = scene(
        SceneNode::new("root").with_meshes([0]),
        vec![broken],
        vec![flat_material("m", [1.0; 3])],
    );

    let (result, _) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());

    assert!(matches!(
        result,
        Err(SceneLoadError::InvalidMesh {
            mesh: 0,
            source: GeometryError::IndexOutOfRange {
                index: 4,
                vertex_count: 4
            }
        })
    ));
}

#[test]
fn should_abort_on_texture_failure_by_default() {
    let desc = scene(
        SceneNode::new("root").with_meshes([0]),
        vec![quad_mesh("quad", 0)],
        vec![textured_material("missing", "missing.png")],
    );

    let (result, uploader) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());

    assert!(matches!(
        result,
        Err(SceneLoadError::Texture {
            material: 0,
            source: ResourceLoadError::UnsupportedSource(_)
        })
    ));
    assert_eq!(uploader.upload_count(), 0);
}

#[test]
fn should_fall_back_to_flat_colour_when_allowed() {
    let mut material = textured_material("missing", "missing.png");
    material.diffuse_color = Some([0.0, 0.0, 1.0]);
    let desc = scene(
        SceneNode::new("root").with_meshes([0]),
        vec![quad_mesh("quad", 0)],
        vec![material],
    );

    let (result, uploader) = import(Some(&desc), &StubImageLoader::default(), fallback());
    let imported = result.expect("import failed");

    assert_eq!(
        imported.materials.get(0).and_then(|m| m.flat_color()),
        Some([0.0, 0.0, 1.0, 1.0])
    );
    assert!(uploader.image_uploads.is_empty());
}

#[test]
fn should_reject_image_with_wrong_pixel_count() {
    let desc = scene(
        SceneNode::new("root").with_meshes([0]),
        vec![quad_mesh("quad", 0)],
        vec![textured_material("short", "short.png")],
    );
    let mut image = solid_image(2, 2);
    image.pixels.truncate(10);
    let images = StubImageLoader::default().with_decoded("short.png", image);

    let (result, uploader) = import(Some(&desc), &images, ImportOptions::default());

    assert!(matches!(
        result,
        Err(SceneLoadError::Texture {
            material: 0,
            source: ResourceLoadError::PixelBufferSize {
                expected: 16,
                actual: 10
            }
        })
    ));
    assert_eq!(uploader.upload_count(), 0);
}

#[test]
fn should_map_sparse_indices_in_resource_arena() {
    let mut arena = ResourceArena::with_index_capacity(2);
    assert!(arena.is_empty());

    arena.insert(5, "five");
    arena.insert(1, "one");
    arena.insert(5, "FIVE");

    assert_eq!(arena.len(), 2);
    assert_eq!(arena.get(5), Some(&"FIVE"));
    assert_eq!(arena.get(1), Some(&"one"));
    assert_eq!(arena.get(0), None);
    assert_eq!(arena.get(100), None);
    assert!(arena.contains(1));
    assert!(!arena.contains(3));
    let collected: Vec<_> = arena.iter().collect();
    assert_eq!(collected, vec![(1, &"one"), (5, &"FIVE")]);
}

#[test]
fn should_treat_identity_root_as_world_origin() {
    let desc = scene(
        SceneNode::new("root").with_meshes([0]),
        vec![quad_mesh("quad", 0)],
        vec![flat_material("m", [1.0; 3])],
    );

    let (result, _) = import(Some(&desc), &StubImageLoader::default(), ImportOptions::default());
    let imported = result.expect("import failed");

    assert_matrix_eq(imported.nodes[0].world_transform, Matrix4::identity());
}
