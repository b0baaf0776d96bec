use super::*;
use crate::error::ErrorKind;
use std::path::PathBuf;

/// Write `files` into a fresh temp directory and return it
fn fixture(name: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tandem_obj_loader_{}", name));
    std::fs::create_dir_all(&dir).unwrap();
    for (file, contents) in files {
        std::fs::write(dir.join(file), contents).unwrap();
    }
    dir
}

const QUAD_MTL: &str = "\
newmtl painted
map_Kd textures\\hull.png

newmtl bare
Kd 1.0 1.0 1.0
";

const TWO_OBJECTS: &str = "\
mtllib quad.mtl
o first
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl painted
f 1/1 2/2 3/3 4/4
o second
v 0 0 1
v 1 0 1
v 1 1 1
usemtl bare
f 5 6 7
";

// ============================================================================
// Loading tests
// ============================================================================

#[test]
fn test_one_child_node_per_object() {
    let dir = fixture("objects", &[("quad.obj", TWO_OBJECTS), ("quad.mtl", QUAD_MTL)]);

    let scene = load_obj_scene(&dir.join("quad.obj")).unwrap();

    assert!(scene.root.meshes.is_empty());
    assert_eq!(scene.root.children.len(), 2);
    assert_eq!(scene.flatten().len(), 2);
}

#[test]
fn test_quad_is_triangulated() {
    let dir = fixture("triangulate", &[("quad.obj", TWO_OBJECTS), ("quad.mtl", QUAD_MTL)]);

    let scene = load_obj_scene(&dir.join("quad.obj")).unwrap();

    assert_eq!(scene.meshes[0].indices.len(), 6);
    assert_eq!(scene.meshes[1].indices.len(), 3);
}

#[test]
fn test_uvs_are_flipped_and_missing_uvs_are_none() {
    let dir = fixture("uvs", &[("quad.obj", TWO_OBJECTS), ("quad.mtl", QUAD_MTL)]);

    let scene = load_obj_scene(&dir.join("quad.obj")).unwrap();

    let uvs = scene.meshes[0].tex_coords.as_ref().unwrap();
    assert!(uvs.contains(&[0.0, 1.0]));
    assert!(uvs.contains(&[1.0, 0.0]));
    assert!(scene.meshes[1].tex_coords.is_none());
}

#[test]
fn test_materials_map_to_diffuse_file_names() {
    let dir = fixture("materials", &[("quad.obj", TWO_OBJECTS), ("quad.mtl", QUAD_MTL)]);

    let scene = load_obj_scene(&dir.join("quad.obj")).unwrap();

    let files = scene.material_texture_files();
    let painted = scene.meshes[0].material.unwrap();
    let bare = scene.meshes[1].material.unwrap();
    assert_eq!(files[painted], Some("hull.png"));
    assert_eq!(files[bare], None);
}

#[test]
fn test_missing_material_library_still_loads() {
    let dir = fixture("no_mtl", &[("quad.obj", TWO_OBJECTS)]);

    let scene = load_obj_scene(&dir.join("quad.obj")).unwrap();

    assert!(scene.materials.is_empty());
    assert_eq!(scene.meshes.len(), 2);
}

#[test]
fn test_missing_file_is_load_error() {
    let err = load_obj_scene(Path::new("Models/does_not_exist.obj")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Load);
}
