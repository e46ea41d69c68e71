use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::renderer::material::{MaterialDesc, MaterialId, MaterialTable};
use crate::renderer::model::{Model, Vertex};
use crate::renderer::texture::TextureUploader;

/// Loads `scene_file` from `scene_root`, registers its materials in
/// `materials` and returns its geometry laid out for aggregation.
///
/// Scene materials are registered in file order, so a mesh's material id is
/// its native material index plus however many rows the table already had.
pub fn import_model<U: TextureUploader>(
    materials: &mut MaterialTable<U>,
    scene_root: &Path,
    scene_file: &str,
) -> Result<Model, Error> {
    let path = scene_root.join(scene_file);
    let (models, scene_materials) = tobj::load_obj(
        &path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|err| Error::resource(&path, err))?;
    let scene_materials = scene_materials.unwrap_or_else(|err| {
        log::warn!(
            "No materials loaded for {} ({err}), using the default material",
            path.display()
        );
        Vec::new()
    });
    log::info!(
        "Parsed {}: {} meshes, {} materials",
        path.display(),
        models.len(),
        scene_materials.len()
    );
    build_model(materials, scene_root, &models, &scene_materials)
}

/// The part of [`import_model`] after parsing.
pub fn build_model<U: TextureUploader>(
    materials: &mut MaterialTable<U>,
    scene_root: &Path,
    models: &[tobj::Model],
    scene_materials: &[tobj::Material],
) -> Result<Model, Error> {
    let first_material = materials.len() as MaterialId;
    for scene_material in scene_materials {
        materials.create(&material_desc(scene_root, scene_material))?;
    }

    let mut default_material = None;
    let mut model = Model::new();
    for scene_model in models {
        let mesh = &scene_model.mesh;
        let material_id = match mesh.material_id {
            Some(index) if index < scene_materials.len() => first_material + index as MaterialId,
            _ => {
                if let Some(index) = mesh.material_id {
                    log::warn!(
                        "Mesh {} references material {index}, which does not exist",
                        scene_model.name
                    );
                }
                match default_material {
                    Some(id) => id,
                    None => {
                        let id = materials.create(&MaterialDesc::default())?;
                        default_material = Some(id);
                        id
                    }
                }
            }
        };
        let vertices = vertices(&scene_model.name, mesh)?;
        model.push_mesh(&scene_model.name, vertices, &mesh.indices, material_id)?;
    }
    Ok(model)
}

fn material_desc(scene_root: &Path, material: &tobj::Material) -> MaterialDesc {
    let resolve = |texture: Option<&String>| -> Option<PathBuf> {
        let texture = texture.filter(|texture| !texture.is_empty())?;
        let path = scene_root.join(texture);
        log::info!("Texture found for {}: {}", material.name, path.display());
        Some(path)
    };
    MaterialDesc {
        albedo: resolve(material.diffuse_texture.as_ref()),
        opacity: material.dissolve.unwrap_or(1.0),
        opacity_map: resolve(material.dissolve_texture.as_ref()),
        metalness: resolve(material.unknown_param.get("map_Pm")),
        roughness: resolve(material.unknown_param.get("map_Pr")),
        normal: resolve(
            material
                .normal_texture
                .as_ref()
                .or_else(|| material.unknown_param.get("norm")),
        ),
    }
}

fn vertices(name: &str, mesh: &tobj::Mesh) -> Result<Vec<Vertex>, Error> {
    let invalid = |reason: String| Error::InvalidGeometry {
        mesh: name.to_string(),
        reason,
    };
    if mesh.positions.len() % 3 != 0 {
        return Err(invalid("position data is not made of xyz triples".to_string()));
    }
    let vertex_count = mesh.positions.len() / 3;
    if mesh.texcoords.len() != vertex_count * 2 {
        return Err(invalid(format!(
            "expected texture coordinates for {vertex_count} vertices, found {}",
            mesh.texcoords.len() / 2
        )));
    }
    let has_normals = mesh.normals.len() == vertex_count * 3;
    if !has_normals && !mesh.normals.is_empty() {
        log::warn!("Mesh {name} has a partial set of normals, ignoring them");
    }

    let vertices = (0..vertex_count)
        .map(|i| Vertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            uv: [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]],
            normal: if has_normals {
                [
                    mesh.normals[i * 3],
                    mesh.normals[i * 3 + 1],
                    mesh.normals[i * 3 + 2],
                ]
            } else {
                [0.0; 3]
            },
        })
        .collect();
    Ok(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::draw_calls::DrawCalls;
    use crate::renderer::material::TextureSlot;
    use crate::renderer::texture::testing::{scratch_dir, write_png, RecordingUploader};

    fn triangle(material_id: Option<usize>) -> tobj::Model {
        let mesh = tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            texcoords: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            indices: vec![0, 1, 2],
            material_id,
            ..Default::default()
        };
        tobj::Model::new(mesh, "triangle".to_string())
    }

    fn quad(material_id: Option<usize>) -> tobj::Model {
        let mesh = tobj::Mesh {
            positions: vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
            ],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            texcoords: vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            indices: vec![0, 1, 2, 2, 3, 0],
            material_id,
            ..Default::default()
        };
        tobj::Model::new(mesh, "quad".to_string())
    }

    fn untextured() -> tobj::Material {
        tobj::Material {
            name: "plain".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn single_textured_triangle() {
        let dir = scratch_dir("import-single");
        write_png(&dir.join("albedo.png"), 2, 2);
        let material = tobj::Material {
            name: "textured".to_string(),
            diffuse_texture: Some("albedo.png".to_string()),
            ..Default::default()
        };

        let mut table = MaterialTable::new(RecordingUploader::default());
        let model = build_model(&mut table, &dir, &[triangle(Some(0))], &[material]).unwrap();

        assert_eq!(3, model.vertex_count);
        assert_eq!(3, model.index_count);
        let draw_calls = DrawCalls::from_model(&model);
        assert_eq!(1, draw_calls.len());
        assert_eq!(0, draw_calls.draw_data()[0].material_id);
        assert_eq!(3, draw_calls.commands()[0].count);
        assert_eq!(0, draw_calls.commands()[0].base_instance);

        let material = table.get_by_id(0).unwrap();
        assert!(material.has(TextureSlot::Albedo));
        assert!(!material.has(TextureSlot::Opacity));
        assert_eq!(1.0, material.opacity);
    }

    #[test]
    fn meshes_sharing_a_material() {
        let mut table = MaterialTable::new(RecordingUploader::default());
        let model = build_model(
            &mut table,
            Path::new("."),
            &[quad(Some(0)), triangle(Some(0))],
            &[untextured()],
        )
        .unwrap();

        let draw_calls = DrawCalls::from_model(&model);
        assert_eq!(2, draw_calls.draw_data().len());
        assert!(draw_calls.draw_data().iter().all(|row| row.material_id == 0));
        assert_eq!(model.meshes[0].vertex_count(), model.meshes[1].vertex_offset);
        assert_eq!(model.meshes[0].index_count(), model.meshes[1].index_offset);
        assert_eq!(vec![4, 5, 6], model.meshes[1].indices);
        assert_eq!(1, table.len());
    }

    #[test]
    fn material_ids_follow_scene_order() {
        let mut table = MaterialTable::new(RecordingUploader::default());
        let scene_materials = [untextured(), untextured(), untextured()];
        let model = build_model(
            &mut table,
            Path::new("."),
            &[triangle(Some(2)), quad(Some(0)), triangle(Some(1))],
            &scene_materials,
        )
        .unwrap();

        let ids = model.meshes.iter().map(|mesh| mesh.material_id).collect::<Vec<_>>();
        assert_eq!(vec![2, 0, 1], ids);
        assert_eq!(3, table.len());
    }

    #[test]
    fn material_ids_are_offset_by_existing_rows() {
        let mut table = MaterialTable::new(RecordingUploader::default());
        table.create(&MaterialDesc::default()).unwrap();
        let model =
            build_model(&mut table, Path::new("."), &[triangle(Some(0))], &[untextured()]).unwrap();
        assert_eq!(1, model.meshes[0].material_id);
    }

    #[test]
    fn meshes_without_material_share_one_default() {
        let mut table = MaterialTable::new(RecordingUploader::default());
        let model = build_model(
            &mut table,
            Path::new("."),
            &[triangle(None), quad(Some(0)), triangle(Some(7))],
            &[untextured()],
        )
        .unwrap();

        assert_eq!(2, table.len());
        assert_eq!(1, model.meshes[0].material_id);
        assert_eq!(0, model.meshes[1].material_id);
        assert_eq!(1, model.meshes[2].material_id);
        assert_eq!(1.0, table.get_by_id(1).unwrap().opacity);
    }

    #[test]
    fn missing_normals_are_zero_filled() {
        let mut table = MaterialTable::new(RecordingUploader::default());
        let model = build_model(
            &mut table,
            Path::new("."),
            &[triangle(None), quad(None)],
            &[],
        )
        .unwrap();
        assert!(model.meshes[0]
            .vertices
            .iter()
            .all(|vertex| vertex.normal == [0.0; 3]));
        assert!(model.meshes[1]
            .vertices
            .iter()
            .all(|vertex| vertex.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn meshes_without_texture_coordinates_are_rejected() {
        let mut no_uvs = triangle(None);
        no_uvs.mesh.texcoords.clear();
        let mut table = MaterialTable::new(RecordingUploader::default());
        let result = build_model(&mut table, Path::new("."), &[no_uvs], &[]);
        assert!(matches!(result, Err(Error::InvalidGeometry { .. })));
    }

    #[test]
    fn imports_obj_and_mtl_from_disk() {
        let dir = scratch_dir("import-obj");
        write_png(&dir.join("albedo.png"), 2, 2);
        write_png(&dir.join("alpha.png"), 2, 2);
        std::fs::write(
            dir.join("scene.mtl"),
            "newmtl glass\nd 0.25\nmap_Kd albedo.png\nmap_d alpha.png\n\n\
             newmtl stone\nmap_Kd albedo.png\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("scene.obj"),
            "mtllib scene.mtl\n\
             v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
             o quad\nusemtl glass\nf 1/1 2/2 3/3 4/4\n\
             o tri\nusemtl stone\nf 1/1 2/2 3/3\n",
        )
        .unwrap();

        let mut table = MaterialTable::new(RecordingUploader::default());
        let model = import_model(&mut table, &dir, "scene.obj").unwrap();

        assert_eq!(2, model.meshes.len());
        // The quad face is triangulated.
        assert_eq!(6, model.meshes[0].index_count());
        assert_eq!(3, model.meshes[1].index_count());
        assert_eq!(model.meshes[0].vertex_count(), model.meshes[1].vertex_offset);
        for mesh in &model.meshes {
            let range = mesh.vertex_offset..mesh.vertex_offset + mesh.vertex_count();
            assert!(mesh.indices.iter().all(|index| range.contains(index)));
        }

        assert_eq!(2, table.len());
        let glass = table.get_by_id(model.meshes[0].material_id).unwrap();
        assert_eq!(0.25, glass.opacity);
        assert!(glass.has(TextureSlot::Albedo));
        assert!(glass.has(TextureSlot::Opacity));
        let stone = table.get_by_id(model.meshes[1].material_id).unwrap();
        assert_eq!(glass.texture(TextureSlot::Albedo), stone.texture(TextureSlot::Albedo));
        // albedo.png is shared, so only two textures were uploaded.
        assert_eq!(2, table.uploader().uploads.len());
    }

    #[test]
    fn norm_statements_fill_the_normal_slot() {
        let dir = scratch_dir("import-norm");
        write_png(&dir.join("n.png"), 2, 2);
        std::fs::write(dir.join("scene.mtl"), "newmtl m\nnorm n.png\n").unwrap();
        std::fs::write(
            dir.join("scene.obj"),
            "mtllib scene.mtl\n\
             v 0 0 0\nv 1 0 0\nv 0 1 0\n\
             vt 0 0\nvt 1 0\nvt 0 1\n\
             usemtl m\nf 1/1 2/2 3/3\n",
        )
        .unwrap();

        let mut table = MaterialTable::new(RecordingUploader::default());
        let model = import_model(&mut table, &dir, "scene.obj").unwrap();

        let material = table.get_by_id(model.meshes[0].material_id).unwrap();
        assert!(material.has(TextureSlot::Normal));
        assert!(!material.has(TextureSlot::Albedo));
        assert_eq!(1, table.uploader().uploads.len());
    }

    #[test]
    fn missing_scene_files_fail_with_their_path() {
        let dir = scratch_dir("import-missing");
        let mut table = MaterialTable::new(RecordingUploader::default());
        match import_model(&mut table, &dir, "nope.obj") {
            Err(Error::ResourceLoad { path, .. }) => assert_eq!(dir.join("nope.obj"), path),
            other => panic!("expected a resource load failure, got {other:?}"),
        }
    }
}
