// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loads Wavefront OBJ files into part hierarchies.

use super::palette_color;
use ahash::AHashMap;
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tricull_core::math::{LinearRgba, Vec3};
use tricull_core::scene::{Mesh, ModelNode};

/// Turns every object of an OBJ file into a child part of one model.
///
/// Part colours come from the material's diffuse colour when materials are
/// available, otherwise from [`palette_color`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjModelLoader;

impl ObjModelLoader {
    fn load_options() -> tobj::LoadOptions {
        tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        }
    }

    /// Parses OBJ text. Material libraries are not resolved.
    pub fn load(&self, name: &str, bytes: &[u8]) -> Result<ModelNode> {
        let obj_text = std::str::from_utf8(bytes).context("OBJ file is not valid UTF-8")?;
        let (models, _materials) = tobj::load_obj_buf(
            &mut std::io::Cursor::new(obj_text),
            &Self::load_options(),
            |_| Ok((Vec::new(), AHashMap::new())),
        )
        .context("Failed to parse OBJ file")?;
        build_model(name, &models, &[])
    }

    /// Loads an OBJ file and the material libraries next to it.
    pub fn load_file(&self, path: &Path) -> Result<ModelNode> {
        let (models, materials) = tobj::load_obj(path, &Self::load_options())
            .with_context(|| format!("Failed to load OBJ file {}", path.display()))?;
        let materials = match materials {
            Ok(materials) => materials,
            Err(e) => {
                log::warn!("{}: materials unavailable ({e}), using palette colours", path.display());
                Vec::new()
            }
        };
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "obj".to_owned());
        build_model(&name, &models, &materials)
    }
}

fn build_model(name: &str, models: &[tobj::Model], materials: &[tobj::Material]) -> Result<ModelNode> {
    if models.is_empty() {
        bail!("No models found in OBJ file");
    }

    let mut root = ModelNode::new(name);
    for (index, model) in models.iter().enumerate() {
        let mesh = convert_mesh(&model.mesh)
            .with_context(|| format!("Invalid geometry in OBJ object '{}'", model.name))?;
        let color = model
            .mesh
            .material_id
            .and_then(|id| materials.get(id))
            .and_then(|m| m.diffuse)
            .map(|[r, g, b]| LinearRgba::rgb(r, g, b))
            .unwrap_or_else(|| palette_color(index));
        root = root.with_child(ModelNode::new(model.name.clone()).with_part(Arc::new(mesh), color));
    }

    log::info!(
        "Loaded OBJ model '{}': {} objects, {} triangles",
        name,
        models.len(),
        root.triangle_count()
    );
    Ok(root)
}

fn convert_mesh(mesh: &tobj::Mesh) -> Result<Mesh> {
    let positions: Vec<Vec3> = mesh
        .positions
        .chunks_exact(3)
        .map(|v| Vec3::new(v[0], v[1], v[2]))
        .collect();

    // With `single_index`, normals are either absent or one per position.
    let mesh = if mesh.normals.len() == mesh.positions.len() {
        let normals = mesh
            .normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect();
        Mesh::with_normals(positions, normals, mesh.indices.clone())?
    } else {
        Mesh::new(positions, mesh.indices.clone())?
    };
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_OBJECTS: &str = "\
o first
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
o second
v 0 0 1
v 1 0 1
v 0 1 1
f 5 6 7
";

    #[test]
    fn each_object_becomes_a_part() {
        let model = ObjModelLoader.load("test", TWO_OBJECTS.as_bytes()).unwrap();
        let parts = model.renderable_parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "first");
        // The quad face is triangulated.
        assert_eq!(parts[0].mesh.triangle_count(), 2);
        assert_eq!(parts[1].mesh.triangle_count(), 1);
        assert_eq!(parts[0].color, palette_color(0));
    }

    #[test]
    fn empty_files_are_rejected() {
        assert!(ObjModelLoader.load("empty", b"# nothing here\n").is_err());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = ObjModelLoader.load("bad", &[0xff, 0xfe]).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}
