use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use rse_formats::{CxpStore, DataPaths, GeometryBody, ModelFile};

fn main() -> Result<()> {
    env_logger::init();
    let path = env::args().nth(1).context("usage: model_dump <SOB or QOB file>")?;
    let path = Path::new(&path);

    let cxp = match DataPaths::for_model(path) {
        Some(paths) => paths
            .load_cxp()
            .with_context(|| format!("loading CXP files for {}", path.display()))?,
        None => CxpStore::default(),
    };
    let model = ModelFile::open(path, &cxp)?;

    println!(
        "{:?} model {} ({} materials, {} objects, {} CXP records)",
        model.kind(),
        path.display(),
        model.materials().len(),
        model.objects().len(),
        cxp.len()
    );

    println!("materials:");
    for (index, material) in model.materials().iter().enumerate() {
        let cxp_match = if material.cxp.is_some() { "cxp" } else { "-" };
        println!(
            "  {index:>3} {name:<32} {texture:<32} {version:<10} {cxp_match}",
            name = material.name(),
            texture = material.texture_name(),
            version = format!("{:?}", material.game_version),
        );
    }

    println!("objects:");
    for object in model.objects() {
        println!(
            "  {name:<32} {vertices:>6} vertices {meshes:>4} meshes",
            name = object.name(),
            vertices = object.vertices.len(),
            meshes = object.mesh_count()
        );
        match &object.body {
            GeometryBody::Sob(sob) => {
                for mesh in &sob.meshes {
                    println!(
                        "    {name:<30} {faces:>6} faces flags {flags:#010x}",
                        name = mesh.name.as_str(),
                        faces = mesh.face_indices.len(),
                        flags = mesh.flags.raw
                    );
                }
            }
            GeometryBody::Qob(qob) => {
                for mesh in &qob.meshes {
                    let material = mesh
                        .material()
                        .and_then(|index| model.material(index))
                        .map_or("<none>", |material| material.name());
                    println!(
                        "    {material:<30} {faces:>6} faces {texture:>6} texture vertices",
                        faces = mesh.face_count(),
                        texture = mesh.texture_vertex_count()
                    );
                }
            }
        }
    }

    let unevaluated = model.meshes_with_unevaluated_flags();
    if !unevaluated.is_empty() {
        println!("meshes with unevaluated flags:");
        for entry in unevaluated {
            println!(
                "  {}/{} raw {:#010x} unknown bits {:#010x}",
                entry.object, entry.mesh, entry.raw, entry.unevaluated_bits
            );
        }
    }
    Ok(())
}
