//! Convert SOB/QOB models into JSON (decoded model plus renderables) or
//! Wavefront OBJ.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use rse_formats::{
    CxpStore, DataPaths, ModelFile, ModelKind, RenderableArray, assemble_object,
    gather_model_files,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Export Red Storm SOB/QOB models", version)]
struct Args {
    /// Model file to convert
    #[arg(long, value_name = "PATH", conflicts_with = "root")]
    input: Option<PathBuf>,

    /// Directory scanned recursively for .sob and .qob files
    #[arg(long, value_name = "DIR", conflicts_with = "input")]
    root: Option<PathBuf>,

    /// Output file for --input, output directory for --root. Defaults to
    /// writing next to each model.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
    format: ExportFormat,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Game data directory holding texture/*.cxp. Found from each model's
    /// location when omitted.
    #[arg(long, value_name = "DIR")]
    data_root: Option<PathBuf>,

    /// Mod data directory whose CXP records take precedence
    #[arg(long, value_name = "DIR", requires = "data_root")]
    mod_root: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Json,
    Obj,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Obj => "obj",
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let shared_cxp = match &args.data_root {
        Some(data_root) => Some(
            CxpStore::load(data_root, args.mod_root.as_deref())
                .with_context(|| format!("loading CXP files from {}", data_root.display()))?,
        ),
        None => None,
    };

    if let Some(input) = &args.input {
        let output = match &args.output {
            Some(output) => output.clone(),
            None => append_extension(input, args.format),
        };
        return export_one(input, &output, &args, shared_cxp.as_ref());
    }

    let Some(root) = &args.root else {
        bail!("pass --input or --root");
    };
    let mut models = gather_model_files(root, ModelKind::Sob);
    models.extend(gather_model_files(root, ModelKind::Qob));
    models.sort();
    if models.is_empty() {
        bail!("no SOB or QOB files under {}", root.display());
    }

    let mut failed = 0usize;
    for model_path in &models {
        let output = batch_output_path(model_path, root, args.output.as_deref(), args.format);
        match export_one(model_path, &output, &args, shared_cxp.as_ref()) {
            Ok(()) => log::info!("wrote {}", output.display()),
            Err(err) => {
                failed += 1;
                log::error!("{err:#}");
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} models failed to export", models.len());
    }
    Ok(())
}

fn batch_output_path(
    model_path: &Path,
    root: &Path,
    output_dir: Option<&Path>,
    format: ExportFormat,
) -> PathBuf {
    let target = match output_dir {
        Some(dir) => dir.join(model_path.strip_prefix(root).unwrap_or(model_path)),
        None => model_path.to_path_buf(),
    };
    append_extension(&target, format)
}

/// `door.sob` becomes `door.sob.json`, so a SOB and a QOB sharing a stem do
/// not overwrite each other.
fn append_extension(path: &Path, format: ExportFormat) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

fn export_one(
    input: &Path,
    output: &Path,
    args: &Args,
    shared_cxp: Option<&CxpStore>,
) -> Result<()> {
    let discovered;
    let cxp = match shared_cxp {
        Some(cxp) => cxp,
        None => {
            discovered = match DataPaths::for_model(input) {
                Some(paths) => paths
                    .load_cxp()
                    .with_context(|| format!("loading CXP files for {}", input.display()))?,
                None => CxpStore::default(),
            };
            &discovered
        }
    };

    let model = ModelFile::open(input, cxp)?;
    let objects = model
        .objects()
        .iter()
        .map(|object| -> Result<ExportObject> {
            let renderables = assemble_object(object)
                .with_context(|| format!("assembling {} in {}", object.name(), input.display()))?;
            Ok(ExportObject {
                name: object.name().to_string(),
                renderables,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let file = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    match args.format {
        ExportFormat::Json => {
            let export = ExportModel {
                model: &model,
                objects,
            };
            if args.pretty {
                serde_json::to_writer_pretty(&mut writer, &export)?;
            } else {
                serde_json::to_writer(&mut writer, &export)?;
            }
        }
        ExportFormat::Obj => {
            let mtl_path = output.with_extension("mtl");
            let mtl_name = mtl_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            write_obj(&mut writer, &model, &objects, &mtl_name)?;

            let mtl_file = File::create(&mtl_path)
                .with_context(|| format!("creating {}", mtl_path.display()))?;
            let mut mtl_writer = BufWriter::new(mtl_file);
            write_mtl(&mut mtl_writer, &model)?;
            mtl_writer.flush()?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ExportModel<'a> {
    model: &'a ModelFile,
    objects: Vec<ExportObject>,
}

#[derive(Debug, Serialize)]
struct ExportObject {
    name: String,
    renderables: Vec<RenderableArray>,
}

fn write_mtl(writer: &mut impl Write, model: &ModelFile) -> Result<()> {
    for material in model.materials() {
        let [r, g, b, _] = material.diffuse.normalized();
        let [ar, ag, ab, _] = material.ambient.normalized();
        writeln!(writer, "newmtl {}", material.name())?;
        writeln!(writer, "Ka {ar} {ag} {ab}")?;
        writeln!(writer, "Kd {r} {g} {b}")?;
        writeln!(writer, "d {}", material.opacity)?;
        if !material.texture_name().is_empty() {
            writeln!(writer, "map_Kd {}", material.texture_name())?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_obj(
    writer: &mut impl Write,
    model: &ModelFile,
    objects: &[ExportObject],
    mtl_name: &str,
) -> Result<()> {
    writeln!(writer, "# {}", model.header_message())?;
    writeln!(writer, "mtllib {mtl_name}")?;
    // OBJ indices are 1-based and global across the file.
    let mut base = 1u32;
    for object in objects {
        writeln!(writer, "o {}", object.name)?;
        for (index, renderable) in object.renderables.iter().enumerate() {
            let material = renderable
                .material_index
                .and_then(|material| model.material(material));
            writeln!(writer, "g {}_{index}", object.name)?;
            if let Some(material) = material {
                writeln!(writer, "usemtl {}", material.name())?;
            }
            for [x, y, z] in &renderable.vertices {
                writeln!(writer, "v {x} {y} {z}")?;
            }
            for [u, v] in &renderable.uvs {
                // OBJ texture space runs bottom-up.
                writeln!(writer, "vt {u} {}", 1.0 - v)?;
            }
            for [x, y, z] in &renderable.normals {
                writeln!(writer, "vn {x} {y} {z}")?;
            }
            for triangle in &renderable.triangles {
                let [a, b, c] = triangle.map(|corner| corner + base);
                writeln!(writer, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
            }
            base += renderable.vertex_count() as u32;
        }
    }
    Ok(())
}
