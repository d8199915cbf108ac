//! Model, material and texture extraction for asset records
//!
//! Output layout, per record:
//! ```text
//! <output>/gltf/<item_id>/<model base name>
//! <output>/gltf/<item_id>/<model stem>.mtl
//! <output>/gltf/<item_id>/textures/<texture base name, .tif written as .dds>
//! ```

use anyhow::{Context, Result};
use nw_pak::material::{material_output_name, model_output_name};
use nw_pak::{texture_key, texture_output_name, texture_references, ClassifiedIndex};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{dedupe_by_output, index, print_report, EntryTask, Session, TextureTask};
use crate::batch::BatchReport;
use crate::paks::{entry_output_path, find_pak_files};
use crate::records::{load_records, AssetRecord};

pub const ASSETS_DIR: &str = "gltf";
pub const TEXTURES_DIR: &str = "textures";

/// Model and material extraction tasks for every record
pub fn plan_models(index: &ClassifiedIndex, records: &[AssetRecord], root: &Path) -> Vec<EntryTask> {
    let mut tasks = Vec::new();

    for record in records {
        let item_dir = entry_output_path(root, &record.item_id);

        for skin in &record.skins {
            if let Some(model) = skin.model() {
                match index.model(model) {
                    Some(header) => tasks.push(EntryTask {
                        header: header.clone(),
                        output: item_dir.join(model_output_name(&header.file_name)),
                    }),
                    None => tracing::debug!("{}: model {} not in index", record.item_id, model),
                }
            }

            if let Some(material) = skin.material() {
                // Named after the model so the pair sits side by side
                let name = material_output_name(&skin.model().unwrap_or(material).to_lowercase());
                match index.material(material) {
                    Some(header) => tasks.push(EntryTask {
                        header: header.clone(),
                        output: item_dir.join(name),
                    }),
                    None => tracing::debug!("{}: material {} not in index", record.item_id, material),
                }
            }
        }
    }

    dedupe_by_output(tasks, |t| &t.output)
}

/// Texture extraction tasks for every material file under `root`
pub fn plan_textures(index: &ClassifiedIndex, root: &Path) -> Result<Vec<TextureTask>> {
    let mut tasks = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let is_material = entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some("mtl");
        if !is_material {
            continue;
        }

        let text = std::fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        let texture_dir = entry
            .path()
            .parent()
            .unwrap_or(root)
            .join(TEXTURES_DIR);

        for reference in texture_references(&String::from_utf8_lossy(&text)) {
            let group = texture_key(&reference).and_then(|key| index.texture(key));
            match group {
                Some(group) => tasks.push(TextureTask {
                    group: group.to_vec(),
                    output: texture_dir.join(texture_output_name(&reference)),
                }),
                None => tracing::debug!(
                    "{}: texture {} not in index",
                    entry.path().display(),
                    reference
                ),
            }
        }
    }

    Ok(dedupe_by_output(tasks, |t| &t.output))
}

/// Extract models and materials, then the textures their materials reference
pub fn extract(
    session: &Session,
    index: &ClassifiedIndex,
    records: &[AssetRecord],
    output: &Path,
) -> Result<BatchReport> {
    let root = assets_dir(output);

    let models = plan_models(index, records, &root);
    tracing::info!("Extracting {} models and materials for {} records", models.len(), records.len());
    let mut report = session.batch("models")?.run(&models, |task| {
        session.extractor.extract_to(&task.header, &task.output)?;
        Ok(())
    });

    let textures = plan_textures(index, &root)?;
    tracing::info!("Extracting {} textures", textures.len());
    report.merge(session.batch("textures")?.run(&textures, |task| {
        session.extractor.extract_texture_to(&task.group, &task.output)?;
        Ok(())
    }));

    Ok(report)
}

/// `assets` command: index, extract, then remove the persisted index
pub fn run(session: &Session, input: &Path, records: &Path, output: &Path) -> Result<()> {
    let records = load_records(records)?;
    let paks = find_pak_files(input)?;

    let index = index::build(&paks, output)?;
    let report = extract(session, &index, &records, output)?;
    index::remove(output)?;

    print_report("Extract assets", &report);
    Ok(())
}

pub(crate) fn assets_dir(output: &Path) -> PathBuf {
    output.join(ASSETS_DIR)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{session, texture_bytes, write_pak};
    use super::*;
    use crate::records::Skin;

    const SWORD_MTL: &str = r#"<Material>
 <Textures>
  <Texture Map="Diffuse" File="objects/weapons/sword_diff.dds"/>
  <Texture Map="Bumpmap" File="Objects\Weapons\Sword_ddna.tif"/>
  <Texture Map="Custom" File="objects/weapons/missing.dds"/>
 </Textures>
</Material>"#;

    fn sword_record() -> AssetRecord {
        AssetRecord {
            item_id: "1hSwordT5".to_string(),
            skins: vec![Skin {
                model: "Objects/Weapons/Sword.cgf".to_string(),
                material: "objects/weapons/sword_t5.mtl".to_string(),
            }],
        }
    }

    fn sword_pak(dir: &Path, primary: &[u8], secondary: &[u8]) -> PathBuf {
        write_pak(
            &dir.join("paks/assets.pak"),
            &[
                ("objects/weapons/sword.cgf", b"cgf bytes"),
                ("objects/weapons/sword_t5.mtl", SWORD_MTL.as_bytes()),
                ("objects/weapons/sword_diff.dds", primary),
                ("objects/weapons/sword_diff.dds.1", secondary),
                ("objects/weapons/sword_ddna.tif", b"normal map"),
            ],
        )
    }

    #[test]
    fn test_extract_assets() {
        let dir = tempfile::tempdir().unwrap();
        let primary = texture_bytes(0x11, 0x100);
        let secondary = vec![0x22u8; 0x40];
        let pak = sword_pak(dir.path(), &primary, &secondary);
        let out = dir.path().join("out");

        let index = nw_pak::build_index(&[pak]).unwrap();
        let report = extract(&session(), &index, &[sword_record()], &out).unwrap();
        assert_eq!(report.succeeded, 4);
        assert!(report.is_clean());

        let item = assets_dir(&out).join("1hSwordT5");
        assert_eq!(std::fs::read(item.join("sword.cgf")).unwrap(), b"cgf bytes");
        assert_eq!(std::fs::read_to_string(item.join("sword.mtl")).unwrap(), SWORD_MTL);
        assert_eq!(std::fs::read(item.join("textures/sword_ddna.dds")).unwrap(), b"normal map");

        let merged = std::fs::read(item.join("textures/sword_diff.dds")).unwrap();
        assert_eq!(merged.len(), 0x94 + secondary.len());
        assert_eq!(merged[0x1c], 0);
        assert_eq!(&merged[..0x1c], &primary[..0x1c]);
        assert_eq!(&merged[0x94..], secondary.as_slice());
    }

    #[test]
    fn test_plan_skips_missing_entries() {
        let index = ClassifiedIndex::default();
        let records = vec![sword_record()];
        assert!(plan_models(&index, &records, Path::new("/out/gltf")).is_empty());
    }

    #[test]
    fn test_plan_material_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let pak = sword_pak(dir.path(), &texture_bytes(0, 0x94), b"");
        let index = nw_pak::build_index(&[pak]).unwrap();

        let record = AssetRecord {
            item_id: "ShieldT1".to_string(),
            skins: vec![Skin {
                model: String::new(),
                material: "objects/weapons/sword_t5.mtl".to_string(),
            }],
        };
        let tasks = plan_models(&index, &[record], Path::new("/out/gltf"));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].output, PathBuf::from("/out/gltf/ShieldT1/sword_t5.mtl"));
    }

    #[test]
    fn test_short_primary_fails_only_that_texture() {
        let dir = tempfile::tempdir().unwrap();
        let pak = sword_pak(dir.path(), b"too short", b"mips");
        let out = dir.path().join("out");

        let index = nw_pak::build_index(&[pak]).unwrap();
        let report = extract(&session(), &index, &[sword_record()], &out).unwrap();
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "objects/weapons/sword_diff.dds");
    }

    #[test]
    fn test_run_removes_index() {
        let dir = tempfile::tempdir().unwrap();
        sword_pak(dir.path(), &texture_bytes(1, 0x94), b"");
        let records = dir.path().join("records.json");
        std::fs::write(&records, serde_json::to_string(&vec![sword_record()]).unwrap()).unwrap();
        let out = dir.path().join("out");

        run(&session(), &dir.path().join("paks"), &records, &out).unwrap();
        assert!(!index::index_dir(&out).join("textures.json").exists());
        assert!(assets_dir(&out).join("1hSwordT5/sword.cgf").exists());
    }
}
