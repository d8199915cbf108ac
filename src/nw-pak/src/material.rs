//! Texture references inside material files
//!
//! Materials (`.mtl`) are XML. Texture slots carry the texture path in a
//! `File="..."` attribute; only `.dds` and `.tif` references are real
//! textures, anything else (e.g. `$NearestCubeMap`) is resolved by the engine.

use std::path::Path;

const FILE_ATTRIBUTE: &str = "File=\"";
const TEXTURE_EXTENSION_LEN: usize = 4;

/// Texture paths referenced by a material, lowercased and de-duplicated in first-seen order
pub fn texture_references(material: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();

    for chunk in material.split(FILE_ATTRIBUTE).skip(1) {
        let Some(end) = chunk.find('"') else {
            continue;
        };
        let reference = chunk[..end].replace('\\', "/").to_lowercase();
        if !(reference.ends_with(".dds") || reference.ends_with(".tif")) {
            continue;
        }
        if !refs.contains(&reference) {
            refs.push(reference);
        }
    }

    refs
}

/// Texture index key for a reference: the reference without its extension
pub fn texture_key(reference: &str) -> Option<&str> {
    reference
        .len()
        .checked_sub(TEXTURE_EXTENSION_LEN)
        .filter(|end| *end > 0)
        .and_then(|end| reference.get(..end))
}

/// File name a referenced texture is written under: base name, `.tif` becomes `.dds`
pub fn texture_output_name(reference: &str) -> String {
    let base = base_name(reference);
    match base.strip_suffix(".tif") {
        Some(stem) => format!("{}.dds", stem),
        None => base.to_string(),
    }
}

/// File name a model entry is written under
pub fn model_output_name(model: &str) -> String {
    base_name(model).to_string()
}

/// File name a model's material is written under: the model's base name with `.mtl`
pub fn material_output_name(model: &str) -> String {
    Path::new(base_name(model))
        .with_extension("mtl")
        .to_string_lossy()
        .into_owned()
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATERIAL: &str = r#"<Material MtlFlags="524544" Shader="Illum">
 <SubMaterials>
  <Material Name="blade">
   <Textures>
    <Texture Map="Diffuse" File="Objects\Weapons\Sword\Sword_T5_diff.dds"/>
    <Texture Map="Bumpmap" File="objects/weapons/sword/sword_t5_ddna.tif"/>
    <Texture Map="Environment" File="$NearestCubeMap"/>
    <Texture Map="Specular" File="objects/weapons/sword/sword_t5_spec.dds"/>
   </Textures>
  </Material>
  <Material Name="hilt">
   <Textures>
    <Texture Map="Diffuse" File="objects/weapons/sword/sword_t5_diff.dds"/>
   </Textures>
  </Material>
 </SubMaterials>
</Material>"#;

    #[test]
    fn test_texture_references() {
        assert_eq!(
            texture_references(MATERIAL),
            vec![
                "objects/weapons/sword/sword_t5_diff.dds",
                "objects/weapons/sword/sword_t5_ddna.tif",
                "objects/weapons/sword/sword_t5_spec.dds",
            ]
        );
    }

    #[test]
    fn test_texture_references_unterminated_attribute() {
        assert!(texture_references("<Texture File=\"a.dds").is_empty());
        assert!(texture_references("").is_empty());
    }

    #[test]
    fn test_texture_key() {
        assert_eq!(
            texture_key("objects/weapons/sword/sword_t5_diff.dds"),
            Some("objects/weapons/sword/sword_t5_diff")
        );
        assert_eq!(texture_key("a.tif"), Some("a"));
        assert_eq!(texture_key("dds"), None);
    }

    #[test]
    fn test_output_names() {
        assert_eq!(
            texture_output_name("objects/weapons/sword/sword_t5_ddna.tif"),
            "sword_t5_ddna.dds"
        );
        assert_eq!(texture_output_name("a/b/c.dds"), "c.dds");
        assert_eq!(model_output_name("objects/weapons/sword/sword_t5.cgf"), "sword_t5.cgf");
        assert_eq!(material_output_name("objects/characters/chest_t2.skin"), "chest_t2.mtl");
    }
}
