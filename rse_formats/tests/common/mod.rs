//! Little-endian builders for synthetic SOB/QOB files.

#![allow(dead_code)]

pub const HEADER: &str = "RSB_MODEL_START";
pub const FOOTER: &str = "RSB_MODEL_END";
pub const NO_MATERIAL: u32 = u32::MAX;

pub fn push_u32(data: &mut Vec<u8>, value: u32) {
    data.extend_from_slice(&value.to_le_bytes());
}

pub fn push_f32s(data: &mut Vec<u8>, values: &[f32]) {
    for value in values {
        data.extend_from_slice(&value.to_le_bytes());
    }
}

pub fn push_u16s(data: &mut Vec<u8>, values: &[u16]) {
    for value in values {
        data.extend_from_slice(&value.to_le_bytes());
    }
}

pub fn push_sized(data: &mut Vec<u8>, text: &str) {
    push_u32(data, sized_len(text));
    data.extend_from_slice(text.as_bytes());
    data.push(0);
}

pub fn sized_len(text: &str) -> u32 {
    text.len() as u32 + 1
}

/// Untagged material with RGB24 colors and a size matching the Rainbow Six
/// layout.
pub fn rainbow_six_material(name: &str, texture: &str) -> Vec<u8> {
    let size = 42 + sized_len(name) + sized_len(texture);
    material(size, None, name, texture, 1, false)
}

/// Tagged material with RGBA32F colors and a size matching the Rogue Spear
/// layout.
pub fn rogue_spear_material(name: &str, texture: &str) -> Vec<u8> {
    let size = 69 + sized_len(texture);
    material(size, Some(3), name, texture, 3, true)
}

pub fn material(
    size: u32,
    version: Option<u32>,
    name: &str,
    texture: &str,
    alpha_method: u32,
    float_colors: bool,
) -> Vec<u8> {
    let mut data = Vec::new();
    push_u32(&mut data, size);
    push_u32(&mut data, 0); // id
    if let Some(version) = version {
        push_sized(&mut data, "Version");
        push_u32(&mut data, version);
    }
    push_sized(&mut data, name);
    push_sized(&mut data, texture);
    push_f32s(&mut data, &[1.0, 0.0]); // opacity, emissive
    push_u32(&mut data, alpha_method);
    for _ in 0..3 {
        if float_colors {
            push_f32s(&mut data, &[0.5, 0.5, 0.5, 1.0]);
        } else {
            data.extend_from_slice(&[128, 128, 128]);
        }
    }
    push_f32s(&mut data, &[0.0]); // specular level
    data.push(0); // two sided
    data
}

/// Untagged SOB object holding one triangle in a single mesh.
pub fn triangle_sob_object(name: &str, material_index: u32, flags: u32) -> Vec<u8> {
    let mut data = Vec::new();
    push_u32(&mut data, 0); // size
    push_u32(&mut data, 1); // id
    push_sized(&mut data, name);

    push_u32(&mut data, 3);
    push_f32s(&mut data, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);

    push_u32(&mut data, 3);
    for uv in [[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]] {
        push_f32s(&mut data, &[0.0, 0.0, 1.0]);
        push_f32s(&mut data, &uv);
        push_f32s(&mut data, &[0.0]);
        data.extend_from_slice(&[255, 255, 255]);
    }

    push_u32(&mut data, 1);
    for index in 0..3 {
        push_u32(&mut data, index);
    }
    for index in 0..3 {
        push_u32(&mut data, index);
    }
    push_f32s(&mut data, &[0.0, 0.0, 1.0, 0.0]);
    push_u32(&mut data, material_index);

    push_u32(&mut data, 1);
    push_u32(&mut data, 0);
    push_sized(&mut data, &format!("{name}_mesh"));
    push_u32(&mut data, 3);
    for index in 0..3 {
        push_u32(&mut data, index);
    }
    push_u32(&mut data, 1);
    push_u32(&mut data, 0);
    push_u32(&mut data, flags);
    push_sized(&mut data, "");
    push_u32(&mut data, 0);
    data
}

/// Untagged QOB object holding a unit quad split into two faces.
pub fn quad_qob_object(name: &str, material_index: u32) -> Vec<u8> {
    let mut data = Vec::new();
    push_u32(&mut data, 0); // size
    push_u32(&mut data, 1); // id
    push_sized(&mut data, name);

    push_u32(&mut data, 4);
    push_f32s(
        &mut data,
        &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
    );

    push_u32(&mut data, 1);
    push_u32(&mut data, material_index);
    push_u32(&mut data, 2);
    push_f32s(&mut data, &[0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    push_u16s(&mut data, &[0, 1, 2, 0, 2, 3]);
    push_u16s(&mut data, &[0, 1, 2, 0, 2, 3]);
    push_u32(&mut data, 4);
    for _ in 0..4 {
        push_f32s(&mut data, &[0.0, 0.0, 1.0]);
    }
    push_f32s(&mut data, &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    for _ in 0..4 {
        push_f32s(&mut data, &[1.0, 1.0, 1.0, 1.0]);
    }
    data
}

pub fn model(materials: &[Vec<u8>], objects: &[Vec<u8>]) -> Vec<u8> {
    let mut data = Vec::new();
    push_sized(&mut data, HEADER);

    push_u32(&mut data, 0); // material list size
    push_u32(&mut data, 0);
    push_sized(&mut data, "BeginMaterialList");
    push_u32(&mut data, materials.len() as u32);
    for material in materials {
        data.extend_from_slice(material);
    }

    push_u32(&mut data, 0); // geometry list size
    push_u32(&mut data, 0);
    push_sized(&mut data, "BeginGeometryList");
    push_u32(&mut data, objects.len() as u32);
    for object in objects {
        data.extend_from_slice(object);
    }

    push_sized(&mut data, FOOTER);
    data
}
