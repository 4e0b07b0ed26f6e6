use serde::Serialize;

/// Known SOB mesh geometry flag bits.
pub const GEOMETRY_FLAG_NAMES: &[(u32, &str)] = &[
    (0x0000_0001, "GF_CLIMBABLE"),
    (0x0000_0002, "GF_NOCOLLIDE2D"),
    (0x0000_0004, "GF_INVISIBLE"),
    (0x0000_0010, "GF_FLOORPOLYGON"),
    (0x0000_0020, "GF_NOCOLLIDE3D"),
];

const KNOWN_MASK: u32 = known_mask();

const fn known_mask() -> u32 {
    let mut mask = 0;
    let mut index = 0;
    while index < GEOMETRY_FLAG_NAMES.len() {
        mask |= GEOMETRY_FLAG_NAMES[index].0;
        index += 1;
    }
    mask
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvaluatedFlag {
    pub name: &'static str,
    pub set: bool,
}

/// Mesh geometry flags, split into the named bits and a marker for any bit
/// the table does not cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeometryFlags {
    pub raw: u32,
    pub evaluated: Vec<EvaluatedFlag>,
    pub unevaluated: bool,
}

impl GeometryFlags {
    pub fn from_raw(raw: u32) -> Self {
        let evaluated = GEOMETRY_FLAG_NAMES
            .iter()
            .map(|&(bit, name)| EvaluatedFlag {
                name,
                set: raw & bit != 0,
            })
            .collect();
        GeometryFlags {
            raw,
            evaluated,
            unevaluated: raw & !KNOWN_MASK != 0,
        }
    }

    /// Whether the named flag is set. Unknown names are never set.
    pub fn is_set(&self, name: &str) -> bool {
        self.evaluated
            .iter()
            .any(|flag| flag.set && flag.name == name)
    }

    pub fn unevaluated_bits(&self) -> u32 {
        self.raw & !KNOWN_MASK
    }
}
