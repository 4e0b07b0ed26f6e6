use serde::Serialize;

/// Converts an 8-bit RGB triple to the 0.0–1.0 range.
pub fn normalize_rgb(color: [u8; 3]) -> [f32; 3] {
    color.map(|channel| f32::from(channel) / 255.0)
}

/// Converts a 0.0–1.0 channel back to 0–255, rounding and clamping.
pub fn unnormalize_channel(channel: f32) -> u8 {
    // `as` saturates, so NaN lands on 0.
    (channel * 255.0).round().clamp(0.0, 255.0) as u8
}

pub fn unnormalize_rgb(color: [f32; 3]) -> [u8; 3] {
    color.map(unnormalize_channel)
}

/// Appends an opaque alpha channel.
pub fn pad_alpha(color: [f32; 3]) -> [f32; 4] {
    [color[0], color[1], color[2], 1.0]
}

/// A material color as stored on disk. Which variant appears depends on the
/// game version the material was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "encoding", content = "value", rename_all = "snake_case")]
pub enum MaterialColor {
    Rgb24([u8; 3]),
    Rgba32F([f32; 4]),
}

impl MaterialColor {
    /// RGBA in the 0.0–1.0 range; RGB24 colors get alpha 1.0.
    pub fn normalized(&self) -> [f32; 4] {
        match *self {
            MaterialColor::Rgb24(rgb) => pad_alpha(normalize_rgb(rgb)),
            MaterialColor::Rgba32F(rgba) => rgba,
        }
    }

    /// RGB in the 0–255 range; the float alpha channel is dropped.
    pub fn quantized(&self) -> [u8; 3] {
        match *self {
            MaterialColor::Rgb24(rgb) => rgb,
            MaterialColor::Rgba32F([r, g, b, _]) => unnormalize_rgb([r, g, b]),
        }
    }
}
