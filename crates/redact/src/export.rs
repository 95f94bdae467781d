use std::{fs, io::Cursor, path::Path};

use image::{
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
    ExtendedColorType, ImageEncoder, Rgb, RgbImage, RgbaImage,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::info;

use crate::error::{RedactError, Result};

/// Output encodings; neither writes EXIF or text metadata
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    #[default]
    Png,
    #[strum(to_string = "jpeg", serialize = "jpg")]
    Jpeg,
}

impl ExportFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// 1..=100, JPEG only
    pub jpeg_quality: u8,
    /// Colour translucent pixels are composited over
    pub background: [u8; 3],
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            jpeg_quality: 92,
            background: [255, 255, 255],
        }
    }
}

/// Composite `image` over an opaque `background`, dropping the alpha channel
pub fn flatten(image: &RgbaImage, background: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        let alpha = p[3] as u32;
        let mix = |fg: u8, bg: u8| ((fg as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8;
        Rgb([
            mix(p[0], background[0]),
            mix(p[1], background[1]),
            mix(p[2], background[2]),
        ])
    })
}

/// Flatten and encode `image` into a fresh buffer
pub fn encode(image: &RgbaImage, options: &ExportOptions) -> Result<Vec<u8>> {
    if image.width() == 0 || image.height() == 0 {
        return Err(RedactError::InvalidInput("cannot export an empty image".to_string()));
    }
    let flat = flatten(image, options.background);
    let mut buffer = Cursor::new(Vec::new());
    match options.format {
        ExportFormat::Png => PngEncoder::new(&mut buffer).write_image(
            flat.as_raw(),
            flat.width(),
            flat.height(),
            ExtendedColorType::Rgb8,
        )?,
        ExportFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut buffer, options.jpeg_quality.clamp(1, 100))
                .write_image(flat.as_raw(), flat.width(), flat.height(), ExtendedColorType::Rgb8)?
        }
    }
    Ok(buffer.into_inner())
}

/// Encode and write `image` to `path`
pub fn save(image: &RgbaImage, path: &Path, options: &ExportOptions) -> Result<()> {
    let bytes = encode(image, options)?;
    fs::write(path, &bytes)?;
    info!(path = %path.display(), format = %options.format, bytes = bytes.len(), "exported image");
    Ok(())
}
