//! Writing generated images (and their parameters) to disk.

use crate::error::{GenerationError, Result};
use crate::generator::GenerationConfig;
use crate::normalize::OutputImage;
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Highest JPEG quality, used when nothing else is configured.
pub const DEFAULT_QUALITY: u8 = 100;

/// Create `dir` and any missing parents.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| GenerationError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Default output path: `<dir>/<canonical name>.<extension>`.
pub fn output_path(dir: &Path, config: &GenerationConfig, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", config.describe(), extension))
}

/// Encode `image` to `path`, creating the parent directory first.
///
/// `.jpg`/`.jpeg` are written with the given JPEG `quality` (1-100); any
/// other extension uses the format it implies.
pub fn write_image(image: &OutputImage, path: &Path, quality: u8) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let color = match image.channels() {
        1 => ColorType::L8,
        _ => ColorType::Rgb8,
    };
    let bytes = image.as_bytes();
    let (width, height) = (image.width(), image.height());
    let encode_err = |source| GenerationError::Encode {
        path: path.to_path_buf(),
        source,
    };
    let io_err = |source| GenerationError::Io {
        path: path.to_path_buf(),
        source,
    };

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => {
            let file = File::create(path).map_err(io_err)?;
            let mut writer = BufWriter::new(file);
            JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100))
                .encode(&bytes, width, height, color)
                .map_err(encode_err)?;
            writer.flush().map_err(io_err)
        }
        _ => image::save_buffer(path, &bytes, width, height, color).map_err(encode_err),
    }
}

/// Write `config` as pretty JSON to `path`.
pub fn write_params(config: &GenerationConfig, path: &Path) -> Result<()> {
    let io_err = |source| GenerationError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, config).map_err(|e| io_err(e.into()))?;
    writer.flush().map_err(io_err)
}
