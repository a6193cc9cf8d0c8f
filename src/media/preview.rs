use std::fs::{self, read};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use arrayvec::ArrayString;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use uuid::Uuid;
use walkdir::WalkDir;
use zune_jpeg::JpegDecoder;
use zune_jpeg::zune_core::colorspace::ColorSpace;

use crate::common::{PREVIEW_MAX_DIMENSION, STAGING_RAYON_POOL};
use crate::utils::{PathExt, clean_input_path, is_valid_image_ext};

/// A local image prepared for the collection: validated, fingerprinted,
/// with a JPEG preview written under the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub source: PathBuf,
    pub filename: String,
    pub preview: PathBuf,
    pub fingerprint: ArrayString<64>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub struct StagingFailure {
    pub source: PathBuf,
    pub message: String,
}

/// Per-file outcome of one staging run. Rejects never abort the batch.
#[derive(Debug, Default)]
pub struct StagingReport {
    pub staged: Vec<StagedFile>,
    pub failures: Vec<StagingFailure>,
}

/// Expands the given paths. Directories are walked recursively and only
/// recognized image extensions survive the walk; a plain file with a
/// foreign extension is kept so the caller can report it. Explicit file
/// arguments keep their order, walked entries are sorted.
pub fn collect_image_paths(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        let input = clean_input_path(input);
        if input.is_dir() {
            let mut walked: Vec<PathBuf> = WalkDir::new(&input)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| {
                    entry.file_type().is_file() && is_valid_image_ext(&entry.path().ext_lower())
                })
                .map(|entry| entry.path().to_path_buf())
                .collect();
            walked.sort();
            paths.extend(walked);
        } else {
            paths.push(input);
        }
    }
    paths
}

/// Decodes, fingerprints and thumbnails every input on the staging pool.
/// Individual failures land in the report; only a missing preview
/// directory is fatal.
pub fn stage_files(
    inputs: &[PathBuf],
    preview_dir: &Path,
    max_size_mb: u64,
) -> Result<StagingReport> {
    let paths = collect_image_paths(inputs);
    if paths.is_empty() {
        return Ok(StagingReport::default());
    }
    fs::create_dir_all(preview_dir)
        .context(format!("failed to create preview directory {:?}", preview_dir))?;

    let progress = ProgressBar::new(paths.len() as u64);
    progress.set_style(ProgressStyle::with_template(
        "Staging {pos}/{len} [{bar:30}] {msg}",
    )?);

    let results: Vec<(PathBuf, Result<StagedFile>)> = STAGING_RAYON_POOL.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let staged = stage_one(path, preview_dir, max_size_mb);
                progress.inc(1);
                (path.clone(), staged)
            })
            .collect()
    });
    progress.finish_and_clear();

    let mut report = StagingReport::default();
    for (path, result) in results {
        match result {
            Ok(staged) => report.staged.push(staged),
            Err(err) => {
                warn!("Skipping {:?}: {:#}", path, err);
                report.failures.push(StagingFailure {
                    source: path,
                    message: format!("{:#}", err),
                });
            }
        }
    }
    info!("Staged {} of {} files", report.staged.len(), paths.len());
    Ok(report)
}

fn stage_one(path: &Path, preview_dir: &Path, max_size_mb: u64) -> Result<StagedFile> {
    if !is_valid_image_ext(&path.ext_lower()) {
        bail!("unsupported image extension: {:?}", path);
    }
    let metadata = fs::metadata(path).context(format!("failed to stat {:?}", path))?;
    if metadata.len() > max_size_mb * 1024 * 1024 {
        bail!(
            "file is {:.1} MB, above the {} MB upload limit",
            metadata.len() as f64 / (1024.0 * 1024.0),
            max_size_mb
        );
    }

    let file_in_memory =
        read(path).context(format!("failed to read file into memory: {:?}", path))?;
    let fingerprint = content_fingerprint(&file_in_memory);

    let mut dynamic_image = decode_image(path, &file_in_memory)?;
    fix_image_orientation(&file_in_memory, &mut dynamic_image);

    let (width, height) = (dynamic_image.width(), dynamic_image.height());
    let preview = write_preview(&dynamic_image, preview_dir)?;

    Ok(StagedFile {
        source: path.to_path_buf(),
        filename: path.file_name_string(),
        preview,
        fingerprint,
        width,
        height,
    })
}

/// blake3 of the raw bytes, hex-encoded. Stored with drafts so a staged
/// source file can be checked for silent edits before publishing.
pub fn content_fingerprint(bytes: &[u8]) -> ArrayString<64> {
    let hash = blake3::hash(bytes);
    ArrayString::from(hash.to_hex().as_str()).unwrap()
}

fn decode_image(path: &Path, file_in_memory: &Vec<u8>) -> Result<DynamicImage> {
    let decoders: Vec<fn(&Vec<u8>) -> Result<DynamicImage>> = if is_jpeg(path) {
        vec![zune_jpeg_decoder, image_crate_decoder]
    } else {
        vec![image_crate_decoder]
    };

    for decoder in decoders {
        match decoder(file_in_memory) {
            Ok(decoded_image) => return Ok(decoded_image),
            Err(_) => continue,
        }
    }

    bail!("all decoders failed for file: {:?}", path);
}

fn is_jpeg(path: &Path) -> bool {
    matches!(path.ext_lower().as_str(), "jpg" | "jpeg" | "jfif" | "jpe")
}

fn zune_jpeg_decoder(file_in_memory: &Vec<u8>) -> Result<DynamicImage> {
    let mut decoder = JpegDecoder::new(file_in_memory.as_slice());
    let pixels = decoder
        .decode()
        .map_err(|err| anyhow!("zune-jpeg failed to decode: {:?}", err))?;
    let (width, height) = decoder
        .dimensions()
        .ok_or_else(|| anyhow!("zune-jpeg reported no dimensions"))?;
    match decoder.get_output_colorspace() {
        Some(ColorSpace::RGB) => RgbImage::from_raw(width as u32, height as u32, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| anyhow!("zune-jpeg RGB buffer has the wrong size")),
        Some(ColorSpace::Luma) => GrayImage::from_raw(width as u32, height as u32, pixels)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(|| anyhow!("zune-jpeg luma buffer has the wrong size")),
        other => bail!("unsupported zune-jpeg output colorspace: {:?}", other),
    }
}

fn image_crate_decoder(file_in_memory: &Vec<u8>) -> Result<DynamicImage> {
    let dynamic_image = image::load_from_memory(file_in_memory)
        .context("image crate failed to decode image from memory")?;
    Ok(dynamic_image)
}

/// Bakes the EXIF orientation into the pixels so previews match what
/// camera viewers show. Files without usable EXIF pass through.
fn fix_image_orientation(file_in_memory: &[u8], dynamic_image: &mut DynamicImage) {
    let Ok(parsed) = exif::Reader::new().read_from_container(&mut Cursor::new(file_in_memory))
    else {
        return;
    };
    let Some(field) = parsed.get_field(exif::Tag::Orientation, exif::In::PRIMARY) else {
        return;
    };
    match field.value.get_uint(0) {
        Some(3) => *dynamic_image = dynamic_image.rotate180(),
        Some(6) => *dynamic_image = dynamic_image.rotate90(),
        Some(8) => *dynamic_image = dynamic_image.rotate270(),
        _ => (),
    }
}

fn write_preview(dynamic_image: &DynamicImage, preview_dir: &Path) -> Result<PathBuf> {
    let (preview_width, preview_height) = small_width_height(
        dynamic_image.width(),
        dynamic_image.height(),
        PREVIEW_MAX_DIMENSION,
    );
    let preview_image = dynamic_image
        .thumbnail_exact(preview_width, preview_height)
        .to_rgb8();

    let preview_path = preview_dir.join(format!("{}.jpg", Uuid::new_v4()));
    preview_image
        .save_with_format(&preview_path, ImageFormat::Jpeg)
        .context(format!("failed to save JPEG preview to {:?}", preview_path))?;
    Ok(preview_path)
}

/// Scales (width, height) down so the larger side fits `max_dimension`,
/// keeping aspect ratio. Smaller images pass through unchanged.
pub fn small_width_height(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let larger = width.max(height);
    if larger <= max_dimension {
        return (width, height);
    }
    let scale = max_dimension as f64 / larger as f64;
    let scaled_width = ((width as f64 * scale).round() as u32).max(1);
    let scaled_height = ((height as f64 * scale).round() as u32).max(1);
    (scaled_width, scaled_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("altai-staging-{}-{}", name, Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let mut img = RgbImage::new(width, height);
        img.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        img.save_with_format(&path, ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn stages_valid_images_and_reports_rejects() {
        let input = temp_dir("input");
        let previews = temp_dir("previews");
        let good = write_png(&input, "good.png", 4, 4);
        let bad = input.join("notes.txt");
        fs::write(&bad, b"not an image").unwrap();

        let report = stage_files(&[good, bad.clone()], &previews, 10).unwrap();

        assert_eq!(report.staged.len(), 1);
        assert_eq!(report.failures.len(), 1);
        let staged = &report.staged[0];
        assert_eq!(staged.filename, "good.png");
        assert_eq!((staged.width, staged.height), (4, 4));
        assert_eq!(staged.fingerprint.len(), 64);
        assert!(staged.preview.exists());
        assert_eq!(report.failures[0].source, bad);

        fs::remove_dir_all(&input).unwrap();
        fs::remove_dir_all(&previews).unwrap();
    }

    #[test]
    fn directories_are_walked_for_images() {
        let input = temp_dir("walk");
        let nested = input.join("nested");
        fs::create_dir_all(&nested).unwrap();
        write_png(&nested, "b.png", 2, 2);
        write_png(&input, "a.png", 2, 2);
        fs::write(input.join("readme.md"), b"skip me").unwrap();

        let paths = collect_image_paths(&[input.clone()]);
        let names: Vec<String> = paths.iter().map(|path| path.file_name_string()).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);

        fs::remove_dir_all(&input).unwrap();
    }

    #[test]
    fn oversized_files_are_rejected() {
        let input = temp_dir("big");
        let previews = temp_dir("big-previews");
        let path = write_png(&input, "big.png", 4, 4);

        let report = stage_files(&[path], &previews, 0).unwrap();

        assert!(report.staged.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].message.contains("upload limit"));

        fs::remove_dir_all(&input).unwrap();
        fs::remove_dir_all(&previews).unwrap();
    }

    #[test]
    fn previews_shrink_to_the_size_cap() {
        assert_eq!(small_width_height(640, 480, 1280), (640, 480));
        assert_eq!(small_width_height(2560, 1440, 1280), (1280, 720));
        assert_eq!(small_width_height(1440, 2560, 1280), (720, 1280));
        assert_eq!(small_width_height(100000, 1, 1280), (1280, 1));
    }

    #[test]
    fn fingerprint_is_stable() {
        let first = content_fingerprint(b"plot bytes");
        let second = content_fingerprint(b"plot bytes");
        assert_eq!(first, second);
        assert_ne!(first, content_fingerprint(b"other bytes"));
    }
}
