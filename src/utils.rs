use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::common::{VALID_DOCUMENT_EXTENSIONS, VALID_IMAGE_EXTENSIONS};

pub trait PathExt {
    fn ext_lower(&self) -> String;
    fn file_name_string(&self) -> String;
}

impl PathExt for Path {
    fn ext_lower(&self) -> String {
        self.extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default()
    }

    fn file_name_string(&self) -> String {
        self.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub fn is_valid_image_ext(ext: &str) -> bool {
    VALID_IMAGE_EXTENSIONS.contains(&ext)
}

pub fn is_valid_document_ext(ext: &str) -> bool {
    VALID_DOCUMENT_EXTENSIONS.contains(&ext)
}

/// MIME type for an already-lowercased extension. Multipart uploads
/// need a concrete content type; the backend rejects non-image parts.
pub fn mime_for_ext(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" | "jfif" | "jpe" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "rtf" => "application/rtf",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Normalize a user-supplied path: absolute paths are cleaned, relative
/// ones resolved against the current directory first. Draft entries
/// store the result, so equality survives `./a/../a` spellings.
pub fn clean_input_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.clean()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path).clean())
            .unwrap_or_else(|_| path.clean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ext_lower_normalizes_case() {
        assert_eq!(Path::new("photo.JPG").ext_lower(), "jpg");
        assert_eq!(Path::new("scan.Tiff").ext_lower(), "tiff");
        assert_eq!(Path::new("noext").ext_lower(), "");
    }

    #[test]
    fn extension_whitelists() {
        assert!(is_valid_image_ext("webp"));
        assert!(!is_valid_image_ext("exe"));
        assert!(is_valid_document_ext("pdf"));
        assert!(!is_valid_document_ext("jpg"));
    }

    #[test]
    fn mime_for_known_and_unknown() {
        assert_eq!(mime_for_ext("jpeg"), "image/jpeg");
        assert_eq!(mime_for_ext("xlsx"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet");
        assert_eq!(mime_for_ext("bin"), "application/octet-stream");
    }

    #[test]
    fn clean_input_path_collapses_dot_segments() {
        let cleaned = clean_input_path(Path::new("/tmp/a/../b/c.jpg"));
        assert_eq!(cleaned, PathBuf::from("/tmp/b/c.jpg"));
    }
}
