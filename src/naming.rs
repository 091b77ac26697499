//! Object-key conventions shared by every stage of manifest generation.
//!
//! Object stores have no directories, only keys. A gallery is the set of keys
//! under a prefix, and this module answers the three questions the generator
//! asks about each key:
//!
//! - Is it an image? (extension check, case-insensitive)
//! - What is its display name? (the final `/`-separated segment)
//! - Where does the manifest itself live? (`<prefix>manifest.json`)
//!
//! ## Prefixes Are Raw
//!
//! The prefix is concatenated to `manifest.json` verbatim, exactly as a listing
//! request would match it. `gallery/` yields `gallery/manifest.json`, while
//! `gallery` yields `gallerymanifest.json`. Callers that want directory-like
//! behaviour must include the trailing slash.

/// Filename of the manifest object, appended to the gallery prefix.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Extensions recognized as images. Compared without regard to case.
pub const IMAGE_EXTENSIONS: &[&str] = &["webp", "jpg", "jpeg", "png", "gif"];

/// The reserved key the manifest is written to for a given prefix.
pub fn manifest_key(prefix: &str) -> String {
    format!("{prefix}{MANIFEST_FILENAME}")
}

/// Whether a key names an image, judged by its extension.
///
/// Only the text after the last `.` counts, and only if that dot sits inside
/// the final path segment: `photos.jpg/readme` is not an image.
pub fn is_image_key(key: &str) -> bool {
    let name = file_name(key);
    match name.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known)),
        None => false,
    }
}

/// Final `/`-separated segment of a key.
///
/// - `"gallery/a.jpg"` → `"a.jpg"`
/// - `"a.jpg"` → `"a.jpg"`
/// - `"gallery/"` → `""`
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_key_appends_to_prefix() {
        assert_eq!(manifest_key("gallery/"), "gallery/manifest.json");
    }

    #[test]
    fn manifest_key_with_empty_prefix() {
        assert_eq!(manifest_key(""), "manifest.json");
    }

    #[test]
    fn manifest_key_does_not_insert_slash() {
        assert_eq!(manifest_key("gallery"), "gallerymanifest.json");
    }

    #[test]
    fn recognizes_every_extension() {
        for ext in IMAGE_EXTENSIONS {
            assert!(is_image_key(&format!("gallery/photo.{ext}")), "{ext}");
        }
    }

    #[test]
    fn extension_match_ignores_case() {
        assert!(is_image_key("gallery/a.JPG"));
        assert!(is_image_key("gallery/a.jpg"));
        assert!(is_image_key("gallery/a.WebP"));
        assert!(is_image_key("gallery/a.Jpeg"));
    }

    #[test]
    fn rejects_non_images() {
        assert!(!is_image_key("gallery/a.txt"));
        assert!(!is_image_key("gallery/manifest.json"));
        assert!(!is_image_key("gallery/a.avif"));
        assert!(!is_image_key("gallery/a.jpg.bak"));
    }

    #[test]
    fn rejects_key_without_extension() {
        assert!(!is_image_key("gallery/jpg"));
        assert!(!is_image_key("gallery/"));
        assert!(!is_image_key(""));
    }

    #[test]
    fn extension_must_be_in_final_segment() {
        assert!(!is_image_key("gallery/shots.png/notes"));
    }

    #[test]
    fn dotfile_with_image_extension_counts() {
        // Mirrors a plain suffix match: ".png" ends with ".png".
        assert!(is_image_key("gallery/.png"));
    }

    #[test]
    fn file_name_takes_last_segment() {
        assert_eq!(file_name("gallery/a.jpg"), "a.jpg");
        assert_eq!(file_name("gallery/2024/summer/b.png"), "b.png");
    }

    #[test]
    fn file_name_without_slash_is_whole_key() {
        assert_eq!(file_name("a.jpg"), "a.jpg");
    }

    #[test]
    fn file_name_of_trailing_slash_is_empty() {
        assert_eq!(file_name("gallery/"), "");
    }
}
