//! Frame discovery.
//!
//! Builds the initial annotation table from a directory tree of extracted
//! video frames laid out as `root/<video_id>/<frame_id>.<ext>`. The frame id
//! is the numeric file stem; the parent folder name is the video id. All
//! frames of a deployment must share a single image extension.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::AnnotationRecord;

/// Recognized image file extensions (lowercase, without dots).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Errors that can occur during frame discovery.
#[derive(Error, Debug)]
pub enum DiscoverError {
    /// I/O error while walking the frame tree
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No image frames found under the root
    #[error("no image frames found under {root:?}")]
    EmptyDataset {
        /// The scanned root directory
        root: PathBuf,
    },

    /// More than one image extension in use under the root
    #[error("mixed image extensions under {root:?}: found both '.{first}' and '.{second}'")]
    MixedExtensions {
        /// The scanned root directory
        root: PathBuf,
        /// Extension seen first
        first: String,
        /// Conflicting extension
        second: String,
    },

    /// Extension lookup found no image file matching the partial name
    #[error("no image file matching '{partial}' in {dir:?}")]
    FileNotFound {
        /// Directory that was searched
        dir: PathBuf,
        /// Partial (extension-less) file name
        partial: String,
    },
}

/// Scan a frame root and build the initial annotation table.
///
/// Enumerates the subdirectories of `root` recursively (files directly in
/// `root` are ignored), collecting one default-initialized record per image
/// file. Files whose stem is not purely numeric, or whose name contains more
/// than one `.`, are skipped with a warning. Returns the records sorted by
/// `(video_id, frame_id_int)` together with the detected image extension.
pub fn scan(root: &Path) -> Result<(Vec<AnnotationRecord>, String), DiscoverError> {
    let mut records = Vec::new();
    let mut extension: Option<String> = None;

    scan_dir(root, root, &mut records, &mut extension)?;

    let Some(extension) = extension else {
        return Err(DiscoverError::EmptyDataset {
            root: root.to_path_buf(),
        });
    };
    if records.is_empty() {
        // Image files existed but every stem was malformed.
        return Err(DiscoverError::EmptyDataset {
            root: root.to_path_buf(),
        });
    }

    records.sort_by(|a, b| {
        a.video_id
            .cmp(&b.video_id)
            .then(a.frame_id_int.cmp(&b.frame_id_int))
    });

    log::info!(
        "discovered {} frames ('.{}') under {:?}",
        records.len(),
        extension,
        root
    );
    Ok((records, extension))
}

fn scan_dir(
    root: &Path,
    dir: &Path,
    records: &mut Vec<AnnotationRecord>,
    extension: &mut Option<String>,
) -> Result<(), DiscoverError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            scan_dir(root, &path, records, extension)?;
            continue;
        }
        if dir == root {
            // Frames live in per-video subfolders; loose files in the root
            // are not frames.
            continue;
        }

        let name = entry.file_name();
        let name = name.to_string_lossy();
        let Some((stem, ext)) = split_image_name(&name) else {
            continue;
        };

        match extension {
            None => *extension = Some(ext),
            Some(first) if *first != ext => {
                return Err(DiscoverError::MixedExtensions {
                    root: root.to_path_buf(),
                    first: first.clone(),
                    second: ext,
                });
            }
            Some(_) => {}
        }

        let Some(frame_id_int) = parse_frame_stem(stem) else {
            log::warn!("skipping frame with malformed name {:?}", path);
            continue;
        };

        let video_id = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        records.push(AnnotationRecord::new(video_id, stem, frame_id_int));
    }
    Ok(())
}

/// Find the extension of an image file in `dir` whose name contains
/// `partial` as a substring. The first match wins; an ambiguous multi-match
/// is not an error.
pub fn find_extension(dir: &Path, partial: &str) -> Result<String, DiscoverError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some((_, ext)) = split_image_name(&name) {
            if name.contains(partial) {
                return Ok(ext);
            }
        }
    }
    Err(DiscoverError::FileNotFound {
        dir: dir.to_path_buf(),
        partial: partial.to_string(),
    })
}

/// Split a file name into `(stem, lowercase extension)` if it carries a
/// recognized image extension.
fn split_image_name(name: &str) -> Option<(&str, String)> {
    let (stem, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    Some((stem, ext))
}

/// Parse a frame stem as its numeric id. Returns `None` for stems that are
/// empty, contain a second `.`, or are not purely numeric.
fn parse_frame_stem(stem: &str) -> Option<u64> {
    if stem.is_empty() || stem.contains('.') {
        return None;
    }
    if !stem.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    fn frame_tree(videos: &[(&str, &[&str])]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (video, frames) in videos {
            let video_dir = dir.path().join(video);
            fs::create_dir_all(&video_dir).unwrap();
            for frame in *frames {
                touch(&video_dir.join(frame));
            }
        }
        dir
    }

    #[test]
    fn test_scan_sorted_by_video_then_frame() {
        let root = frame_tree(&[
            ("video02", &["000010.png", "000002.png"]),
            ("video01", &["000500.png", "000001.png"]),
        ]);

        let (records, ext) = scan(root.path()).unwrap();
        assert_eq!(ext, "png");

        let order: Vec<(&str, u64)> = records
            .iter()
            .map(|r| (r.video_id.as_str(), r.frame_id_int))
            .collect();
        assert_eq!(
            order,
            vec![
                ("video01", 1),
                ("video01", 500),
                ("video02", 2),
                ("video02", 10),
            ]
        );
    }

    #[test]
    fn test_scan_preserves_leading_zeros() {
        let root = frame_tree(&[("v1", &["000042.jpg"])]);
        let (records, _) = scan(root.path()).unwrap();
        assert_eq!(records[0].frame_id, "000042");
        assert_eq!(records[0].frame_id_int, 42);
    }

    #[test]
    fn test_scan_ignores_root_level_files_and_non_images() {
        let root = frame_tree(&[("v1", &["1.png", "notes.txt"])]);
        touch(&root.path().join("stray.png"));

        let (records, _) = scan(root.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_scan_skips_malformed_stems() {
        let root = frame_tree(&[("v1", &["1.png", "thumb_old.png", "2.b.png"])]);
        let (records, _) = scan(root.path()).unwrap();

        let ids: Vec<u64> = records.iter().map(|r| r.frame_id_int).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_scan_case_insensitive_extensions() {
        let root = frame_tree(&[("v1", &["1.PNG", "2.png"])]);
        let (records, ext) = scan(root.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(ext, "png");
    }

    #[test]
    fn test_scan_empty_dataset() {
        let root = frame_tree(&[("v1", &["notes.txt"])]);
        let err = scan(root.path()).unwrap_err();
        assert!(matches!(err, DiscoverError::EmptyDataset { .. }));
    }

    #[test]
    fn test_scan_rejects_mixed_extensions() {
        let root = frame_tree(&[("v1", &["1.png"]), ("v2", &["1.jpg"])]);
        let err = scan(root.path()).unwrap_err();
        assert!(matches!(err, DiscoverError::MixedExtensions { .. }));
    }

    #[test]
    fn test_find_extension() {
        let root = frame_tree(&[("v1", &["000123.jpeg", "readme.md"])]);
        let ext = find_extension(&root.path().join("v1"), "000123").unwrap();
        assert_eq!(ext, "jpeg");
    }

    #[test]
    fn test_find_extension_not_found() {
        let root = frame_tree(&[("v1", &["000123.jpeg"])]);
        let err = find_extension(&root.path().join("v1"), "999").unwrap_err();
        assert!(matches!(err, DiscoverError::FileNotFound { .. }));
    }
}
