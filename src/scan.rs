use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use walkdir::WalkDir;

use crate::playlist::Locator;
use crate::settings::SortOrder;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp", "gif"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_directory: bool,
    pub is_hidden: bool,
}

/// Lists the direct children of one directory.
pub trait FileEnumerator: Send + Sync {
    fn list(&self, dir: &Path) -> io::Result<Vec<FileEntry>>;
}

/// Default enumerator on top of `walkdir`. Symlinks are not followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkDirEnumerator;

impl FileEnumerator for WalkDirEnumerator {
    fn list(&self, dir: &Path) -> io::Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(dir).min_depth(0).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                // The directory itself could not be read
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    tracing::debug!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(FileEntry {
                path: entry.path().to_path_buf(),
                is_directory: entry.file_type().is_dir(),
                is_hidden: name.starts_with('.'),
                name,
            });
        }
        Ok(entries)
    }
}

pub fn is_supported_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub locators: Vec<Locator>,
    pub directories: usize,
    pub failed_directories: usize,
    pub cancelled: bool,
}

/// Collects every supported image below `roots`.
///
/// Hidden files and directories are skipped, duplicates dropped and the result
/// sorted by `order`. A directory that cannot be listed is logged and skipped;
/// the scan itself never fails. `cancel` is checked between directories.
pub fn scan(
    roots: &[PathBuf],
    enumerator: &dyn FileEnumerator,
    cancel: &AtomicBool,
    order: SortOrder,
) -> ScanReport {
    let mut report = ScanReport::default();
    let mut seen = HashSet::new();
    let mut stack: Vec<PathBuf> = roots.iter().rev().cloned().collect();

    while let Some(dir) = stack.pop() {
        if cancel.load(Ordering::Relaxed) {
            tracing::info!(found = report.locators.len(), "scan cancelled");
            report.cancelled = true;
            break;
        }

        let entries = match enumerator.list(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "cannot list directory, skipping");
                report.failed_directories += 1;
                continue;
            }
        };
        report.directories += 1;

        let mut subdirs = Vec::new();
        for entry in entries {
            if entry.is_hidden {
                continue;
            }
            if entry.is_directory {
                subdirs.push(entry.path);
            } else if is_supported_image(&entry.name) {
                let locator = Locator::from_path(&entry.path);
                if seen.insert(locator.clone()) {
                    report.locators.push(locator);
                }
            }
        }
        stack.extend(subdirs.into_iter().rev());
    }

    sort_locators(&mut report.locators, order);
    tracing::debug!(
        found = report.locators.len(),
        directories = report.directories,
        failed = report.failed_directories,
        "scan finished"
    );
    report
}

pub fn sort_locators(locators: &mut [Locator], order: SortOrder) {
    match order {
        SortOrder::Lexical => locators.sort_by(|a, b| {
            a.as_str()
                .to_lowercase()
                .cmp(&b.as_str().to_lowercase())
                .then_with(|| a.cmp(b))
        }),
        SortOrder::Natural => locators.sort_by(|a, b| {
            natord::compare(&a.as_str().to_lowercase(), &b.as_str().to_lowercase())
                .then_with(|| a.cmp(b))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    fn names(report: &ScanReport, root: &Path) -> Vec<String> {
        report
            .locators
            .iter()
            .map(|l| {
                Path::new(l.as_str())
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_supported_extensions_ignore_case() {
        assert!(is_supported_image("a.JPG"));
        assert!(is_supported_image("b.WebP"));
        assert!(is_supported_image("c.gif"));
        assert!(!is_supported_image("d.tiff"));
        assert!(!is_supported_image("jpg"));
        assert!(!is_supported_image("notes.txt"));
    }

    #[test]
    fn test_scan_walks_tree_skipping_hidden() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("B.png"));
        touch(&root.join("a.jpg"));
        touch(&root.join("readme.txt"));
        touch(&root.join(".secret.jpg"));
        touch(&root.join(".cache/inner.jpg"));
        touch(&root.join("trip/day1/c.JPEG"));
        touch(&root.join("trip/d.bmp"));

        let cancel = AtomicBool::new(false);
        let report = scan(&[root.to_path_buf()], &WalkDirEnumerator, &cancel, SortOrder::Lexical);
        assert_eq!(
            names(&report, root),
            vec!["a.jpg", "B.png", "trip/d.bmp", "trip/day1/c.JPEG"]
        );
        assert!(!report.cancelled);
        assert_eq!(report.directories, 3);
    }

    #[test]
    fn test_overlapping_roots_are_deduplicated() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("x/one.png"));
        let cancel = AtomicBool::new(false);
        let report = scan(
            &[root.to_path_buf(), root.join("x")],
            &WalkDirEnumerator,
            &cancel,
            SortOrder::Lexical,
        );
        assert_eq!(report.locators.len(), 1);
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("ok.gif"));
        let cancel = AtomicBool::new(false);
        let report = scan(
            &[dir.path().join("missing"), dir.path().to_path_buf()],
            &WalkDirEnumerator,
            &cancel,
            SortOrder::Lexical,
        );
        assert_eq!(report.locators.len(), 1);
        assert_eq!(report.failed_directories, 1);
    }

    #[test]
    fn test_cancelled_scan_stops() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.jpg"));
        let cancel = AtomicBool::new(true);
        let report = scan(&[dir.path().to_path_buf()], &WalkDirEnumerator, &cancel, SortOrder::Lexical);
        assert!(report.cancelled);
        assert!(report.locators.is_empty());
    }

    struct FakeTree(HashMap<PathBuf, io::Result<Vec<FileEntry>>>);

    impl FileEnumerator for FakeTree {
        fn list(&self, dir: &Path) -> io::Result<Vec<FileEntry>> {
            match self.0.get(dir) {
                Some(Ok(entries)) => Ok(entries.clone()),
                Some(Err(e)) => Err(io::Error::new(e.kind(), e.to_string())),
                None => Err(io::Error::from(io::ErrorKind::NotFound)),
            }
        }
    }

    fn file(path: &str) -> FileEntry {
        let path = PathBuf::from(path);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        FileEntry { is_hidden: name.starts_with('.'), name, path, is_directory: false }
    }

    fn subdir(path: &str) -> FileEntry {
        FileEntry { is_directory: true, ..file(path) }
    }

    #[test]
    fn test_unreadable_subtree_does_not_abort() {
        let mut tree = HashMap::new();
        tree.insert(
            PathBuf::from("/r"),
            Ok(vec![file("/r/img10.jpg"), subdir("/r/locked"), file("/r/img9.jpg"), file("/r/img2.png")]),
        );
        tree.insert(
            PathBuf::from("/r/locked"),
            Err(io::Error::from(io::ErrorKind::PermissionDenied)),
        );
        let fake = FakeTree(tree);
        let cancel = AtomicBool::new(false);

        let report = scan(&[PathBuf::from("/r")], &fake, &cancel, SortOrder::Natural);
        let order: Vec<_> = report.locators.iter().map(|l| l.label()).collect();
        assert_eq!(order, vec!["img2.png", "img9.jpg", "img10.jpg"]);
        assert_eq!(report.failed_directories, 1);

        let report = scan(&[PathBuf::from("/r")], &fake, &cancel, SortOrder::Lexical);
        let order: Vec<_> = report.locators.iter().map(|l| l.label()).collect();
        assert_eq!(order, vec!["img10.jpg", "img2.png", "img9.jpg"]);
    }
}
