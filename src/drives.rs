//! Camera storage discovery.
//!
//! Without explicit `--source` arguments the tool looks for mounted volumes
//! that have a `DCIM` directory (the DCF layout every camera writes):
//!
//! | Platform | Candidates |
//! |----------|------------|
//! | Windows | drive roots `C:\` through `Z:\` |
//! | macOS | entries of `/Volumes` |
//! | other Unix | entries of `/media/$USER`, `/run/media/$USER`, `/media`, `/mnt` |
//!
//! The volume holding the material root is never a candidate: indexing the
//! destination as a source would offer the material tree its own files.

use std::path::{Component, Path, PathBuf, Prefix};

/// Turn a `--source` token into a path. A lone drive letter (`e`, `E`)
/// becomes `E:\` on Windows; everything else is taken as a path.
pub fn normalize_source(token: &str) -> PathBuf {
    let mut chars = token.chars();
    if let (Some(letter), None) = (chars.next(), chars.next())
        && letter.is_ascii_alphabetic()
        && cfg!(windows)
    {
        return PathBuf::from(format!("{}:\\", letter.to_ascii_uppercase()));
    }
    PathBuf::from(token)
}

/// Mount points worth checking on this platform.
pub fn candidate_roots() -> Vec<PathBuf> {
    if cfg!(windows) {
        return (b'C'..=b'Z')
            .map(|l| PathBuf::from(format!("{}:\\", l as char)))
            .collect();
    }

    let parents: Vec<PathBuf> = if cfg!(target_os = "macos") {
        vec![PathBuf::from("/Volumes")]
    } else {
        let mut parents = Vec::new();
        if let Ok(user) = std::env::var("USER") {
            parents.push(Path::new("/media").join(&user));
            parents.push(Path::new("/run/media").join(&user));
        }
        parents.push(PathBuf::from("/media"));
        parents.push(PathBuf::from("/mnt"));
        parents
    };

    let mut roots = Vec::new();
    for parent in parents {
        let Ok(entries) = std::fs::read_dir(&parent) else {
            continue;
        };
        let mut children: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        children.sort();
        for child in children {
            if !roots.contains(&child) {
                roots.push(child);
            }
        }
    }
    roots
}

/// Keep the candidates that look like camera storage and do not hold the
/// material root.
pub fn discover_camera_roots(
    candidates: &[PathBuf],
    material_root: &Path,
    camera_dir: &str,
) -> Vec<PathBuf> {
    candidates
        .iter()
        .filter(|root| {
            if on_volume(material_root, root) {
                log::debug!("skipping {}: holds the material root", root.display());
                return false;
            }
            root.join(camera_dir).is_dir()
        })
        .cloned()
        .collect()
}

/// The directory to index on a camera root, if the camera layout is there.
pub fn camera_scan_dir(root: &Path, camera_dir: &str) -> Option<PathBuf> {
    let dir = root.join(camera_dir);
    dir.is_dir().then_some(dir)
}

/// True when `path` lives on the volume rooted at `root`.
///
/// Drive-letter paths compare by letter, so `\\?\C:\photos` is on `C:\`.
fn on_volume(path: &Path, root: &Path) -> bool {
    match (drive_letter(path), drive_letter(root)) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(&b),
        _ => path.starts_with(root),
    }
}

fn drive_letter(path: &Path) -> Option<u8> {
    match path.components().next()? {
        Component::Prefix(prefix) => match prefix.kind() {
            Prefix::Disk(letter) | Prefix::VerbatimDisk(letter) => Some(letter),
            _ => None,
        },
        _ => None,
    }
}
