//! Shared helpers for locating external audio tools.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Locate `bin` on `PATH`. Names containing a separator are checked as-is.
pub(crate) fn get_from_path(bin: &str) -> Option<PathBuf> {
    if bin.contains(std::path::MAIN_SEPARATOR) || bin.contains('/') {
        let p = PathBuf::from(bin);
        return if p.exists() { Some(p) } else { None };
    }
    let paths = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&paths) {
        for candidate in candidates_in(&dir, bin) {
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

fn candidates_in(dir: &Path, bin: &str) -> Vec<PathBuf> {
    let mut out = vec![dir.join(bin)];
    if cfg!(windows) {
        out.push(dir.join(format!("{bin}.exe")));
    }
    out
}

/// Resolve a configured binary (absolute path or bare name), else the default name on `PATH`.
pub(crate) fn resolve_bin(configured: Option<&Path>, default_bin: &str) -> Option<PathBuf> {
    match configured {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => p.to_str().and_then(get_from_path),
        None => get_from_path(default_bin),
    }
}

/// Best-effort removal used when unwinding a failed call.
pub(crate) async fn discard_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(target = "duckytie", path = ?path, "Removed leftover audio file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(target = "duckytie", path = ?path, error = %e, "Failed to remove leftover audio file"),
    }
}

/// Bare program name of a resolved binary, without any `.exe` suffix.
pub(crate) fn program_name(bin: &Path) -> &str {
    bin.file_stem().and_then(|s| s.to_str()).unwrap_or("")
}
