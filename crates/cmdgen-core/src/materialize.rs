//! Script materializer: writes classified script output under a
//! date-partitioned output directory with a non-colliding, human-meaningful
//! filename.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::error::Error;
use crate::label::derive_label;
use crate::mode::Mode;

/// Saves `content` to `output_dir/<YYYYMMDD>/<label><ext>` and returns the
/// final path. Existing files are never overwritten; collisions get `_1`,
/// `_2`, ... suffixes. Shell-family modes get the execute bits added.
pub fn save_script(
    content: &str,
    output_dir: &Path,
    mode: Mode,
    label: &str,
) -> Result<PathBuf, Error> {
    let folder = output_dir.join(Utc::now().format("%Y%m%d").to_string());
    fs::create_dir_all(&folder)?;

    let label = derive_label(label, content, mode);
    let ext = mode.extension();
    let path = next_free_path(&folder, &label, ext);

    fs::write(&path, content)?;
    if mode.is_shell() {
        make_executable(&path)?;
    }
    debug!("saved script to {}", path.display());
    Ok(path)
}

fn next_free_path(folder: &Path, label: &str, ext: &str) -> PathBuf {
    let mut idx = 0u32;
    loop {
        let name = if idx == 0 {
            format!("{label}{ext}")
        } else {
            format!("{label}_{idx}{ext}")
        };
        let candidate = folder.join(name);
        if !candidate.exists() {
            return candidate;
        }
        idx += 1;
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), Error> {
    Ok(())
}
