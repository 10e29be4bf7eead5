use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{AblistError, Result};
use crate::util::to_forward_slashes;

const ATLAS_SUFFIX: &str = ".atlas";
const SKEL_SUFFIX: &str = ".skel";
const PREFAB_SUFFIX: &str = ".prefab";
const BOOK_SUFFIX: &str = ".book.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// `spine.txt` (atlas stems resolved to .skel or .prefab) and `memory.txt`.
    Bundle,
    /// `binary_spine.txt`, `json_spine.txt` and `event.txt`.
    Split,
}

/// Dot-files and dot-directories below the root are never listed.
fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Every visible file under `root` whose name ends with `suffix`, relative to `root`.
pub fn scan(root: &Path, suffix: &str) -> Result<Vec<String>> {
    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let context = format!("failed to walk {}", root.display());
            AblistError::filesystem(context, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !entry.file_name().to_string_lossy().ends_with(suffix) {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            found.push(to_forward_slashes(relative));
        }
    }
    found.sort();
    debug!("list: {} files matching *{suffix}", found.len());
    Ok(found)
}

/// Atlas stems paired with whichever skeleton format ships next to them.
pub fn spine_listing(root: &Path) -> Result<Vec<String>> {
    let atlases = scan(root, ATLAS_SUFFIX)?;
    Ok(atlases
        .iter()
        .filter_map(|atlas| atlas.strip_suffix(ATLAS_SUFFIX))
        .map(|stem| {
            let binary = root.join(format!("{stem}{SKEL_SUFFIX}"));
            if binary.is_file() {
                format!("{stem}{SKEL_SUFFIX}")
            } else {
                format!("{stem}{PREFAB_SUFFIX}")
            }
        })
        .collect())
}

pub fn write_listing(path: &Path, lines: &[String]) -> Result<()> {
    let mut body = String::new();
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    fs::write(path, body)
        .map_err(|e| AblistError::filesystem(format!("failed to write {}", path.display()), e))
}

/// Write every listing of `preset` into `root`, returning the files written.
pub fn generate(root: &Path, preset: Preset) -> Result<Vec<PathBuf>> {
    let listings = match preset {
        Preset::Bundle => vec![
            ("spine.txt", spine_listing(root)?),
            ("memory.txt", scan(root, BOOK_SUFFIX)?),
        ],
        Preset::Split => vec![
            ("binary_spine.txt", scan(root, SKEL_SUFFIX)?),
            ("json_spine.txt", scan(root, PREFAB_SUFFIX)?),
            ("event.txt", scan(root, BOOK_SUFFIX)?),
        ],
    };

    let mut written = Vec::with_capacity(listings.len());
    for (name, lines) in listings {
        let path = root.join(name);
        write_listing(&path, &lines)?;
        info!("list: wrote {} entries to {}", lines.len(), path.display());
        written.push(path);
    }
    Ok(written)
}
