//! Includes aggregation
//!
//! Rebuilds, from a scan of the bills tree, either a dedicated includes file
//! or the marked region of the main ledger file. The rebuild is a full
//! replace and is idempotent. It is not atomic: two concurrent rebuilds race
//! and the last writer wins.

use std::path::{Path, PathBuf};

use beanbills_config::{Config, IncludesTarget};
use beanbills_utils::relative_path;

use crate::error::{CoreError, CoreResult};

/// Per-bill ledger files, relative to the bills folder
pub const LEDGER_GLOB: &str = "*/*/*/*.beancount";

/// All per-bill ledger files under `bills_folder`, sorted
pub fn discover_ledgers(bills_folder: &Path) -> CoreResult<Vec<PathBuf>> {
    let root = glob::Pattern::escape(&bills_folder.to_string_lossy());
    let pattern = format!("{}/{}", root.trim_end_matches('/'), LEDGER_GLOB);

    let paths = glob::glob(&pattern).map_err(|e| CoreError::ConfigError {
        message: format!("Invalid bills folder pattern {}: {}", pattern, e),
    })?;

    let mut found = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => found.push(path),
            Ok(_) => {}
            Err(e) => log::warn!("Skipping unreadable path {}: {}", e.path().display(), e),
        }
    }
    found.sort();

    log::debug!("Discovered {} ledger files under {}", found.len(), bills_folder.display());
    Ok(found)
}

/// Beancount-quoted path
fn quote_path(path: &Path) -> String {
    let text = path.to_string_lossy();
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Regenerates the includes file or region
#[derive(Debug, Clone)]
pub struct IncludesBuilder {
    bills_folder: PathBuf,
    main_file: PathBuf,
    target: IncludesTarget,
    file: PathBuf,
    inline: bool,
    begin_marker: String,
    end_marker: String,
}

impl IncludesBuilder {
    pub fn new(config: &Config) -> Self {
        Self {
            bills_folder: config.bills.folder.clone(),
            main_file: config.bills.main_file.clone(),
            target: config.includes.target,
            file: config.includes.file.clone(),
            inline: config.includes.inline,
            begin_marker: config.includes.begin_marker.trim().to_string(),
            end_marker: config.includes.end_marker.trim().to_string(),
        }
    }

    pub fn bills_folder(&self) -> &Path {
        &self.bills_folder
    }

    /// File rewritten by `rebuild`
    pub fn target_file(&self) -> &Path {
        match self.target {
            IncludesTarget::File => &self.file,
            IncludesTarget::Region => &self.main_file,
        }
    }

    /// Include lines, or inlined ledger text, for `paths`.
    ///
    /// Include paths are relative to `base_dir` when possible.
    pub fn render(&self, paths: &[PathBuf], base_dir: &Path) -> CoreResult<String> {
        let mut blocks = Vec::with_capacity(paths.len());
        for path in paths {
            if self.inline {
                let content = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
                blocks.push(format!("{}\n", content));
            } else {
                let shown = relative_path(base_dir, path).unwrap_or_else(|| path.clone());
                blocks.push(format!("include {}", quote_path(&shown)));
            }
        }
        Ok(blocks.join("\n"))
    }

    /// Replace what lies strictly between the marker lines of `text`
    pub fn replace_region(&self, text: &str, body: &str) -> CoreResult<String> {
        let mut offset = 0;
        let mut region_start = None;
        let mut region_end = None;

        for line in text.split_inclusive('\n') {
            let content = line.trim();
            match region_start {
                None if content == self.begin_marker => region_start = Some(offset + line.len()),
                Some(_) if content == self.end_marker => {
                    region_end = Some(offset);
                    break;
                }
                _ => {}
            }
            offset += line.len();
        }

        let (start, end) = match (region_start, region_end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(CoreError::StructuralError {
                    message: format!(
                        "could not find the lines {:?} and {:?} in {}",
                        self.begin_marker,
                        self.end_marker,
                        self.main_file.display()
                    ),
                })
            }
        };

        let mut out = String::with_capacity(text.len() + body.len());
        out.push_str(&text[..start]);
        if start > 0 && !text[..start].ends_with('\n') {
            out.push('\n');
        }
        out.push_str(body);
        if !body.is_empty() && !body.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&text[end..]);
        Ok(out)
    }

    /// Rescan the bills folder and rewrite the target; returns the file written
    pub fn rebuild(&self) -> CoreResult<PathBuf> {
        let paths = discover_ledgers(&self.bills_folder)?;
        let target = self.target_file().to_path_buf();
        let base_dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let body = self.render(&paths, &base_dir)?;

        match self.target {
            IncludesTarget::File => {
                std::fs::write(&target, body).map_err(|e| CoreError::io(&target, e))?;
            }
            IncludesTarget::Region => {
                let text = std::fs::read_to_string(&target).map_err(|e| CoreError::io(&target, e))?;
                let updated = self.replace_region(&text, &body)?;
                if updated == text {
                    log::debug!("Includes region of {} already up to date", target.display());
                    return Ok(target);
                }
                std::fs::write(&target, updated).map_err(|e| CoreError::io(&target, e))?;
            }
        }

        log::info!(
            "Updated {} with {} ledger files ({})",
            target.display(),
            paths.len(),
            if self.inline { "inline" } else { "include" }
        );
        Ok(target)
    }
}

// ==================== Tests ====================
