//! YaoXiang IR
//!
//! Typed intermediate representation tree and reachability-based dead code
//! elimination shared by the native, Wasm and JS backends.
//!
//! # Example
//!
//! ```no_run
//! use yxir::middle::ir::{IrArena, IrBuilder};
//! use yxir::util::config::DceConfig;
//! use yxir::{shake_modules, Result};
//!
//! fn main() -> Result<()> {
//!     let mut arena = IrArena::new();
//!     let mut b = IrBuilder::new(&mut arena);
//!     let module = b.module("app")?;
//!     let file = b.file(module, "app", "main.yx")?;
//!     b.function(file, "main")?;
//!     b.function(file, "unused")?;
//!
//!     let outcome = shake_modules(&mut arena, &DceConfig::default())?;
//!     assert_eq!(outcome.report.removed, vec!["app.unused".to_string()]);
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/yxir")]
#![warn(rust_2018_idioms)]

// Public modules
pub mod middle;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use thiserror::Error;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::middle::ir::IrArena;
use crate::middle::passes::dce::{DceOutcome, DcePass};
use crate::util::config::DceConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "YaoXiang IR (爻象)";

/// Run DCE over every module fragment in `arena`
pub fn shake_modules(
    arena: &mut IrArena,
    config: &DceConfig,
) -> Result<DceOutcome> {
    debug!("shaking {} module(s)", arena.modules().len());
    let mut pass = DcePass::new(config.clone());
    let outcome = pass.run(arena).context("Dead code elimination failed")?;
    Ok(outcome)
}

/// Load an arena serialized as JSON
pub fn load_arena(path: &Path) -> Result<IrArena> {
    debug!("loading arena from {}", path.display());
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let arena = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse IR arena: {}", path.display()))?;
    Ok(arena)
}

/// Collect the `.json` arena files under `path`
///
/// A file is returned as-is; a directory is walked recursively and its
/// files are returned in sorted order.
pub fn collect_arena_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(anyhow::anyhow!("Path does not exist: {}", path.display()));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
        let entry = entry
            .with_context(|| format!("Failed to read directory entry in {}", path.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("json")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}

/// Write an arena as pretty-printed JSON
pub fn save_arena(
    path: &Path,
    arena: &IrArena,
) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }
    let text = serde_json::to_string_pretty(arena).context("Failed to serialize IR arena")?;
    fs::write(path, text).with_context(|| format!("Failed to write file: {}", path.display()))?;
    Ok(())
}
