// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use path_clean::clean;
use std::path::{Path, PathBuf};

/// Name of the configuration file searched for when none is given.
pub const DEFAULT_CONFIG_NAME: &str = "ctally.config.yaml";

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Nearest `filename` in `dir` or any of its ancestors.
pub fn find_in_parent(dir: &Path, filename: &str) -> Option<PathBuf> {
    dir.ancestors()
        .map(|ancestor| ancestor.join(filename))
        .find(|candidate| candidate.exists())
}

/// Where the configuration comes from.
///
/// An explicit `cli_file` wins and is taken relative to `cwd`. Otherwise the nearest
/// `filename` above `cwd` is used, falling back to `config_dir`.
pub fn resolve_config_path(
    find: FindInParent,
    cwd: &Path,
    config_dir: &Path,
    filename: &str,
    cli_file: Option<&Path>,
) -> PathBuf {
    match cli_file {
        Some(file) if file.is_absolute() => file.to_path_buf(),
        Some(file) => clean(cwd.join(file)),
        None => find(cwd, filename).unwrap_or_else(|| clean(config_dir.join(filename))),
    }
}
