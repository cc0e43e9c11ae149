//! Locate and load dotenv files.
//!
//! Relative paths are searched for under the application directory and the
//! current working directory, optionally walking up parent directories.
//! [`load_into_process`] additionally writes the result into the process
//! environment.

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::Error;
use crate::env::EnvMap;
use crate::parser::parse_reader_with_encoding;
use crate::source::Encoding;

/// Callback receiving debug trace lines.
pub type DebugLogger = Arc<dyn Fn(&str) + Send + Sync>;

/// Options for [`load`] and [`load_into_process`].
#[derive(Clone)]
pub struct LoadOptions {
    path: PathBuf,
    encoding: Encoding,
    overwrite: bool,
    ignore_missing: bool,
    debug: bool,
    debug_logger: Option<DebugLogger>,
    search_depth: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".env"),
            encoding: Encoding::Utf8,
            overwrite: false,
            ignore_missing: false,
            debug: false,
            debug_logger: None,
            search_depth: 1,
        }
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("path", &self.path)
            .field("encoding", &self.encoding)
            .field("overwrite", &self.overwrite)
            .field("ignore_missing", &self.ignore_missing)
            .field("debug", &self.debug)
            .field("debug_logger", &self.debug_logger.is_some())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

impl LoadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File to load. Default: `.env`.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub const fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Replace variables that are already set in the process environment.
    #[must_use]
    pub const fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Treat a missing file as an empty one.
    #[must_use]
    pub const fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = ignore;
        self
    }

    /// Send trace lines to the debug logger.
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn debug_logger(mut self, logger: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.debug_logger = Some(Arc::new(logger));
        self
    }

    /// Directories to try per base directory, the base itself included.
    #[must_use]
    pub const fn search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth;
        self
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn file_encoding(&self) -> Encoding {
        self.encoding
    }

    #[must_use]
    pub const fn overwrites(&self) -> bool {
        self.overwrite
    }

    fn trace(&self, line: &str) {
        debug!("{line}");
        if self.debug
            && let Some(logger) = &self.debug_logger
        {
            logger(line);
        }
    }
}

/// Base directories searched for relative paths: the directory of the
/// running executable, then the current working directory.
#[must_use]
pub fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(dir);
    }
    if let Ok(cwd) = std::env::current_dir()
        && !dirs.contains(&cwd)
    {
        dirs.push(cwd);
    }
    dirs
}

/// Resolve `path` to an existing file.
///
/// Absolute paths are returned unchanged. Otherwise `path` is joined to each
/// base directory and looked up there and in up to `depth - 1` parents.
///
/// # Errors
///
/// Returns `Error::NotFound` listing every directory searched.
pub fn find_env_file(path: &Path, base_dirs: &[PathBuf], depth: usize) -> Result<PathBuf, Error> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let not_found = |searched| Error::NotFound {
        path: path.to_path_buf(),
        searched,
    };

    let Some(file_name) = path.file_name() else {
        return Err(not_found(Vec::new()));
    };
    let relative_dir = path.parent().unwrap_or_else(|| Path::new(""));

    let mut searched = Vec::new();
    let mut seen = HashSet::new();

    for base in base_dirs {
        let start = if relative_dir.as_os_str().is_empty() {
            base.clone()
        } else {
            base.join(relative_dir)
        };
        if !seen.insert(start.clone()) {
            continue;
        }

        let mut dir = Some(start.as_path());
        for _ in 0..depth {
            let Some(current) = dir else {
                break;
            };
            searched.push(current.to_path_buf());
            let candidate = current.join(file_name);
            if candidate.is_file() {
                return Ok(candidate);
            }
            dir = current.parent();
        }
    }

    Err(not_found(searched))
}

/// Parse the file at `path` without any searching.
///
/// # Errors
///
/// Returns `Error::Io` when the file cannot be read, otherwise as
/// [`parse_reader_with_encoding`].
pub fn parse_file(path: impl AsRef<Path>, encoding: Encoding) -> Result<EnvMap, Error> {
    let file = File::open(path)?;
    parse_reader_with_encoding(file, encoding)
}

/// Locate and parse the file described by `options`.
///
/// # Errors
///
/// Returns `Error::NotFound` for a missing file unless
/// [`LoadOptions::ignore_missing`] is set, and any read or parse error.
pub fn load(options: &LoadOptions) -> Result<EnvMap, Error> {
    load_from(options, &default_search_dirs())
}

/// [`load`] with explicit base directories.
///
/// # Errors
///
/// As [`load`].
pub fn load_from(options: &LoadOptions, base_dirs: &[PathBuf]) -> Result<EnvMap, Error> {
    let path = match find_env_file(&options.path, base_dirs, options.search_depth) {
        Ok(path) => path,
        Err(err @ Error::NotFound { .. }) if options.ignore_missing => {
            options.trace(&format!("Ignoring missing env file: {err}"));
            return Ok(EnvMap::new());
        }
        Err(err) => return Err(err),
    };

    options.trace(&format!("Loading env file: {}", path.display()));

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound && options.ignore_missing => {
            options.trace(&format!(
                "Ignoring missing env file: {}: {err}",
                path.display()
            ));
            return Ok(EnvMap::new());
        }
        Err(err) => return Err(err.into()),
    };

    let env = parse_reader_with_encoding(file, options.encoding)?;
    options.trace(&format!(
        "Loaded {} variable(s) from {}",
        env.len(),
        path.display()
    ));
    Ok(env)
}

/// Load as [`load`] and write the variables into the process environment.
///
/// # Safety
///
/// Mutates the process environment; see [`EnvMap::apply_to_process`].
///
/// # Errors
///
/// As [`load`]; nothing is written when loading fails.
pub unsafe fn load_into_process(options: &LoadOptions) -> Result<EnvMap, Error> {
    let env = load(options)?;
    // SAFETY: upheld by the caller.
    let report = unsafe { env.apply_to_process(options.overwrite) };
    options.trace(&format!(
        "Applied {} variable(s), kept {} existing",
        report.applied, report.skipped_existing
    ));
    Ok(env)
}
