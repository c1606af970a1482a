//! JSON configuration loading.
//!
//! A config file names input modules and the ctor/dtor/all pattern lists:
//!
//! ```json
//! {
//!   "files": ["../out/CCScheduler.ll"],
//!   "patterns": { "ctor": "cocos2d::**::{this.stem}", "all": ["x::y::Z"] }
//! }
//! ```
//!
//! `files` entries resolve relative to the config file's directory and must
//! be regular files. `patterns` may be a single string, an array, or an
//! object with optional `ctor`/`dtor`/`all` members, each a string or an
//! array. Patterns compile with the config file's property cache in scope,
//! so `{this.*}` resolves against the config path. Shape mismatches are
//! fatal in strict mode and skipped with a warning in permissive mode.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use super::error::{PatternError, PatternResult};
use super::file_props::FilePropertyCache;
use super::matcher::SymbolMatcher;
use super::pattern::PatternNode;

impl<'arena> SymbolMatcher<'arena> {
    /// Loads symbol patterns (and optionally input file paths) from a JSON
    /// config file. Re-loading is disallowed.
    pub fn load_config(
        &mut self,
        config_file: &Path,
        out_files: Option<&mut Vec<PathBuf>>,
    ) -> PatternResult<()> {
        if let Some(previous) = self.config_path() {
            return Err(PatternError::ConfigReload {
                path: previous.display().to_string(),
            });
        }

        let config_file = absolute_path(config_file);
        let display = config_file.display().to_string();

        let text = fs::read_to_string(&config_file).map_err(|source| PatternError::ConfigIo {
            path: display.clone(),
            source,
        })?;
        let json: Value =
            serde_json::from_str(&text).map_err(|source| PatternError::ConfigJson {
                path: display.clone(),
                source,
            })?;

        let mut loader = ConfigLoader {
            matcher: self,
            path: display,
            dir: config_file.parent().map(Path::to_path_buf).unwrap_or_default(),
            this: FilePropertyCache::new(config_file.display().to_string()),
        };
        loader.load(&json, out_files)?;

        self.set_config_path(config_file);
        Ok(())
    }
}

struct ConfigLoader<'m, 'arena> {
    matcher: &'m mut SymbolMatcher<'arena>,
    /// Display path of the config, for diagnostics.
    path: String,
    /// Directory file entries resolve against.
    dir: PathBuf,
    /// Property cache of the config path, for `{this.*}`.
    this: FilePropertyCache,
}

impl<'arena> ConfigLoader<'_, 'arena> {
    fn load(
        &mut self,
        json: &Value,
        out_files: Option<&mut Vec<PathBuf>>,
    ) -> PatternResult<()> {
        let Some(root) = json.as_object() else {
            return Err(self.report("root node is not an object"));
        };

        if let Some(out_files) = out_files {
            match root.get("files") {
                Some(Value::Array(files)) => self.load_file_paths(files, out_files)?,
                Some(Value::String(file)) => self.load_file_path(file, out_files)?,
                _ => {
                    let err = self.report("'files' does not exist or is not an array");
                    if !self.matcher.permissive() {
                        return Err(err);
                    }
                    log::warn!("{err}");
                }
            }
        }

        match root.get("patterns") {
            Some(Value::Object(patterns)) => self.load_pattern_object(patterns),
            Some(Value::Array(patterns)) => self.load_pattern_array(patterns),
            Some(Value::String(pattern)) => {
                let node = self.compile(pattern)?;
                self.matcher.insert_ctor(node);
                self.matcher.insert_dtor(node);
                Ok(())
            }
            _ => {
                let err =
                    self.report("'patterns' does not exist or is not an object/array/string");
                if !self.matcher.permissive() {
                    return Err(err);
                }
                log::warn!("{err}");
                Ok(())
            }
        }
    }

    /// Resolves one `files` entry and appends it when it is a regular file.
    fn load_file_path(
        &self,
        filename: &str,
        out_files: &mut Vec<PathBuf>,
    ) -> PatternResult<()> {
        let resolved = normalize_dots(&self.dir.join(filename));
        let is_file = fs::metadata(&resolved).map(|m| m.is_file()).unwrap_or(false);
        if is_file {
            out_files.push(resolved);
            return Ok(());
        }
        let err = self.report(&format!("file \"{filename}\" is not a regular file"));
        if self.matcher.permissive() {
            log::warn!("{err}");
            return Ok(());
        }
        Err(err)
    }

    fn load_file_paths(
        &self,
        files: &[Value],
        out_files: &mut Vec<PathBuf>,
    ) -> PatternResult<()> {
        for file in files {
            let Some(filename) = file.as_str() else {
                if self.matcher.permissive() {
                    log::warn!("{}", self.report("filename is not a string"));
                    continue;
                }
                return Err(self.report("filename is not a string"));
            };
            self.load_file_path(filename, out_files)?;
        }
        Ok(())
    }

    /// `patterns` as an object: `ctor` ∪ `all` and `dtor` ∪ `all`.
    fn load_pattern_object(
        &mut self,
        patterns: &serde_json::Map<String, Value>,
    ) -> PatternResult<()> {
        let ctors = self.load_subpatterns(patterns, "ctor")?;
        let dtors = self.load_subpatterns(patterns, "dtor")?;
        let all = self.load_subpatterns(patterns, "all")?;

        if ctors.is_empty() && dtors.is_empty() && all.is_empty() {
            return Err(PatternError::ConfigMissingPatterns {
                path: self.path.clone(),
            });
        }

        for node in ctors.iter().chain(all.iter()).copied() {
            self.matcher.insert_ctor(node);
        }
        for node in dtors.iter().chain(all.iter()).copied() {
            self.matcher.insert_dtor(node);
        }
        Ok(())
    }

    /// `patterns` as an array: every entry feeds both sets.
    fn load_pattern_array(&mut self, patterns: &[Value]) -> PatternResult<()> {
        for pattern in patterns {
            let Some(pattern) = pattern.as_str() else {
                if self.matcher.permissive() {
                    log::warn!("{}", self.report("pattern is not a string"));
                    continue;
                }
                return Err(self.report("pattern is not a string"));
            };
            match self.compile(pattern) {
                Ok(node) => {
                    self.matcher.insert_ctor(node);
                    self.matcher.insert_dtor(node);
                }
                Err(err) => {
                    if !self.matcher.permissive() {
                        return Err(err);
                    }
                    log::warn!("skipping pattern '{pattern}': {err}");
                }
            }
        }
        Ok(())
    }

    /// Loads one of the `ctor`/`dtor`/`all` members.
    fn load_subpatterns(
        &mut self,
        patterns: &serde_json::Map<String, Value>,
        name: &str,
    ) -> PatternResult<Vec<&'arena PatternNode<'arena>>> {
        let mut out = Vec::new();
        match patterns.get(name) {
            None => {}
            Some(Value::Array(list)) => {
                for pattern in list {
                    let Some(pattern) = pattern.as_str() else {
                        if self.matcher.permissive() {
                            log::warn!("{}", self.report("pattern is not a string"));
                            continue;
                        }
                        return Err(self.report("pattern is not a string"));
                    };
                    match self.compile(pattern) {
                        Ok(node) => out.push(node),
                        Err(err) => {
                            if !self.matcher.permissive() {
                                return Err(err);
                            }
                            log::warn!("skipping pattern '{pattern}': {err}");
                        }
                    }
                }
            }
            Some(Value::String(pattern)) => match self.compile(pattern) {
                Ok(node) => out.push(node),
                Err(err) => {
                    if !self.matcher.permissive() {
                        return Err(err);
                    }
                    log::warn!("skipping pattern '{pattern}': {err}");
                }
            },
            Some(_) => {
                let err = self.report(&format!("field \"{name}\" is not an array or string"));
                if !self.matcher.permissive() {
                    return Err(err);
                }
                log::warn!("{err}");
            }
        }
        Ok(out)
    }

    fn compile(&mut self, pattern: &str) -> PatternResult<&'arena PatternNode<'arena>> {
        self.matcher
            .compile_pattern_with(pattern, Some(&mut self.this))
    }

    fn report(&self, detail: &str) -> PatternError {
        PatternError::ConfigShape {
            path: self.path.clone(),
            detail: detail.to_string(),
        }
    }
}

/// Makes a path absolute against the current directory, without touching
/// the filesystem.
fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_dots(path)
    } else {
        let base = std::env::current_dir().unwrap_or_default();
        normalize_dots(&base.join(path))
    }
}

/// Removes `.` components and resolves `..` lexically.
fn normalize_dots(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
