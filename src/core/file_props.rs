//! Lazily computed properties of the current input filename.
//!
//! `{file.stem}` style replacements pull their values from here. A cache is
//! created fresh for every `set_filename` call (and once for the config file
//! path during loading), so the lazy slots never observe a stale path.

use std::path::Path;

use super::error::{PatternError, PatternResult};

/// A property of the current input file usable in replacements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileProp {
    /// The whole filename, `{file}`.
    Whole,
    /// The leaf with its last suffix removed, `{file.stem}`.
    Stem,
    /// The parent directory, `{file.dir}`.
    Dir,
    /// The last dotted suffix including the dot, `{file.ext}`.
    Ext,
}

impl FileProp {
    /// Parses a replacement member name, case-insensitively.
    ///
    /// The empty member selects the whole filename (`{file}`).
    pub fn from_member(member: &str) -> Option<FileProp> {
        if member.is_empty() {
            Some(FileProp::Whole)
        } else if member.eq_ignore_ascii_case("stem") {
            Some(FileProp::Stem)
        } else if member.eq_ignore_ascii_case("dir") {
            Some(FileProp::Dir)
        } else if member.eq_ignore_ascii_case("ext") {
            Some(FileProp::Ext)
        } else {
            None
        }
    }

    /// The canonical spelling stored in tokens.
    pub fn canonical(self) -> &'static str {
        match self {
            FileProp::Whole => "",
            FileProp::Stem => "stem",
            FileProp::Dir => "dir",
            FileProp::Ext => "ext",
        }
    }
}

/// Caches the derived properties of one input filename.
///
/// Construction does no I/O and no parsing; `stem`, `dir`, and `ext` are
/// computed on first read.
#[derive(Debug)]
pub struct FilePropertyCache {
    filename: String,
    stem: Option<String>,
    dir: Option<String>,
    ext: Option<String>,
}

impl FilePropertyCache {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            stem: None,
            dir: None,
            ext: None,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the value of `prop`, computing and caching it if needed.
    pub fn property(&mut self, prop: FileProp) -> &str {
        match prop {
            FileProp::Whole => &self.filename,
            FileProp::Stem => {
                if self.stem.is_none() {
                    let stem = Path::new(&self.filename)
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    self.stem = Some(stem);
                }
                self.stem.as_deref().unwrap_or("")
            }
            FileProp::Dir => {
                if self.dir.is_none() {
                    let dir = Path::new(&self.filename)
                        .parent()
                        .map(|p| p.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    self.dir = Some(dir);
                }
                self.dir.as_deref().unwrap_or("")
            }
            FileProp::Ext => {
                if self.ext.is_none() {
                    let ext = Path::new(&self.filename)
                        .extension()
                        .map(|e| format!(".{}", e.to_string_lossy()))
                        .unwrap_or_default();
                    self.ext = Some(ext);
                }
                self.ext.as_deref().unwrap_or("")
            }
        }
    }

    /// Looks up a property by member name, failing on unknown names.
    pub fn property_named(&mut self, name: &str) -> PatternResult<&str> {
        match FileProp::from_member(name) {
            Some(prop) => Ok(self.property(prop)),
            None => Err(PatternError::UnknownProperty {
                name: name.to_string(),
            }),
        }
    }
}
