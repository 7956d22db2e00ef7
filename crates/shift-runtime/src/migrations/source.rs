//! Migration script discovery.
//!
//! Scripts are read from an ordered list of directories followed by an
//! ordered list of embedded bundles. A `(version, direction)` pair may only
//! appear once across all of them.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use rust_embed::RustEmbed;
use tracing::debug;

use shift_core::error::{Result, ShiftError};
use shift_core::migration::{MigrationFileName, MigrationScript, MigrationSource, Registry};

/// Migration files compiled into the binary.
#[derive(Debug, Clone)]
pub struct EmbeddedBundle {
    name: String,
    files: Vec<(String, String)>,
}

impl EmbeddedBundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
        }
    }

    /// Add a file. Only the file name is matched against the migration grammar.
    pub fn with_file(mut self, file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.push((file_name.into(), contents.into()));
        self
    }

    /// Build a bundle from `include_str!`-style pairs.
    ///
    /// ```ignore
    /// let bundle = EmbeddedBundle::from_static("core", &[
    ///     ("20240101_init.up.sql", include_str!("../migrations/20240101_init.up.sql")),
    /// ]);
    /// ```
    pub fn from_static(name: impl Into<String>, files: &[(&str, &str)]) -> Self {
        files
            .iter()
            .fold(Self::new(name), |bundle, (file, sql)| bundle.with_file(*file, *sql))
    }

    /// Build a bundle from a `rust_embed` folder.
    ///
    /// Entries in nested folders are skipped, matching directory sources.
    pub fn from_embed<E: RustEmbed>(name: impl Into<String>) -> Result<Self> {
        let mut bundle = Self::new(name);
        for path in E::iter() {
            if path.contains('/') {
                continue;
            }
            let Some(file) = E::get(&path) else {
                continue;
            };
            let contents = String::from_utf8(file.data.into_owned()).map_err(|e| {
                ShiftError::Load {
                    path: PathBuf::from(format!("{}:{}", bundle.name, path)),
                    source: io::Error::new(io::ErrorKind::InvalidData, e),
                }
            })?;
            bundle.files.push((path.into_owned(), contents));
        }
        Ok(bundle)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Reads migration scripts from directories and embedded bundles.
#[derive(Debug, Clone, Default)]
pub struct SourceAggregator {
    dirs: Vec<PathBuf>,
    bundles: Vec<EmbeddedBundle>,
}

impl SourceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }

    pub fn with_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Append an embedded bundle. Bundles are read after all directories.
    pub fn with_bundle(mut self, bundle: EmbeddedBundle) -> Self {
        self.bundles.push(bundle);
        self
    }

    /// Configured directories, empty entries and repeats removed.
    fn unique_dirs(&self) -> Vec<&Path> {
        let mut seen = HashSet::new();
        self.dirs
            .iter()
            .filter(|d| !d.as_os_str().is_empty())
            .filter(|d| seen.insert(d.as_path()))
            .map(PathBuf::as_path)
            .collect()
    }

    fn read_dir(dir: &Path, out: &mut Vec<MigrationScript>) -> Result<()> {
        let load_err = |source| ShiftError::Load {
            path: dir.to_path_buf(),
            source,
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(load_err)? {
            let entry = entry.map_err(load_err)?;
            if entry.file_type().map_err(load_err)?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();

        let before = out.len();
        for name in names {
            let path = dir.join(&name);
            if MigrationFileName::parse(&name).is_none() {
                continue;
            }
            let contents = std::fs::read_to_string(&path).map_err(|source| ShiftError::Load {
                path: path.clone(),
                source,
            })?;
            if let Some(script) =
                MigrationScript::from_file(&name, path.display().to_string(), &contents)
            {
                out.push(script);
            }
        }

        debug!("Loaded {} migration scripts from {:?}", out.len() - before, dir);
        Ok(())
    }

    fn read_bundle(bundle: &EmbeddedBundle, out: &mut Vec<MigrationScript>) {
        let mut files: Vec<_> = bundle.files.iter().collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let before = out.len();
        for (name, contents) in files {
            if name.contains('/') {
                continue;
            }
            let origin = format!("{}:{}", bundle.name, name);
            if let Some(script) = MigrationScript::from_file(name, origin, contents) {
                out.push(script);
            }
        }

        debug!(
            "Loaded {} migration scripts from bundle {}",
            out.len() - before,
            bundle.name
        );
    }
}

impl MigrationSource for SourceAggregator {
    fn load(&self) -> Result<Registry> {
        let dirs = self.unique_dirs();
        if dirs.is_empty() && self.bundles.is_empty() {
            return Err(ShiftError::NoSources);
        }

        let mut scripts = Vec::new();
        for dir in dirs {
            Self::read_dir(dir, &mut scripts)?;
        }
        for bundle in &self.bundles {
            Self::read_bundle(bundle, &mut scripts);
        }

        let registry = Registry::from_scripts(scripts)?;
        debug!("Migration registry holds {} scripts", registry.len());
        Ok(registry)
    }
}
