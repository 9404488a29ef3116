use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

use crate::class_source::ClassAccessor;

#[derive(Debug, Error)]
pub enum ClasspathError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

/// One classpath entry: an exploded class directory or a jar/zip archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClasspathRoot {
    Directory(PathBuf),
    Archive(PathBuf),
}

impl ClasspathRoot {
    /// Classifies `path` by extension; anything that isn't a `.jar`/`.zip` is a directory.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_archive = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"));
        if is_archive {
            ClasspathRoot::Archive(path)
        } else {
            ClasspathRoot::Directory(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ClasspathRoot::Directory(path) | ClasspathRoot::Archive(path) => path,
        }
    }

    fn contains(&self, entry_name: &str) -> Result<bool, ClasspathError> {
        match self {
            ClasspathRoot::Directory(dir) => Ok(dir.join(entry_name).is_file()),
            ClasspathRoot::Archive(jar) => {
                let mut archive = ZipArchive::new(File::open(jar)?)?;
                let found = match archive.by_name(entry_name) {
                    Ok(_) => Ok(true),
                    Err(zip::result::ZipError::FileNotFound) => Ok(false),
                    Err(err) => Err(err.into()),
                };
                found
            }
        }
    }

    fn read(&self, entry_name: &str) -> Result<Option<Vec<u8>>, ClasspathError> {
        match self {
            ClasspathRoot::Directory(dir) => {
                let candidate = dir.join(entry_name);
                if !candidate.is_file() {
                    return Ok(None);
                }
                Ok(Some(std::fs::read(candidate)?))
            }
            ClasspathRoot::Archive(jar) => {
                let mut archive = ZipArchive::new(File::open(jar)?)?;
                let bytes = match archive.by_name(entry_name) {
                    Ok(mut entry) => {
                        let mut bytes = Vec::with_capacity(entry.size() as usize);
                        entry.read_to_end(&mut bytes)?;
                        Ok(Some(bytes))
                    }
                    Err(zip::result::ZipError::FileNotFound) => Ok(None),
                    Err(err) => Err(err.into()),
                };
                bytes
            }
        }
    }
}

pub fn class_entry_name(internal_name: &str) -> String {
    format!("{internal_name}.class")
}

/// [`ClassAccessor`] that looks classes up on an ordered classpath, reading from disk on every
/// call. The first root containing a class wins.
#[derive(Debug, Clone, Default)]
pub struct ClasspathAccessor {
    roots: Vec<ClasspathRoot>,
}

impl ClasspathAccessor {
    pub fn new(roots: Vec<ClasspathRoot>) -> Self {
        Self { roots }
    }

    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::new(paths.into_iter().map(ClasspathRoot::from_path).collect())
    }

    pub fn roots(&self) -> &[ClasspathRoot] {
        &self.roots
    }
}

impl ClassAccessor for ClasspathAccessor {
    fn exists(&self, name: &str) -> bool {
        let entry_name = class_entry_name(name);
        self.roots.iter().any(|root| match root.contains(&entry_name) {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(
                    target: "nova.decompiler",
                    root = %root.path().display(),
                    class = name,
                    error = %err,
                    "failed to read classpath root"
                );
                false
            }
        })
    }

    fn fetch(&self, name: &str) -> Option<Vec<u8>> {
        let entry_name = class_entry_name(name);
        self.roots.iter().find_map(|root| match root.read(&entry_name) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(
                    target: "nova.decompiler",
                    root = %root.path().display(),
                    class = name,
                    error = %err,
                    "failed to read class from classpath root"
                );
                None
            }
        })
    }
}
