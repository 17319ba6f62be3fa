//! Ordered list of directory roots searched for source files.

use crate::error::AutoloadError;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Ordered search roots. Every entry carries exactly one trailing separator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths {
    paths: Vec<String>,
}

impl SearchPaths {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        Self {
            paths: Self::prep_paths(paths),
        }
    }

    /// Insert a path at `position`.
    ///
    /// - `None`: append to the end
    /// - `Some(-1)`: prepend to the start
    /// - `Some(i)`: insert at index `i`, where `0 <= i <= len`
    pub fn add_path(
        &mut self,
        path: impl AsRef<str>,
        position: Option<i64>,
    ) -> Result<&mut Self, AutoloadError> {
        let prepared = Self::prep_path(path);
        match position {
            None => self.paths.push(prepared),
            Some(-1) => self.paths.insert(0, prepared),
            Some(pos) => {
                let index = usize::try_from(pos)
                    .ok()
                    .filter(|index| *index <= self.paths.len())
                    .ok_or(AutoloadError::PositionOutOfRange {
                        position: pos,
                        len: self.paths.len(),
                    })?;
                self.paths.insert(index, prepared);
            }
        }
        Ok(self)
    }

    /// Insert several paths, each one at `position` in turn.
    pub fn add_paths<I, P>(
        &mut self,
        paths: I,
        position: Option<i64>,
    ) -> Result<&mut Self, AutoloadError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        for path in paths {
            self.add_path(path, position)?;
        }
        Ok(self)
    }

    /// Ensure a single trailing directory separator.
    pub fn prep_path(path: impl AsRef<str>) -> String {
        let trimmed = path.as_ref().trim_end_matches(['/', MAIN_SEPARATOR]);
        format!("{trimmed}{MAIN_SEPARATOR}")
    }

    pub fn prep_paths<I, P>(paths: I) -> Vec<String>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        paths.into_iter().map(Self::prep_path).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(Path::new)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Candidate files `root/subdir/filename.ext`, in search order.
    pub fn candidates<'a>(
        &'a self,
        subdir: &'a str,
        filename: &'a str,
        ext: &'a str,
    ) -> impl Iterator<Item = PathBuf> + 'a {
        self.iter().map(move |root| {
            let mut path = root.to_path_buf();
            if !subdir.is_empty() {
                path.push(subdir);
            }
            path.push(with_extension(filename, ext));
            path
        })
    }
}

fn with_extension(filename: &str, ext: &str) -> String {
    let ext = ext.trim_start_matches('.');
    if ext.is_empty() {
        filename.to_string()
    } else {
        format!("{filename}.{ext}")
    }
}
