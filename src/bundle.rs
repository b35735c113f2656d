use crate::error::Error;
use crate::result::Result;
use crate::utils;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const DIRECTORY_MODE: u32 = 0o755;

/// What ended up in a finished archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSummary {
    pub path: PathBuf,
    pub files: usize,
    /// Entries replaced because the same name was added again later
    pub duplicates: usize,
}

#[derive(Debug)]
enum Entry {
    File(PathBuf),
    Directory,
}

/// Zip archive being assembled for upload as a function package.
///
/// Entries are collected by name and written on `finish`. Adding a name
/// again replaces the earlier source, the same way `zip` overwrites a
/// member when appending to an archive, so each name appears once.
pub struct Bundle {
    path: PathBuf,
    zip: ZipWriter<File>,
    entries: BTreeMap<String, Entry>,
    exclude: Vec<String>,
    verbose: bool,
    duplicates: usize,
}

impl Bundle {
    /// Start a new archive at `path`, removing any previous archive there
    pub fn create(path: &Path, exclude: &[String], verbose: bool) -> Result<Self> {
        if path.is_dir() {
            return Err(Error::custom(format!(
                "{} is a directory, expected an archive path",
                path.display()
            )));
        }
        if path.exists() {
            fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            utils::ensure_dir(parent)?;
        }

        let file = File::create(path)?;
        // Canonical form lets us recognise the archive if a walked tree contains it
        let path = fs::canonicalize(path)?;

        Ok(Self {
            path,
            zip: ZipWriter::new(file),
            entries: BTreeMap::new(),
            exclude: exclude.to_vec(),
            verbose,
            duplicates: 0,
        })
    }

    fn is_excluded(&self, name: &str) -> bool {
        name.split('/').any(|part| self.exclude.iter().any(|e| e == part))
    }

    fn is_self(&self, source: &Path) -> bool {
        source.file_name() == self.path.file_name()
            && fs::canonicalize(source).is_ok_and(|p| p == self.path)
    }

    /// Add a single file under `name`, replacing any earlier file of that
    /// name. Returns false when the entry was excluded.
    pub fn add_file(&mut self, source: &Path, name: &str) -> Result<bool> {
        if name.is_empty() || self.is_excluded(name) || self.is_self(source) {
            return Ok(false);
        }

        let previous = self
            .entries
            .insert(name.to_string(), Entry::File(source.to_path_buf()));
        match previous {
            Some(Entry::File(old)) => {
                if self.verbose {
                    println!("Replacing {} with {}", old.display(), source.display());
                }
                self.duplicates += 1;
            }
            _ if self.verbose => println!("Adding {} as {}", source.display(), name),
            _ => {}
        }
        Ok(true)
    }

    fn add_directory_entry(&mut self, name: &str) {
        self.entries
            .entry(format!("{name}/"))
            .or_insert(Entry::Directory);
    }

    /// Add every file below `dir`, named relative to it and placed under
    /// `prefix` (empty prefix puts the contents at the archive root).
    /// Returns the number of files added.
    pub fn add_tree(&mut self, dir: &Path, prefix: &str) -> Result<usize> {
        let prefix = prefix.trim_matches('/');
        if !prefix.is_empty() {
            // Parent directories of the prefix, e.g. `google/` for `google/protobuf`
            let mut partial = String::new();
            for part in prefix.split('/') {
                if !partial.is_empty() {
                    partial.push('/');
                }
                partial.push_str(part);
                self.add_directory_entry(&partial);
            }
        }

        let exclude = self.exclude.clone();
        let walker = WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !exclude.iter().any(|x| e.file_name() == x.as_str())
            });

        let mut added = 0;
        for entry in walker {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(dir)
                .map_err(|e| Error::custom(format!("{}: {}", entry.path().display(), e)))?;
            let relative = utils::entry_name(relative);

            let name = match (prefix.is_empty(), relative.is_empty()) {
                (_, true) => continue,
                (true, false) => relative,
                (false, false) => format!("{prefix}/{relative}"),
            };

            if entry.file_type().is_dir() {
                self.add_directory_entry(&name);
            } else if entry.path().is_file() && self.add_file(entry.path(), &name)? {
                added += 1;
            }
        }

        Ok(added)
    }

    /// Write every collected entry and the central directory
    pub fn finish(mut self) -> Result<BundleSummary> {
        let mut files = 0;
        for (name, entry) in &self.entries {
            match entry {
                Entry::Directory => {
                    let options = SimpleFileOptions::default().unix_permissions(DIRECTORY_MODE);
                    self.zip.add_directory(name.clone(), options)?;
                }
                Entry::File(source) => {
                    let options = SimpleFileOptions::default()
                        .compression_method(CompressionMethod::Deflated)
                        .unix_permissions(file_mode(source)?);
                    self.zip.start_file(name.clone(), options)?;
                    let mut reader = File::open(source)?;
                    io::copy(&mut reader, &mut self.zip)?;
                    files += 1;
                }
            }
        }

        self.zip.finish()?;
        Ok(BundleSummary {
            path: self.path,
            files,
            duplicates: self.duplicates,
        })
    }
}

#[cfg(unix)]
fn file_mode(path: &Path) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    // Lambda needs world-readable files
    Ok((fs::metadata(path)?.permissions().mode() & 0o777) | 0o444)
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> Result<u32> {
    Ok(0o644)
}
