use crate::error::Error;
use crate::result::Result;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const MANIFEST_FILE: &str = "pyproject.toml";

/// Find pyproject.toml in the current directory or specified path
pub fn find_manifest(path: Option<&Path>) -> Result<PathBuf> {
    let base_path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir()?,
    };

    let manifest_path = if base_path.is_file() {
        base_path
    } else {
        base_path.join(MANIFEST_FILE)
    };

    if !manifest_path.exists() {
        return Err(Error::ManifestNotFound(
            manifest_path.display().to_string(),
        ));
    }

    Ok(manifest_path)
}

/// Resolve the user-supplied output path to an absolute, normalized path.
///
/// Relative paths are taken relative to `cwd`. `.` and `..` components are
/// folded lexically, so the target does not need to exist yet.
pub fn resolve_output(raw: &str, cwd: &Path) -> Result<PathBuf> {
    if raw.trim().is_empty() {
        return Err(Error::custom("output path must not be empty"));
    }

    let path = Path::new(raw);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    Ok(normalize(&joined))
}

/// True when the output argument designates a directory to put the archive in:
/// a trailing separator, a final `.` or `..`, or an existing directory
pub fn is_directory_target(raw: &str, resolved: &Path) -> bool {
    let last = raw
        .rsplit(|c| c == '/' || c == std::path::MAIN_SEPARATOR)
        .next();
    matches!(last, Some("" | "." | "..")) || resolved.is_dir()
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root
                let at_root = matches!(
                    out.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_)) | None
                );
                if !at_root {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Archive entry name for a relative path: `/`-separated, no leading `./`
pub fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_output() {
        let resolved =
            resolve_output("dist/../out/lambda.zip", Path::new("/work/project")).unwrap();
        assert_eq!(resolved, PathBuf::from("/work/project/out/lambda.zip"));
    }

    #[test]
    fn test_resolve_absolute_output() {
        let resolved = resolve_output("/tmp/./a.zip", Path::new("/ignored")).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/a.zip"));
    }

    #[test]
    fn test_parent_dir_does_not_escape_root() {
        let resolved = resolve_output("../../x.zip", Path::new("/")).unwrap();
        assert_eq!(resolved, PathBuf::from("/x.zip"));
    }

    #[test]
    fn test_empty_output_rejected() {
        assert!(resolve_output("", Path::new("/")).is_err());
        assert!(resolve_output("   ", Path::new("/")).is_err());
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(entry_name(Path::new("./lambdas/uploads.py")), "lambdas/uploads.py");
        assert_eq!(entry_name(Path::new("redis")), "redis");
    }

    #[test]
    fn test_find_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_manifest(Some(dir.path())),
            Err(Error::ManifestNotFound(_))
        ));

        let manifest = dir.path().join(MANIFEST_FILE);
        fs::write(&manifest, "").unwrap();
        assert_eq!(find_manifest(Some(dir.path())).unwrap(), manifest);
        assert_eq!(find_manifest(Some(manifest.as_path())).unwrap(), manifest);
    }

    #[test]
    fn test_directory_target() {
        let dir = tempfile::tempdir().unwrap();
        assert!(is_directory_target("dist/", Path::new("/nonexistent/dist")));
        assert!(is_directory_target("dist/.", Path::new("/nonexistent/dist")));
        assert!(is_directory_target("build/..", Path::new("/nonexistent")));
        assert!(is_directory_target(".", Path::new("/nonexistent")));
        assert!(!is_directory_target("dist", Path::new("/nonexistent/dist")));
        assert!(is_directory_target("x", dir.path()));
        assert!(!is_directory_target("out.zip", &dir.path().join("out.zip")));
    }
}
