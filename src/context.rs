use std::path::PathBuf;

/// Settings shared by every packaging step
#[derive(Clone, Debug)]
pub struct Context {
    /// Echo executed commands and archived entries
    pub verbose: bool,

    /// Skip `pip install` even when the manifest asks for it
    pub no_install: bool,

    /// pyproject.toml that located the project
    pub manifest_path: PathBuf,

    /// Project root (directory containing pyproject.toml)
    pub base_dir: PathBuf,
}

impl Context {
    pub fn new(manifest_path: PathBuf, verbose: bool, no_install: bool) -> Self {
        let base_dir = match manifest_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Self {
            verbose,
            no_install,
            manifest_path,
            base_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_dir_is_manifest_parent() {
        let ctx = Context::new(PathBuf::from("/srv/app/pyproject.toml"), false, false);
        assert_eq!(ctx.base_dir, PathBuf::from("/srv/app"));

        let ctx = Context::new(PathBuf::from("pyproject.toml"), true, false);
        assert_eq!(ctx.base_dir, PathBuf::from("."));
    }
}
