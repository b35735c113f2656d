use crate::context::Context;
use crate::error::Error;
use crate::result::Result;
use crate::tpl::Tpl;
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_FILENAME: &str = "$NAME-$VERSION.zip";
pub const DEFAULT_VERSION: &str = "0.0.0";

#[derive(Debug, Deserialize, Default)]
pub struct PyProject {
    #[serde(default)]
    pub project: Option<Project>,
    #[serde(default)]
    pub tool: Option<Tool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Project {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Tool {
    #[serde(rename = "lambda-bundle", default)]
    pub lambda_bundle: Option<BundleConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct BundleConfig {
    #[serde(default)]
    pub source_dir: Option<String>,

    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,

    #[serde(default)]
    pub install: Option<bool>,

    #[serde(default)]
    pub python: Option<String>,

    #[serde(default)]
    pub filename: Option<String>,

    #[serde(default)]
    pub exclude: Option<Vec<String>>,
}

/// A dependency as written in the manifest: either just the installer name,
/// or a table naming the directory it installs into as well.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum DependencySpec {
    Name(String),
    Table {
        name: String,
        #[serde(default)]
        dir: Option<String>,
    },
}

/// Third-party package to install and copy out of site-packages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Name passed to the installer (e.g. `psycopg2-binary`)
    pub name: String,
    /// Directory (or `<dir>.py` module) under site-packages
    pub dir: String,
}

impl Dependency {
    fn from_spec(spec: &DependencySpec) -> Result<Self> {
        let (name, dir) = match spec {
            DependencySpec::Name(name) => (name.trim().to_string(), None),
            DependencySpec::Table { name, dir } => (name.trim().to_string(), dir.clone()),
        };

        if name.is_empty() {
            return Err(Error::InvalidManifest("dependency name must not be empty".into()));
        }

        let dir = dir.unwrap_or_else(|| default_dir(&name));
        check_relative(&dir, "dependency dir")?;

        Ok(Self { name, dir })
    }
}

/// Import directory for an installer name: lowercase, `-` and `.` become `_`,
/// version specifiers and extras are dropped.
fn default_dir(name: &str) -> String {
    let base: String = name
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();

    base.to_ascii_lowercase().replace(['-', '.'], "_")
}

fn check_relative(value: &str, what: &str) -> Result<()> {
    let path = Path::new(value);
    let escapes = value.trim().is_empty()
        || path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));

    if escapes {
        return Err(Error::InvalidManifest(format!(
            "{what} '{value}' must be a relative path inside the project"
        )));
    }
    Ok(())
}

/// Parsed and processed bundle configuration
#[derive(Debug)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    /// Absolute (or base-dir relative) directory sources are taken from
    pub source_dir: PathBuf,
    /// Paths relative to `source_dir`; empty means the whole directory
    pub sources: Vec<PathBuf>,
    pub dependencies: Vec<Dependency>,
    pub install: bool,
    pub python: String,
    /// Archive file name used when the output argument is a directory
    pub filename: String,
    /// Path component names never written to the archive
    pub exclude: Vec<String>,
}

impl Manifest {
    /// Load the manifest from pyproject.toml
    pub fn load(ctx: &Context, python: Option<&str>) -> Result<Self> {
        let project = read_pyproject(&ctx.manifest_path)?;
        let config = bundle_config(&project, &ctx.manifest_path)?;
        Self::from_config(ctx, project.project.unwrap_or_default(), config, python)
    }

    /// Load `[tool.lambda-bundle]` from an alternative file, keeping the
    /// `[project]` table of pyproject.toml
    pub fn load_with_manifest(ctx: &Context, path: &Path, python: Option<&str>) -> Result<Self> {
        let alt_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            ctx.base_dir.join(path)
        };
        if !alt_path.exists() {
            return Err(Error::ManifestNotFound(alt_path.display().to_string()));
        }

        let project = read_pyproject(&ctx.manifest_path)?;
        let alt = read_pyproject(&alt_path)?;
        let config = bundle_config(&alt, &alt_path)?;
        let info = alt.project.or(project.project).unwrap_or_default();
        Self::from_config(ctx, info, config, python)
    }

    fn from_config(
        ctx: &Context,
        project: Project,
        config: BundleConfig,
        python: Option<&str>,
    ) -> Result<Self> {
        let name = project
            .name
            .unwrap_or_else(|| directory_name(&ctx.base_dir));
        let version = project
            .version
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        let python = python
            .map(str::to_string)
            .or(config.python)
            .unwrap_or_else(|| DEFAULT_PYTHON.to_string());

        let mut tpl = Tpl::new();
        tpl.register("NAME", &name);
        tpl.register("VERSION", &version);
        tpl.register("PYTHON", &python);

        let source_dir = match config.source_dir {
            Some(dir) => {
                let dir = tpl.parse(&dir);
                check_relative(&dir, "source-dir")?;
                ctx.base_dir.join(dir)
            }
            None => ctx.base_dir.clone(),
        };

        let mut sources = Vec::with_capacity(config.sources.len());
        for source in &config.sources {
            let source = tpl.parse(source);
            check_relative(&source, "source")?;
            sources.push(PathBuf::from(source));
        }

        let mut dependencies: Vec<Dependency> = Vec::new();
        for spec in &config.dependencies {
            let dependency = Dependency::from_spec(spec)?;
            if !dependencies.iter().any(|d| d.name == dependency.name) {
                dependencies.push(dependency);
            }
        }

        let filename = tpl.parse(config.filename.as_deref().unwrap_or(DEFAULT_FILENAME));
        if filename.trim().is_empty() || filename.contains(['/', '\\']) {
            return Err(Error::InvalidManifest(format!(
                "filename '{filename}' must be a plain file name"
            )));
        }

        // Installing only makes sense alongside an explicit source list unless asked for
        let install = config.install.unwrap_or(!sources.is_empty());

        let exclude = config
            .exclude
            .unwrap_or_else(|| vec!["__pycache__".to_string()]);

        Ok(Manifest {
            name,
            version,
            source_dir,
            sources,
            dependencies,
            install,
            python,
            filename,
            exclude,
        })
    }
}

fn read_pyproject(path: &Path) -> Result<PyProject> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn bundle_config(project: &PyProject, path: &Path) -> Result<BundleConfig> {
    project
        .tool
        .as_ref()
        .and_then(|t| t.lambda_bundle.clone())
        .ok_or_else(|| {
            Error::InvalidManifest(format!(
                "Missing [tool.lambda-bundle] section in {}",
                path.display()
            ))
        })
}

fn directory_name(dir: &Path) -> String {
    fs::canonicalize(dir)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "bundle".to_string())
}
