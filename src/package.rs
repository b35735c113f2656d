use crate::bundle::{Bundle, BundleSummary};
use crate::context::Context;
use crate::error::Error;
use crate::manifest::Manifest;
use crate::python;
use crate::result::Result;
use crate::utils;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where dependencies are copied from
#[derive(Debug, Clone)]
pub enum SitePackages {
    /// Ask the manifest's interpreter
    Interpreter,
    /// Use this directory as-is
    Path(PathBuf),
}

/// Build the function package at `output`.
///
/// Sources go in first, then (after an optional `pip install`) each
/// dependency directory from site-packages. The archive is rebuilt from
/// scratch on every run.
pub fn package(
    ctx: &Context,
    manifest: &Manifest,
    output: &Path,
    site_packages: &SitePackages,
) -> Result<BundleSummary> {
    if !manifest.source_dir.is_dir() {
        return Err(Error::SourceNotFound(manifest.source_dir.display().to_string()));
    }

    let mut bundle = Bundle::create(output, &manifest.exclude, ctx.verbose)?;

    // Entries are only written in finish(), so either step can leave a half-written archive
    let result = match fill(ctx, manifest, &mut bundle, site_packages) {
        Ok(()) => bundle.finish(),
        Err(err) => {
            drop(bundle);
            Err(err)
        }
    };

    if result.is_err()
        && let Err(remove_err) = remove_partial(output)
    {
        cliclack::log::warning(format!(
            "Could not remove partial archive {}: {}",
            output.display(),
            remove_err
        ))?;
    }

    result
}

/// Delete an archive left behind by a failed run
fn remove_partial(output: &Path) -> Result<()> {
    match fs::remove_file(output) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
        _ => Ok(()),
    }
}

fn fill(
    ctx: &Context,
    manifest: &Manifest,
    bundle: &mut Bundle,
    site_packages: &SitePackages,
) -> Result<()> {
    add_sources(bundle, manifest)?;

    if manifest.install && !manifest.dependencies.is_empty() {
        if ctx.no_install {
            if ctx.verbose {
                println!("Skipping dependency installation");
            }
        } else {
            python::install(ctx, &manifest.python, &manifest.dependencies)?;
        }
    }

    if !manifest.dependencies.is_empty() {
        let site = match site_packages {
            SitePackages::Interpreter => python::site_packages(ctx, &manifest.python)?,
            SitePackages::Path(path) => python::checked(path.clone())?,
        };
        add_dependencies(bundle, manifest, &site)?;
    }

    Ok(())
}

fn add_sources(bundle: &mut Bundle, manifest: &Manifest) -> Result<()> {
    if manifest.sources.is_empty() {
        bundle.add_tree(&manifest.source_dir, "")?;
        return Ok(());
    }

    for source in &manifest.sources {
        let path = manifest.source_dir.join(source);
        let name = utils::entry_name(source);

        if path.is_dir() {
            bundle.add_tree(&path, &name)?;
        } else if path.is_file() {
            bundle.add_file(&path, &name)?;
        } else {
            return Err(Error::SourceNotFound(path.display().to_string()));
        }
    }

    Ok(())
}

fn add_dependencies(bundle: &mut Bundle, manifest: &Manifest, site: &Path) -> Result<()> {
    for dependency in &manifest.dependencies {
        let dir = site.join(&dependency.dir);
        let module = site.join(format!("{}.py", dependency.dir));

        if dir.is_dir() {
            bundle.add_tree(&dir, &utils::entry_name(Path::new(&dependency.dir)))?;
        } else if module.is_file() {
            let name = utils::entry_name(Path::new(&format!("{}.py", dependency.dir)));
            bundle.add_file(&module, &name)?;
        } else {
            return Err(Error::DependencyNotFound {
                name: dependency.name.clone(),
                site_packages: site.display().to_string(),
            });
        }
    }

    Ok(())
}

/// Final archive path for the output argument: a directory target gets the
/// manifest's file name appended
pub fn output_path(raw: &str, cwd: &Path, manifest: &Manifest) -> Result<PathBuf> {
    let resolved = utils::resolve_output(raw, cwd)?;
    if utils::is_directory_target(raw, &resolved) {
        Ok(resolved.join(&manifest.filename))
    } else {
        Ok(resolved)
    }
}
