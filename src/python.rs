//! Interaction with the Python interpreter: locating site-packages and
//! installing dependencies into it with pip.

use crate::cmd;
use crate::context::Context;
use crate::error::Error;
use crate::manifest::Dependency;
use crate::result::Result;
use std::path::PathBuf;

const PURELIB_SCRIPT: &str = "import sysconfig; print(sysconfig.get_paths()['purelib'])";

/// Ask `python` where its site-packages (purelib) directory is
pub fn site_packages(ctx: &Context, python: &str) -> Result<PathBuf> {
    let output = cmd::execute_with_output(ctx, python, &["-c", PURELIB_SCRIPT])?;
    checked(parse_purelib(&output, python)?)
}

/// Last non-blank line of the interpreter output; anything printed by
/// sitecustomize hooks comes before it
fn parse_purelib(output: &str, python: &str) -> Result<PathBuf> {
    output
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| Error::custom(format!("{python} did not report a site-packages directory")))
}

/// Validate a site-packages directory given explicitly
pub fn checked(path: PathBuf) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(Error::SitePackagesNotFound(path.display().to_string()));
    }
    Ok(path)
}

/// Arguments for `python -m pip install ...`
fn install_args(dependencies: &[Dependency]) -> Vec<&str> {
    let mut args = vec!["-m", "pip", "install", "--disable-pip-version-check"];
    args.extend(dependencies.iter().map(|d| d.name.as_str()));
    args
}

/// Install the dependencies into the interpreter's environment
pub fn install(ctx: &Context, python: &str, dependencies: &[Dependency]) -> Result<()> {
    if dependencies.is_empty() {
        return Ok(());
    }

    cmd::execute(ctx, python, &install_args(dependencies))
}
