use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

pub const USAGE: &str = "Usage: lambda-bundle [OPTIONS] <OUTPUT>";

/// Command-line arguments for the lambda-bundle tool
#[derive(Debug)]
pub struct Args {
    /// Enable verbose output
    pub verbose: bool,

    /// Skip the dependency installation step
    pub no_install: bool,

    /// Output archive path, exactly as given on the command line
    pub output: Option<String>,

    /// Path to pyproject.toml or directory containing it
    pub path: Option<PathBuf>,

    /// Path to alternative manifest file for bundle configuration
    pub manifest: Option<PathBuf>,

    /// Python interpreter used for installation and site-packages lookup
    pub python: Option<String>,

    /// Use this directory instead of asking the interpreter for site-packages
    pub site_packages: Option<PathBuf>,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        Self::from_matches(command().get_matches())
    }

    #[cfg(test)]
    pub fn parse_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::from_matches(command().get_matches_from(args))
    }

    fn from_matches(matches: ArgMatches) -> Self {
        Self {
            verbose: matches.get_flag("verbose"),
            no_install: matches.get_flag("no-install"),
            output: matches.get_one::<String>("output").cloned(),
            path: matches.get_one::<String>("path").map(PathBuf::from),
            manifest: matches.get_one::<String>("manifest").map(PathBuf::from),
            python: matches.get_one::<String>("python").cloned(),
            site_packages: matches.get_one::<String>("site-packages").map(PathBuf::from),
        }
    }

    /// The output argument, if one was supplied and is not blank
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref().filter(|o| !o.trim().is_empty())
    }
}

fn command() -> Command {
    Command::new("lambda-bundle")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build zip packages of Python sources and dependencies for serverless functions")
        .arg(
            // Optional at the clap level so a missing value exits with 1, not clap's 2
            Arg::new("output")
                .value_name("OUTPUT")
                .help("Output archive path (or directory to place the archive in)")
        )
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .value_name("PATH")
                .help("Path to pyproject.toml or directory containing it")
        )
        .arg(
            Arg::new("manifest")
                .short('m')
                .long("manifest")
                .value_name("FILE")
                .help("Path to alternative manifest file with a [tool.lambda-bundle] table")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output")
        )
        .arg(
            Arg::new("no-install")
                .long("no-install")
                .action(ArgAction::SetTrue)
                .help("Skip pip install (use dependencies already in site-packages)")
        )
        .arg(
            Arg::new("python")
                .long("python")
                .value_name("PYTHON")
                .env("LAMBDA_BUNDLE_PYTHON")
                .help("Python interpreter to use")
        )
        .arg(
            Arg::new("site-packages")
                .long("site-packages")
                .value_name("DIR")
                .env("LAMBDA_BUNDLE_SITE_PACKAGES")
                .help("Site-packages directory to take dependencies from")
        )
}
