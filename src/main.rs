mod args;
mod bundle;
mod cmd;
mod context;
mod error;
mod manifest;
mod package;
mod python;
mod result;
mod tpl;
mod utils;

use args::Args;
use context::Context;
use manifest::Manifest;
use package::SitePackages;

fn main() {
    let args = Args::parse();

    // Checked before touching the filesystem
    let Some(output) = args.output().map(str::to_string) else {
        eprintln!("{}", args::USAGE);
        std::process::exit(1);
    };

    if let Err(e) = run(args, &output) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args, output: &str) -> result::Result<()> {
    let Args {
        verbose,
        no_install,
        path,
        manifest: alt_manifest,
        python,
        site_packages,
        ..
    } = args;

    let manifest_path = utils::find_manifest(path.as_deref())?;
    let ctx = Context::new(manifest_path, verbose, no_install);

    cliclack::intro("lambda-bundle")?;

    let manifest = {
        let spinner = cliclack::spinner();
        spinner.start("Loading manifest...");
        let result = match alt_manifest {
            Some(alt) => Manifest::load_with_manifest(&ctx, &alt, python.as_deref()),
            None => Manifest::load(&ctx, python.as_deref()),
        };
        match result {
            Ok(m) => {
                spinner.stop(format!("Loaded manifest for {} {}", m.name, m.version));
                m
            }
            Err(e) => {
                spinner.error("Failed to load manifest");
                return Err(e);
            }
        }
    };

    let cwd = std::env::current_dir()?;
    let archive_path = package::output_path(output, &cwd, &manifest)?;
    let site_packages = match site_packages {
        Some(dir) => SitePackages::Path(dir),
        None => SitePackages::Interpreter,
    };

    if manifest.install && !no_install && !manifest.dependencies.is_empty() {
        let names: Vec<&str> = manifest.dependencies.iter().map(|d| d.name.as_str()).collect();
        cliclack::log::info(format!("Installing {} with {}", names.join(", "), manifest.python))?;
    }

    let summary = if verbose {
        cliclack::log::step(format!("Creating {}", archive_path.display()))?;
        package::package(&ctx, &manifest, &archive_path, &site_packages)?
    } else {
        let spinner = cliclack::spinner();
        spinner.start(format!("Creating {}...", archive_path.display()));
        match package::package(&ctx, &manifest, &archive_path, &site_packages) {
            Ok(summary) => {
                spinner.stop("Archive written");
                summary
            }
            Err(e) => {
                spinner.error("Failed to create archive");
                return Err(e);
            }
        }
    };

    if summary.duplicates > 0 {
        cliclack::log::warning(format!(
            "Skipped {} duplicate entr{}",
            summary.duplicates,
            if summary.duplicates == 1 { "y" } else { "ies" }
        ))?;
    }

    cliclack::outro(format!(
        "Created {} ({} files)",
        summary.path.display(),
        summary.files
    ))?;
    Ok(())
}
