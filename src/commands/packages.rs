use clap::Args;
use serde::Serialize;

use vendorize::config::ProjectConfig;
use vendorize::manifest::{self, Package};

use crate::commands::{resolve_working_dir, CmdResult};

#[derive(Args)]
pub struct PackagesArgs {
    /// Project directory containing composer.json (default: current directory)
    #[arg(long)]
    path: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum PackagesOutput {
    #[serde(rename = "packages")]
    Packages {
        working_dir: String,
        total: usize,
        packages: Vec<Package>,
    },
}

pub fn run(args: PackagesArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<PackagesOutput> {
    let working_dir = resolve_working_dir(args.path.as_deref())?;
    let config = ProjectConfig::load(&working_dir)?;
    let packages = manifest::discover_packages(&working_dir, &config)?;

    // A run that discovers nothing usually means composer install hasn't
    // happened; surface it through the exit code.
    let exit_code = if packages.is_empty() { 1 } else { 0 };

    Ok((
        PackagesOutput::Packages {
            working_dir: working_dir.display().to_string(),
            total: packages.len(),
            packages,
        },
        exit_code,
    ))
}
