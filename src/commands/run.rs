use clap::Args;
use serde::Serialize;

use vendorize::config::ProjectConfig;
use vendorize::log_status;
use vendorize::manifest::{self, Package};
use vendorize::mover::Mover;
use vendorize::replacer::Replacer;

use crate::commands::{resolve_working_dir, CmdResult};

#[derive(Args)]
pub struct RunArgs {
    /// Project directory containing composer.json (default: current directory)
    #[arg(long)]
    path: Option<String>,
    /// Discover and report without moving or rewriting anything
    #[arg(long)]
    dry_run: bool,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum RunOutput {
    #[serde(rename = "run")]
    Run {
        working_dir: String,
        dry_run: bool,
        packages: Vec<Package>,
        files_moved: usize,
        files_changed: usize,
        propagation_files_changed: usize,
        renamed_symbols: Vec<RenameSummary>,
    },
}

#[derive(Serialize)]
pub struct RenameSummary {
    pub from: String,
    pub to: String,
}

pub fn run(args: RunArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<RunOutput> {
    let working_dir = resolve_working_dir(args.path.as_deref())?;
    let config = ProjectConfig::load(&working_dir)?;
    let packages = manifest::discover_packages(&working_dir, &config)?;

    if args.dry_run {
        return Ok((
            RunOutput::Run {
                working_dir: working_dir.display().to_string(),
                dry_run: true,
                packages,
                files_moved: 0,
                files_changed: 0,
                propagation_files_changed: 0,
                renamed_symbols: Vec::new(),
            },
            0,
        ));
    }

    let mover = Mover::new(&working_dir, &config);
    let mut files_moved = 0;
    for package in &packages {
        files_moved += mover.move_package(package)?;
    }
    log_status!("move", "Staged {} files from {} packages", files_moved, packages.len());

    let mut replacer = Replacer::new(&working_dir, config.clone());
    let summary = replacer.replace_project(&packages)?;
    log_status!(
        "replace",
        "Rewrote {} files, propagated into {} more",
        summary.files_changed,
        summary.propagation_files_changed
    );

    let renamed_symbols = replacer
        .ledger()
        .entries()
        .iter()
        .map(|(from, to)| RenameSummary {
            from: from.clone(),
            to: to.clone(),
        })
        .collect();

    if config.delete_vendor_directories {
        mover.delete_vendor_sources(&packages)?;
    }

    Ok((
        RunOutput::Run {
            working_dir: working_dir.display().to_string(),
            dry_run: false,
            packages,
            files_moved,
            files_changed: summary.files_changed,
            propagation_files_changed: summary.propagation_files_changed,
            renamed_symbols,
        },
        0,
    ))
}
