use std::path::PathBuf;

pub type CmdResult<T> = vendorize::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod packages;
pub mod run;

/// Resolve the working directory for a command: an explicit `--path`
/// (with `~` expanded) or the current directory.
pub(crate) fn resolve_working_dir(path: Option<&str>) -> vendorize::Result<PathBuf> {
    let resolved = match path {
        Some(p) => PathBuf::from(shellexpand::tilde(p).into_owned()),
        None => std::env::current_dir().map_err(|e| {
            vendorize::Error::internal_io(
                e.to_string(),
                Some("resolve working directory".to_string()),
            )
        })?,
    };

    if !resolved.is_dir() {
        return Err(vendorize::Error::validation_invalid_argument(
            "path",
            format!("'{}' is not a directory", resolved.display()),
        ));
    }

    Ok(resolved)
}

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (vendorize::Result<serde_json::Value>, i32) {
    crate::tty::status("vendorize is working...");

    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Packages(args) => dispatch!(args, global, packages),
    }
}
