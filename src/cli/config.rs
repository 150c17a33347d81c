//! Config command handlers

use crate::cli::ConfigInitArgs;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../apimon.example.toml");

/// Handle `apimon config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> anyhow::Result<String> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        );
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    Ok(format!(
        "✓ Configuration file created: {}\n  Point base_url at your monitor backend, \
         then run `apimon login`.",
        args.output.display()
    ))
}
