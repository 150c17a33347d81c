//! Params command implementations

use crate::cli::output::format_params_table;
use crate::cli::{AppContext, ParamsCommands};

/// Handle `apimon params ...`
pub fn handle_params(cmd: &ParamsCommands, ctx: &AppContext) -> anyhow::Result<String> {
    match cmd {
        ParamsCommands::Show => {
            let params = ctx.params.load()?;
            Ok(format_params_table(&params))
        }
        ParamsCommands::Set(args) => {
            let params = ctx.params.update(args.field, &args.value)?;
            Ok(format!(
                "✓ {} = {}",
                args.field,
                params.get(args.field)
            ))
        }
        ParamsCommands::Reset => {
            let params = ctx.params.reset()?;
            Ok(format!(
                "✓ Parameters reset to defaults\n{}",
                format_params_table(&params)
            ))
        }
    }
}
