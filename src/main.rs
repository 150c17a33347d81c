use apimon::cli::{
    admin, handle_completions, handle_config_init, load_config_with_overrides, login, params,
    requires_login, status, test, watch, AppContext, Cli, Commands, ConfigCommands,
};
use apimon::logging::init_tracing;
use clap::Parser;
use colored::Colorize;

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Commands that need neither config nor logging
    match cli.command {
        Commands::Completions(ref args) => {
            handle_completions(args);
            return Ok(());
        }
        Commands::Config(ConfigCommands::Init(ref args)) => {
            println!("{}", handle_config_init(args)?);
            return Ok(());
        }
        _ => {}
    }

    let config = load_config_with_overrides(&cli)?;
    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
    let ctx = AppContext::new(config);

    let output = match cli.command {
        Commands::Status(ref args) => status::handle_status(args, &ctx).await?,
        Commands::Watch(ref args) => {
            watch::handle_watch(args, &ctx).await?;
            return Ok(());
        }
        Commands::Test(ref args) => test::handle_test(args, &ctx).await?,
        Commands::Login(ref args) => login::handle_login(args, &ctx).await?,
        Commands::Logout => login::handle_logout(&ctx)?,
        Commands::Params(ref cmd) => params::handle_params(cmd, &ctx)?,
        Commands::Admin(ref cmd) => admin::handle_admin(cmd, &ctx).await?,
        Commands::Config(_) | Commands::Completions(_) => return Ok(()),
    };

    println!("{}", output);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red(), e);
        if requires_login(&e) {
            eprintln!("  Run `apimon login --project-key <KEY> --api-key <KEY>` to sign in.");
        }
        std::process::exit(1);
    }
}
