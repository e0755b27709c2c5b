use clap::Parser;
use scripts::{
    cli::{Cli, CommonArgs},
    errors::ScriptError,
    utils::init_tracing,
};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let cli = Cli::parse();
    init_tracing();

    let cli_args = CommonArgs {
        network: cli.network,
        settings: cli.connection_settings(),
        parameters_dir: cli.parameters_dir.clone(),
        deployments_dir: cli.deployments_dir.clone(),
    };

    cli.command.run(cli_args).await
}
