use clap::Parser;
use std::process::ExitCode;
use tallybot::cli::{self, Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command.unwrap_or(Command::Start) {
        Command::Start => cli::handle_start(config_path).await,
        Command::Check => cli::handle_check(config_path).await,
        Command::Config(ConfigCommand::Show) => cli::handle_config_show(config_path),
        Command::Config(ConfigCommand::Path) => {
            cli::handle_config_path(config_path);
            Ok(())
        }
        Command::Version => {
            cli::handle_version();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
