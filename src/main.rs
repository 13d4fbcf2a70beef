use clap::Parser;
use formpost::cli::commands::{cmd_classify, cmd_submit};
use formpost::cli::config::{Cli, Commands, load_config, merge_cli_overrides};
use tracing::Level;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Classify { page } => {
            for line in cmd_classify(&page)? {
                println!("{}", line);
            }
        }
        Commands::Submit {
            page,
            form,
            set,
            timeout_ms,
        } => {
            // CLI > config > defaults
            let config = merge_cli_overrides(config, timeout_ms);
            let succeeded = cmd_submit(&page, &form, &set, config, cli.verbose).await?;
            if !succeeded {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
