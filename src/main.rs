use clap::Parser;
use schema_form::cli::commands::{cmd_actions, cmd_compile, cmd_fetch, cmd_flatten, cmd_submit};
use schema_form::cli::config::{Cli, Commands, load_config, log_level, resolve_url};
use schema_form::trace::logger::TraceLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(log_level(cli.verbose))
        .init();

    let config = load_config(cli.config.as_deref());

    // Trace file: CLI > config > disabled
    let tracer = match cli.trace.as_deref().or(config.trace.path.as_deref()) {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };

    match cli.command {
        Commands::Compile { layout } => {
            println!("{}", cmd_compile(&layout)?);
        }
        Commands::Flatten { layout, value } => {
            println!("{}", cmd_flatten(&layout, &value)?);
        }
        Commands::Actions { file } => {
            println!("{}", cmd_actions(&file)?);
        }
        Commands::Fetch { url } => {
            let url = resolve_url(url.as_deref(), &config).ok_or("no server url given")?;
            println!("{}", cmd_fetch(&url, &config, tracer)?);
        }
        Commands::Submit {
            url,
            data,
            button,
            cancel,
        } => {
            let url = resolve_url(url.as_deref(), &config).ok_or("no server url given")?;
            let (output, accepted) = cmd_submit(&url, &data, button.as_deref(), cancel, &config, tracer)?;
            println!("{}", output);
            if !accepted {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
