use std::path::PathBuf;
use std::process::ExitCode;

use mm::app::App;
use mm::{config, logging};

const USAGE: &str = "usage: mm [-c|--config PATH] [-h|--help]";

enum Cli {
    Run { config_path: PathBuf },
    Help,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = match parse_args(&args) {
        Ok(Cli::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Ok(Cli::Run { config_path }) => config_path,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match logging::init_logging() {
        Ok(log_path) => tracing::info!("logging to {}", log_path.display()),
        Err(err) => {
            eprintln!("initialize logging failed: {err}");
            return ExitCode::FAILURE;
        }
    }

    let config = match config::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{:#}", anyhow::Error::new(err));
            return ExitCode::from(2);
        }
    };

    let app = match App::new(config) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::from(2);
        }
    };

    if let Err(err) = app.run() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut config_path = PathBuf::from(config::DEFAULT_CONFIG_PATH);
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Cli::Help),
            "-c" | "--config" => match iter.next() {
                Some(path) => config_path = PathBuf::from(path),
                None => return Err(format!("{arg} requires a path")),
            },
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(Cli::Run { config_path })
}
