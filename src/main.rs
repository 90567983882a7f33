use log::{error, info};
use queuenet::{Experiment, ExperimentConfig};
use std::process::ExitCode;

/// Names a JSON file overriding any subset of the default settings.
const CONFIG_ENV: &str = "QUEUENET_CONFIG";

fn load_config() -> queuenet::Result<ExperimentConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            info!("Loading configuration from {}", path.to_string_lossy());
            ExperimentConfig::from_json_file(path)
        }
        None => Ok(ExperimentConfig::default()),
    }
}

fn run() -> queuenet::Result<()> {
    let config = load_config()?;
    let mut experiment = Experiment::new(config)?;
    let summary = experiment.run()?;
    println!("{}", summary);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
