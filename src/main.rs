#![allow(non_snake_case)]

use std::env;

use agendaBot::cli;
use agendaBot::config::{AppConfig, Settings};
use agendaBot::runtime;

const DEFAULT_RUN_MODE: &str = "bot";

#[tokio::main]
async fn main() {
    let config = match env::var("CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    };

    let get_prop = |key: &str| -> Option<String> {
        config.get(key).or_else(|| env::var(key).ok())
    };

    let run_mode = get_prop("RUN_MODE").unwrap_or(DEFAULT_RUN_MODE.to_string());
    if run_mode == "bot" {
        let settings = Settings::from_props(&get_prop);
        runtime::run_bot(settings).await;
    } else if run_mode == "cli" {
        let settings = Settings::from_props_console(&get_prop);
        cli::cli(settings).await;
    } else {
        println!("Invalid run mode {}", run_mode);
    }
}
