use clap::{value_parser, Arg, Command};
use ecoviz::api::{self, AppState};
use ecoviz::emissions::{calculate_breakdown, FootprintComparison};
use ecoviz::{CalculationData, Config};
use log::LevelFilter;
use std::process;
use std::str::FromStr;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let matches = Command::new("ecoviz")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Carbon footprint calculation service")
        .long_about(
            "EcoViz estimates a household's annual carbon footprint from housing energy use,\n\
             transportation, diet and consumption habits, stores each calculation, and can\n\
             email a summary of the results.",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/ecoviz.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("calculate")
                .long("calculate")
                .value_name("FILE")
                .help("Calculate the footprint for a JSON calculation data file and exit")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to listen on (overrides configuration and PORT)")
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("/etc/ecoviz.yaml");

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let loaded = match load_config(config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    init_logging(matches.get_flag("verbose"), loaded.as_ref());

    let mut config = match loaded {
        Some(config) => config,
        None => {
            log::warn!("Configuration file '{config_path}' not found, using default configuration");
            Config::default()
        }
    };

    if let Err(e) = config.apply_env_overrides() {
        eprintln!("Error in environment: {e}");
        process::exit(1);
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    if matches.get_flag("test-config") {
        test_config(&config);
        return;
    }

    if let Some(data_file) = matches.get_one::<String>("calculate") {
        calculate_file(data_file);
        return;
    }

    if let Err(e) = config.validate() {
        log::error!("Invalid configuration: {e}");
        process::exit(1);
    }

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Failed to start: {e:#}");
            process::exit(1);
        }
    };

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received shutdown signal, stopping server...");
        let _ = shutdown_tx.send(true);
    }) {
        log::warn!("Failed to install signal handler: {e}");
    }

    log::info!("Starting EcoViz v{}...", env!("CARGO_PKG_VERSION"));
    let shutdown = async move {
        let _ = shutdown_rx.changed().await;
    };

    if let Err(e) = api::serve(&config.listen_address(), state, shutdown).await {
        log::error!("Server error: {e}");
        process::exit(1);
    }
}

/// `Ok(None)` when the file does not exist, so the caller can fall back to defaults
/// once logging is up.
fn load_config(path: &str) -> anyhow::Result<Option<Config>> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path).map(Some)
    } else {
        Ok(None)
    }
}

fn init_logging(verbose: bool, config: Option<&Config>) {
    let configured = config
        .and_then(|c| c.logging.as_ref())
        .and_then(|logging| LevelFilter::from_str(&logging.level).ok());

    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        configured.unwrap_or(LevelFilter::Info)
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn test_config(config: &Config) {
    println!("🔍 Testing configuration...");
    println!();
    println!("Listen address: {}", config.listen_address());
    println!("Database: {}", config.storage.database_path);
    if config.recommendations.enabled {
        println!(
            "AI recommendations: enabled ({} via {})",
            config.recommendations.model, config.recommendations.api_base
        );
    } else {
        println!("AI recommendations: disabled");
    }
    match &config.email.api_url {
        Some(url) => println!("Mail API: {url}"),
        None => println!("Mail API: not configured, emails will only be logged"),
    }
    println!("From address: {}", config.email.from_address);
    println!();

    match config.validate() {
        Ok(()) => println!("✅ Configuration is valid"),
        Err(e) => {
            println!("❌ Configuration validation failed:");
            println!("Error: {e}");
            process::exit(1);
        }
    }
}

fn calculate_file(path: &str) {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("❌ Error reading calculation file: {e}");
            process::exit(1);
        }
    };

    let data: CalculationData = match serde_json::from_str(&content) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("❌ Invalid calculation data: {e}");
            process::exit(1);
        }
    };

    if let Err(problems) = data.validate() {
        eprintln!("❌ Invalid calculation data:");
        for problem in problems {
            eprintln!("   - {problem}");
        }
        process::exit(1);
    }

    let result = calculate_breakdown(&data);
    if !result.is_finite() {
        eprintln!("❌ Invalid calculation data: calculated footprint is too large");
        process::exit(1);
    }
    let comparison = FootprintComparison::new(result.total);

    println!("🌍 Estimated annual carbon footprint");
    println!("═══════════════════════════════════════");
    for (name, value) in result.categories() {
        println!("  {:<16} {:>12.2} kg CO2e", name, value);
    }
    println!("  ─────────────────────────────────────");
    println!("  {:<16} {:>12.2} kg CO2e", "Total", result.total);
    println!();
    println!("That is {}.", comparison.describe());
}
