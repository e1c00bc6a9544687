//! Butler - Entry Point
//!
//! Runs one device command and prints the report on stdout.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use butler::backend::http::HttpBackend;
use butler::backend::mock::MockBackend;
use butler::backend::DeviceBackend;
use butler::catalog::cache::CatalogCache;
use butler::catalog::loader::{CatalogLoader, FileCatalogLoader, StaticCatalogLoader};
use butler::catalog::InMemoryCatalog;
use butler::engine::evaluator::ProbeMode;
use butler::engine::manager::DeviceManager;
use butler::errors::ManageError;
use butler::filesys::file::File;
use butler::logs::{init_logging, LogOptions};
use butler::storage::layout::StorageLayout;
use butler::storage::settings::Settings;
use butler::utils::version_info;

use anyhow::Context;
use tracing::{error, info};

const USAGE: &str = "usage: butler [--settings=PATH] [--catalog=PATH] [--json] [--demo] <command text>";

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let mut cli_args: HashMap<String, String> = HashMap::new();
    let mut words: Vec<String> = Vec::new();

    for arg in env::args().skip(1) {
        if let Some(flag) = arg.strip_prefix("--") {
            match flag.split_once('=') {
                Some((key, value)) => cli_args.insert(key.to_string(), value.to_string()),
                None => cli_args.insert(flag.to_string(), "true".to_string()),
            };
        } else {
            words.push(arg);
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("Failed to render version: {e}"),
        }
        return ExitCode::SUCCESS;
    }

    let command = match cli_args.get("command") {
        Some(command) => command.clone(),
        None => words.join(" "),
    };
    if command.trim().is_empty() {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }

    // Retrieve the settings file
    let layout = StorageLayout::default();
    let settings_file = match cli_args.get("settings") {
        Some(path) => File::new(path),
        None => layout.settings_file(),
    };
    let settings = match settings_file.read_json_or_default::<Settings>().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file {}: {}", settings_file.path().display(), e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.log_dir.clone(),
        json_format: settings.log_json,
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let demo = cli_args.contains_key("demo");
    let manager = match build_manager(&settings, &layout, &cli_args, demo) {
        Ok(manager) => manager,
        Err(e) => {
            error!("Failed to start: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    info!("Running butler (demo: {}) with settings: {:?}", demo, settings);
    let as_json = cli_args.contains_key("json");
    match manager.manage_device(&command).await {
        Ok(report) => {
            if as_json {
                print_json(&report);
            } else {
                println!("{}", report.render());
            }
            ExitCode::SUCCESS
        }
        Err(ManageError::NotFound(not_found)) => {
            if as_json {
                print_json(&not_found);
            } else {
                println!("{}", not_found);
            }
            ExitCode::FAILURE
        }
        Err(ManageError::Failed(e)) => {
            error!("Failed to manage device: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build_manager(
    settings: &Settings,
    layout: &StorageLayout,
    cli_args: &HashMap<String, String>,
    demo: bool,
) -> anyhow::Result<DeviceManager> {
    let loader: Arc<dyn CatalogLoader>;
    let backend: Arc<dyn DeviceBackend>;
    if demo {
        loader = Arc::new(StaticCatalogLoader::new(InMemoryCatalog::demo()));
        backend = Arc::new(MockBackend::demo());
    } else {
        let catalog_file = cli_args
            .get("catalog")
            .map(PathBuf::from)
            .or_else(|| settings.catalog.path.clone())
            .map(File::new)
            .unwrap_or_else(|| layout.catalog_file());
        loader = Arc::new(FileCatalogLoader::new(catalog_file));
        backend = Arc::new(
            HttpBackend::new(&settings.backend)
                .with_context(|| format!("Failed to create HTTP backend for {}", settings.backend.base_url))?,
        );
    }

    let cache = Arc::new(CatalogCache::new(loader, settings.catalog.reload_per_call));
    let mode = if settings.evaluation.concurrent_probes {
        ProbeMode::Concurrent
    } else {
        ProbeMode::Sequential
    };
    Ok(DeviceManager::new(cache, backend, mode))
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to render JSON: {e}"),
    }
}
