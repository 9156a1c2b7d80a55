//! Coloring Catalog - a coloring page catalog server.
//!
//! This binary starts the HTTP server and configures all components.

use std::io::{BufRead, IsTerminal};
use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coloring_catalog::{
    auth::{hash_password, SessionSigner},
    catalog::CatalogStore,
    config::{Cli, Command, HashPasswordConfig, ServeConfig, SyncConfig},
    server::{create_router, AppState, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::HashPassword(config) => run_hash_password(config),
        Command::Sync(config) => run_sync(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let credentials = match config.credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let layout = config.storage.layout();

    info!("Coloring Catalog v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Data dir: {}", layout.data_dir().display());
    info!("  Pages dir: {}", layout.pages_dir().display());
    info!("  Public prefix: {}", layout.public_prefix());
    info!("  Admin user: {}", credentials.username());
    if credentials.uses_plaintext() {
        warn!("  Admin password: PLAINTEXT - development only");
        warn!("        Use --admin-password-hash for production (see `hash-password`)");
    }
    if !config.secure_cookies {
        warn!("  Cookies: not marked Secure; enable --secure-cookies behind HTTPS");
    }
    info!(
        "  Thumbnails: {}px max edge, quality {}",
        config.storage.thumbnail_max_edge, config.storage.thumbnail_quality
    );

    if let Err(e) = layout.ensure_roots().await {
        error!("Failed to create catalog directories: {}", e);
        return ExitCode::FAILURE;
    }

    let store = CatalogStore::new(layout).with_thumbnail_settings(config.storage.thumbnail_settings());
    match store.sync_with_file_system().await {
        Ok(added) if !added.is_empty() => info!("  Registered {} new categories", added.len()),
        Ok(_) => {}
        Err(e) => warn!("  Initial category sync failed: {}", e),
    }
    info!("  Categories: {}", store.list_categories().await.len());

    let signer = SessionSigner::new(config.session_secret_or_empty(), credentials.username());
    let state = AppState::new(store, credentials, signer).with_secure_cookies(config.secure_cookies);

    let router = create_router(state, build_router_config(&config));

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/api/categories", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "coloring_catalog=debug,tower_http=debug"
    } else {
        "coloring_catalog=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new();

    // Apply CORS origins
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    if let Some(ref admin_dir) = config.admin_dir {
        router_config = router_config.with_admin_dir(admin_dir);
    }

    // Apply tracing setting
    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Hash Password Command
// =============================================================================

fn run_hash_password(config: HashPasswordConfig) -> ExitCode {
    let password = match config.password {
        Some(password) => password,
        None => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                eprintln!("Enter password, then press Enter:");
            }
            let mut line = String::new();
            if let Err(e) = stdin.lock().read_line(&mut line) {
                eprintln!("Error: failed to read password: {}", e);
                return ExitCode::FAILURE;
            }
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        eprintln!("Error: password must not be empty");
        return ExitCode::FAILURE;
    }

    match hash_password(&password) {
        Ok(hash) => {
            println!("{}", hash);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Sync Command
// =============================================================================

async fn run_sync(config: SyncConfig) -> ExitCode {
    // Initialize minimal logging for sync command
    if config.verbose {
        init_logging(true);
    }

    println!("Coloring Catalog Sync");
    println!("═════════════════════");
    println!();

    if let Err(e) = config.storage.validate() {
        println!("✗ Configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let layout = config.storage.layout();
    println!("✓ Index: {}", layout.index_path().display());
    println!("✓ Pages: {}", layout.pages_dir().display());

    if let Err(e) = layout.ensure_roots().await {
        println!("✗ Failed to create directories: {}", e);
        return ExitCode::FAILURE;
    }

    let store =
        CatalogStore::new(layout).with_thumbnail_settings(config.storage.thumbnail_settings());

    print!("Scanning category directories... ");
    match store.sync_with_file_system().await {
        Ok(added) => {
            println!("✓ {} new", added.len());
            for slug in &added {
                println!("  + {}", slug);
            }
        }
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    println!();
    println!("Categories:");
    println!("───────────");

    let categories = store.list_categories_with_images().await;
    if categories.is_empty() {
        println!("  (no categories)");
    } else {
        for category in &categories {
            let marker = if category.featured { "*" } else { " " };
            println!(
                " {} {} ({} image(s))",
                marker,
                category.slug,
                category.images.len()
            );
        }
        println!();
        println!(
            "Total: {} categories, {} image(s)",
            categories.len(),
            categories.iter().map(|c| c.images.len()).sum::<usize>()
        );
    }

    println!();
    println!("═════════════════════");
    println!("✓ Sync complete!");

    ExitCode::SUCCESS
}
