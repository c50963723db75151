use clap::Parser;
use tbs::cli::{Args, build_config, init_logging, load_token_settings, open_database};
use tbs::seed::seed_default_users;
use tbs::{init_cleanup, run_server};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(tokens) = load_token_settings(&args) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if args.no_seed {
        info!("Skipping default user seeding");
    } else if let Err(e) = seed_default_users(&db).await {
        error!(error = %e, "Failed to seed default users");
        std::process::exit(1);
    }

    if args.insecure_cookies {
        warn!("Refresh cookie will be sent without the Secure flag");
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };

    let config = build_config(&args, db, tokens);

    init_cleanup(&config);

    match listener.local_addr() {
        Ok(local_addr) => info!(address = %local_addr, "Listening"),
        Err(_) => info!(address = %addr, "Listening"),
    }

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
