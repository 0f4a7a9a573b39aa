use std::{net::SocketAddr, process::exit, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pocketbook::{
    AppState, DisabledReceiptParser, GenerativeReceiptConfig, GenerativeReceiptParser,
    PaginationConfig, ReceiptParser, build_router, get_local_offset, graceful_shutdown,
    logging_middleware,
};

/// The web server for pocketbook.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    db_path: String,

    /// The port to serve the app from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// The canonical name of the local timezone, e.g. "Pacific/Auckland".
    #[arg(long, env = "TZ_NAME", default_value = "Etc/UTC")]
    timezone: String,

    /// The secret used to sign and encrypt auth cookies.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    secret: String,

    /// API key for the generative AI endpoint that parses receipts.
    ///
    /// Receipt scanning is disabled when this is not set.
    #[arg(long, env = "RECEIPT_API_KEY", hide_env_values = true)]
    receipt_api_key: Option<String>,

    /// Base URL of the generative AI endpoint.
    #[arg(long, env = "RECEIPT_API_URL", default_value = GenerativeReceiptConfig::DEFAULT_API_URL)]
    receipt_api_url: String,

    /// The model used to parse receipts.
    #[arg(long, env = "RECEIPT_MODEL", default_value = GenerativeReceiptConfig::DEFAULT_MODEL)]
    receipt_model: String,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    if get_local_offset(&args.timezone).is_none() {
        tracing::error!(
            "\"{}\" is not a valid canonical timezone name, e.g. \"Pacific/Auckland\"",
            args.timezone
        );
        exit(1);
    }

    let receipt_parser = build_receipt_parser(&args);

    let connection = match Connection::open(&args.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not open the database at {}: {error}", args.db_path);
            exit(1);
        }
    };

    let state = match AppState::new(
        connection,
        &args.secret,
        &args.timezone,
        PaginationConfig::default(),
        receipt_parser,
    ) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not initialize the app: {error}");
            exit(1);
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server stopped unexpectedly: {error}");
        exit(1);
    }
}

fn build_receipt_parser(args: &Args) -> Arc<dyn ReceiptParser> {
    let Some(api_key) = args.receipt_api_key.as_deref().filter(|key| !key.is_empty()) else {
        tracing::info!("RECEIPT_API_KEY is not set, receipt scanning is disabled");
        return Arc::new(DisabledReceiptParser);
    };

    let config = GenerativeReceiptConfig {
        api_key: api_key.to_owned(),
        api_url: args.receipt_api_url.clone(),
        model: args.receipt_model.clone(),
    };

    match GenerativeReceiptParser::new(config) {
        Ok(parser) => {
            tracing::info!("Receipt scanning enabled with model {}", args.receipt_model);
            Arc::new(parser)
        }
        Err(error) => {
            tracing::error!("Could not set up receipt scanning, it will be disabled: {error}");
            Arc::new(DisabledReceiptParser)
        }
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
