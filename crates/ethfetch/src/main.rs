mod cli;
mod server;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};

use ethfetch_core::cache::{spawn_sweeper, ResultCache};
use ethfetch_core::fetcher::{FetcherConfig, LedgerFetcher};
use ethfetch_core::rpc::{HttpRpcClient, LedgerRpc};
use ethfetch_core::store::SqliteStore;
use ethfetch_core::LookupService;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    // Connect to the ledger node and verify it answers before serving.
    let rpc: Arc<dyn LedgerRpc> = Arc::new(
        HttpRpcClient::new(
            &args.node_url,
            args.rpc_user.as_deref(),
            args.rpc_pass.as_deref(),
            args.rpc_requests_per_second,
        )
        .context("configure ledger node client")?,
    );

    let chain_id = rpc.chain_id().await.map_err(|err| {
        let message = format_rpc_connect_error(&args.node_url, &err.to_string());
        eyre!(message).wrap_err("while attempting to connect to the ledger node")
    })?;
    tracing::info!(chain_id, "connected to ledger node");

    let store = SqliteStore::connect(&args.database_url)
        .await
        .context("open transaction store")?;
    store
        .ensure_schema()
        .await
        .context("prepare transaction store schema")?;
    store
        .health_check()
        .await
        .context("transaction store health check")?;

    let cache = Arc::new(ResultCache::new(Duration::from_secs(args.cache_ttl_secs)));
    let _sweeper = spawn_sweeper(&cache, Duration::from_secs(args.cache_sweep_secs.max(1)));

    let fetcher = LedgerFetcher::new(
        rpc,
        FetcherConfig {
            concurrency: args.fetch_concurrency,
            deadline: Duration::from_secs(args.fetch_timeout_secs),
        },
    );

    let state = server::AppState {
        lookup: LookupService::new(Arc::new(store), cache, fetcher),
    };
    let router = server::build_router(state);

    let bind_addr = format!("{}:{}", args.bind, args.port);
    if args.bind == "0.0.0.0" {
        tracing::warn!("server is bound to 0.0.0.0; it is accessible from the network");
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("bind TCP listener")?;

    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("run HTTP server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

fn format_rpc_connect_error(node_url: &str, source_error: &str) -> String {
    let mut lines = vec![
        format!("could not connect to ledger node `{node_url}`"),
        format!("RPC error: {source_error}"),
    ];

    if source_error.contains("dns error") {
        lines.push(
            "hint: hostname resolution failed; verify the node hostname and your DNS/network"
                .into(),
        );
    } else if source_error.contains("certificate") || source_error.contains("tls") {
        lines.push("hint: TLS handshake failed; verify that the node URL uses HTTPS correctly".into());
    } else if source_error.contains("401") || source_error.contains("403") {
        lines.push(
            "hint: authentication failed; verify the token in the URL or --rpc-user/--rpc-pass"
                .into(),
        );
    } else if source_error.contains("error sending request for url") {
        lines.push("hint: request could not be sent; verify the URL and that the node is reachable".into());
    }

    lines.join("\n")
}
