use clap::Parser;

/// ethfetch: resolve Ethereum transaction hashes through a cache, a local
/// store and a JSON-RPC node.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Ethereum JSON-RPC node URL.
    #[arg(long, default_value = "http://127.0.0.1:8545", env = "ETH_NODE_URL")]
    pub node_url: String,

    /// RPC username (optional; not needed for token-in-URL providers).
    #[arg(long, env = "ETH_NODE_USER")]
    pub rpc_user: Option<String>,

    /// RPC password (optional; not needed for token-in-URL providers).
    #[arg(long, env = "ETH_NODE_PASS")]
    pub rpc_pass: Option<String>,

    /// Cap on outbound RPC requests per second. Unlimited when omitted.
    #[arg(long, env = "ETH_NODE_RPS")]
    pub rpc_requests_per_second: Option<u32>,

    /// SQLite database URL.
    #[arg(long, default_value = "sqlite://ethfetch.db", env = "DB_CONNECTION_URL")]
    pub database_url: String,

    /// Address to bind the web server to.
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value = "8080", env = "API_PORT")]
    pub port: u16,

    /// Maximum concurrent ledger node calls per lookup.
    #[arg(long, default_value = "10")]
    pub fetch_concurrency: usize,

    /// Deadline in seconds for fetching one batch from the node.
    #[arg(long, default_value = "30")]
    pub fetch_timeout_secs: u64,

    /// How long a resolved transaction stays in the in-memory cache.
    #[arg(long, default_value = "3600")]
    pub cache_ttl_secs: u64,

    /// Interval between sweeps of expired cache entries.
    #[arg(long, default_value = "60")]
    pub cache_sweep_secs: u64,
}
