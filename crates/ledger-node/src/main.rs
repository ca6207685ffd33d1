mod constants;
mod error;
mod routes;

use clap::Parser;
use ledger_core::{Chain, ChainHandle, SubmissionWorkflow, Sha256Hasher, SystemClock};
use ledger_storage::SledStore;
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, Level};

use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_LISTEN};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Data directory for sled
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Keep the chain in memory only
    #[arg(long)]
    memory: bool,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) chain: ChainHandle,
    pub(crate) workflow: Arc<SubmissionWorkflow>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let chain = if args.memory {
        Chain::new()
    } else {
        let store = Arc::new(SledStore::open(&args.data_dir)?);
        Chain::open(store, Arc::new(Sha256Hasher), Arc::new(SystemClock))?
    };
    info!(height = chain.height(), "chain ready");

    let state = AppState {
        chain: ChainHandle::new(chain),
        workflow: Arc::new(SubmissionWorkflow::default()),
    };
    let app = routes::router(state);

    let addr: SocketAddr = args.listen.parse()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
