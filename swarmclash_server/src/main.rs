//! SwarmClash server CLI.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use swarmclash_core::{World, WorldConfig};
use swarmclash_oracle::{Adjudicator, GeminiJudge, Judge, VerdictCache};
use swarmclash_server::simulation::{Command, Simulation};
use swarmclash_server::transport::{AppState, router};
use swarmclash_server::Hub;
use tokio::sync::mpsc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Authoritative SwarmClash game server
#[derive(Parser, Debug)]
#[command(name = "swarmclash-server")]
#[command(about = "Authoritative game server for SwarmClash", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Directory of browser client assets served at /
    #[arg(long, default_value = "frontend")]
    static_root: PathBuf,

    /// Oracle verdict cache file
    #[arg(long, default_value = "cache.json")]
    cache: PathBuf,

    /// World seed (0 = seed from entropy)
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("SwarmClash server v{}", env!("CARGO_PKG_VERSION"));

    let judge = GeminiJudge::from_env().map(|judge| Arc::new(judge) as Arc<dyn Judge>);
    let adjudicator = Arc::new(Adjudicator::new(VerdictCache::load(&args.cache), judge));
    info!(
        cache = %args.cache.display(),
        cached_verdicts = adjudicator.cached_len(),
        oracle = adjudicator.judge_enabled(),
        "oracle pipeline ready"
    );

    let world = World::new(WorldConfig {
        seed: args.seed,
        ..WorldConfig::default()
    });
    let hub = Arc::new(Hub::new());
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();

    let simulation = Simulation::new(
        world,
        hub.clone(),
        adjudicator.clone(),
        commands_tx.clone(),
    );
    let stats = simulation.stats();
    let simulation_task = tokio::spawn(simulation.run(commands_rx));

    let state = Arc::new(AppState {
        hub,
        commands: commands_tx.clone(),
        adjudicator,
        stats,
    });
    let app = router(state, args.static_root);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(commands_tx))
        .await?;

    simulation_task.await?;
    Ok(())
}

/// Waits for ctrl-c, then tells the actor to stop; it exits within one
/// tick.
async fn shutdown_signal(commands: mpsc::UnboundedSender<Command>) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
    let _ = commands.send(Command::Shutdown);
}
