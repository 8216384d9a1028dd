use dotenv::dotenv;
use sparsebot::rl::{GzipFileStore, SparseAgent};
use sparsebot::sim::{ScriptedEnvironment, SimConfig};
use sparsebot::state::TerranCatalog;
use sparsebot::{AgentConfig, Game};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sparsebot=debug,info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging()?;

    let config = AgentConfig::from_env();
    tracing::info!(
        "lr={}, discount={}, epsilon={}, table={}",
        config.learning_rate,
        config.discount,
        config.epsilon,
        config.data_file.display()
    );

    let environment = ScriptedEnvironment::new(SimConfig {
        episode_ticks: config.episode_ticks,
        minimap_size: config.minimap_size,
        seed: config.seed,
    });
    let agent = SparseAgent::new(
        &config,
        Box::new(TerranCatalog::new()),
        Box::new(GzipFileStore::new(&config.data_file)),
    );

    let mut game = Game::new(environment, agent);
    game.run(config.episodes)?;

    let metrics = game.agent().metrics();
    tracing::info!(
        "Finished {} episodes: {} wins, {} losses, {} ties, {} states learned",
        metrics.episodes,
        metrics.wins,
        metrics.losses,
        metrics.ties,
        game.agent().table().len()
    );
    Ok(())
}
