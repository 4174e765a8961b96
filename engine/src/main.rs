use clap::Parser;
use engine::game::Session;
use engine::input::Autopilot;
use engine::network::{PeerListener, PeerSession};
use engine::runner::run_game_loop;
use engine::scores::{MemoryScoreStore, Profile};
use log::info;
use shared::Settings;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Player name used for score submission
    #[arg(short = 'u', long, default_value = "player")]
    username: String,

    /// Host a versus match on this address
    #[arg(short = 'H', long, conflicts_with = "connect")]
    host: Option<String>,

    /// Join a versus match hosted at this address
    #[arg(short = 'c', long)]
    connect: Option<String>,

    /// Tick rate (updates per second), overrides the config file
    #[arg(short = 't', long)]
    tick_rate: Option<u32>,

    /// Stop after this many ticks
    #[arg(short = 'm', long)]
    max_ticks: Option<u64>,

    /// Autopilot seed
    #[arg(short = 's', long, default_value = "1")]
    seed: u64,

    /// Starting lives, overrides the config file
    #[arg(short = 'l', long)]
    lives: Option<u32>,

    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(tick_rate) = args.tick_rate {
        settings.tick_rate = tick_rate;
    }
    if let Some(lives) = args.lives {
        settings.starting_lives = lives;
    }
    settings.validate()?;

    let send_timeout = Duration::from_millis(settings.peer_send_timeout_ms);
    let peer = if let Some(addr) = &args.host {
        let listener = PeerListener::bind(addr).await?;
        info!("Waiting for an opponent...");
        Some(listener.accept(send_timeout).await?)
    } else if let Some(addr) = &args.connect {
        Some(PeerSession::connect(addr, send_timeout).await?)
    } else {
        None
    };

    let store = MemoryScoreStore::new();
    let profile = Profile::load(&args.username, &store);
    let tick_rate = settings.tick_rate;
    let mut session = Session::new(settings, profile, store);
    let mut input = Autopilot::new(args.seed);

    info!("Starting autopilot game for {}", args.username);
    let summary = run_game_loop(&mut session, &mut input, peer, tick_rate, args.max_ticks).await;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    for (rank, (name, score)) in session.score_store().top(10).iter().enumerate() {
        info!("#{} {} {}", rank + 1, name, score);
    }

    Ok(())
}
