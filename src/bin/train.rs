use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use q_connect_four::ai::QLearningAgent;
use q_connect_four::checkpoint::CheckpointManager;
use q_connect_four::config::AppConfig;
use q_connect_four::error::CheckpointError;
use q_connect_four::training::{Scoreboard, Trainer};

/// Train a tabular Q-learning Connect Four player against a random opponent.
#[derive(Parser)]
#[command(name = "train", about = "Train a Q-learning Connect Four agent")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of training games
    #[arg(long)]
    games: Option<usize>,

    /// Override learning rate
    #[arg(long)]
    alpha: Option<f64>,

    /// Override discount factor
    #[arg(long)]
    gamma: Option<f64>,

    /// Seed both the agent and the opponent for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Resume training from the latest checkpoint
    #[arg(long)]
    resume: bool,

    /// Number of table entries to print at debug level each log interval
    #[arg(long)]
    dump_entries: Option<usize>,

    /// Log the running score this often from a background thread (0 = off)
    #[arg(long, default_value_t = 0)]
    status_interval_ms: u64,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(games) = cli.games {
        app_config.training.num_games = games;
    }
    if let Some(alpha) = cli.alpha {
        app_config.agent.alpha = alpha;
    }
    if let Some(gamma) = cli.gamma {
        app_config.agent.gamma = gamma;
    }
    if let Some(seed) = cli.seed {
        app_config.training.seed = Some(seed);
    }
    if let Some(n) = cli.dump_entries {
        app_config.training.dump_entries = n;
    }
    app_config.validate().context("validating configuration")?;

    let mut agent = match app_config.training.seed {
        Some(seed) => QLearningAgent::with_seed(app_config.agent.clone(), seed),
        None => QLearningAgent::new(app_config.agent.clone()),
    };

    let manager = CheckpointManager::new(app_config.checkpoint.clone()).with_context(|| {
        format!(
            "creating checkpoint directory {}",
            app_config.checkpoint.checkpoint_dir.display()
        )
    })?;

    let games_already_played = if cli.resume {
        resume_agent(&mut agent, &manager)?
    } else {
        0
    };

    let trainer = Trainer::new(app_config.training.clone()).with_checkpoints(manager);

    let quit = Arc::new(AtomicBool::new(false));
    let status = (cli.status_interval_ms > 0).then(|| {
        spawn_status_thread(
            trainer.scoreboard(),
            Arc::clone(&quit),
            Duration::from_millis(cli.status_interval_ms),
        )
    });

    let result = trainer.train(&mut agent, games_already_played);

    quit.store(true, Ordering::Relaxed);
    if let Some(handle) = status {
        let _ = handle.join();
    }

    let summary = result.context("training failed")?;
    println!(
        "{} games | {} | epsilon {:.4} | {} states",
        summary.games, summary.scores, summary.final_epsilon, summary.table_states
    );
    if let Some(wr) = summary.final_eval_win_rate {
        println!("greedy win rate vs random: {:.1}%", wr * 100.0);
    }
    Ok(())
}

/// Load the latest checkpoint into `agent`, returning the number of games it
/// had already played. A missing checkpoint starts fresh.
fn resume_agent(agent: &mut QLearningAgent, manager: &CheckpointManager) -> Result<usize> {
    match manager.load_latest() {
        Ok(data) => {
            let game = data.metadata.game;
            log::info!(
                "resumed from {} (game {}, {} states)",
                data.path.display(),
                game,
                data.table.len()
            );
            data.restore_into(agent);
            Ok(game)
        }
        Err(CheckpointError::NoLatestSymlink(dir)) => {
            log::warn!("no checkpoint in {}, starting fresh", dir.display());
            Ok(0)
        }
        Err(e) => Err(e).context("loading latest checkpoint"),
    }
}

/// Periodically log the scoreboard until `quit` is set.
fn spawn_status_thread(
    scoreboard: Arc<Scoreboard>,
    quit: Arc<AtomicBool>,
    interval: Duration,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let tick = interval.min(Duration::from_millis(50));
        let mut elapsed = Duration::ZERO;
        while !quit.load(Ordering::Relaxed) {
            std::thread::sleep(tick);
            elapsed += tick;
            if elapsed >= interval {
                elapsed = Duration::ZERO;
                log::info!("score: {}", scoreboard.snapshot());
            }
        }
    })
}
