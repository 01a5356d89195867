use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use connect_four_arena::ai::{
    ConnectFourAgent, HumanPlayer, Participant, RandomPlayer, ScriptedPlayer,
};
use connect_four_arena::arena::{winning_seat, Arena, Seat};
use connect_four_arena::checkpoint::CheckpointManager;
use connect_four_arena::config::AppConfig;
use connect_four_arena::game::ConnectFour;
use connect_four_arena::training::trainer::CENTER_FIRST;
use connect_four_arena::training::{OpponentKind, Trainer};

/// Train a DQN Connect Four agent and pit it against other players.
#[derive(Parser)]
#[command(name = "connect-four-arena", version, about)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Train the agent against a fixed opponent, saving checkpoints.
    Train {
        /// Override number of training games
        #[arg(long)]
        games: Option<usize>,

        /// Override learning rate
        #[arg(long)]
        lr: Option<f64>,

        /// Override the training opponent
        #[arg(long, value_enum)]
        opponent: Option<OpponentKind>,

        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Resume from the latest checkpoint
        #[arg(long)]
        resume: bool,
    },

    /// Pit the greedy agent against an opponent and print the tally.
    Arena {
        /// Weights to load; defaults to the latest checkpoint
        #[arg(long)]
        weights: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "random")]
        opponent: OpponentKind,

        #[arg(long, default_value_t = 20)]
        games: usize,

        /// Log every turn
        #[arg(long)]
        verbose: bool,
    },

    /// Play against the agent on the terminal.
    Play {
        /// Weights to load; defaults to the latest checkpoint
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Let the agent move first
        #[arg(long)]
        agent_first: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.print_config {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    match cli.command {
        Some(Command::Train {
            games,
            lr,
            opponent,
            seed,
            resume,
        }) => {
            if let Some(games) = games {
                config.training.num_games = games;
            }
            if let Some(lr) = lr {
                config.agent.learning_rate = lr;
            }
            if let Some(opponent) = opponent {
                config.training.opponent = opponent;
            }
            if seed.is_some() {
                config.training.seed = seed;
            }
            config.validate().context("invalid configuration after overrides")?;
            train(&config, resume)
        }
        Some(Command::Arena {
            weights,
            opponent,
            games,
            verbose,
        }) => arena(&config, weights.as_deref(), opponent, games, verbose),
        Some(Command::Play {
            weights,
            agent_first,
        }) => play(&config, weights.as_deref(), agent_first),
        None => bail!("no subcommand given (try `train`, `arena` or `play`)"),
    }
}

fn agent_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_os_rng(),
    }
}

fn train(config: &AppConfig, resume: bool) -> Result<()> {
    let manager = CheckpointManager::new(config.checkpoint.clone()).with_context(|| {
        format!(
            "creating checkpoint directory {}",
            config.checkpoint.checkpoint_dir.display()
        )
    })?;

    let mut agent = ConnectFourAgent::with_network(config.agent.clone(), agent_rng(config.training.seed));
    let mut games_before = 0;
    if resume {
        let latest = manager.latest().context("finding checkpoint to resume from")?;
        manager
            .restore(&latest, &mut agent)
            .with_context(|| format!("restoring {}", latest.path.display()))?;
        games_before = latest.metadata.games_played;
    }

    let mut trainer = Trainer::new(config.training.clone()).with_checkpoints(manager);
    let summary = trainer.train(&mut agent, games_before).context("training failed")?;

    println!(
        "Trained {} games ({} updates, epsilon {:.3})",
        summary.games_played, summary.train_steps, summary.epsilon
    );
    println!(
        "Final eval vs random: {} wins, {} losses, {} draws",
        summary.final_eval.first_wins, summary.final_eval.second_wins, summary.final_eval.draws
    );
    Ok(())
}

/// Build an agent and load weights from `weights` or the latest checkpoint.
fn load_agent(config: &AppConfig, weights: Option<&Path>) -> Result<ConnectFourAgent> {
    let mut agent = ConnectFourAgent::with_network(config.agent.clone(), agent_rng(config.training.seed));
    match weights {
        Some(path) => agent
            .load(path)
            .with_context(|| format!("loading weights from {}", path.display()))?,
        None => {
            let manager = CheckpointManager::new(config.checkpoint.clone())?;
            match manager.latest() {
                Ok(latest) => {
                    agent
                        .load(&latest.weights_path())
                        .with_context(|| format!("loading {}", latest.path.display()))?;
                    info!(path = %latest.path.display(), "loaded latest checkpoint");
                }
                Err(e) => warn!(error = %e, "no weights loaded, agent is untrained"),
            }
        }
    }
    Ok(agent)
}

fn opponent(kind: OpponentKind, seed: Option<u64>) -> Box<dyn Participant<ConnectFour>> {
    match kind {
        OpponentKind::Random => Box::new(match seed {
            Some(seed) => RandomPlayer::with_rng(StdRng::seed_from_u64(seed)),
            None => RandomPlayer::new(),
        }),
        OpponentKind::Scripted => Box::new(ScriptedPlayer::new(CENTER_FIRST.to_vec())),
    }
}

fn arena(
    config: &AppConfig,
    weights: Option<&Path>,
    kind: OpponentKind,
    games: usize,
    verbose: bool,
) -> Result<()> {
    let agent = load_agent(config, weights)?;
    let opponent = opponent(kind, config.training.seed);
    let opponent_name = Participant::<ConnectFour>::name(&opponent).to_string();

    let mut arena = Arena::new(ConnectFour::new(), agent.greedy(), opponent).verbose(verbose);
    let tally = arena.play_session(games).context("arena session aborted")?;

    println!("Results after {games} games:");
    println!("DQN wins: {}", tally.first_wins);
    println!("{opponent_name} wins: {}", tally.second_wins);
    println!("Draws: {}", tally.draws);
    Ok(())
}

fn play(config: &AppConfig, weights: Option<&Path>, agent_first: bool) -> Result<()> {
    let agent = load_agent(config, weights)?;
    let human = HumanPlayer::new(io::stdin().lock(), io::stdout());
    let starting = if agent_first { Seat::First } else { Seat::Second };

    let mut arena = Arena::new(ConnectFour::new(), agent.greedy(), human);
    let result = arena.play_game(starting).context("game aborted")?;

    match winning_seat(starting, result) {
        Some(Seat::First) => println!("The agent wins."),
        Some(Seat::Second) => println!("You win!"),
        None => println!("Draw."),
    }
    Ok(())
}
