mod metrics;
mod registration;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bracket_core::{
    load_config, load_config_from_env, validate_config, BlobStore, BracketError, CategoryEditor,
    Config, MatchPosition, SlotRef, SlotSide, SqliteBlobStore,
};

use registration::RegistrationFile;

/// Operate on one category's single-elimination bracket.
#[derive(Debug, Parser)]
#[command(name = "bracketctl", version)]
struct Cli {
    /// TOML configuration file. Defaults and BRACKET_* variables apply when omitted.
    #[arg(long, env = "BRACKET_CONFIG")]
    config: Option<PathBuf>,

    /// JSON file with the category key, tournament window and competitors.
    #[arg(long, short)]
    registrations: PathBuf,

    /// Print Prometheus metrics to stderr after the command.
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the bracket.
    Show,

    /// Print the category key, window, editability and seed order.
    Status,

    /// Record scores without finishing the match.
    Score(ScoreArgs),

    /// Record final scores and advance the winner.
    Submit(ScoreArgs),

    /// Advance the winner of a finished match.
    Advance(MatchArgs),

    /// Move a competitor one round forward.
    MoveRight(SlotArgs),

    /// Undo a forward move.
    MoveLeft(SlotArgs),

    /// Create the third-place match, or score it when scores are given.
    ThirdPlace(ThirdPlaceArgs),

    /// Print the provisional podium.
    Podium,

    /// Durably commit the current matches.
    Commit,

    /// Close the category and print the podium.
    Finish,
}

#[derive(Debug, Args)]
struct MatchArgs {
    /// Round number, 1-based.
    #[arg(long)]
    round: u32,

    /// Match order within the round, 1-based.
    #[arg(long)]
    order: u32,
}

impl MatchArgs {
    fn position(&self) -> MatchPosition {
        MatchPosition::new(self.round, self.order)
    }
}

#[derive(Debug, Args)]
struct ScoreArgs {
    #[command(flatten)]
    at: MatchArgs,

    /// Score of the first slot.
    first: u32,

    /// Score of the second slot.
    second: u32,
}

#[derive(Debug, Args)]
struct SlotArgs {
    #[command(flatten)]
    at: MatchArgs,

    /// Slot number: 1 or 2.
    #[arg(long, value_parser = parse_side)]
    slot: SlotSide,
}

impl SlotArgs {
    fn slot_ref(&self) -> SlotRef {
        SlotRef::new(self.at.position(), self.slot)
    }
}

#[derive(Debug, Args)]
struct ThirdPlaceArgs {
    /// Scores of the bout as FIRST SECOND.
    #[arg(long, num_args = 2, value_names = ["FIRST", "SECOND"])]
    score: Option<Vec<u32>>,
}

fn parse_side(value: &str) -> Result<SlotSide, String> {
    let number: u8 = value
        .parse()
        .map_err(|_| format!("invalid slot '{}'", value))?;
    SlotSide::try_from(number).map_err(|n| format!("slot must be 1 or 2, got {}", n))
}

fn main() {
    if let Err(e) = run() {
        // Rule violations exit with 2, everything else with 1.
        if e
            .downcast_ref::<BracketError>()
            .is_some_and(BracketError::is_user_facing)
        {
            eprintln!("rejected: {:#}", e);
            std::process::exit(2);
        }
        error!("Fatal error: {:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => load_config_from_env().context("Failed to load config from environment")?,
    };
    validate_config(&config).context("Configuration validation failed")?;

    init_logging(&config);
    info!("Database path: {:?}", config.database.path);

    let registrations = RegistrationFile::load(&cli.registrations)?;
    let key = registrations.key();

    let store: Arc<dyn BlobStore> = Arc::new(
        SqliteBlobStore::new(&config.database.path).context("Failed to open bracket store")?,
    );
    let mut editor = CategoryEditor::open(
        store,
        key,
        registrations.competitors,
        registrations.window,
        config.bracket.clone(),
    )
    .with_context(|| format!("Failed to load category {}", key))?;

    execute(&mut editor, cli.command)?;

    if cli.metrics {
        eprint!("{}", metrics::encode_metrics());
    }
    Ok(())
}

fn init_logging(config: &Config) {
    let default_filter = config.logging.filter.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn execute(editor: &mut CategoryEditor, command: Command) -> Result<()> {
    match command {
        Command::Show => print(editor.bracket()),
        Command::Status => print(&status(editor)),
        Command::Score(args) => {
            print(&editor.record_score(args.at.position(), args.first, args.second)?)
        }
        Command::Submit(args) => {
            print(&editor.submit_result(args.at.position(), args.first, args.second)?)
        }
        Command::Advance(args) => print(&editor.advance_winner(args.position())?),
        Command::MoveRight(args) => {
            let to = editor.move_right(args.slot_ref())?;
            print(&json!({ "from": args.slot_ref(), "to": to }))
        }
        Command::MoveLeft(args) => {
            let origin = editor.move_left(args.slot_ref())?;
            print(&json!({ "at": args.slot_ref(), "origin": origin }))
        }
        Command::ThirdPlace(args) => match args.score.as_deref() {
            Some(&[first, second]) => print(&editor.record_third_place_score(first, second)?),
            _ => print(&editor.create_third_place_match()?),
        },
        Command::Podium => print(&editor.podium()?),
        Command::Commit => {
            let assigned = editor.commit()?;
            print(&json!({ "assigned_ids": assigned }))
        }
        Command::Finish => print(&editor.finish_category()?),
    }
}

fn status(editor: &CategoryEditor) -> serde_json::Value {
    let seeds: Vec<_> = editor
        .bracket()
        .seeds
        .iter()
        .zip(1..)
        .map(|(c, seed)| json!({ "seed": seed, "id": c.id, "name": c.name }))
        .collect();
    json!({
        "category": editor.key().to_string(),
        "window": editor.window(),
        "finished": editor.is_finished(),
        "editable": editor.is_editable(),
        "seeds": seeds,
    })
}

fn print<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracket_core::testing::{fixtures, MockBlobStore};
    use bracket_core::BracketConfig;

    #[test]
    fn test_parse_move_right() {
        let cli = Cli::try_parse_from([
            "bracketctl",
            "--registrations",
            "reg.json",
            "move-right",
            "--round",
            "1",
            "--order",
            "3",
            "--slot",
            "2",
        ])
        .unwrap();

        match cli.command {
            Command::MoveRight(args) => {
                assert_eq!(
                    args.slot_ref(),
                    SlotRef::new(MatchPosition::new(1, 3), SlotSide::Second)
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_submit_scores() {
        let cli = Cli::try_parse_from([
            "bracketctl", "-r", "reg.json", "submit", "--round", "2", "--order", "1", "10", "3",
        ])
        .unwrap();
        match cli.command {
            Command::Submit(args) => {
                assert_eq!(args.at.position(), MatchPosition::new(2, 1));
                assert_eq!((args.first, args.second), (10, 3));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_status_lists_seeds_in_registration_order() {
        let store: Arc<dyn BlobStore> = Arc::new(MockBlobStore::new());
        let editor = CategoryEditor::open(
            store,
            fixtures::category_key(),
            fixtures::registrations(&["Ana", "Ben", "Cy"]),
            fixtures::closed_window(),
            BracketConfig::default(),
        )
        .unwrap();

        let value = status(&editor);
        assert_eq!(value["category"], "1:1");
        assert_eq!(value["editable"], false);
        assert_eq!(value["seeds"][0]["name"], "Ana");
        assert_eq!(value["seeds"][2]["seed"], 3);
        assert!(value["window"]["ends_at"].is_string());
    }

    #[test]
    fn test_invalid_slot_rejected() {
        let result = Cli::try_parse_from([
            "bracketctl", "-r", "reg.json", "move-left", "--round", "2", "--order", "1", "--slot",
            "3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_third_place_score_takes_two_values() {
        let cli = Cli::try_parse_from([
            "bracketctl", "-r", "reg.json", "third-place", "--score", "2", "1",
        ])
        .unwrap();
        match cli.command {
            Command::ThirdPlace(args) => assert_eq!(args.score, Some(vec![2, 1])),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
