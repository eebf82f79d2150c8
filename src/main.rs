use clap::Parser;

use libd20::{DiceError, RollMode, RollResult, Roller, SessionEvent};

/// CLI for physically simulated d20 rolls
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Roll mode: normal, advantage (adv), or disadvantage (dis)
    #[arg(short, long, default_value = "normal", value_parser = parse_mode)]
    mode: RollMode,

    /// Number of rolls
    #[arg(short, long, default_value_t = 1)]
    rolls: usize,

    /// RNG seed for a reproducible roll sequence
    #[arg(short, long)]
    seed: Option<u64>,

    /// Maximum simulated seconds per roll before it is force-resolved
    #[arg(short, long, default_value_t = 20.0)]
    time: f32,

    /// Output format: text, json, csv
    #[arg(short, long, default_value = "text", value_parser = ["text", "json", "csv"])]
    output: String,

    /// Print per-die events to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Parse a roll mode name, accepting the adv/dis aliases.
fn parse_mode(s: &str) -> Result<RollMode, String> {
    s.parse()
}

fn run_rolls(args: &Args) -> Result<Vec<RollResult>, DiceError> {
    let mut roller = match args.seed {
        Some(seed) => Roller::with_seed(seed),
        None => Roller::new(),
    };
    roller.rest.max_sim_time = args.time;

    let mut results = Vec::with_capacity(args.rolls);
    for _ in 0..args.rolls {
        let result = roller.roll(args.mode)?;
        if args.verbose {
            for (die, event) in roller.drain_events() {
                let what = match event {
                    SessionEvent::ThrowStarted => "thrown",
                    SessionEvent::GroundImpact => "ground impact",
                };
                eprintln!("die {}: {}", die + 1, what);
            }
        }
        results.push(result);
    }
    Ok(results)
}

/// One-line text form: `d20 → 14` or `d20 (advantage) → 17  [6, 17]`.
fn format_roll(result: &RollResult) -> String {
    match result.mode {
        RollMode::Normal => format!("d20 → {}", result.chosen),
        _ => {
            let dice: Vec<String> = result.rolls.iter().map(|v| v.to_string()).collect();
            format!(
                "d20 ({}) → {}  [{}]",
                result.mode,
                result.chosen,
                dice.join(", ")
            )
        }
    }
}

fn format_output(
    results: &[RollResult],
    output_format: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    match output_format {
        "text" => {
            let mut lines = Vec::with_capacity(results.len());
            for (i, result) in results.iter().enumerate() {
                if results.len() > 1 {
                    lines.push(format!("Roll {}: {}", i + 1, format_roll(result)));
                } else {
                    lines.push(format_roll(result));
                }
            }
            Ok(lines.join("\n"))
        }
        "json" => {
            if results.len() == 1 {
                Ok(serde_json::to_string_pretty(&results[0])?)
            } else {
                Ok(serde_json::to_string_pretty(&results)?)
            }
        }
        "csv" => {
            let mut lines = vec![String::from("Roll,Mode,Die1,Die2,Chosen")];
            for (i, result) in results.iter().enumerate() {
                let die1 = result
                    .rolls
                    .first()
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                let die2 = result
                    .rolls
                    .get(1)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                lines.push(format!(
                    "{},{},{},{},{}",
                    i + 1,
                    result.mode,
                    die1,
                    die2,
                    result.chosen
                ));
            }
            Ok(lines.join("\n"))
        }
        _ => Err("Invalid output format".into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if args.verbose {
        eprintln!("Rolling {}x d20, mode {}", args.rolls, args.mode);
    }

    match run_rolls(&args) {
        Ok(results) => {
            let output = format_output(&results, &args.output)?;
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Roll failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
