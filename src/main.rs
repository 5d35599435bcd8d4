use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rosterbook::logic::{Logic, LogicError};
use rosterbook::storage::Storage;

#[derive(Parser)]
#[command(
    name = "rosterbook",
    version,
    about = "Student roster and timeslot manager"
)]
struct Cli {
    /// Directory holding roster.json and timeslots.json
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive command loop; 'exit' or 'quit' leaves
    Repl,
    /// Execute a single command line and exit
    Exec {
        /// The command, e.g.: delete 1:3
        line: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut logic = Logic::new(Storage::new(&cli.data_dir));

    match cli.command {
        Commands::Exec { line } => {
            let line = line.join(" ");
            match logic.execute(&line) {
                Ok(result) => print_result(&result),
                Err(error) => {
                    eprintln!("{error}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Repl => {
            println!("rosterbook ready. Type a command, or 'exit' to leave.");
            let stdin = io::stdin();
            loop {
                print!("> ");
                io::stdout().flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break; // EOF
                }
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "exit" || trimmed == "quit" {
                    break;
                }
                match logic.execute(trimmed) {
                    Ok(result) => print_result(&result),
                    Err(error @ LogicError::Storage(_)) => eprintln!("{error}"),
                    Err(error) => println!("{error}"),
                }
            }
        }
    }
    Ok(())
}

fn print_result(result: &rosterbook::command::CommandResult) {
    println!("{}", result.feedback);
    if let Some(ranges) = &result.ranges {
        for &(start, end) in ranges {
            println!("  {}", rosterbook::model::timeslot::format_range(start, end));
        }
    }
}
