use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use focus_shield::client::app::{
    BlockCommand as ClientBlockCommand, Command as ClientCommand, DurationArguments,
};
use focus_shield::domain::entity::Mode;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    /// Path to a custom configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Path to the daemon's UNIX socket
    #[arg(short, long)]
    pub socket: Option<PathBuf>,
    /// Maximum logging level the subscriber should use
    #[arg(short, long, default_value_t = Level::INFO)]
    pub verbosity: Level,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the timer's current state
    State,
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Reset the current session
    Reset,
    /// Switch to another mode: focus, short_break or long_break
    Mode {
        #[arg(value_parser = parse_mode)]
        mode: Mode,
    },
    /// Show the durations, or change them when any flag is given
    Durations(Durations),
    /// Manage the sites blocked while focusing
    #[command(subcommand)]
    Block(Block),
    /// Print every timer update until interrupted
    Watch,
}

#[derive(Debug, Args)]
pub struct Durations {
    /// Minutes of a focus session
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub focus: Option<u64>,
    /// Minutes of a short break
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub short_break: Option<u64>,
    /// Minutes of a long break
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub long_break: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum Block {
    /// Block a site
    Add { site: String },
    /// Unblock a site
    Remove { site: String },
    /// List the blocked sites
    List,
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse().map_err(|err| format!("{err}"))
}

impl From<Command> for ClientCommand {
    fn from(value: Command) -> Self {
        match value {
            Command::State => Self::State,
            Command::Start => Self::Start,
            Command::Pause => Self::Pause,
            Command::Reset => Self::Reset,
            Command::Mode { mode } => Self::Mode(mode),
            Command::Durations(Durations {
                focus,
                short_break,
                long_break,
            }) => Self::Durations(DurationArguments {
                focus,
                short_break,
                long_break,
            }),
            Command::Block(Block::Add { site }) => Self::Block(ClientBlockCommand::Add(site)),
            Command::Block(Block::Remove { site }) => {
                Self::Block(ClientBlockCommand::Remove(site))
            }
            Command::Block(Block::List) => Self::Block(ClientBlockCommand::List),
            Command::Watch => Self::Watch,
        }
    }
}
