pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "configurator",
    about = "Industrial configurator operator CLI",
    long_about = "Manage the component catalog, run configurations through pricing and keep the saved quote ledger.",
    after_help = "Examples:\n  configurator seed\n  configurator catalog --category motor\n  configurator configure --base BASE-003 --part MOTOR-003 --part CTRL-002 --save\n  configurator quotes list"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the sample industrial catalog into the catalog tables")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "List catalog components, optionally for one category")]
    Catalog {
        #[arg(long, help = "Category key, e.g. base_unit, motor, mounting_bracket")]
        category: Option<String>,
    },
    #[command(about = "Run a configuration through every step and price it")]
    Configure(ConfigureArgs),
    #[command(subcommand, about = "Inspect and maintain saved quotes")]
    Quotes(QuotesCommand),
}

#[derive(Debug, Clone, Args)]
pub struct ConfigureArgs {
    #[arg(long, help = "Base unit component id")]
    pub base: String,
    #[arg(long = "part", help = "Additional component id; repeat for each part")]
    pub parts: Vec<String>,
    #[arg(long, help = "Free-text notes carried on the quote")]
    pub notes: Option<String>,
    #[arg(long, help = "Persist the generated quote to the ledger")]
    pub save: bool,
}

#[derive(Debug, Subcommand)]
pub enum QuotesCommand {
    #[command(about = "List saved quotes")]
    List,
    #[command(about = "Show the export view of one quote")]
    Show { id: String },
    #[command(about = "Set the status of one quote (draft|submitted|approved|rejected)")]
    Status { id: String, status: String },
    #[command(about = "Delete one quote")]
    Delete { id: String },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Catalog { category } => commands::catalog::run(category.as_deref()),
        Command::Configure(args) => commands::configure::run(&args),
        Command::Quotes(command) => commands::quotes::run(&command),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
