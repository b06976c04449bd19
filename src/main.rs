use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use lembar::{
    DatabaseError, EmptyReason, QueryDescriptor, QueryEngine, QueryOutput, SelectOutcome,
    planner::{error::PlannerError, parser::SqlParser},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lembar",
    about = "Read-only queries over a SQLite database file"
)]
struct Cli {
    /// Path to the database file
    database: PathBuf,

    /// `.dbinfo`, `.tables`, or a SELECT statement
    #[arg(required_unless_present = "descriptor")]
    command: Option<String>,

    /// Query descriptor as JSON, e.g. {"table":"t","columns":"*","mode":"Select"}
    #[arg(long, conflicts_with = "command")]
    descriptor: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.is_fatal() {
                tracing::error!("{err}");
            }
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), DatabaseError> {
    let mut engine = QueryEngine::open(&cli.database)?;

    let descriptor = match (&cli.descriptor, cli.command.as_deref()) {
        (Some(json), _) => QueryDescriptor::from_json(json).map_err(PlannerError::from)?,
        (None, Some(".dbinfo")) => {
            println!("database page size: {}", engine.catalog().page_size());
            println!("number of tables: {}", engine.catalog().tables().len());
            return Ok(());
        }
        (None, Some(".tables")) => {
            println!("{}", engine.catalog().table_names().join(" "));
            return Ok(());
        }
        (None, Some(sql)) => SqlParser::new().parse_sql(sql)?,
        (None, None) => {
            return Err(DatabaseError::InvalidQuery {
                details: "no command given".to_string(),
            });
        }
    };

    match engine.execute(&descriptor)? {
        QueryOutput::Count(count) => println!("{count}"),
        QueryOutput::Select(SelectOutcome::Rows(rows)) => {
            for row in rows {
                println!("{}", row.join("|"));
            }
        }
        QueryOutput::Select(SelectOutcome::Empty(reason)) => match reason {
            EmptyReason::NoMatchingColumns => eprintln!("No rows found with given column(s)"),
            EmptyReason::NoMatchingRows => eprintln!("No rows found"),
        },
    }
    Ok(())
}
