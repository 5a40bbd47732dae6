//! Schema runner for the `database` remote.
//!
//! ```text
//! migration [up [N] | down [N] | fresh | reset | status] [DATABASE_URL]
//! ```
//!
//! The url falls back to `$DATABASE_URL`, then to the default sqlite file
//! the batchbook app uses.
use std::process::ExitCode;

use migration::Migrator;
use sea_orm::{Database, DbErr};
use sea_orm_migration::MigratorTrait;

const DEFAULT_URL: &str = "sqlite:./batchbook.db?mode=rwc";
const USAGE: &str = "usage: migration [up [N] | down [N] | fresh | reset | status] [DATABASE_URL]";

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Up(Option<u32>),
    Down(Option<u32>),
    Fresh,
    Reset,
    Status,
}

#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    step: Step,
    url: Option<String>,
}

fn parse(args: &[String]) -> Result<Invocation, String> {
    let mut rest = args.iter().map(String::as_str).peekable();
    let name = rest.next().unwrap_or("up");
    let mut count = || {
        rest.next_if(|arg| arg.starts_with(|c: char| c.is_ascii_digit() || c == '-'))
            .map(|arg| arg.parse::<u32>().map_err(|_| format!("bad step count {arg:?}")))
            .transpose()
    };
    let step = match name {
        "up" => Step::Up(count()?),
        "down" => Step::Down(count()?),
        "fresh" => Step::Fresh,
        "reset" => Step::Reset,
        "status" => Step::Status,
        other => return Err(format!("unknown command {other:?}")),
    };
    let url = rest.next().map(str::to_string);
    if let Some(extra) = rest.next() {
        return Err(format!("unexpected argument {extra:?}"));
    }
    Ok(Invocation { step, url })
}

async fn run(invocation: Invocation) -> Result<(), DbErr> {
    let url = invocation
        .url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_URL.to_string());
    let db = Database::connect(&url).await?;

    match invocation.step {
        Step::Up(n) => Migrator::up(&db, n).await?,
        Step::Down(n) => Migrator::down(&db, n).await?,
        Step::Fresh => Migrator::fresh(&db).await?,
        Step::Reset => Migrator::reset(&db).await?,
        Step::Status => Migrator::status(&db).await?,
    }
    let pending = Migrator::get_pending_migrations(&db).await?.len();
    println!("{url}: {pending} pending migration(s)");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match parse(&args) {
        Ok(invocation) => invocation,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    match run(invocation).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("migration failed: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn no_arguments_applies_everything() {
        let invocation = parse(&[]).unwrap();
        assert_eq!(invocation, Invocation { step: Step::Up(None), url: None });
    }

    #[test]
    fn step_count_and_url_are_optional() {
        assert_eq!(parse(&args(&["down", "1"])).unwrap().step, Step::Down(Some(1)));
        let invocation = parse(&args(&["up", "sqlite::memory:"])).unwrap();
        assert_eq!(invocation.step, Step::Up(None));
        assert_eq!(invocation.url.as_deref(), Some("sqlite::memory:"));
        let invocation = parse(&args(&["status", "sqlite:./other.db"])).unwrap();
        assert_eq!(invocation.step, Step::Status);
    }

    #[test]
    fn unknown_commands_and_extra_arguments_are_refused() {
        assert!(parse(&args(&["sideways"])).is_err());
        assert!(parse(&args(&["fresh", "a", "b"])).is_err());
        assert!(parse(&args(&["down", "-1"])).is_err());
    }
}
