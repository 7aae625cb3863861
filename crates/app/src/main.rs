use std::fmt;
use std::sync::Arc;

use eco_core::model::{ChallengeId, PeerStanding, UserStanding};
use services::config::parse_seconds;
use services::{
    Clock, ConfigError, DashboardConfig, DashboardServices, JoinOutcome, LeaderboardSurface,
};
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt};
use ui::vm::{format_compact, format_refreshed_at};
use ui::{ChallengeBoard, LeaderboardPage, UiApp, build_dashboard_context};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingChallengeId,
    Config(ConfigError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingChallengeId => write!(f, "join requires a challenge id"),
            ArgsError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArgsError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for ArgsError {
    fn from(err: ConfigError) -> Self {
        ArgsError::Config(err)
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct CliApp {
    services: DashboardServices,
}

impl UiApp for CliApp {
    fn dashboard(&self) -> DashboardServices {
        self.services.clone()
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- watch [--base-url <url>] [--csrf-token <token>] [--interval <secs>]");
    eprintln!("  cargo run -p app -- join <challenge-id> [--base-url <url>] [--csrf-token <token>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --base-url http://localhost:8000/");
    eprintln!("  --interval 30");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ECO_BASE_URL, ECO_CSRF_TOKEN, ECO_POLL_INTERVAL_SECS, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Watch,
    Join(ChallengeId),
}

struct Args {
    command: Command,
    config: DashboardConfig,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter().peekable();
        let command = match args.peek().map(String::as_str) {
            Some("watch") => {
                args.next();
                Command::Watch
            }
            Some("join") => {
                args.next();
                let id = args
                    .next()
                    .filter(|id| !id.starts_with("--"))
                    .ok_or(ArgsError::MissingChallengeId)?;
                Command::Join(ChallengeId::new(id))
            }
            Some(first) if !first.starts_with("--") => {
                return Err(ArgsError::UnknownArg(first.to_owned()));
            }
            // Default behavior: watch the leaderboard.
            _ => Command::Watch,
        };

        let mut config = DashboardConfig::from_env()?;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => {
                    let value = require_value(&mut args, "--base-url")?;
                    config = config.with_base_url(&value)?;
                }
                "--csrf-token" => {
                    let value = require_value(&mut args, "--csrf-token")?;
                    config = config.with_csrf_token(value);
                }
                "--interval" => {
                    let value = require_value(&mut args, "--interval")?;
                    config = config.with_poll_interval(parse_seconds("--interval", &value)?);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { command, config })
    }
}

/// Logs a one-line summary of every region write, then forwards it to the page.
struct LoggedPage {
    page: Arc<LeaderboardPage>,
}

impl LeaderboardSurface for LoggedPage {
    fn has_personal_view(&self) -> bool {
        self.page.has_personal_view()
    }

    fn has_global_view(&self) -> bool {
        self.page.has_global_view()
    }

    fn render_user_stats(&self, user: &UserStanding) {
        tracing::info!(
            student = %user.name,
            rank = ?user.rank,
            points = %format_compact(user.eco_points),
            tier = %user.tier.name,
            "standing updated"
        );
        self.page.render_user_stats(user);
    }

    fn render_personal_window(&self, user: &UserStanding, rows: &[PeerStanding]) {
        tracing::info!(rows = rows.len(), "personal window updated");
        self.page.render_personal_window(user, rows);
    }

    fn render_global_top(&self, rows: &[PeerStanding]) {
        if let Some(leader) = rows.first() {
            tracing::info!(
                rows = rows.len(),
                leader = %leader.name,
                points = %format_compact(leader.eco_points),
                "global top updated"
            );
        }
        self.page.render_global_top(rows);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if matches!(argv.first().map(String::as_str), Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }

    let Args { command, config } = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let services = DashboardServices::from_config(config, Clock::default())?;
    let app: Arc<dyn UiApp> = Arc::new(CliApp { services });
    let context = build_dashboard_context(&app);

    match command {
        Command::Watch => {
            let page = Arc::new(LeaderboardPage::new(true, true));
            let logged = Arc::new(LoggedPage {
                page: Arc::clone(&page),
            });
            let Some(reconciler) = context.activate_leaderboard(logged) else {
                return Ok(());
            };

            tokio::signal::ctrl_c().await?;
            context.teardown();

            if let Some(at) = reconciler.last_refreshed_at() {
                tracing::info!(
                    last_refresh = %format_refreshed_at(at),
                    writes = page.render_count(),
                    "stopped watching"
                );
            }
            Ok(())
        }
        Command::Join(challenge_id) => {
            let board = Arc::new(ChallengeBoard::new([challenge_id.clone()]));
            context.activate_challenges(Arc::clone(&board));

            let outcome = context.join_challenge(&challenge_id).await;
            for entry in context.notifications().snapshot() {
                println!(
                    "[{}] {}",
                    entry.notification.kind.label(),
                    entry.notification.message
                );
            }
            context.teardown();

            match outcome {
                Some(JoinOutcome::Joined | JoinOutcome::AlreadyJoined) => Ok(()),
                Some(JoinOutcome::Failed { message }) => Err(message.into()),
                Some(JoinOutcome::InFlight) | None => Err("join did not run".into()),
            }
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| (*arg).to_owned()).collect()
    }

    #[test]
    fn defaults_to_watch() {
        let args = Args::parse(argv(&["--interval", "5"])).unwrap();
        assert_eq!(args.command, Command::Watch);
        assert_eq!(args.config.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn join_takes_an_id() {
        let args = Args::parse(argv(&["join", "17", "--csrf-token", "abc"])).unwrap();
        assert_eq!(args.command, Command::Join(ChallengeId::from("17")));
        assert_eq!(args.config.csrf_token, "abc");

        assert!(matches!(
            Args::parse(argv(&["join", "--csrf-token", "abc"])),
            Err(ArgsError::MissingChallengeId)
        ));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            Args::parse(argv(&["watch", "--interval"])),
            Err(ArgsError::MissingValue { flag: "--interval" })
        ));
        assert!(matches!(
            Args::parse(argv(&["watch", "--interval", "0"])),
            Err(ArgsError::Config(_))
        ));
        assert!(matches!(
            Args::parse(argv(&["serve"])),
            Err(ArgsError::UnknownArg(arg)) if arg == "serve"
        ));
    }
}
