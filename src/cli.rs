use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::info;

use crate::api::{ApiClient, ApiError};
use crate::capture::{BeverageStep, SelectionError, Submission, SubmitOutcome};
use crate::catalog::{self, Category, COFFEE_BRANDS};
use crate::models::AuthParams;
use crate::stats::{flatten_json, StatsPeriod, StatsSeries};
use crate::utils::{format_time_label, local_datetime, parse_date, parse_hour_minute, parse_time_label};
use crate::Config;

#[derive(Parser)]
#[command(name = "sleeplog")]
#[command(about = "Sleep and caffeine tracker for the terminal")]
#[command(version)]
pub struct Cli {
    /// Use development mode (separate config and log directory)
    #[arg(long)]
    pub dev: bool,

    /// Backend base URL, overriding the config file and environment
    #[arg(long)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Log one drink
    Add(AddArgs),
    /// Read or change the sleep goal
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },
    /// Print aggregate statistics
    Stats {
        /// sleep or caffeine
        series: StatsSeries,
        /// weekly, monthly, four-weeks or four-months
        period: StatsPeriod,
    },
    /// List categories, brands, drinks and sizes
    Catalog,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AddArgs {
    /// Intake time (HH:MM, defaults to now)
    #[arg(long)]
    pub time: Option<String>,
    /// Intake date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub date: Option<String>,
    /// coffee, tea, energy, soda or other
    #[arg(long)]
    pub category: String,
    /// Coffee brand id (see `catalog`)
    #[arg(long)]
    pub brand: Option<String>,
    /// Drink id or name
    #[arg(long)]
    pub drink: Option<String>,
    /// Coffee size label
    #[arg(long)]
    pub size: Option<String>,
    /// Drink name for the other category
    #[arg(long)]
    pub name: Option<String>,
    /// Caffeine in mg for the other category
    #[arg(long)]
    pub mg: Option<String>,
}

#[derive(Subcommand)]
pub enum GoalAction {
    /// Print the goal for a date
    Get {
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Set the goal (HH:MM or "오후 11:00")
    Set { time: String },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0}")]
    Selection(#[from] SelectionError),
    #[error("Invalid time '{0}': expected HH:MM")]
    InvalidTime(String),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Missing --{0}")]
    MissingArgument(&'static str),
    #[error("Entry is incomplete: {0}")]
    Incomplete(String),
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Build an API client from the `--api-url` override, config and
/// environment, authenticated as the configured user if any.
pub fn client_for(config: &Config, api_url: Option<&str>) -> Result<ApiClient, ApiError> {
    let client = ApiClient::from_config_value(api_url.or(config.api_url.as_deref()))?;
    Ok(match &config.user_id {
        Some(user_id) => client.with_auth(AuthParams {
            user_id: user_id.clone(),
            token: config.auth_token.clone(),
        }),
        None => client,
    })
}

fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    Ok(tokio::runtime::Builder::new_current_thread().enable_all().build()?)
}

fn parse_goal_time(raw: &str) -> Result<NaiveTime, CliError> {
    parse_hour_minute(raw.trim())
        .ok()
        .or_else(|| parse_time_label(raw))
        .ok_or_else(|| CliError::InvalidTime(raw.to_string()))
}

fn parse_optional_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, CliError> {
    match raw {
        Some(raw) => parse_date(raw)
            .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", raw, e))),
        None => Ok(today),
    }
}

/// Run the arguments through the beverage step and start a submission.
/// The returned step is waiting for the result of that submission.
pub fn build_submission(
    args: &AddArgs,
    now: chrono::DateTime<Local>,
) -> Result<(BeverageStep, Submission), CliError> {
    let date = parse_optional_date(args.date.as_deref(), now.date_naive())?;
    let time = match &args.time {
        Some(raw) => parse_hour_minute(raw.trim()).map_err(|_| CliError::InvalidTime(raw.clone()))?,
        None => now.time(),
    };
    let mut step = BeverageStep::new(local_datetime(date, time));

    let category: Category = args.category.parse().map_err(CliError::InvalidCategory)?;
    step.select_category(category)?;
    match category {
        Category::Coffee => {
            step.select_brand(args.brand.as_deref().ok_or(CliError::MissingArgument("brand"))?)?;
            step.select_drink(args.drink.as_deref().ok_or(CliError::MissingArgument("drink"))?)?;
            step.select_size(args.size.as_deref().ok_or(CliError::MissingArgument("size"))?)?;
        }
        Category::Other => {
            step.set_custom_name(args.name.as_deref().unwrap_or_default())?;
            step.set_custom_amount(args.mg.as_deref().unwrap_or_default())?;
        }
        _ => {
            step.select_drink(args.drink.as_deref().ok_or(CliError::MissingArgument("drink"))?)?;
        }
    }

    let submission = step.begin_submit().ok_or_else(|| {
        CliError::Incomplete("other drinks need --name and a positive whole --mg".to_string())
    })?;
    Ok((step, submission))
}

/// Handle the add command
pub fn handle_add(args: AddArgs, client: &ApiClient) -> Result<(), CliError> {
    let (mut step, submission) = build_submission(&args, Local::now())?;
    let result = runtime()?.block_on(client.add_caffeine(&submission.payload));
    match result {
        Ok(_) => {
            if let SubmitOutcome::Saved(entry) = step.finish_submit::<ApiError>(submission.ticket, Ok(())) {
                info!(id = %entry.id, "entry logged from cli");
                println!("Logged {} at {}", entry.beverage, entry.time_label());
            }
            Ok(())
        }
        Err(e) => {
            step.finish_submit(submission.ticket, Err(&e));
            Err(e.into())
        }
    }
}

/// Handle `goal get` and `goal set`
pub fn handle_goal(action: GoalAction, client: &ApiClient) -> Result<(), CliError> {
    let runtime = runtime()?;
    match action {
        GoalAction::Get { date } => {
            let date = parse_optional_date(date.as_deref(), Local::now().date_naive())?;
            let goal = runtime.block_on(client.sleep_goal(date))?;
            println!("{}  {}", date, format_time_label(goal));
        }
        GoalAction::Set { time } => {
            let goal = parse_goal_time(&time)?;
            runtime.block_on(client.set_sleep_goal(goal))?;
            println!("Sleep goal set to {}", format_time_label(goal));
        }
    }
    Ok(())
}

/// Handle the stats command
pub fn handle_stats(series: StatsSeries, period: StatsPeriod, client: &ApiClient) -> Result<(), CliError> {
    let body = runtime()?.block_on(client.stats(series, period))?;
    println!("{} - {}", series.label(), period.label());
    for line in flatten_json(&body) {
        println!("  {}", line);
    }
    Ok(())
}

/// Lines printed by the catalog command
pub fn catalog_listing() -> Vec<String> {
    let mut lines = Vec::new();
    for category in Category::ALL {
        lines.push(format!("{} ({})", category.label(), category.id()));
        match category {
            Category::Coffee => {
                for brand in COFFEE_BRANDS {
                    let sizes: Vec<&str> = brand.sizes.iter().map(|s| s.label).collect();
                    lines.push(format!("  {} ({}) sizes: {}", brand.store_name, brand.id, sizes.join(", ")));
                    for drink in brand.menu {
                        lines.push(format!("    {} ({})", drink.name, drink.id));
                    }
                }
            }
            Category::Other => lines.push("  any name with --name and --mg".to_string()),
            preset => {
                for drink in catalog::preset_drinks(preset) {
                    lines.push(format!("  {} ({})", drink.name, drink.id));
                }
            }
        }
    }
    lines
}

pub fn handle_catalog() {
    for line in catalog_listing() {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn now() -> chrono::DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 14, 5, 0).unwrap()
    }

    fn args(category: &str) -> AddArgs {
        AddArgs {
            category: category.to_string(),
            ..AddArgs::default()
        }
    }

    #[test]
    fn coffee_needs_brand_drink_and_size() {
        let mut add = args("coffee");
        add.brand = Some("starbucks".to_string());
        add.drink = Some("americano".to_string());
        assert!(matches!(
            build_submission(&add, now()),
            Err(CliError::MissingArgument("size"))
        ));

        add.size = Some("tall".to_string());
        add.time = Some("08:30".to_string());
        let (step, submission) = build_submission(&add, now()).unwrap();
        assert!(step.is_submitting());
        assert_eq!(submission.payload.store_name, "스타벅스");
        assert_eq!(submission.payload.size, "Tall");
        assert_eq!(step.intake_time().hour(), 8);
        assert_eq!(step.intake_time().minute(), 30);
    }

    #[test]
    fn other_with_zero_mg_is_incomplete() {
        let mut add = args("other");
        add.name = Some("홍삼차".to_string());
        add.mg = Some("0".to_string());
        assert!(matches!(build_submission(&add, now()), Err(CliError::Incomplete(_))));

        add.mg = Some("150".to_string());
        let (_, submission) = build_submission(&add, now()).unwrap();
        assert_eq!(submission.payload.menu_name, "홍삼차");
    }

    #[test]
    fn preset_drink_accepts_display_name() {
        let mut add = args("soda");
        add.drink = Some("펩시".to_string());
        let (_, submission) = build_submission(&add, now()).unwrap();
        assert_eq!(submission.payload.store_name, "탄산");
        assert_eq!(submission.payload.size, catalog::DEFAULT_SIZE_LABEL);
    }

    #[test]
    fn bad_inputs_are_reported() {
        assert!(matches!(build_submission(&args("juice"), now()), Err(CliError::InvalidCategory(_))));

        let mut add = args("tea");
        add.drink = Some("greenTea".to_string());
        add.time = Some("25:00".to_string());
        assert!(matches!(build_submission(&add, now()), Err(CliError::InvalidTime(_))));

        add.time = None;
        add.date = Some("yesterday".to_string());
        assert!(matches!(build_submission(&add, now()), Err(CliError::DateParseError(_))));
    }

    #[test]
    fn goal_time_accepts_both_formats() {
        let eleven_pm = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        assert_eq!(parse_goal_time("23:00").unwrap(), eleven_pm);
        assert_eq!(parse_goal_time("오후 11:00").unwrap(), eleven_pm);
        assert!(parse_goal_time("late").is_err());
    }

    #[test]
    fn catalog_lists_every_brand() {
        let listing = catalog_listing().join("\n");
        for brand in COFFEE_BRANDS {
            assert!(listing.contains(brand.store_name));
        }
        assert!(listing.contains("녹차 (greenTea)"));
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["sleeplog", "--dev", "stats", "caffeine", "four-weeks"]).unwrap();
        assert!(cli.dev);
        assert!(matches!(
            cli.command,
            Some(Commands::Stats {
                series: StatsSeries::Caffeine,
                period: StatsPeriod::FourWeeks
            })
        ));

        let cli = Cli::try_parse_from(["sleeplog"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["sleeplog", "goal", "set", "23:30"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Goal { action: GoalAction::Set { .. } })));
    }

    #[test]
    fn explicit_api_url_wins() {
        let mut config = Config::default();
        config.api_url = Some("http://from-config".to_string());
        config.user_id = Some("sleeper".to_string());
        let client = client_for(&config, Some("http://override/")).unwrap();
        assert_eq!(client.base_url(), "http://override");
    }
}
