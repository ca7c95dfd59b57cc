use anyhow::Context;
use clap::{Args, Parser, Subcommand};

pub mod commands;
pub mod error;
pub mod queue;
pub mod store;
pub mod util;

use commands::config::{load_config, save_store_settings, BugdeskConfig};
use commands::detect::ScreenSize;
use commands::report::{BugReportForm, SubmissionContext};
use commands::submit::submit_with_config;
use queue::{FilePendingQueue, PendingQueue};

#[derive(Parser)]
#[command(name = "bugdesk", version, about = "Submit bug reports for the game showcase")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose and submit a bug report. Prints the outcome as JSON.
    Submit(SubmitArgs),
    /// List reports waiting in the local pending queue.
    Pending,
    /// Show or change settings in ~/.bugdesk/config.json.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
struct SubmitArgs {
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    severity: String,
    #[arg(long, default_value = "")]
    steps: String,
    #[arg(long, default_value = "")]
    contact: String,
    #[arg(long)]
    user_id: Option<String>,
    #[arg(long)]
    user_email: Option<String>,
    /// Page the report is about.
    #[arg(long, default_value = "")]
    url: String,
    #[arg(long, default_value = "")]
    user_agent: String,
    /// Screen resolution, e.g. 1920x1080.
    #[arg(long)]
    screen: Option<ScreenSize>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    Show,
    SetStore {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        queue_path: Option<String>,
    },
}

impl SubmitArgs {
    fn into_parts(self) -> (BugReportForm, SubmissionContext) {
        let form = BugReportForm {
            title: self.title,
            category: self.category,
            severity: self.severity,
            description: self.description,
            steps: self.steps,
            contact: self.contact,
        };
        let context = SubmissionContext {
            user_id: self.user_id,
            user_email: self.user_email,
            page_url: self.url,
            user_agent: self.user_agent,
            screen: self.screen,
        };
        (form, context)
    }
}

/// Entry point for the `bugdesk` binary. Returns `false` when a submission was rejected.
pub async fn run() -> anyhow::Result<bool> {
    match Cli::parse().command {
        Command::Submit(args) => submit(args).await,
        Command::Pending => pending().await,
        Command::Config(command) => config(command).await,
    }
}

async fn submit(args: SubmitArgs) -> anyhow::Result<bool> {
    // A broken config must not cost the user their report.
    let config = match load_config().await {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            log::warn!("ignoring config: {e}");
            BugdeskConfig::default()
        }
    };
    let (form, context) = args.into_parts();
    let outcome = submit_with_config(&config, &form, &context).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(outcome.ok)
}

async fn saved_config() -> anyhow::Result<BugdeskConfig> {
    Ok(load_config()
        .await
        .context("loading ~/.bugdesk/config.json")?
        .unwrap_or_default())
}

async fn pending() -> anyhow::Result<bool> {
    let path = saved_config().await?.resolved_queue_path()?;
    let reports = FilePendingQueue::new(&path)
        .pending()
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    log::debug!("{} pending in {}", reports.len(), path.display());
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(true)
}

async fn config(command: ConfigCommand) -> anyhow::Result<bool> {
    let config = match command {
        ConfigCommand::Show => saved_config().await?,
        ConfigCommand::SetStore {
            url,
            api_key,
            queue_path,
        } => save_store_settings(url, api_key, queue_path).await?,
    };
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(true)
}
