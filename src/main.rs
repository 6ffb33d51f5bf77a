//! CLI entry point for `maildigest`.

use std::path::Path;

use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use maildigest::config::{self, Config};
use maildigest::credentials::{self, MailCredentials};
use maildigest::delivery::{self, SmtpDelivery};
use maildigest::digest::{self, artifact};
use maildigest::error::DigestError;
use maildigest::mailbox::ImapMailbox;
use maildigest::summary::{self, ChatCompletionSummarizer, PromptTemplate};

#[derive(Parser)]
#[command(
    name = "maildigest",
    version,
    about = "Summarize yesterday's email into a single digest message"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Mailbox login (also used for SMTP)
    #[arg(long, env = credentials::USER_VAR, global = true)]
    user: Option<String>,

    /// Mailbox password or app password
    #[arg(long, env = credentials::PASSWORD_VAR, hide_env_values = true, global = true)]
    password: Option<String>,

    /// Process this day (YYYY-MM-DD) instead of `lookback_days` ago
    #[arg(long, value_name = "DATE", global = true)]
    date: Option<NaiveDate>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the day's messages and write the records file
    Fetch {
        /// Also print the records as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Summarize the day's records file and email the result
    Summarize {
        #[command(flatten)]
        summary: SummaryArgs,
    },
    /// Fetch, then summarize
    Run {
        #[command(flatten)]
        summary: SummaryArgs,
    },
    /// Write the default configuration file
    InitConfig,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[derive(clap::Args)]
struct SummaryArgs {
    /// Key for the chat-completion endpoint
    #[arg(long, env = credentials::API_KEY_VAR, hide_env_values = true)]
    api_key: Option<String>,

    /// Where to send the digest; omit to only save it
    #[arg(long, env = credentials::RECIPIENT_VAR)]
    recipient: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let day = cli
        .date
        .unwrap_or_else(|| digest::cutoff_date(config.general.lookback_days));
    let date_key = digest::date_key(day, &config.general.date_format);

    let result = match cli.command {
        Commands::Fetch { json } => {
            let creds = credentials::load_credentials(cli.user, cli.password)?;
            cmd_fetch(&config, &creds, day, &date_key, json)
        }
        Commands::Summarize { summary } => {
            let creds = MailCredentials::from_parts(cli.user, cli.password);
            cmd_summarize(&config, creds.as_ref(), &date_key, &summary)
        }
        Commands::Run { summary } => {
            let creds = credentials::load_credentials(cli.user, cli.password)?;
            cmd_fetch(&config, &creds, day, &date_key, false)?;
            cmd_summarize(&config, Some(&creds), &date_key, &summary)
        }
        Commands::InitConfig => cmd_init_config(),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    };
    if let Err(err) = &result {
        log_failure(err);
    }
    result
}

/// Record why the run ended early in the log file as well as on stderr.
fn log_failure(err: &anyhow::Error) {
    match err.downcast_ref::<DigestError>() {
        Some(e) if e.is_fatal() => tracing::error!(error = %e, "Run aborted"),
        Some(e) => tracing::warn!(error = %e, "Run stopped"),
        None => tracing::error!(error = %err, "Run failed"),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "maildigest.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Connect, collect the day's records, and write them to the email dir.
fn cmd_fetch(
    config: &Config,
    creds: &MailCredentials,
    day: NaiveDate,
    date_key: &str,
    json: bool,
) -> anyhow::Result<()> {
    let mailbox = ImapMailbox::connect(&config.imap, creds)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Fetching [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let records = digest::ingest(
        mailbox,
        day,
        Some(&|current, total| {
            pb.set_length(total as u64);
            pb.set_position(current as u64);
        }),
    );
    pb.finish_and_clear();

    let path = artifact::write_artifact(&config.paths.email_dir, date_key, &records)?;
    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    eprintln!(
        "  Saved {} message(s) to {} ({})",
        records.len(),
        path.display(),
        humansize::format_size(size, humansize::BINARY)
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }
    Ok(())
}

/// Summarize the day's records, save the summary, and email it if a recipient is set.
fn cmd_summarize(
    config: &Config,
    creds: Option<&MailCredentials>,
    date_key: &str,
    args: &SummaryArgs,
) -> anyhow::Result<()> {
    let Some(api_key) = args.api_key.as_deref() else {
        anyhow::bail!(
            "Summarization API key not found: set {}",
            credentials::API_KEY_VAR
        );
    };

    let Some(content) = artifact::read_artifact(&config.paths.email_dir, date_key)? else {
        eprintln!("  No records for {date_key}, nothing to summarize");
        return Ok(());
    };
    if content.trim().is_empty() {
        eprintln!("  Records for {date_key} are empty, nothing to summarize");
        return Ok(());
    }

    let template = PromptTemplate::load(&config.summary.prompt_template)?;
    let summarizer = ChatCompletionSummarizer::new(&config.summary, api_key);
    let Some(text) =
        summary::summarize_digest(&summarizer, &template, &content, &config.summary.signature)
    else {
        return Ok(());
    };

    println!("{text}");
    let path = summary::write_summary(&config.paths.summary_dir, date_key, &text)?;
    eprintln!("  Saved summary to {}", path.display());

    send_summary(config, creds, date_key, &text, args.recipient.as_deref());
    Ok(())
}

/// Delivery is best-effort; every problem here is logged, never returned.
fn send_summary(
    config: &Config,
    creds: Option<&MailCredentials>,
    date_key: &str,
    text: &str,
    recipient: Option<&str>,
) {
    let Some(recipient) = recipient else {
        tracing::info!("No {} set, not sending", credentials::RECIPIENT_VAR);
        return;
    };
    let Some(creds) = creds else {
        tracing::error!("Mail credentials missing, cannot send digest");
        return;
    };
    match SmtpDelivery::new(&config.smtp, creds) {
        Ok(smtp) => {
            delivery::deliver_digest(&smtp, date_key, text, recipient);
        }
        Err(e) => tracing::error!(error = %e, "Could not set up SMTP"),
    }
}

fn cmd_init_config() -> anyhow::Result<()> {
    let path = config::save_config(&Config::default())?;
    println!("  Wrote default configuration to {}", path.display());
    if !Path::new(&Config::default().summary.prompt_template).exists() {
        println!(
            "  Remember to create a prompt template containing {}",
            summary::CONTENT_PLACEHOLDER
        );
    }
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "maildigest", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(cmd: &clap::Command, id: &str) -> Option<String> {
        cmd.get_arguments()
            .find(|arg| arg.get_id() == id)
            .and_then(|arg| arg.get_env())
            .map(|env| env.to_string_lossy().into_owned())
    }

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_read_shared_env_names() {
        let cmd = Cli::command();
        assert_eq!(env_of(&cmd, "user").as_deref(), Some(credentials::USER_VAR));
        assert_eq!(env_of(&cmd, "password").as_deref(), Some(credentials::PASSWORD_VAR));

        let summarize = cmd
            .find_subcommand("summarize")
            .expect("summarize subcommand");
        assert_eq!(env_of(summarize, "api_key").as_deref(), Some(credentials::API_KEY_VAR));
        assert_eq!(env_of(summarize, "recipient").as_deref(), Some(credentials::RECIPIENT_VAR));
    }

    #[test]
    fn test_missing_credentials_classified_fatal() {
        let err: anyhow::Error = credentials::load_credentials(None, None).unwrap_err().into();
        let digest_err = err.downcast_ref::<DigestError>().expect("digest error");
        assert!(digest_err.is_fatal());
    }
}
