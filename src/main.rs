//! batt - CLI entry point.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::Confirm;
use git2::Repository;
use tracing_subscriber::{EnvFilter, fmt};

use batt::commit::{collect_staged_diff, commit_staged};
use batt::config::{Credentials, GenerationConfig, template_path};
use batt::{CommitError, PromptTemplate, ProviderDispatcher, TokenBudget};

/// Generate conventional commit messages for staged changes.
#[derive(Parser, Debug)]
#[command(name = "batt")]
#[command(about = "AI-powered git commit message generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a commit message
    #[command(alias = "generate")]
    Gen {
        /// What to generate
        #[arg(value_enum, default_value = "commit")]
        target: Target,

        /// Commit without asking for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Print the generated message without committing
        #[arg(long)]
        dry_run: bool,

        /// Provider to use instead of the configured one
        #[arg(long)]
        provider: Option<String>,

        /// Log debug output to stderr
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Target {
    Commit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Gen {
            target: Target::Commit,
            yes,
            dry_run,
            provider,
            verbose,
        } => {
            init_logging(verbose);
            gen_commit(yes, dry_run, provider).await
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("BATT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn gen_commit(yes: bool, dry_run: bool, provider: Option<String>) -> Result<()> {
    let repo = Repository::discover(".")
        .context("Not a git repository. Please run this command in a git repository.")?;
    let root = repo
        .workdir()
        .context("Bare repositories are not supported")?
        .to_path_buf();

    println!("Reading staged changes...");
    let staged = match collect_staged_diff(&repo) {
        Ok(staged) => staged,
        Err(CommitError::NoStagedChanges) => {
            println!("No staged changes found.");
            println!("Stage your changes first with: git add <files>");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to read staged changes"),
    };
    println!(
        "Found {} staged files (+{} -{})",
        staged.changed_files.len(),
        staged.additions,
        staged.deletions
    );

    let mut config = GenerationConfig::load(&root);
    if let Some(provider) = provider {
        config.provider = provider.trim().to_lowercase();
    }

    let dispatcher = build_dispatcher(&root)?;
    let credentials = Credentials::from_env();

    println!("Generating commit message with {}...", config.provider);
    let message = match dispatcher.generate(&staged.text, &config, &credentials).await {
        Ok(message) => message,
        Err(e) => {
            eprintln!("Failed to generate commit message: {}", e);
            println!("You can write your commit message manually.");
            println!("Run: git commit");
            return Ok(());
        }
    };

    println!();
    println!("Generated commit message:");
    println!("  {}", message);
    println!();

    if dry_run {
        return Ok(());
    }

    if config.confirm_before_commit && !yes {
        let confirmed = Confirm::new()
            .with_prompt("Commit with this message?")
            .default(true)
            .interact()
            .context("Failed to read confirmation")?;

        if !confirmed {
            println!("Commit cancelled.");
            return Ok(());
        }
    }

    let oid = commit_staged(&repo, &message).context("Failed to commit staged changes")?;
    println!("✓ Committed {}", &oid.to_string()[..7]);

    Ok(())
}

fn build_dispatcher(root: &Path) -> Result<ProviderDispatcher> {
    let template = PromptTemplate::load_or_default(&template_path(root))
        .context("Failed to load prompt template")?;
    Ok(ProviderDispatcher::with_default_transports(
        template,
        TokenBudget::default(),
    ))
}
