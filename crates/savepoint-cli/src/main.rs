use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use savepoint_core::providers::NoFrameHook;
use savepoint_core::{
    default_archive_root, AccountId, FrameHook, OpOutcome, Providers, SaveContext, SelectionMode,
    TextInput, TextInputResult, TitleId, TransferProgress, COMMON_SAVE,
};

#[derive(Parser, Debug)]
#[command(name = "savepoint", version, about = "Save-data catalog and backup/restore tool")]
struct Cli {
    /// Archive directory holding all backup slots
    #[arg(long)]
    archive_root: Option<PathBuf>,

    /// Configuration document (defaults to config.json in the archive root)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mounted storage root to scan; repeat for multiple volumes
    #[arg(long = "root")]
    roots: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan the storage roots and list the catalog per user
    List,
    /// Back up one title's save into an archive slot
    Backup {
        /// Owning account id (hex), or "common"
        user: String,
        /// Title position within the user's list (see `list`)
        title: usize,
        /// Slot index; 0 creates a new slot
        #[arg(default_value = "0")]
        slot: usize,
        /// Use the suggested slot name without prompting
        #[arg(long)]
        yes: bool,
    },
    /// Restore an archive slot onto the live save location
    Restore {
        /// Owning account id (hex), or "common"
        user: String,
        /// Title position within the user's list (see `list`)
        title: usize,
        /// Slot index (1 = newest)
        slot: usize,
    },
    /// Inspect or edit filters and favorites
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the configuration document
    Show,
    /// Hide a title id from discovery
    FilterAdd { id: String },
    /// Stop hiding a title id
    FilterRemove { id: String },
    /// Pin a title id first in sort order
    FavoriteAdd { id: String },
    /// Unpin a title id
    FavoriteRemove { id: String },
}

/// Line-edit text input: empty input accepts the suggestion, EOF cancels.
struct StdinInput;

impl TextInput for StdinInput {
    fn is_available(&self) -> bool {
        true
    }

    fn prompt(&self, suggestion: &str) -> TextInputResult {
        print!("Backup name [{}]: ", suggestion);
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => TextInputResult::Cancelled,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    TextInputResult::Accepted(suggestion.to_string())
                } else {
                    TextInputResult::Accepted(trimmed.to_string())
                }
            }
        }
    }
}

/// Frame hook driving a spinner with the file currently in flight.
struct SpinnerHook {
    bar: ProgressBar,
}

impl SpinnerHook {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} copying {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        SpinnerHook { bar }
    }
}

impl FrameHook for SpinnerHook {
    fn frame(&self, progress: &TransferProgress) {
        if progress.in_transfer {
            self.bar.set_message(progress.current_file.clone());
            self.bar.tick();
        }
    }
}

fn parse_user(s: &str) -> Result<AccountId> {
    if s.eq_ignore_ascii_case("common") {
        return Ok(COMMON_SAVE);
    }
    match AccountId::from_str_radix(s.trim_start_matches("0x"), 16) {
        Ok(id) => Ok(id),
        Err(_) => bail!("invalid account id: {s}"),
    }
}

fn parse_title_id(s: &str) -> Result<TitleId> {
    match TitleId::from_str_radix(s.trim_start_matches("0x"), 16) {
        Ok(id) => Ok(id),
        Err(_) => bail!("invalid title id: {s}"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let archive_root = cli.archive_root.unwrap_or_else(default_archive_root);

    let interactive = atty::is(atty::Stream::Stdout);
    let mut providers = Providers::default();
    if interactive {
        providers.frame = Box::new(SpinnerHook::new());
    } else {
        providers.frame = Box::new(NoFrameHook);
    }

    match cli.command {
        Commands::List => {
            let mut ctx = SaveContext::new(archive_root, cli.config, providers);
            require_roots(&cli.roots)?;
            ctx.scan(&cli.roots);

            for user in ctx.catalog.users() {
                if user == COMMON_SAVE {
                    println!("shared saves:");
                } else {
                    println!("user {:08x}:", user);
                }
                for (i, title) in ctx.catalog.titles_for(user).iter().enumerate() {
                    let star = if ctx.settings.favorite(title.id) { "*" } else { " " };
                    let slots = title.saves.len().saturating_sub(1);
                    println!(
                        "  [{:2}]{} {} ({} slot{})",
                        i,
                        star,
                        title.name,
                        slots,
                        if slots == 1 { "" } else { "s" }
                    );
                    if title.play_time_minutes > 0 {
                        println!("        played {}", title.play_time());
                    }
                }
            }
        }
        Commands::Backup { user, title, slot, yes } => {
            if interactive && !yes {
                providers.text_input = Box::new(StdinInput);
            }
            let mut ctx = SaveContext::new(archive_root, cli.config, providers);
            require_roots(&cli.roots)?;
            ctx.scan(&cli.roots);

            let mode = if yes { SelectionMode::Batch } else { SelectionMode::Single };
            let outcome = ctx.backup(parse_user(&user)?, title, slot, mode);
            report(outcome)?;
        }
        Commands::Restore { user, title, slot } => {
            let mut ctx = SaveContext::new(archive_root, cli.config, providers);
            require_roots(&cli.roots)?;
            ctx.scan(&cli.roots);

            let outcome = ctx.restore(parse_user(&user)?, title, slot);
            report(outcome)?;
        }
        Commands::Config { action } => {
            let mut ctx = SaveContext::new(archive_root, cli.config, providers);
            match action {
                ConfigAction::Show => {
                    println!("{}", ctx.settings.document());
                }
                ConfigAction::FilterAdd { id } => {
                    ctx.settings.set_filtered(parse_title_id(&id)?, true);
                    ctx.settings.save()?;
                }
                ConfigAction::FilterRemove { id } => {
                    ctx.settings.set_filtered(parse_title_id(&id)?, false);
                    ctx.settings.save()?;
                }
                ConfigAction::FavoriteAdd { id } => {
                    ctx.settings.set_favorite(parse_title_id(&id)?, true);
                    ctx.settings.save()?;
                }
                ConfigAction::FavoriteRemove { id } => {
                    ctx.settings.set_favorite(parse_title_id(&id)?, false);
                    ctx.settings.save()?;
                }
            }
        }
    }

    Ok(())
}

fn require_roots(roots: &[PathBuf]) -> Result<()> {
    if roots.is_empty() {
        bail!("no storage roots given; pass at least one --root");
    }
    Ok(())
}

fn report(outcome: OpOutcome) -> Result<()> {
    match &outcome {
        OpOutcome::Completed { message } => println!("{message}"),
        OpOutcome::CompletedWithNote { message } => println!("{message}"),
        OpOutcome::Cancelled => println!("{}", outcome.message()),
        OpOutcome::Failed { code, message } => bail!("{message} (code {code})"),
    }
    Ok(())
}
