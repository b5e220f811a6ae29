//! Command dispatch logic for repo-hound

use super::{InitArgs, ScanArgs, ValidateArgs, init_config, process_scan, validate_config};
use crate::scan::ScanMode;
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "repo-hound", version, author, long_about = None)]
#[command(about = "Find mouse jiggler repositories on public code hosts and fingerprint their files")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: HoundSubcommand,
}

#[derive(Subcommand, Debug)]
enum HoundSubcommand {
    /// List the URLs of unique matching repositories
    Repos(Box<ScanArgs>),
    /// Print MD5 digests of candidate files and release assets in matching repositories
    Hashes(Box<ScanArgs>),
    /// List repositories together with the digests of their contents
    Scan(Box<ScanArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Errors
///
/// Returns an error if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);

    let (scan_args, mode) = match &cli.command {
        HoundSubcommand::Repos(scan_args) => (scan_args, ScanMode::Repos),
        HoundSubcommand::Hashes(scan_args) => (scan_args, ScanMode::Hashes),
        HoundSubcommand::Scan(scan_args) => (scan_args, ScanMode::Full),
        HoundSubcommand::Init(init_args) => return init_config(host, init_args),
        HoundSubcommand::Validate(validate_args) => return validate_config(host, validate_args),
    };

    let summary = process_scan(host, scan_args, mode).await?;
    log::info!(
        "Scan finished: {} repositories, {} digests, {} rate-limit cool-downs",
        summary.repositories,
        summary.digests,
        summary.cool_downs
    );

    Ok(())
}
