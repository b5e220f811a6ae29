use super::Host;
use super::config::Config;
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file (default is `hound.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

pub fn validate_config<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    let config_path = args.config.as_ref();

    match Config::load(Utf8Path::new("."), config_path) {
        Ok(config) => {
            let mut out = host.output();
            let _ = writeln!(out, "Configuration file is valid");
            if let Some(path) = config_path {
                let _ = writeln!(out, "Config file: {path}");
            } else {
                let _ = writeln!(out, "Using hound.toml from the working directory, or the default configuration");
            }
            let _ = writeln!(out, "{} search terms, {} extensions", config.terms.len(), config.extensions.len());
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Configuration validation failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}
