//! Common processing logic shared between the repos, hashes, and scan commands.

use super::ProgressReporter;
use super::config::Config;
use crate::Result;
use crate::scan::hosting::{ClientSettings, create_provider};
use crate::scan::{
    ContentFetcher, CrawlRules, ExclusionFilter, FetchSettings, NoProgress, Platform, Progress, Provider, RequestTracker, ScanPlan,
    Scanner,
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use core::time::Duration;
use std::sync::Arc;
use strum::IntoEnumIterator;

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    Auto,
}

impl ColorMode {
    fn enabled(self, is_terminal: impl FnOnce() -> bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => is_terminal(),
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Common arguments shared between the scanning commands
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitLab personal access token
    #[arg(long, value_name = "TOKEN", env = "GITLAB_TOKEN", hide_env_values = true)]
    pub gitlab_token: Option<String>,

    /// Codeberg personal access token
    #[arg(long, value_name = "TOKEN", env = "CODEBERG_TOKEN", hide_env_values = true)]
    pub codeberg_token: Option<String>,

    /// Path to configuration file (default is `hound.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Platforms to search; may be repeated (default is every platform)
    #[arg(long = "provider", value_name = "PLATFORM")]
    pub providers: Vec<Platform>,

    /// Search phrase to use instead of the configured terms; may be repeated
    #[arg(long = "term", value_name = "TEXT")]
    pub terms: Vec<String>,

    /// Use a different API endpoint for a platform (e.g. a self-hosted GitLab), as `PLATFORM=URL`; may be repeated
    #[arg(long = "api-url", value_name = "PLATFORM=URL", value_parser = parse_api_url)]
    pub api_urls: Vec<(Platform, String)>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

fn parse_api_url(text: &str) -> core::result::Result<(Platform, String), String> {
    let (platform, url) = text.split_once('=').ok_or_else(|| format!("expected PLATFORM=URL, got '{text}'"))?;
    let platform = platform.parse::<Platform>().map_err(|e| format!("unknown platform '{platform}': {e}"))?;
    let _ = url::Url::parse(url).map_err(|e| format!("invalid URL '{url}': {e}"))?;
    Ok((platform, url.to_string()))
}

impl CommonArgs {
    /// Selected platforms, in the fixed per-term order and without repeats.
    #[must_use]
    pub fn platforms(&self) -> Vec<Platform> {
        Platform::iter()
            .filter(|p| self.providers.is_empty() || self.providers.contains(p))
            .collect()
    }

    fn token(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::GitHub => self.github_token.as_deref(),
            Platform::GitLab => self.gitlab_token.as_deref(),
            Platform::Codeberg => self.codeberg_token.as_deref(),
            Platform::SourceForge => None,
        }
    }

    fn api_url(&self, platform: Platform) -> Option<&str> {
        self.api_urls.iter().rev().find(|(p, _)| *p == platform).map(|(_, url)| url.as_str())
    }

    /// Whether stdout should be colored.
    #[must_use]
    pub fn use_colors_for_output(&self) -> bool {
        self.color.enabled(|| {
            use std::io::{IsTerminal, stdout};
            stdout().is_terminal()
        })
    }
}

/// Initialize logger based on log level
pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // A logger may already be installed when commands run in-process more than once
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

/// Everything a scanning command needs, built from its arguments and configuration
#[derive(Debug)]
pub struct Common {
    pub config: Config,
    pub scanner: Scanner,
    pub tracker: RequestTracker,
}

impl Common {
    /// Set up logging, load configuration, and build the providers and scanner
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or an HTTP client cannot be built
    pub fn new(args: &CommonArgs) -> Result<Self> {
        init_logging(args.log_level);

        let mut config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
        if !args.terms.is_empty() {
            config.terms.clone_from(&args.terms);
            config.validate()?;
        }

        let tracker = RequestTracker::new();

        let progress: Arc<dyn Progress> = if args.log_level == LogLevel::None {
            let use_colors = args.color.enabled(|| {
                use std::io::{IsTerminal, stderr};
                stderr().is_terminal()
            });
            Arc::new(ProgressReporter::new(Duration::from_millis(300), use_colors))
        } else {
            Arc::new(NoProgress)
        };

        let providers = build_providers(args, &config, &tracker)?;
        let scanner = build_scanner(&config, providers, tracker.clone(), progress)?;

        Ok(Self { config, scanner, tracker })
    }
}

fn build_providers(args: &CommonArgs, config: &Config, tracker: &RequestTracker) -> Result<Vec<Arc<dyn Provider>>> {
    let settings = ClientSettings::new(config.request_timeout, tracker.clone());

    args.platforms()
        .into_iter()
        .map(|platform| create_provider(platform, args.token(platform), args.api_url(platform), &settings))
        .collect()
}

/// Assemble a scanner from configuration and a set of providers
///
/// # Errors
///
/// Returns an error if the download client cannot be built
pub fn build_scanner(config: &Config, providers: Vec<Arc<dyn Provider>>, tracker: RequestTracker, progress: Arc<dyn Progress>) -> Result<Scanner> {
    let crawler = crate::scan::TreeCrawler::new(crawl_rules(config));

    let fetcher = ContentFetcher::new(
        FetchSettings {
            file_timeout: config.file_timeout,
            asset_timeout: config.asset_timeout,
            max_file_size: config.max_file_size,
            max_asset_size: config.max_asset_size,
            fetch_pause: config.fetch_pause,
        },
        tracker.clone(),
    )?;

    let plan = ScanPlan {
        terms: config.terms.clone(),
        max_results: config.max_results,
        repository_pause: config.repository_pause,
        term_pause: config.term_pause,
    };

    Ok(Scanner::new(
        providers,
        ExclusionFilter::new(&config.exclude_keywords),
        crawler,
        fetcher,
        plan,
        tracker,
        progress,
    ))
}

fn crawl_rules(config: &Config) -> CrawlRules {
    CrawlRules {
        extensions: config.extensions.iter().map(|e| e.to_lowercase()).collect(),
        skip_dirs: config.skip_dirs.iter().cloned().collect(),
        max_file_size: config.max_file_size,
        max_asset_size: config.max_asset_size,
        max_releases: config.max_releases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(flatten)]
        common: CommonArgs,
    }

    fn parse(args: &[&str]) -> CommonArgs {
        Harness::try_parse_from(core::iter::once("test").chain(args.iter().copied())).unwrap().common
    }

    #[test]
    fn test_all_platforms_by_default() {
        let args = parse(&[]);
        assert_eq!(
            args.platforms(),
            [Platform::GitHub, Platform::GitLab, Platform::Codeberg, Platform::SourceForge]
        );
    }

    #[test]
    fn test_selected_platforms_keep_fixed_order() {
        let args = parse(&["--provider", "codeberg", "--provider", "github", "--provider", "codeberg"]);
        assert_eq!(args.platforms(), [Platform::GitHub, Platform::Codeberg]);
    }

    #[test]
    fn test_unknown_platform_rejected() {
        assert!(Harness::try_parse_from(["test", "--provider", "bitbucket"]).is_err());
    }

    #[test]
    fn test_tokens_per_platform() {
        let args = parse(&["--github-token", "gh", "--gitlab-token", "gl", "--codeberg-token", "cb"]);
        assert_eq!(args.token(Platform::GitHub), Some("gh"));
        assert_eq!(args.token(Platform::GitLab), Some("gl"));
        assert_eq!(args.token(Platform::Codeberg), Some("cb"));
        assert_eq!(args.token(Platform::SourceForge), None);
    }

    #[test]
    fn test_api_url_override() {
        let args = parse(&["--api-url", "gitlab=http://127.0.0.1:8080/api/v4"]);
        assert_eq!(args.api_url(Platform::GitLab), Some("http://127.0.0.1:8080/api/v4"));
        assert_eq!(args.api_url(Platform::GitHub), None);
        assert!(Harness::try_parse_from(["test", "--api-url", "gitlab"]).is_err());
    }

    #[test]
    fn test_crawl_rules_lowercase_extensions() {
        let config = Config {
            extensions: vec![".EXE".into(), ".py".into()],
            ..Config::builtin().unwrap()
        };
        let rules = crawl_rules(&config);
        assert_eq!(rules.extensions.as_ref(), [".exe".to_string(), ".py".to_string()]);
    }
}
