use super::Host;
use super::common::{Common, CommonArgs};
use crate::Result;
use crate::reports::LineWriter;
use crate::scan::{ScanMode, ScanSummary};
use clap::Parser;

#[derive(Parser, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Run a scan in the given mode, streaming records to the host's output
///
/// # Errors
///
/// Returns an error if setup fails or the output cannot be written
pub async fn process_scan<H: Host>(host: &mut H, args: &ScanArgs, mode: ScanMode) -> Result<ScanSummary> {
    let use_colors = args.common.use_colors_for_output();
    let common = Common::new(&args.common)?;

    log::info!(
        "Scanning {} terms with max {} results per provider",
        common.config.terms.len(),
        common.config.max_results
    );

    let mut writer = LineWriter::new(host.output(), use_colors);
    common.scanner.run(mode, &mut writer).await
}
