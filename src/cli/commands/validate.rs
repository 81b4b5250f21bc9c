//! Validate command - release gate

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::Config;
use crate::error::{PrecacheError, PrecacheResult};
use crate::ui::{self, UiContext};
use crate::validate::validate_site;
use console::style;
use std::path::Path;

/// Execute the validate command
///
/// Every violation goes to stderr; the command fails if there is any.
pub async fn execute(args: ValidateArgs, root: &Path, config: &Config) -> PrecacheResult<()> {
    let report = validate_site(root, config).await?;

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_clean() {
        let ctx = UiContext::detect();
        ui::outro_success(&ctx, &report.summary());
    } else {
        eprintln!(
            "{} {} violation(s) in {} pages",
            style("Validation failed:").red().bold(),
            report.violations.len(),
            report.pages
        );
        for violation in &report.violations {
            eprintln!("  - {}", violation);
        }
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(PrecacheError::ValidationFailed(report.violations.len()))
    }
}
