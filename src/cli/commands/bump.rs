//! Bump command - retag every versioned file

use crate::bump::bump_version;
use crate::cli::args::BumpArgs;
use crate::config::Config;
use crate::error::PrecacheResult;
use crate::ui::{self, UiContext};
use crate::version::VersionTag;
use std::path::Path;

/// Execute the bump command
pub async fn execute(args: BumpArgs, root: &Path, config: &Config) -> PrecacheResult<()> {
    // Validate before touching anything
    let tag = VersionTag::parse(&args.tag)?;
    let ctx = UiContext::detect();

    let report = bump_version(root, &tag, config).await?;
    for path in &report.changed {
        let shown = path.strip_prefix(root).unwrap_or(path);
        ui::step_ok(&ctx, &shown.display().to_string());
    }

    ui::outro_success(
        &ctx,
        &format!(
            "Updated version to {}, files written: {}",
            report.tag,
            report.files_written()
        ),
    );
    Ok(())
}
