//! Generate command - build-output proxy

use crate::cli::args::GenerateArgs;
use crate::config::Config;
use crate::error::PrecacheResult;
use crate::manifest::{generate_dist_proxy, GenerateOptions};
use crate::ui::{self, TaskSpinner, UiContext};
use std::path::Path;

/// Execute the generate command
pub async fn execute(args: GenerateArgs, root: &Path, config: &Config) -> PrecacheResult<()> {
    let ctx = UiContext::detect();

    let mut options = GenerateOptions::from_config(root, config);
    if let Some(out_dir) = args.out_dir {
        options.out_dir = root.join(out_dir);
    }
    if let Some(prefix) = args.prefix {
        options.cache_prefix = prefix;
    }

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Scanning {}...", options.out_dir.display()));

    let generated = match generate_dist_proxy(&options).await {
        Ok(generated) => generated,
        Err(e) => {
            spinner.stop_error("Proxy generation failed");
            return Err(e);
        }
    };
    spinner.stop(&format!("Wrote {}", generated.path.display()));

    ui::key_value(&ctx, "Cache", &generated.namespace.name());
    ui::key_value(&ctx, "Entries", &generated.precache_count().to_string());
    ui::key_value(&ctx, "Manifest", &generated.digest);
    Ok(())
}
