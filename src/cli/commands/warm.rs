//! Warm command - install the proxy against a live origin
//!
//! Runs install and activation over HTTP into an in-process cache, then
//! cuts the network and checks that navigations still resolve through the
//! fallback chain.

use crate::cli::args::WarmArgs;
use crate::config::Config;
use crate::error::PrecacheResult;
use crate::manifest::{ProxySource, PROXY_FILE_NAME};
use crate::proxy::{
    CacheStorage, FetchOutcome, HttpNetwork, InterceptionConfig, MemoryCacheStorage, Registration,
    Request, ToggleNetwork,
};
use crate::ui::{self, TaskSpinner, UiContext};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Path never listed in any manifest, used to exercise the offline page
const UNCACHED_PROBE: &str = "__precache_probe__.html";

/// Execute the warm command
pub async fn execute(args: WarmArgs, root: &Path, config: &Config) -> PrecacheResult<()> {
    let ctx = UiContext::detect();

    let (source_path, prefix) = if args.dist {
        (
            root.join(&config.dist.out_dir).join(PROXY_FILE_NAME),
            config.dist_prefix(),
        )
    } else {
        (
            root.join(&config.site.proxy_source),
            config.site.cache_prefix.clone(),
        )
    };

    let source = ProxySource::load(&source_path).await?;
    let namespace = source.namespace(&prefix, &source_path)?;
    let scope = scope_of(&args.origin);
    debug!("Warming {} under {}", namespace, scope);

    ui::intro(&ctx, &format!("Warming {}", namespace));

    let storage = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ToggleNetwork::new(HttpNetwork::new(Some(Duration::from_secs(
        args.timeout,
    )))));
    let registration = Registration::new(storage.clone(), network.clone());

    let interception = InterceptionConfig::new(
        scope.clone(),
        namespace.clone(),
        source.precache_urls.clone(),
        &config.proxy,
    );

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!(
        "Installing {} entries from {}...",
        source.precache_urls.len(),
        scope
    ));
    let state = match registration.register(interception).await {
        Ok(state) => state,
        Err(e) => {
            spinner.stop_error("Install failed");
            return Err(e);
        }
    };
    let cached = storage.entry_count(&namespace.name()).await?;
    spinner.stop(&format!("Installed {} entries ({})", cached, state));

    network.set_online(false);
    let probes = [
        ("Index page", config.proxy.index_page.as_str()),
        ("Directory navigation", ""),
        ("Uncached page", UNCACHED_PROBE),
    ];

    let mut failed = 0;
    for (label, path) in probes {
        let Ok(url) = scope.join(path) else {
            continue;
        };
        let outcome = registration.handle_fetch(&Request::navigate(url.clone())).await;
        match outcome {
            FetchOutcome::Respond(response) if response.is_ok() => {
                ui::step_ok_detail(
                    &ctx,
                    &format!("{} served offline", label),
                    &format!("{} bytes", response.body().len()),
                );
            }
            FetchOutcome::Respond(response) => {
                failed += 1;
                ui::step_warn(
                    &ctx,
                    &format!("{} offline: {} {}", label, response.status(), response.status_text()),
                );
            }
            FetchOutcome::PassThrough => {
                failed += 1;
                ui::step_warn(&ctx, &format!("{} not intercepted: {}", label, url));
            }
        }
    }
    registration.settle().await;

    if failed == 0 {
        ui::outro_success(&ctx, "Offline fallbacks verified");
    } else {
        ui::outro_warn(&ctx, &format!("{} offline probe(s) failed", failed));
    }
    Ok(())
}

/// Directory-style scope for an origin URL
fn scope_of(origin: &Url) -> Url {
    let mut scope = origin.clone();
    scope.set_query(None);
    scope.set_fragment(None);
    if !scope.path().ends_with('/') {
        let path = format!("{}/", scope.path());
        scope.set_path(&path);
    }
    scope
}
