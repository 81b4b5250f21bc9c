//! Output functions for consistent CLI formatting

use super::context::UiContext;
use console::style;

/// Display intro banner
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::intro(style(title).cyan().bold()).ok();
    } else {
        println!("{}", style(title).cyan().bold());
    }
}

/// Display success outro
pub fn outro_success(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).green().bold()).ok();
    } else {
        println!("{} {}", style("[OK]").green(), message);
    }
}

/// Display warning outro
pub fn outro_warn(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).yellow().bold()).ok();
    } else {
        println!("{} {}", style("[WARN]").yellow(), message);
    }
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(message).ok();
    } else {
        println!("  {} {}", style("[OK]").green(), message);
    }
}

pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(format!("{} ({})", message, style(detail).dim())).ok();
    } else {
        println!("  {} {} ({})", style("[OK]").green(), message, detail);
    }
}

pub fn step_warn(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::warning(message).ok();
    } else {
        println!("  {} {}", style("[WARN]").yellow(), message);
    }
}

/// Print an aligned key-value line
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {:<9} {}", style(format!("{}:", key)).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_plain() {
        let ctx = UiContext::plain();
        // These should not panic
        intro(&ctx, "Warming site-20260113.2");
        step_ok(&ctx, "index.html");
        step_ok_detail(&ctx, "Index page served offline", "512 bytes");
        step_warn(&ctx, "Uncached page offline: 504 Offline");
        key_value(&ctx, "Entries", "12");
        outro_success(&ctx, "Done");
        outro_warn(&ctx, "1 offline probe(s) failed");
    }
}
