//! Spinner with CI fallback

use super::context::UiContext;
use console::style;

/// A task spinner that degrades to plain lines outside a terminal
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    fancy: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            fancy: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.fancy {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", style("[OK]").green(), message),
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", style("[FAIL]").red(), message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_plain() {
        let ctx = UiContext::plain();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Installing 12 entries...");
        spinner.stop("Installed 12 entries (active)");
        spinner.start("Scanning dist...");
        spinner.stop_error("Proxy generation failed");
    }
}
