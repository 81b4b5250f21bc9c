//! Terminal detection for choosing between styled and plain output

use std::io::IsTerminal;

/// Environment variables set by common CI providers
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// Decides whether output may use spinners and cliclack framing
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    fancy: bool,
}

impl UiContext {
    /// Styled output only on an interactive terminal outside CI
    pub fn detect() -> Self {
        let tty = std::io::stdout().is_terminal() && std::io::stderr().is_terminal();
        Self {
            fancy: tty && !running_in_ci(),
        }
    }

    /// Plain line-oriented output
    pub fn plain() -> Self {
        Self { fancy: false }
    }

    pub fn use_fancy_output(&self) -> bool {
        self.fancy
    }
}

fn running_in_ci() -> bool {
    CI_VARS.iter().any(|var| std::env::var_os(var).is_some())
}
