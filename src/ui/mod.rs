//! Terminal output
//!
//! Uses `cliclack` framing and spinners on an interactive terminal, with
//! plain `[OK]` / `[WARN]` lines in CI and when piped.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{intro, key_value, outro_success, outro_warn, step_ok, step_ok_detail, step_warn};
pub use progress::TaskSpinner;
