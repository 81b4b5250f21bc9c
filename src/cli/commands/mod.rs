//! CLI command implementations

pub mod bump;
pub mod config;
pub mod generate;
pub mod validate;
pub mod warm;

pub use bump::execute as bump;
pub use config::execute as config;
pub use generate::execute as generate;
pub use validate::execute as validate;
pub use warm::execute as warm;
