mod build;
mod clean;
mod resolve;
mod verify;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use resolve::cmd_resolve;
pub use verify::cmd_verify;
