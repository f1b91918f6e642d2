//! Logger set-up for the binaries. Library code only talks to the `log` facade.

mod init;

pub use init::{LoggingConfig, init_logging};
