pub mod backup;
pub mod clock;
pub mod config;
pub mod encoder;
pub mod engine;
pub mod identity;
pub mod log;
pub mod stats;
pub mod timer;
pub mod watch;
