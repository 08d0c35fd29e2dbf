pub(crate) mod activation;
pub mod backup;
pub mod config;
pub mod db;
pub mod export;
pub mod init;
pub mod list;
pub mod log;
pub mod login;
pub mod logout;
pub mod reset;
pub mod skip;
pub mod start;
pub mod stats;
pub mod status;
pub mod stop;
pub mod watch;
