//! NotifyMe core library: config, prompt validation, auth, and the HTTP gateway
//! used by the `notifyme` CLI.

pub mod auth;
pub mod config;
pub mod gateway;
pub mod init;
pub mod prompt;
