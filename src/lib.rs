pub mod cli;
pub mod command;
pub mod config;
pub mod handler;
pub mod localization;
pub mod media;
pub mod session;
