pub mod config;
pub mod domain;
pub mod mail;
pub mod services;
pub mod store;
pub mod summarize;
pub mod terminal;
