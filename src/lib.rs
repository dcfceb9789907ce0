//! Spam Detector: hybrid spam/ham message classifier with a chat front end.

pub mod chat;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod server;
