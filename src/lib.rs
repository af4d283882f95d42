pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod generate;
pub mod interactive;
pub mod logging;
pub mod render;
pub mod scanner;
pub mod session;
pub mod stamp;
pub mod store;
