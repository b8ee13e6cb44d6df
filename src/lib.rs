pub mod cli;
pub mod core;
pub mod logging;
pub mod provision;
pub mod server;
pub mod utils;
