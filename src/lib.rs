pub mod app;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod output;
pub mod paths;
pub mod prober;
pub mod runner;
pub mod utils;

#[cfg(test)]
mod tests;
