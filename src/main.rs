use crate::cli::run;

pub mod cli;
mod config;
pub mod domain;
pub mod http;
pub mod storage;
pub mod validation;

fn main() -> anyhow::Result<()> {
    run()
}
