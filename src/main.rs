use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::init();
    let cfg = ifs_dancers::config::Config::parse();
    ifs_dancers::app::run(cfg)
}
