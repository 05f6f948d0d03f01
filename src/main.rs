use anyhow::Context;
use clap::Parser;

use shadowshare::cli::{Cli, Mode};
use shadowshare::orchestrator;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("shadowshare: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match cli.mode()? {
        Mode::Distribute { k, n, width, height } => {
            orchestrator::distribute(&cli.dir, &cli.secret, k, n, cli.seed, width, height)
                .context("distribute failed")?;
        }
        Mode::Recover { k, width, height } => {
            orchestrator::recover(&cli.dir, &cli.secret, width, height, k)
                .context("recover failed")?;
        }
    }
    Ok(())
}
