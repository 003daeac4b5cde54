use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use minikube_env::{
    cli::{render, Args},
    MinikubeExtension, ParticipantManager, Session, TracingLogger,
};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.resolve_config().context("invalid configuration")?;
    let extension = MinikubeExtension::with_config(Arc::new(TracingLogger), &config)?;

    let mut manager = ParticipantManager::new();
    manager.register(Box::new(extension));

    let mut session = Session::new();
    manager.run_lifecycle(&mut session)?;

    print!("{}", render(session.system_properties(), args.format));
    Ok(())
}
