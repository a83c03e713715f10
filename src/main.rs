use clap::Parser;
use treebuilder::cli::{self, Commands};
use treebuilder::commands;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let args = cli::Args::parse();
    install_tracing(&args.log);

    let result = match args.command {
        Commands::Attach(attach_args) => commands::attach::run(attach_args),
        Commands::Validate {
            tree_file,
            reference,
        } => commands::validate::run(&tree_file, &reference),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn install_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
