use clap::Parser;
use shizuku::ShizukuError;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

mod commands;
mod config;

#[derive(Parser, Clone)]
#[clap(name = "shizuku", version, about)]
struct ShizukuArgs {
    /// Debug output
    #[clap(long, alias = "debug", global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: commands::ShizukuCommand,
}

#[tokio::main]
async fn main() {
    let args = ShizukuArgs::parse();

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = args.command.run().await {
        report(&error);
        std::process::exit(1);
    }
}

fn report(error: &anyhow::Error) {
    match error.downcast_ref::<ShizukuError>() {
        Some(e) => {
            let category = e.category();
            eprintln!("{}", category.title());
            eprintln!("{}", category.help());
            eprintln!();
            eprintln!("Details: {e}");
        }
        None => eprintln!("Error: {error:#}"),
    }
}
