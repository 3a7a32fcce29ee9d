// CLI modules
mod args;
mod io;
mod op;
mod ops;
mod state;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Dec, Enc, Init, Post, Version};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

command_enum! {
    (Post, Post),
    (Enc, Enc),
    (Dec, Dec),
    (Init, Init),
    (Version, Version),
}

/// Log to stderr so stdout stays a clean manifest stream
fn init_tracing(log_level: &str) -> WorkerGuard {
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let log_level: tracing::Level = log_level.parse().unwrap_or(tracing::Level::WARN);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
    guard
}

async fn run(args: Args) -> i32 {
    let ctx = match op::OpContext::new(&args) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {}", e);
            return 1;
        }
    };

    let command = args.command.unwrap_or(Command::Post(Post));
    match command.execute(&ctx).await {
        Ok(output) => {
            let output = output.to_string();
            if !output.is_empty() {
                println!("{}", output);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let guard = init_tracing(&args.log_level);

    let code = run(args).await;

    // flush buffered log lines before exiting
    drop(guard);
    std::process::exit(code);
}
