pub use clap::Parser;

use std::path::PathBuf;

/// Seal and unseal marker values in rendered Kubernetes manifests.
///
/// With no subcommand, runs as a Helm post-renderer: manifests on stdin,
/// rewritten manifests on stdout.
#[derive(Parser, Debug)]
#[command(name = "postcrypt")]
#[command(about, long_about = None)]
pub struct Args {
    /// Treat --secret as a local key file instead of a cluster secret
    #[arg(long, global = true)]
    pub local: bool,

    /// Input file, `-` for stdin
    #[arg(short = 'i', long = "in", global = true, default_value = "-")]
    pub input: PathBuf,

    /// Output file, `-` for stdout
    #[arg(short = 'o', long = "out", global = true, default_value = "-")]
    pub output: PathBuf,

    /// Default secret: a secret name, or a key file path with --local
    #[arg(short, long, global = true, env = "POSTCRYPT_SECRET")]
    pub secret: Option<String>,

    /// Namespace of the default secret
    #[arg(short, long, global = true, env = "POSTCRYPT_NAMESPACE")]
    pub namespace: Option<String>,

    /// Write decrypted values as text rather than base64
    #[arg(short, long, global = true)]
    pub plain: bool,

    /// Path to the config file (defaults to ~/.postcrypt/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<crate::Command>,
}
