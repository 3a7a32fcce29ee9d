use std::error::Error;
use std::path::PathBuf;

use common::keystore::{ClusterKeyStore, Keyring, ScopeDefaults, SecretScope};
use common::marker::Mode;
use common::rewrite::Rewriter;

use crate::args::Args;
use crate::state::{AppState, StateError};

/// Everything an op needs, resolved from flags, environment and config
#[derive(Debug, Clone)]
pub struct OpContext {
    /// Scope used by `enc`, `dec` and `init`
    pub defaults: ScopeDefaults,
    /// Whether the default scope is a local file or a cluster secret
    pub mode: Mode,
    pub plain: bool,
    pub key_bits: usize,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl OpContext {
    /// Resolve flags over environment over config file over defaults
    pub fn new(args: &Args) -> Result<Self, StateError> {
        let state = AppState::load(args.config.clone())?;
        tracing::debug!(path = %state.config_path.display(), "resolved configuration");
        let config = state.config;

        Ok(Self {
            defaults: ScopeDefaults::new(
                args.namespace.clone().unwrap_or(config.namespace),
                args.secret.clone().unwrap_or(config.secret),
            ),
            mode: if args.local { Mode::Local } else { Mode::Cluster },
            plain: args.plain || config.plain,
            key_bits: config.key_bits,
            input: args.input.clone(),
            output: args.output.clone(),
        })
    }

    pub fn default_scope(&self) -> SecretScope {
        self.defaults.scope(self.mode)
    }

    /// Key lookups for local files and, when a multi-threaded runtime is
    /// available, the current cluster
    pub fn keyring(&self) -> Keyring {
        match ClusterKeyStore::new() {
            Ok(cluster) => Keyring::with_cluster(cluster),
            Err(e) => {
                tracing::debug!("cluster key store disabled: {}", e);
                Keyring::local()
            }
        }
    }

    pub fn rewriter(&self) -> Rewriter<Keyring> {
        Rewriter::new(self.keyring()).plain(self.plain)
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("postcrypt").chain(args.iter().copied())).unwrap()
    }

    fn config_file(contents: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        let path = path.display().to_string();
        (dir, path)
    }

    #[test]
    fn test_flags_override_config() {
        let (_dir, config) = config_file("secret = \"from-config\"\nnamespace = \"cfg\"\n");
        let args = parse(&["--config", &config, "-s", "from-flag", "--local", "-p"]);
        let ctx = OpContext::new(&args).unwrap();

        assert_eq!(ctx.defaults, ScopeDefaults::new("cfg", "from-flag"));
        assert_eq!(ctx.mode, Mode::Local);
        assert!(ctx.plain);
        assert_eq!(
            ctx.default_scope(),
            SecretScope::Local(PathBuf::from("from-flag"))
        );
    }

    #[test]
    fn test_config_fills_defaults() {
        let (_dir, config) = config_file("plain = true\nkey_bits = 2048\n");
        let args = parse(&["--config", &config, "post"]);
        let ctx = OpContext::new(&args).unwrap();

        assert!(ctx.plain);
        assert_eq!(ctx.key_bits, 2048);
        assert_eq!(
            ctx.default_scope(),
            SecretScope::Cluster {
                namespace: "postcrypt".to_string(),
                name: "postcrypt".to_string()
            }
        );
        assert_eq!(ctx.input, PathBuf::from("-"));
    }

    #[test]
    fn test_keyring_without_runtime_is_local() {
        let (_dir, config) = config_file("");
        let ctx = OpContext::new(&parse(&["--config", &config])).unwrap();
        assert!(format!("{:?}", ctx.keyring()).contains("cluster: None"));
    }
}
