pub mod commands;
pub mod logging;
pub mod output;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Issue short-lived Kubernetes client credentials through the CSR flow.
#[derive(Parser, Debug)]
#[command(name = "konfig", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Kubeconfig to read (default: $KUBECONFIG, then ~/.kube/config)
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of current-context
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Path to alternative config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output. Repeat for more detail: -v, -vv, -vvv
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Issue a client certificate and write a kubeconfig for it
    Cert(CertArgs),

    /// Show client and API server versions
    Version {
        /// Only show the client version
        #[arg(long)]
        client: bool,
        /// Print version numbers only
        #[arg(long)]
        short: bool,
        /// Output format
        #[arg(short, long, value_enum)]
        output: Option<VersionFormat>,
    },
}

#[derive(Args, Debug)]
pub struct CertArgs {
    /// User name, becomes the certificate's common name
    #[arg(short, long)]
    pub username: String,

    /// Group to include. Repeat for several: -g dev -g ops
    #[arg(short, long = "group", required = true)]
    pub groups: Vec<String>,

    /// Write the kubeconfig to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Requested certificate lifetime in seconds
    #[arg(long)]
    pub expiration: Option<i32>,

    /// Seconds to wait for the signer after approval (0: no waiting)
    #[arg(long)]
    pub wait_timeout: Option<u64>,

    /// Namespace of the generated context
    #[arg(long)]
    pub namespace: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionFormat {
    Yaml,
    Json,
}
