mod adapters;
mod cli;
mod config;
mod core;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let args = Cli::parse();
    cli::logging::init(args.verbose);

    let kubeconfig = args.kubeconfig.as_deref();
    let context = args.context.as_deref();

    let result = match &args.command {
        Commands::Cert(cert) => {
            cli::commands::cert::execute(cert, kubeconfig, context, args.config.as_deref())
        }
        Commands::Version {
            client,
            short,
            output,
        } => cli::commands::version::execute(*client, *short, *output, kubeconfig, context),
    };

    if let Err(e) = result {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}
