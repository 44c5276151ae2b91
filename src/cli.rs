use clap::{Parser, Subcommand};

/// keygate: ephemeral API key service
#[derive(Parser)]
#[command(name = "keygate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (defaults to KEYGATE_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the storage digest of a raw key, as it appears in logs
    Digest {
        token: String,
    },
}
