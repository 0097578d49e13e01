use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ytaudio")]
#[command(about = "Download the audio track of a YouTube video over HTTP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Server(ServerArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to, overrides `server.bind_addr`
    #[arg(long)]
    pub address: Option<SocketAddr>,

    /// Configuration file, defaults to $YTAUDIO_CONFIG or config/ytaudio.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_args() {
        let cli = Cli::try_parse_from([
            "ytaudio",
            "server",
            "--address",
            "127.0.0.1:9000",
            "--config",
            "/etc/ytaudio.toml",
        ])
        .unwrap();

        let Commands::Server(args) = cli.command;
        assert_eq!(args.address, Some("127.0.0.1:9000".parse().unwrap()));
        assert_eq!(args.config, Some(PathBuf::from("/etc/ytaudio.toml")));
    }

    #[test]
    fn test_server_args_are_optional() {
        let cli = Cli::try_parse_from(["ytaudio", "server"]).unwrap();
        let Commands::Server(args) = cli.command;
        assert!(args.address.is_none());
        assert!(args.config.is_none());
    }
}
