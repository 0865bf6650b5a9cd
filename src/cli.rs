use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "predmirror")]
#[command(author = "Predmirror Team")]
#[command(version = "0.1.0")]
#[command(about = "Mirror prediction-game accounts from devnet and mainnet and serve them over HTTP", long_about = None)]
pub struct Cli {
    /// Deployment selector; loads config/<environment>.toml on top of the defaults
    #[arg(default_value = "development")]
    pub environment: String,

    /// Config directory
    #[arg(short, long, default_value = "config")]
    pub config_dir: String,

    /// Override the HTTP port from the config file
    #[arg(short, long, env = "MIRROR_PORT")]
    pub port: Option<u16>,
}
