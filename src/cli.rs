use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "demo-wallet")]
#[command(version)]
#[command(about = "A terminal demo wallet for Ethereum-style accounts")]
pub struct Args {
    /// Tick rate in ticks per second
    #[arg(short, long, default_value_t = 4.0)]
    pub tick_rate: f64,

    /// Frame rate in frames per second
    #[arg(short, long, default_value_t = 60.0)]
    pub frame_rate: f64,

    /// API backend to use (mock, rest)
    /// If not specified, uses the config file or defaults to mock
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Base URL of the REST backend (implies --backend rest)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<String>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
