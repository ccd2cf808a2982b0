use {
    clap::Parser,
    rsgopher::{
        Config, GopherFs,
        config::{DEFAULT_MAP_FILENAME, DEFAULT_MAX_SELECTOR_LEN, DEFAULT_ROOT},
        srv::{Handler, srv_async},
    },
    std::{net::IpAddr, path::PathBuf},
};

mod utils;
use crate::utils::*;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
struct Cli {
    /// Directory to publish
    #[arg(default_value = DEFAULT_ROOT)]
    root: PathBuf,

    /// Port to listen on, also written into menus
    #[arg(short, long, default_value_t = rsgopher::DEFAULT_PORT)]
    port: u16,

    /// Host name written into menus [default: this machine's host name]
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Local address to bind
    #[arg(short, long, default_value = "0.0.0.0")]
    listen: IpAddr,

    /// Name of the per-directory gophermap
    #[arg(short, long, default_value = DEFAULT_MAP_FILENAME)]
    map_filename: String,

    /// Request lines longer than this many bytes are truncated
    #[arg(long, default_value_t = DEFAULT_MAX_SELECTOR_LEN)]
    max_selector_len: usize,

    /// Seconds a client may take to send its selector, 0 waits forever
    #[arg(long, default_value_t = 0)]
    timeout: u64,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            host: self.host.unwrap_or_else(default_host),
            port: self.port,
            root: self.root,
            map_filename: self.map_filename,
            listen: self.listen,
            max_selector_len: self.max_selector_len,
            request_timeout: timeout_from_secs(self.timeout),
        }
    }
}

async fn gopherd_main(cli: Cli) -> rsgopher::Result<i32> {
    let config = cli.into_config();
    let addr = config.listen_addr();
    let fs = GopherFs::new(config)?;

    println!("[*] Serving: {}", fs.root().display());
    println!("[*] Advertising: {}:{}", fs.config().host, fs.config().port);
    println!("[*] Ready to accept clients: {}", addr);
    srv_async(fs, addr).await.and(Ok(0))
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let exit_code = gopherd_main(Cli::parse()).await.unwrap_or_else(|e| {
        eprintln!("Error: {:?}", e);
        -1
    });

    std::process::exit(exit_code);
}
