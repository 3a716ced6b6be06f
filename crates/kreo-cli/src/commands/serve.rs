//! Serve command - run the HTTP backend.

use kreo_server::{KreoConfig, KreoConfigBuilder};
use std::net::SocketAddr;

pub(crate) async fn run(config: KreoConfig, bind: Option<SocketAddr>, no_warm: bool) -> miette::Result<()> {
    let mut builder = KreoConfigBuilder::from_config(config);
    if let Some(addr) = bind {
        builder = builder.bind(addr);
    }
    if no_warm {
        builder = builder.warm_on_start(false);
    }
    let config = builder.build();

    println!("Kreo backend on http://{}", config.bind);
    println!("  Ollama: {}", config.ollama_url);
    println!("  Data:   {}", config.data_dir.display());

    kreo_server::serve(config)
        .await
        .map_err(|e| miette::miette!("Server error: {}", e))
}
