use crate::error::Result;
use crate::server::{self, config::Config};

pub fn run(port: Option<u16>) -> Result<()> {
    let config = Config::load().with_port(port);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::run(config))
}
