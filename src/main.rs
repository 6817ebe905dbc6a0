pub use error::ApiError;
pub use error::Error;

mod conf;
mod db;
mod error;
mod registry;
mod rest;
mod server;
#[cfg(test)]
mod test;
mod upstream;
mod window;

use std::env;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[actix_web::main]
async fn main() -> Result<()> {
    init_logging();
    server::run().await
}

fn init_logging() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
