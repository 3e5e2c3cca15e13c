use anyhow::Result;
use admit::cli::{build_cli, setup};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    setup::init_tracing(matches.get_flag("verbose"))?;
    admit::cli::handlers::dispatch(&matches).await
}
