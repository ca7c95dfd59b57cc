#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if !bugdesk_lib::run().await? {
        std::process::exit(1);
    }
    Ok(())
}
