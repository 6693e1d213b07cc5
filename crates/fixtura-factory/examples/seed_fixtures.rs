use std::env;
use std::path::PathBuf;

use fixtura_factory::{FactoryConfig, FixtureFactory, Overrides, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);
    let config = match args.next() {
        Some(path) => FactoryConfig::load(&PathBuf::from(path))?,
        None => FactoryConfig {
            fixtures: Some(PathBuf::from("crates/fixtura-factory/tests/fixtures")),
            ..FactoryConfig::default()
        },
    };
    let fixture = args.next().unwrap_or_else(|| "user".to_string());
    let quantity = args.next().and_then(|raw| raw.parse().ok()).unwrap_or(3);

    init_logging(&config.logging)?;
    let factory = FixtureFactory::from_config(&config).await?;
    for record in factory
        .create_list(&fixture, quantity, Overrides::none(), &[])
        .await?
    {
        println!("{}", serde_json::to_string(&record)?);
    }
    factory.clear_all().await?;
    Ok(())
}
