use anyhow::Context;

use demandcast_ai::ForecastConfig;
use demandcast_inventory::RecommendationPolicy;

fn main() -> anyhow::Result<()> {
    demandcast_observability::init();

    let path = std::env::args()
        .nth(1)
        .context("usage: demandcast <request.json>")?;

    let config = ForecastConfig::from_env().context("invalid forecast configuration")?;
    let policy = RecommendationPolicy::from_env().context("invalid recommendation policy")?;

    let raw = std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
    let output = demandcast_cli::run_json(&raw, &config, &policy)?;
    println!("{output}");
    Ok(())
}
