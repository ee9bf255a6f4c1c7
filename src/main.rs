use vitrine::{ShowcaseConfig, run_showcase};

/// Usage: `vitrine [ASSET...]`. Without arguments the default models are shown.
fn main() -> anyhow::Result<()> {
    let assets: Vec<String> = std::env::args().skip(1).collect();
    let config = if assets.is_empty() {
        ShowcaseConfig::default()
    } else {
        ShowcaseConfig::with_assets(assets)
    };
    run_showcase(config)
}
