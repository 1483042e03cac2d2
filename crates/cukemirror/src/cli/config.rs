//! `cukemirror config` - show resolved paths and settings.

use anyhow::Result;
use cukemirror::config::MirrorConfig;
use cukemirror_protocol::paths::{config_file_path, cukemirror_home, default_logs_dir};

#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved configuration in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ConfigArgs, config: &MirrorConfig) -> Result<()> {
    let home = cukemirror_home();
    let config_file = config_file_path();
    let store = config.store_path();
    let logs = default_logs_dir();

    if args.json {
        let resolved = serde_json::json!({
            "home": home.to_string_lossy(),
            "config_file": {
                "path": config_file.to_string_lossy(),
                "exists": config_file.exists(),
            },
            "store": {
                "path": store.to_string_lossy(),
                "exists": store.exists(),
            },
            "logs": logs.to_string_lossy(),
            "upstream": {
                "base_url": config.upstream.base_url,
                "timeout_secs": config.upstream.timeout().as_secs(),
            },
            "refresh": {
                "strategy": config.refresh.strategy.as_str(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    } else {
        println!("CUKEMIRROR CONFIGURATION");
        println!("========================");
        println!();
        println!("Home:        {}", home.display());
        println!(
            "Config file: {} ({})",
            config_file.display(),
            if config_file.exists() { "exists" } else { "not found" }
        );
        println!(
            "Store:       {} ({})",
            store.display(),
            if store.exists() { "exists" } else { "not found" }
        );
        println!("Logs:        {}", logs.display());
        println!();
        println!("Upstream:    {}", config.upstream.base_url);
        println!("  Timeout:   {}s", config.upstream.timeout().as_secs());
        println!("Refresh:     {}", config.refresh.strategy);
    }

    Ok(())
}
