use std::path::PathBuf;

use clap::Parser;
use log::debug;
use serde_json::{Map, Value};

use meal_planner::{build_meal_plan_prompt, generate_meal_plan, AiConfig, Preferences, Tier};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subscription tier: free, basic, premium or premiumPlus
    #[arg(short, long, default_value = "free")]
    tier: Tier,

    /// JSON file with the user's meal preferences
    #[arg(short, long)]
    preferences: Option<PathBuf>,

    /// Provider to use instead of the configured default (google, openai)
    #[arg(long)]
    provider: Option<String>,

    /// Print the prompt and output schema without calling a model
    #[arg(long)]
    prompt_only: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let preferences: Value = match &cli.preferences {
        Some(path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        None => Value::Object(Map::new()),
    };
    debug!("Raw preferences: {}", preferences);

    if cli.prompt_only {
        let normalized = Preferences::normalize(&preferences, cli.tier);
        let prompt = build_meal_plan_prompt(&normalized, cli.tier);
        println!("{}\n", prompt.system.trim_end());
        println!("{}\n", prompt.user);
        println!("{}", serde_json::to_string_pretty(&prompt.schema)?);
        return Ok(());
    }

    let mut config = AiConfig::load()?;
    if let Some(provider) = cli.provider {
        config.default_provider = provider;
        config.chain.enabled = false;
    }

    let result = generate_meal_plan(&config, &preferences, cli.tier).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}
