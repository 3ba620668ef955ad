//! spa-router CLI
//!
//! Inspect a route table and replay navigations against an in-memory host.
//!
//! ```text
//! spa-router --config routes.toml check
//! spa-router --config routes.toml resolve "/users/42?tab=info"
//! spa-router --config routes.toml path users --param id=42 --query tab=info
//! spa-router --config routes.toml simulate / /users/42 /nowhere
//! ```
//!
//! Lazy routes are served by stub loaders that resolve to a component named
//! after the loader.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use spa_router::config::{load_config, ObservabilityConfig, RouterConfig};
use spa_router::navigation::{MemoryNavigator, MemoryScroll, Navigator, RouterBuilder};
use spa_router::observability::logging;
use spa_router::{Component, LoadError, Params, Router};

#[derive(Parser)]
#[command(name = "spa-router")]
#[command(about = "Inspect and exercise a client-side route table", long_about = None)]
struct Cli {
    /// Route table (TOML)
    #[arg(short, long, default_value = "routes.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the route table and list its routes
    Check,
    /// Resolve a URL to its route
    Resolve { url: String },
    /// Build the URL of a named route
    Path {
        name: String,
        /// Path parameter, `key=value`
        #[arg(long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
        /// Query parameter, `key=value`
        #[arg(long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
    /// Start at the first URL, then navigate to the others
    Simulate {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

fn build_router(config: RouterConfig, navigator: Arc<MemoryNavigator>) -> Result<Router, Box<dyn Error>> {
    let loaders: Vec<String> = config.loader_names().map(String::from).collect();
    let mut builder = RouterBuilder::new(config, navigator).scrolling_element(Arc::new(MemoryScroll::default()));
    for name in loaders {
        let id = name.clone();
        builder = builder.loader(name, move || {
            let id = id.clone();
            async move { Ok::<_, LoadError>(Component::new(id)) }
        });
    }
    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let logs = logging::init(&ObservabilityConfig::default())?;
    let config = load_config(&cli.config)?;
    logs.apply(&config.observability)?;

    match cli.command {
        Commands::Check => {
            let router = build_router(config, Arc::new(MemoryNavigator::default()))?;
            let state = router.state();
            println!("{} routes OK", state.routes.len());
            for route in state.routes {
                let kind = if route.lazy { "lazy" } else { "direct" };
                println!("  {:<20} {:<30} {}", route.name, route.path, kind);
            }
        }
        Commands::Resolve { url } => {
            let router = build_router(config, Arc::new(MemoryNavigator::default()))?;
            let route = router.get_route(&url)?;
            println!("{}", serde_json::to_string_pretty(&route)?);
        }
        Commands::Path { name, params, query } => {
            let router = build_router(config, Arc::new(MemoryNavigator::default()))?;
            let params: Params = params.into_iter().collect();
            let query: Params = query.into_iter().collect();
            let path = router.name_to_path(
                &name,
                Some(&params).filter(|p| !p.is_empty()),
                Some(&query).filter(|q| !q.is_empty()),
            )?;
            println!("{path}");
        }
        Commands::Simulate { urls } => {
            let (first, rest) = urls.split_first().ok_or("no URL given")?;
            let navigator = Arc::new(MemoryNavigator::with_initial_url(first.clone()));
            let router = build_router(config, navigator.clone())?;

            let active = router.start().await?;
            println!("{first} -> {}", serde_json::to_string(&active)?);
            for url in rest {
                match router.push_path(url).await {
                    Ok(active) => println!("{url} -> {}", serde_json::to_string(&active)?),
                    Err(e) => println!("{url} -> error: {e}"),
                }
            }

            // Give spawned lazy loads a chance to land.
            tokio::task::yield_now().await;
            println!("location: {}", serde_json::to_string_pretty(&router.location())?);
            println!(
                "history: {} entries, at {}",
                navigator.history_len(),
                navigator.location().href()
            );
            router.destroy();
        }
    }

    Ok(())
}
