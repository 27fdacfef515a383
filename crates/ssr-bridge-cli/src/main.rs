//! SSR Bridge CLI
//!
//! The `ssr-bridge` command renders a component from a server bundle outside
//! of any web framework, which is handy when debugging a bundle.
//!
//! ## Commands
//!
//! - `render`: Render a component and print the markup
//! - `script`: Print the invocation script a render would evaluate
//! - `polyfill`: Print the console polyfill injected ahead of the bundle

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};

use ssr_bridge_core::{
    console_polyfill, ContextPolicy, InvocationBuilder, QuickJsEngine, RenderRequest,
    RendererConfig, SsrRenderer, StoreInitializer, METRICS,
};

#[derive(Parser)]
#[command(name = "ssr-bridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Server-side render JavaScript components from a bundle", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a component and print the markup (HTML followed by console replay)
    Render {
        /// Path to the server bundle
        #[arg(short, long, env = "SSR_BUNDLE_PATH")]
        bundle: PathBuf,

        #[command(flatten)]
        request: RequestArgs,

        /// Abort with an error when the bundle reports render errors
        #[arg(long, env = "SSR_FAIL_LOUD")]
        fail_loud: bool,

        /// Evaluation timeout in milliseconds (0 disables the limit)
        #[arg(long, default_value = "30000")]
        timeout_ms: u64,

        /// Global object exposing the bundle's render entry points
        #[arg(long, default_value = "ReactOnRails")]
        registry: String,

        /// Keep the script context between renders while the bundle is unchanged
        #[arg(long)]
        reuse_context: bool,

        /// Render the request this many times (implies --reuse-context)
        #[arg(long, default_value = "1")]
        repeat: usize,
    },

    /// Print the invocation script without evaluating it
    Script {
        #[command(flatten)]
        request: RequestArgs,

        /// Global object exposing the bundle's render entry points
        #[arg(long, default_value = "ReactOnRails")]
        registry: String,
    },

    /// Print the console polyfill
    Polyfill,
}

#[derive(Args)]
struct RequestArgs {
    /// Registered component name
    #[arg(short, long)]
    component: String,

    /// Component props as a JSON string
    #[arg(short, long, default_value = "{}", conflicts_with = "props_file")]
    props: String,

    /// Read component props from a JSON file
    #[arg(long)]
    props_file: Option<PathBuf>,

    /// DOM node id (default: <component>-react-component-<uuid>)
    #[arg(long)]
    dom_id: Option<String>,

    /// Store initializer as name=<json>; repeat in registration order
    #[arg(long = "store", value_parser = parse_store)]
    stores: Vec<StoreInitializer>,

    /// Ask the bundle to trace the render
    #[arg(long)]
    trace: bool,
}

impl RequestArgs {
    fn into_request(self) -> Result<RenderRequest> {
        let props = match &self.props_file {
            Some(path) => read_props(path)?,
            None => self.props,
        };
        let dom_id = self.dom_id.unwrap_or_else(|| {
            format!("{}-react-component-{}", self.component, uuid::Uuid::new_v4())
        });
        Ok(RenderRequest::new(self.component, props, dom_id, self.trace).with_stores(self.stores))
    }
}

fn parse_store(raw: &str) -> std::result::Result<StoreInitializer, String> {
    let (name, props) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=<json>, got: {raw}"))?;
    if name.is_empty() {
        return Err("store name must not be empty".to_string());
    }
    Ok(StoreInitializer::new(name, props))
}

fn read_props(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read props file: {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    ssr_bridge_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Render {
            bundle,
            request,
            fail_loud,
            timeout_ms,
            registry,
            reuse_context,
            repeat,
        } => {
            let config = RendererConfig::new(bundle)
                .with_fail_loud(fail_loud)
                .with_timeout_ms((timeout_ms > 0).then_some(timeout_ms))
                .with_registry_global(registry)
                .with_context_policy(if reuse_context || repeat > 1 {
                    ContextPolicy::Reuse
                } else {
                    ContextPolicy::Fresh
                });
            cmd_render(config, request.into_request()?, repeat)
        }
        Commands::Script { request, registry } => cmd_script(&registry, request.into_request()?),
        Commands::Polyfill => {
            print!("{}", console_polyfill());
            Ok(())
        }
    }
}

fn cmd_render(config: RendererConfig, request: RenderRequest, repeat: usize) -> Result<()> {
    let engine = QuickJsEngine::new().context("Failed to start JavaScript engine")?;
    let mut renderer = SsrRenderer::new(engine, config).context("Invalid renderer configuration")?;

    let mut markup = render_once(&mut renderer, &request)?;
    for _ in 1..repeat {
        markup = render_once(&mut renderer, &request)?;
    }

    info!(
        component = %request.component_name,
        dom_node_id = %request.dom_node_id,
        bytes = markup.len(),
        "render complete"
    );
    METRICS.flush();
    println!("{markup}");
    Ok(())
}

fn render_once(renderer: &mut SsrRenderer<QuickJsEngine>, request: &RenderRequest) -> Result<String> {
    renderer
        .render_request(request)
        .with_context(|| format!("Failed to render component {}", request.component_name))
}

fn cmd_script(registry: &str, request: RenderRequest) -> Result<()> {
    let script = InvocationBuilder::new(registry).build(&request);
    println!("{script}");
    Ok(())
}
