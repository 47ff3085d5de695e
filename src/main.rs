//! gadget-io command line.
//!
//! Issues requests the way a gadget would and prints the normalized
//! response as JSON.
//!
//! ```text
//! gadget-io --config core-io.toml fetch http://example.com/feed.xml --content-type feed
//!     → config (TOML, validated)
//!     → preloads (optional JSON file)
//!     → GadgetIo::fetch
//!     → stdout
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use gadget_io::auth::SharedSecurityToken;
use gadget_io::config::{load_config, load_preloads, GadgetConfig};
use gadget_io::io::{
    AuthorizationType, ContentType, EnvelopeError, GadgetIo, MethodType, RequestParameters,
};
use gadget_io::observability::logging;

#[derive(Parser)]
#[command(name = "gadget-io")]
#[command(about = "Fetch remote content through a gadget container proxy", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Security token sent with signed and OAuth requests.
    #[arg(long, default_value = "")]
    security_token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL through the JSON proxy
    Fetch {
        url: String,
        #[arg(short, long, default_value = "GET")]
        method: MethodType,
        #[arg(long, default_value = "TEXT")]
        content_type: ContentType,
        #[arg(long, default_value = "NONE")]
        auth: AuthorizationType,
        /// Proxy cache lifetime in seconds.
        #[arg(long)]
        refresh: Option<u64>,
        #[arg(long)]
        post_data: Option<String>,
        /// Request header as `Name: value`; repeatable.
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// OAuth option as `OAUTH_NAME=value`; repeatable.
        #[arg(long = "oauth")]
        oauth: Vec<String>,
    },
    /// Fetch a URL directly, without the proxy
    Direct {
        url: String,
        #[arg(short, long, default_value = "GET")]
        method: MethodType,
        #[arg(long, default_value = "TEXT")]
        content_type: ContentType,
        #[arg(long)]
        post_data: Option<String>,
    },
    /// Print the proxied form of a URL
    ProxyUrl {
        url: String,
        #[arg(long)]
        refresh: Option<u64>,
        #[arg(long)]
        rewrite_mime: Option<String>,
    },
    /// Form-encode `key=value` pairs
    Encode {
        pairs: Vec<String>,
        /// Do not escape keys and values.
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GadgetConfig::default(),
    };
    logging::init(&config.observability.log_level);

    tracing::info!(
        json_proxy_url = ?config.core_io.json_proxy_url,
        proxy_url = ?config.core_io.proxy_url,
        host = %config.page.host,
        "Configuration loaded"
    );

    let preloads = load_preloads(&config.preload)?;

    let io = GadgetIo::builder(config.core_io.clone())
        .page(config.page.clone())
        .preloads(preloads)
        .security_tokens(Arc::new(SharedSecurityToken::new(cli.security_token)))
        .on_dropped_envelope(Arc::new(|url: &str, e: &EnvelopeError| {
            eprintln!("warning: response for {url} was dropped: {e}");
        }))
        .build();

    match cli.command {
        Commands::Fetch {
            url,
            method,
            content_type,
            auth,
            refresh,
            post_data,
            headers,
            oauth,
        } => {
            let mut options = RequestParameters::new()
                .method(method)
                .content_type(content_type)
                .authorization(auth);
            if let Some(refresh) = refresh {
                options = options.refresh_interval(refresh);
            }
            if let Some(data) = post_data {
                options = options.post_data(data);
            }
            for header in &headers {
                let (name, value) = split_pair(header, ':')?;
                options = options.header(name, value);
            }
            for option in &oauth {
                let (name, value) = split_pair(option, '=')?;
                options = options.oauth_param(name, value);
            }

            match io.fetch(&url, options).await? {
                Some(response) => println!("{}", serde_json::to_string_pretty(&response)?),
                None => {
                    eprintln!("Error: proxy response was not a valid envelope");
                    std::process::exit(1);
                }
            }
        }
        Commands::Direct {
            url,
            method,
            content_type,
            post_data,
        } => {
            let mut options = RequestParameters::new().method(method).content_type(content_type);
            if let Some(data) = post_data {
                options = options.post_data(data);
            }
            let response = io.fetch_non_proxied(&url, options, None).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::ProxyUrl {
            url,
            refresh,
            rewrite_mime,
        } => {
            let mut options = RequestParameters::new();
            if let Some(refresh) = refresh {
                options = options.refresh_interval(refresh);
            }
            if let Some(mime) = rewrite_mime {
                options = options.rewrite_mime(mime);
            }
            match io.get_proxy_url(&url, &options) {
                Some(proxied) => println!("{proxied}"),
                None => {
                    eprintln!("Error: no proxy_url template configured");
                    std::process::exit(1);
                }
            }
        }
        Commands::Encode { pairs, raw } => {
            let fields = pairs
                .iter()
                .map(|pair| split_pair(pair, '='))
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", GadgetIo::encode_values(fields, raw));
        }
    }

    Ok(())
}

fn split_pair(input: &str, separator: char) -> Result<(String, String), String> {
    input
        .split_once(separator)
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| format!("expected `name{separator}value`, got `{input}`"))
}
