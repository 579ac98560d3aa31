//! Firma command-line front end
//!
//! Drives signature requests through the request store:
//! create, list, inspect, follow and download them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use firma_core::{
    ClientConfig, ConfigError, DirectorySink, HttpSignatureClient, RequestStore,
    SignatureRequest, StoreState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod render;
mod signer;

use signer::SignerArg;

#[derive(Parser, Debug)]
#[command(name = "firma")]
#[command(version, about = "Create, track and download e-signature requests")]
struct Cli {
    /// Signature service base URL, including the /api prefix [overrides FIRMA_API_URL]
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Give up on a service call after this many seconds [overrides FIRMA_TIMEOUT_SECS]
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a PDF out for signature
    Create {
        /// PDF to sign
        #[arg(short, long)]
        file: PathBuf,

        /// Signer as FIRST,LAST,EMAIL,PHONE (repeatable)
        #[arg(short, long = "signer", required = true)]
        signers: Vec<SignerArg>,

        /// Page every signer signs on (1-based)
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i32,

        /// Signature box as x1,y1,x2,y2
        #[arg(long)]
        position: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Name the service should store the document under
        #[arg(long)]
        filename: Option<String>,
    },

    /// List all signature requests
    List,

    /// Show one signature request
    Show { id: String },

    /// Poll a request until the service stops moving it
    Watch {
        id: String,

        /// Seconds between polls
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },

    /// Save the signed document locally
    Download {
        id: String,

        /// Directory the document is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// File name to save as; defaults to the request's file name
        #[arg(long)]
        filename: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries command output, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("firma_core=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("Invalid service configuration")?;
    let config = with_overrides(config, cli.api_url.clone(), cli.timeout_secs)
        .context("Invalid service configuration")?;

    let output_dir = match &cli.command {
        Command::Download { output_dir, .. } => output_dir.clone(),
        _ => PathBuf::from("."),
    };

    let client = HttpSignatureClient::new(&config).context("Invalid service configuration")?;
    let store = RequestStore::new(Arc::new(client), Arc::new(DirectorySink::new(output_dir)));
    trace_transitions(&store);

    run(cli.command, &store).await
}

async fn run(command: Command, store: &RequestStore) -> Result<()> {
    match command {
        Command::Create {
            file,
            signers,
            page,
            position,
            title,
            description,
            filename,
        } => {
            let members = signers
                .into_iter()
                .map(|s| s.into_signer(page, position.as_deref()))
                .collect();
            let request = SignatureRequest {
                title,
                description,
                filename,
                members,
                ..Default::default()
            };

            store.create_request_from_file(&file, request).await;
            let state = settled(store)?;
            if let Some(record) = &state.current_request {
                print!("{}", render::request_detail(record));
            }
        }

        Command::List => {
            store.fetch_all_requests().await;
            let state = settled(store)?;
            print!("{}", render::request_table(&state.requests));
        }

        Command::Show { id } => {
            store.fetch_request_by_id(&id).await;
            let state = settled(store)?;
            match &state.current_request {
                Some(record) => print!("{}", render::request_detail(record)),
                None => bail!("Request {} was not returned by the service", id),
            }
        }

        Command::Watch { id, interval } => watch(store, &id, interval).await?,

        Command::Download {
            id,
            output_dir: _,
            filename,
        } => {
            let filename = match filename {
                Some(name) => name,
                None => stored_filename(store, &id).await?,
            };
            match store.download_document(&id, &filename).await {
                Some(path) => println!("Saved {}", path.display()),
                None => {
                    settled(store)?;
                    bail!("Download of {} produced no document", id);
                }
            }
        }
    }

    Ok(())
}

/// Command-line values win over the environment
fn with_overrides(
    mut config: ClientConfig,
    api_url: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<ClientConfig, ConfigError> {
    if let Some(url) = api_url {
        config.base_url = url;
    }
    if let Some(secs) = timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config.validate()?;
    Ok(config)
}

/// Snapshot after an action, turning a recorded error into a failure
fn settled(store: &RequestStore) -> Result<StoreState> {
    let state = store.state();
    if let Some(error) = &state.error {
        bail!("{}", error);
    }
    Ok(state)
}

/// File name the service knows the request by, or `<id>.pdf`
async fn stored_filename(store: &RequestStore, id: &str) -> Result<String> {
    store.fetch_all_requests().await;
    let state = settled(store)?;
    Ok(state
        .requests
        .iter()
        .find(|r| r.id == id)
        .map(|r| r.filename.clone())
        .unwrap_or_else(|| format!("{}.pdf", id)))
}

async fn watch(store: &RequestStore, id: &str, interval: u64) -> Result<()> {
    let mut last_status = None;
    loop {
        store.fetch_request_by_id(id).await;
        let state = settled(store)?;
        let Some(record) = state.current_request else {
            bail!("Request {} was not returned by the service", id);
        };

        if last_status != Some(record.status) {
            println!("{}  {}", record.id, record.status);
            last_status = Some(record.status);
        }
        if record.status.is_terminal() {
            print!("{}", render::request_detail(&record));
            return Ok(());
        }

        tokio::time::sleep(Duration::from_secs(interval.max(1))).await;
    }
}

/// Log store transitions at debug level
fn trace_transitions(store: &RequestStore) {
    let mut rx = store.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            tracing::debug!(
                loading = state.loading,
                requests = state.requests.len(),
                current = state.current_request.as_ref().map(|r| r.id.as_str()),
                error = state.error.as_deref(),
                "Store updated"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn env_config(pairs: &'static [(&'static str, &'static str)]) -> ClientConfig {
        ClientConfig::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[test]
    fn test_environment_used_without_flags() {
        let config = env_config(&[
            ("FIRMA_API_URL", "https://sign.example.com/api"),
            ("FIRMA_TIMEOUT_SECS", "30"),
        ]);

        let config = with_overrides(config, None, None).unwrap();
        assert_eq!(config.base_url, "https://sign.example.com/api");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_flags_override_environment() {
        let config = env_config(&[
            ("FIRMA_API_URL", "https://sign.example.com/api"),
            ("FIRMA_TIMEOUT_SECS", "30"),
        ]);

        let config =
            with_overrides(config, Some("http://127.0.0.1:9000/api".to_string()), Some(5)).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_invalid_flag_url_rejected() {
        let config = env_config(&[]);
        let err = with_overrides(config, Some("ftp://files.example.com".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_invalid_environment_timeout_rejected() {
        let err = ClientConfig::from_lookup(|key| {
            (key == "FIRMA_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(ref raw) if raw == "soon"));
    }
}
