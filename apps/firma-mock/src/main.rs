//! Mock e-signature service binary
//!
//! Serves the signing API from memory so front ends can be exercised
//! without the hosted service.

use anyhow::Result;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "firma-mock")]
#[command(about = "In-memory stand-in for the e-signature service")]
struct Args {
    /// Address to bind
    #[arg(long, env = "FIRMA_MOCK_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("firma_mock=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let addr = bind_addr(&args.host, args.port)?;

    let app = firma_mock::app();

    info!(
        "Starting mock signature service on http://{}{}",
        addr,
        firma_mock::API_PREFIX
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// IPv4 and IPv6 hosts alike; IPv6 needs no brackets
fn bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = host.trim().parse()?;
    Ok(SocketAddr::new(ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bind_addr_ipv4() {
        assert_eq!(
            bind_addr("0.0.0.0", 8080).unwrap().to_string(),
            "0.0.0.0:8080"
        );
    }

    #[test]
    fn test_bind_addr_ipv6() {
        let addr = bind_addr("::1", 9000).unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.to_string(), "[::1]:9000");
    }

    #[test]
    fn test_bind_addr_rejects_hostname() {
        assert!(bind_addr("not an address", 80).is_err());
    }
}
