use axum::http::HeaderValue;
use meridian_types::constants::MAINNET_CHAIN_ID;
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Behavior knobs for the RPC surface, independent of where it is served.
#[derive(Clone, Debug)]
pub struct RpcConfig {
    /// Chain ID reported by `eth_chainId` and required of incoming signed
    /// transactions.
    pub chain_id: u64,
    /// Client identifier reported by `web3_clientVersion`.
    pub client_version: String,
    /// Gas ceiling for `eth_call` and `eth_estimateGas`.
    pub rpc_gas_cap: u64,
    /// Widest block range a single `eth_getLogs` query may cover.
    pub max_blocks_per_filter: u64,
    /// Most logs a single multi-block `eth_getLogs` query may return.
    pub max_logs_per_response: usize,
    /// How long an installed filter survives without being polled.
    pub filter_ttl: Duration,
    /// How long formatted blocks and receipts stay memoized.
    pub memo_ttl: Duration,
    /// Where to persist the memo cache. `None` keeps it memory-only.
    pub memo_path: Option<PathBuf>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            chain_id: MAINNET_CHAIN_ID,
            client_version: concat!("meridian/v", env!("CARGO_PKG_VERSION")).to_string(),
            rpc_gas_cap: 50_000_000,
            max_blocks_per_filter: 100_000,
            max_logs_per_response: 20_000,
            filter_ttl: Duration::from_secs(15 * 60),
            memo_ttl: Duration::from_secs(15 * 60),
            memo_path: None,
        }
    }
}

/// Guard to shutdown the RPC servers. When dropped, this will shutdown all
/// running servers.
#[derive(Default)]
pub struct RpcServerGuard {
    http: Vec<tokio::task::JoinHandle<()>>,
}

impl core::fmt::Debug for RpcServerGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RpcServerGuard").field("http", &self.http.len()).finish()
    }
}

impl Drop for RpcServerGuard {
    fn drop(&mut self) {
        for handle in self.http.drain(..) {
            handle.abort();
        }
    }
}

/// Configuration for the RPC server.
#[derive(Clone, Debug)]
pub struct ServeConfig {
    /// HTTP server addresses.
    pub http: Vec<SocketAddr>,
    /// CORS origins to allow, comma-separated. `None` or `"*"` allows any.
    pub cors: Option<String>,
}

impl ServeConfig {
    /// Serve the router on the configured addresses.
    pub async fn serve(&self, router: ajj::Router<()>) -> eyre::Result<RpcServerGuard> {
        let app = router.into_axum("/").layer(cors_layer(self.cors.as_deref())?);

        let mut http = Vec::with_capacity(self.http.len());
        for addr in &self.http {
            let listener = tokio::net::TcpListener::bind(*addr).await?;
            let app = app.clone();
            info!(%addr, "serving RPC over HTTP");
            http.push(tokio::spawn(async move {
                if let Err(err) = axum::serve(listener, app).await {
                    error!(%err, "HTTP server exited with error");
                }
            }));
        }

        Ok(RpcServerGuard { http })
    }
}

fn cors_layer(cors: Option<&str>) -> eyre::Result<CorsLayer> {
    match cors {
        None | Some("*") => Ok(CorsLayer::permissive()),
        Some(domains) => {
            let origins = domains
                .split(',')
                .map(|o| o.trim().parse::<HeaderValue>())
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_config_is_mainnet() {
        let config = RpcConfig::default();
        assert_eq!(config.chain_id, MAINNET_CHAIN_ID);
        assert!(config.client_version.starts_with("meridian/v"));
        assert!(config.memo_path.is_none());
    }

    #[test]
    fn test_cors_origin_parsing() {
        assert!(cors_layer(None).is_ok());
        assert!(cors_layer(Some("*")).is_ok());
        assert!(cors_layer(Some("https://a.example, https://b.example")).is_ok());
        assert!(cors_layer(Some("bad\norigin")).is_err());
    }
}
