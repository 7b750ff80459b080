//! HTTP server configuration object and helpers.

use std::env;
use std::net::SocketAddr;

use tracing::warn;

use crate::outbound::persistence::{DbPool, PoolConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration for the given bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When absent, the server falls back to the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Read configuration from the environment.
    ///
    /// `BIND_ADDR` defaults to `0.0.0.0:8080`. When `DATABASE_URL` is set a
    /// connection pool is built eagerly so misconfiguration fails at startup.
    ///
    /// # Errors
    /// Returns [`std::io::Error`] when the bind address does not parse or the
    /// pool cannot be built.
    pub async fn from_env() -> std::io::Result<Self> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.into())
            .parse::<SocketAddr>()
            .map_err(|e| std::io::Error::other(format!("invalid BIND_ADDR: {e}")))?;

        let config = Self::new(bind_addr);
        match env::var("DATABASE_URL") {
            Ok(url) => {
                let pool = DbPool::new(PoolConfig::new(url))
                    .await
                    .map_err(|e| std::io::Error::other(format!("database pool: {e}")))?;
                Ok(config.with_db_pool(pool))
            }
            Err(_) => {
                warn!("DATABASE_URL not set, serving from the in-memory store");
                Ok(config)
            }
        }
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bind_addr_parses() {
        let addr = DEFAULT_BIND_ADDR.parse::<SocketAddr>().expect("valid");
        assert_eq!(addr.port(), 8080);
    }
}
