//! The database session an introspection pass runs on.

use crate::traced::QueryFuture;
use crate::{Connection, Error, Result};
use boilroach_config::{Config, SslMode};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_postgres::NoTls;
use tokio_postgres_rustls::MakeRustlsConnect;

/// An open connection plus the task driving it.
///
/// Queries run strictly one at a time. Dropping a session without calling
/// [`Session::close`] still disconnects, but loses any error the connection
/// task reports on the way out.
pub struct Session {
    client: tokio_postgres::Client,
    driver: JoinHandle<Result<(), tokio_postgres::Error>>,
}

impl Session {
    /// Connect using the connection options of `config`.
    pub async fn connect(config: &Config) -> Result<Self> {
        let pg = pg_config(config);
        tracing::debug!(
            host = %config.host,
            port = config.port,
            dbname = %config.dbname,
            sslmode = %config.ssl_mode,
            "connecting"
        );

        let session = match config.ssl_mode {
            SslMode::Disable => {
                let (client, connection) = pg
                    .connect(NoTls)
                    .await
                    .map_err(|source| Error::Connect {
                        step: "connect to database",
                        source,
                    })?;
                Self {
                    client,
                    driver: tokio::spawn(connection),
                }
            }
            SslMode::Prefer | SslMode::Require => {
                let (client, connection) = pg
                    .connect(tls_connector()?)
                    .await
                    .map_err(|source| Error::Connect {
                        step: "connect to database over tls",
                        source,
                    })?;
                Self {
                    client,
                    driver: tokio::spawn(connection),
                }
            }
        };
        Ok(session)
    }

    /// Disconnect and wait for the connection task to finish.
    pub async fn close(self) -> Result<()> {
        let Self { client, driver } = self;
        drop(client);
        match driver.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::Close(e.to_string())),
            Err(e) => Err(Error::Close(e.to_string())),
        }
    }
}

impl Connection for Session {
    fn query<'a>(&'a self, sql: &'a str, params: &'a [&'a str]) -> QueryFuture<'a> {
        Connection::query(&self.client, sql, params)
    }
}

fn pg_config(config: &Config) -> tokio_postgres::Config {
    let mut pg = tokio_postgres::Config::new();
    pg.user(&config.user)
        .dbname(&config.dbname)
        .host(&config.host)
        .port(config.port)
        .application_name("boilroach")
        .ssl_mode(match config.ssl_mode {
            SslMode::Disable => tokio_postgres::config::SslMode::Disable,
            SslMode::Prefer => tokio_postgres::config::SslMode::Prefer,
            SslMode::Require => tokio_postgres::config::SslMode::Require,
        });
    if let Some(password) = &config.password {
        pg.password(password);
    }
    pg
}

/// TLS against the Mozilla root store.
fn tls_connector() -> Result<MakeRustlsConnect> {
    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let tls = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_root_certificates(roots)
    .with_no_client_auth();
    Ok(MakeRustlsConnect::new(tls))
}
