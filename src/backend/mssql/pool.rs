use async_trait::async_trait;
use tiberius::{Client, Config};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

pub type MssqlClient = Client<Compat<TcpStream>>;

/// bb8 connection manager for tiberius clients.
#[derive(Clone)]
pub struct TiberiusManager {
    config: Config,
}

impl TiberiusManager {
    pub fn new(config: Config) -> Self {
        TiberiusManager { config }
    }
}

#[async_trait]
impl bb8::ManageConnection for TiberiusManager {
    type Connection = MssqlClient;
    type Error = tiberius::error::Error;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let tcp = TcpStream::connect(self.config.get_addr())
            .await
            .map_err(|e| tiberius::error::Error::Io {
                kind: e.kind(),
                message: format!("TCP connection to {} failed: {e}", self.config.get_addr()),
            })?;
        tcp.set_nodelay(true).ok();

        Client::connect(self.config.clone(), tcp.compat_write()).await
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}
