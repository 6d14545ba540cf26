//! Engine Handle
//!
//! Bundles the three live connections a task needs. Construction is all or
//! nothing: backends are provisioned in order source, target, meta and the
//! first failure closes whatever was already opened before returning.

use crate::error::EngineError;
use crate::models::{EmbeddedConfig, OracleConfig, RelationalConfig};
use crate::provision::{BackendConnection, Provisioner};

pub struct EngineHandle<P: Provisioner> {
    source: P::Source,
    target: P::Target,
    meta: P::Meta,
}

impl<P: Provisioner> EngineHandle<P> {
    pub async fn open(
        provisioner: &P,
        oracle: &OracleConfig,
        mysql: &RelationalConfig,
        sqlite: &EmbeddedConfig,
    ) -> Result<Self, EngineError> {
        let source = provisioner.source(oracle).await?;

        let target = match provisioner.target(mysql).await {
            Ok(target) => target,
            Err(e) => {
                source.close().await;
                return Err(e);
            }
        };

        let meta = match provisioner.meta(sqlite).await {
            Ok(meta) => meta,
            Err(e) => {
                source.close().await;
                target.close().await;
                return Err(e);
            }
        };

        log::info!("Engine handle ready");
        Ok(Self { source, target, meta })
    }

    pub fn source(&self) -> &P::Source {
        &self.source
    }

    pub fn target(&self) -> &P::Target {
        &self.target
    }

    pub fn meta(&self) -> &P::Meta {
        &self.meta
    }

    /// Closes all three connections.
    pub async fn close(self) {
        self.source.close().await;
        self.target.close().await;
        self.meta.close().await;
        log::debug!("Engine handle closed");
    }
}
