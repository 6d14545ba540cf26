/// Backend connection records
///
/// This module defines the per-backend configuration records carried by a
/// create-task request, plus the redacting `Password` wrapper.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::sanitize::is_safe_identifier;

/// Which of the three backends a config, descriptor or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Oracle,
    MySql,
    Sqlite,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Oracle => f.write_str("oracle"),
            Backend::MySql => f.write_str("mysql"),
            Backend::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Secret string that never prints its value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the cleartext. Only the driver layer should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(xxxxx)")
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("xxxxx")
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Configuration for the Oracle source database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleConfig {
    /// Deployment architecture; "CDB" (any case) marks a container database
    pub oracle_arch: String,

    /// Login user; a `C##` prefix marks a common user
    pub username: String,

    pub password: Password,

    /// Database host/hostname
    pub host: String,

    /// Listener port (typically 1521)
    pub port: u16,

    /// Oracle service name
    pub service_name: String,

    /// Directory holding the native client library, `~/` is expanded
    pub lib_dir: String,

    /// `k=v&k=v` connection parameters appended to the address
    pub connect_params: String,

    /// Statements executed on every new physical session
    pub session_params: Vec<String>,

    /// Schema the broker operates on
    pub schema_name: String,

    /// Tables to include (mutually exclusive with `exclude_tables`)
    pub include_tables: Vec<String>,

    /// Tables to exclude
    pub exclude_tables: Vec<String>,
}

impl OracleConfig {
    /// Validates the source configuration
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |reason: &str| EngineError::invalid_config(Backend::Oracle, reason);

        if self.username.is_empty() {
            return Err(invalid("username cannot be empty"));
        }
        if self.host.is_empty() {
            return Err(invalid("host cannot be empty"));
        }
        if self.port == 0 {
            return Err(invalid("port must be greater than 0"));
        }
        if self.service_name.is_empty() {
            return Err(invalid("service name cannot be empty"));
        }
        if !self.include_tables.is_empty() && !self.exclude_tables.is_empty() {
            return Err(invalid("includeTables and excludeTables are mutually exclusive"));
        }
        if let Some(bad) = self
            .include_tables
            .iter()
            .chain(self.exclude_tables.iter())
            .find(|t| !is_safe_identifier(t))
        {
            return Err(EngineError::invalid_config(
                Backend::Oracle,
                format!("table filter [{}] is not a valid identifier", bad),
            ));
        }
        Ok(())
    }

    pub fn is_cdb(&self) -> bool {
        self.oracle_arch.eq_ignore_ascii_case("cdb")
    }

    /// Common users carry the `C##` prefix, compared after upper-casing.
    pub fn is_common_user(&self) -> bool {
        self.username.to_uppercase().starts_with("C##")
    }

    /// Schema differs from the login user, compared case-insensitively.
    pub fn schema_differs(&self) -> bool {
        !self.username.eq_ignore_ascii_case(&self.schema_name)
    }
}

/// Flavor of the relational target. TiDB speaks the MySQL protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationalEngine {
    #[default]
    MySql,
    TiDb,
}

impl FromStr for RelationalEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "mysql" => Ok(RelationalEngine::MySql),
            "tidb" => Ok(RelationalEngine::TiDb),
            other => Err(format!("unsupported dbType [{}], expected mysql or tidb", other)),
        }
    }
}

impl fmt::Display for RelationalEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationalEngine::MySql => f.write_str("mysql"),
            RelationalEngine::TiDb => f.write_str("tidb"),
        }
    }
}

/// Configuration for the MySQL/TiDB target database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationalConfig {
    /// "mysql" or "tidb"; empty means mysql
    pub db_type: String,
    pub username: String,
    pub password: Password,
    pub host: String,
    pub port: u16,
    pub connect_params: String,
    pub schema_name: String,
}

impl RelationalConfig {
    pub fn engine(&self) -> Result<RelationalEngine, EngineError> {
        self.db_type
            .parse()
            .map_err(|reason: String| EngineError::invalid_config(Backend::MySql, reason))
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.engine()?;
        if self.username.is_empty() {
            return Err(EngineError::invalid_config(Backend::MySql, "username cannot be empty"));
        }
        if self.host.is_empty() {
            return Err(EngineError::invalid_config(Backend::MySql, "host cannot be empty"));
        }
        if self.port == 0 {
            return Err(EngineError::invalid_config(Backend::MySql, "port must be greater than 0"));
        }
        Ok(())
    }
}

/// Configuration for the embedded SQLite metadata store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddedConfig {
    /// Database file; created when missing
    pub db_path: String,
}

impl EmbeddedConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.db_path.trim().is_empty() {
            return Err(EngineError::invalid_config(Backend::Sqlite, "db path cannot be empty"));
        }
        Ok(())
    }
}

/// Any one of the three backend records
#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    Oracle(OracleConfig),
    Relational(RelationalConfig),
    Embedded(EmbeddedConfig),
}

impl BackendConfig {
    pub fn backend(&self) -> Backend {
        match self {
            BackendConfig::Oracle(_) => Backend::Oracle,
            BackendConfig::Relational(_) => Backend::MySql,
            BackendConfig::Embedded(_) => Backend::Sqlite,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            BackendConfig::Oracle(cfg) => cfg.validate(),
            BackendConfig::Relational(cfg) => cfg.validate(),
            BackendConfig::Embedded(cfg) => cfg.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle()-> OracleConfig {
        OracleConfig {
            oracle_arch: "noncdb".to_string(),
            username: "marvin".to_string(),
            password: "secret".into(),
            host: "10.2.103.31".to_string(),
            port: 1521,
            service_name: "orclpdb1".to_string(),
            schema_name: "marvin".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_password_never_prints() {
        let cfg = oracle();
        let debug = format!("{:?}", cfg);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("Password(xxxxx)"));
        assert_eq!(cfg.password.to_string(), "xxxxx");
        assert_eq!(cfg.password.expose(), "secret");
    }

    #[test]
    fn test_oracle_validation() {
        assert!(oracle().validate().is_ok());

        let mut cfg = oracle();
        cfg.host.clear();
        assert!(cfg.validate().unwrap_err().to_string().contains("host cannot be empty"));

        let mut cfg = oracle();
        cfg.include_tables = vec!["A".to_string()];
        cfg.exclude_tables = vec!["B".to_string()];
        assert!(cfg.validate().unwrap_err().to_string().contains("mutually exclusive"));

        let mut cfg = oracle();
        cfg.include_tables = vec!["T1; DROP TABLE X".to_string()];
        assert!(cfg.validate().is_err());

        let mut cfg = oracle();
        cfg.include_tables = vec!["ORDERS$HIST".to_string(), "T#2".to_string()];
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_oracle_predicates() {
        let mut cfg = oracle();
        assert!(!cfg.is_cdb());
        cfg.oracle_arch = "Cdb".to_string();
        assert!(cfg.is_cdb());

        cfg.username = "c##admin".to_string();
        assert!(cfg.is_common_user());
        cfg.username = "admin".to_string();
        assert!(!cfg.is_common_user());
        cfg.username = "C##ADMIN".to_string();
        assert!(cfg.is_common_user());

        cfg.schema_name = "c##admin".to_string();
        assert!(!cfg.schema_differs());
        cfg.schema_name = "MARVIN".to_string();
        assert!(cfg.schema_differs());
    }

    #[test]
    fn test_relational_engine_parse() {
        assert_eq!("".parse::<RelationalEngine>().unwrap(), RelationalEngine::MySql);
        assert_eq!("TiDB".parse::<RelationalEngine>().unwrap(), RelationalEngine::TiDb);
        assert!("postgres".parse::<RelationalEngine>().is_err());

        let cfg = RelationalConfig {
            db_type: "oracle".to_string(),
            username: "root".to_string(),
            host: "h".to_string(),
            port: 4000,
            ..Default::default()
        };
        assert!(cfg.validate().unwrap_err().to_string().contains("unsupported dbType"));
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::json!({
            "oracleArch": "cdb",
            "username": "C##ADMIN",
            "password": "pw",
            "host": "h",
            "port": 1521,
            "serviceName": "orclpdb1",
            "libDir": "~/instantclient",
            "connectParams": "poolMinSessions=1",
            "sessionParams": ["ALTER SESSION SET NLS_DATE_FORMAT = 'YYYY-MM-DD'"],
            "schemaName": "marvin",
            "includeTables": [],
            "excludeTables": []
        });
        let cfg: OracleConfig = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.service_name, "orclpdb1");
        assert_eq!(cfg.lib_dir, "~/instantclient");
        assert_eq!(cfg.session_params.len(), 1);

        let cfg: EmbeddedConfig = serde_json::from_value(serde_json::json!({"dbPath": "m.db"})).unwrap();
        assert_eq!(cfg.db_path, "m.db");
    }
}
