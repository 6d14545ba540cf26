//! Oracle descriptor construction and the CDB authentication rewrite.

use std::path::PathBuf;
use std::time::Duration;

use super::params::{encode_params, parse_duration, parse_params};
use super::{endpoint_of, parse_address, redact_address, Endpoint};
use crate::error::{DsnParseError, EngineError};
use crate::models::{Backend, OracleConfig, Password};
use crate::platform::{expand_lib_dir, PlatformAdapter, TargetOs};

/// Connection class shared by every pooled session.
pub const POOL_CONNECTION_CLASS: &str = "POOL_CONNECTION_CLASS";

const UNSIGNED_PARAMS: [&str; 3] = ["poolMinSessions", "poolMaxSessions", "poolIncrement"];
const DURATION_PARAMS: [&str; 4] = [
    "poolWaitTimeout",
    "poolSessionMaxLifetime",
    "poolSessionTimeout",
    "connect_timeout",
];

/// How the session authenticates against the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Common user logs in on behalf of `schema` through a heterogeneous pool.
    ProxyHeterogeneous,
    /// Credentials embedded verbatim in the address.
    Direct,
}

impl AuthMode {
    pub fn decide(cfg: &OracleConfig) -> Self {
        Self::from_conditions(cfg.is_cdb(), cfg.schema_differs(), cfg.is_common_user())
    }

    /// Decision table over (container database, schema differs from user, common user).
    pub fn from_conditions(is_cdb: bool, schema_differs: bool, common_user: bool) -> Self {
        match (is_cdb, schema_differs, common_user) {
            (true, true, true) => AuthMode::ProxyHeterogeneous,
            (true, true, false) => AuthMode::Direct,
            (true, false, _) => AuthMode::Direct,
            (false, _, _) => AuthMode::Direct,
        }
    }
}

/// Everything the provisioner needs to open an Oracle pool.
#[derive(Debug, Clone)]
pub struct OracleDescriptor {
    /// Full `oracle://` address; carries the password in `Direct` mode.
    pub address: String,
    pub auth_mode: AuthMode,
    /// Effective login user, `user[schema]` in proxy mode.
    pub username: String,
    pub password: Password,
    /// Easy Connect string handed to the client library.
    pub connect_string: String,
    pub connection_class: String,
    pub heterogeneous_pool: bool,
    pub params: Vec<(String, String)>,
    /// Statements run on every new physical session.
    pub on_init_stmts: Vec<String>,
    /// Client library directory for platforms that prime it explicitly.
    pub lib_dir: Option<PathBuf>,
}

impl OracleDescriptor {
    pub fn redacted_address(&self) -> String {
        redact_address(&self.address)
    }

    pub fn endpoint(&self) -> Result<Endpoint, DsnParseError> {
        endpoint_of(Backend::Oracle, &self.address)
    }

    /// First value given for `key`. The pool parameters lead the query, so
    /// caller parameters cannot override them.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.param("connect_timeout").and_then(|v| parse_duration(v).ok())
    }
}

pub(super) fn build(
    cfg: &OracleConfig,
    platform: &dyn PlatformAdapter,
) -> Result<OracleDescriptor, EngineError> {
    let mode = AuthMode::decide(cfg);
    let hostport = format!("{}:{}", cfg.host, cfg.port);

    let user_params = parse_params(&cfg.connect_params).map_err(|reason| {
        let bare = format!("oracle://{}/{}?{}", hostport, cfg.service_name, cfg.connect_params);
        DsnParseError::new(Backend::Oracle, bare, reason)
    })?;
    let mut query = format!("connectionClass={}&heterogeneousPool=1", POOL_CONNECTION_CLASS);
    if !user_params.is_empty() {
        query.push('&');
        query.push_str(&encode_params(&user_params));
    }

    let address = match mode {
        AuthMode::ProxyHeterogeneous => {
            format!("oracle://@{}/{}?{}", hostport, cfg.service_name, query)
        }
        AuthMode::Direct => format!(
            "oracle://{}:{}@{}/{}?{}",
            urlencoding::encode(&cfg.username),
            urlencoding::encode(cfg.password.expose()),
            hostport,
            cfg.service_name,
            query
        ),
    };

    let url = parse_address(Backend::Oracle, &address)?;
    let fail = |reason: String| DsnParseError::new(Backend::Oracle, redact_address(&address), reason);

    let params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    validate_params(&params).map_err(fail)?;

    let (username, password) = match mode {
        AuthMode::ProxyHeterogeneous => (
            format!("{}[{}]", cfg.username, cfg.schema_name),
            cfg.password.clone(),
        ),
        AuthMode::Direct => {
            let user = urlencoding::decode(url.username()).map_err(|e| fail(e.to_string()))?;
            let pass = urlencoding::decode(url.password().unwrap_or_default())
                .map_err(|e| fail(e.to_string()))?;
            (user.into_owned(), Password::new(pass.into_owned()))
        }
    };

    let endpoint = endpoint_of(Backend::Oracle, &address)?;
    let mut descriptor = OracleDescriptor {
        address,
        auth_mode: mode,
        username,
        password,
        connect_string: String::new(),
        connection_class: POOL_CONNECTION_CLASS.to_string(),
        heterogeneous_pool: false,
        params,
        on_init_stmts: cfg.session_params.clone(),
        lib_dir: None,
    };
    if let Some(class) = descriptor.param("connectionClass") {
        descriptor.connection_class = class.to_string();
    }
    descriptor.heterogeneous_pool = descriptor.param("heterogeneousPool") == Some("1");
    descriptor.connect_string = easy_connect(&endpoint, descriptor.connect_timeout());

    descriptor.lib_dir = match (expand_lib_dir(&cfg.lib_dir), platform.target_os()) {
        (None, _) => None,
        (Some(dir), TargetOs::Linux) => {
            platform.export_library_path(&dir)?;
            None
        }
        (Some(dir), TargetOs::MacOs | TargetOs::Windows) => Some(dir),
        (Some(dir), TargetOs::Other) => {
            log::warn!("Ignoring oracle lib dir {:?} on unsupported platform", dir);
            None
        }
    };

    log::info!(
        "Built oracle dsn in {:?} mode: {}",
        descriptor.auth_mode,
        descriptor.redacted_address()
    );
    Ok(descriptor)
}

fn validate_params(params: &[(String, String)]) -> Result<(), String> {
    for (key, value) in params {
        let key = key.as_str();
        if UNSIGNED_PARAMS.contains(&key) {
            value
                .parse::<u32>()
                .map_err(|_| format!("{}={}: expected an unsigned integer", key, value))?;
        } else if DURATION_PARAMS.contains(&key) {
            parse_duration(value).map_err(|e| format!("{}={}: {}", key, value, e))?;
        } else if key == "heterogeneousPool" && value != "0" && value != "1" {
            return Err(format!("{}={}: expected 0 or 1", key, value));
        }
    }
    Ok(())
}

/// `host:port/service`, with `connect_timeout` in whole seconds when set.
fn easy_connect(endpoint: &Endpoint, connect_timeout: Option<Duration>) -> String {
    let base = format!("{}:{}/{}", endpoint.host, endpoint.port, endpoint.database);
    match connect_timeout {
        Some(timeout) => format!("{}?connect_timeout={}", base, timeout.as_secs().max(1)),
        None => base,
    }
}
