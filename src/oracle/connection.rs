/// Oracle session pool and provisioning
///
/// The pool is the client library's own session pool, configured from the
/// descriptor's pool parameters. Sessions are checked out with the
/// descriptor's connection class and run the session-init statements the
/// first time they are handed out. All calls block and are expected to run
/// on the blocking thread pool.

use oracle::pool::{CloseMode, GetMode, Pool, PoolBuilder, PoolOptions, PoolType};
use oracle::Connection;

use super::client::prime_client;
use super::rows::query_connection;
use crate::dsn::params::parse_duration;
use crate::dsn::OracleDescriptor;
use crate::error::{ConnectStage, ConnectionError, QueryError, QueryStage};
use crate::models::Backend;
use crate::provision::{PoolPolicy, Unverified};
use crate::query::QueryResult;

/// Sessions kept across releases when no `poolMaxSessions` cap is given.
const RETAINED_SESSIONS: u32 = 2;

/// Pool builder plus the options every checkout uses.
///
/// Pure configuration: nothing here touches the client library until
/// [`PoolBuilder::build`] runs.
pub fn pool_config(
    descriptor: &OracleDescriptor,
    policy: PoolPolicy,
) -> Result<(PoolBuilder, PoolOptions), oracle::Error> {
    let unsigned = |key: &str| descriptor.param(key).and_then(|v| v.parse::<u32>().ok());
    let duration = |key: &str| descriptor.param(key).and_then(|v| parse_duration(v).ok());

    let mut builder = PoolBuilder::new(
        descriptor.username.as_str(),
        descriptor.password.expose(),
        descriptor.connect_string.as_str(),
    );
    let mut session = PoolOptions::new().connection_class(descriptor.connection_class.as_str());

    if descriptor.heterogeneous_pool {
        builder.pool_type(PoolType::Heterogeneous);
        session = session
            .username(descriptor.username.as_str())
            .password(descriptor.password.expose());
    } else {
        builder.pool_type(PoolType::Homogeneous);
        if let Some(min) = unsigned("poolMinSessions") {
            builder.min_connections(min);
        }
        if let Some(step) = unsigned("poolIncrement") {
            builder.connection_increment(step);
        }
    }

    match unsigned("poolMaxSessions").or(policy.max_open) {
        Some(max) => {
            builder.max_connections(max);
            builder.get_mode(match duration("poolWaitTimeout") {
                Some(wait) => GetMode::TimedWait(wait),
                None => GetMode::Wait,
            });
        }
        None => {
            builder.max_connections(policy.max_idle.unwrap_or(RETAINED_SESSIONS));
            builder.get_mode(GetMode::ForceGet);
        }
    }

    if let Some(idle) = duration("poolSessionTimeout").or(policy.max_idle_time) {
        builder.timeout(idle)?;
    }
    if let Some(lifetime) = duration("poolSessionMaxLifetime").or(policy.max_lifetime) {
        builder.max_lifetime_connection(lifetime)?;
    }
    Ok((builder, session))
}

/// Pool of Oracle sessions for one descriptor
pub struct OraclePool {
    pool: Pool,
    session: PoolOptions,
    init_stmts: Vec<String>,
    address: String,
}

impl OraclePool {
    /// Creates the client-side pool. Homogeneous pools open their minimum
    /// sessions here, so a dead listener can already fail at this point.
    pub fn new(descriptor: &OracleDescriptor, policy: PoolPolicy) -> Result<Self, oracle::Error> {
        let (builder, session) = pool_config(descriptor, policy)?;
        Ok(Self {
            pool: builder.build()?,
            session,
            init_stmts: descriptor.on_init_stmts.clone(),
            address: descriptor.redacted_address(),
        })
    }

    /// Redacted address the pool connects to
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Physical sessions currently open, idle or in use
    pub fn open_sessions(&self) -> u32 {
        self.pool.open_count().unwrap_or(0)
    }

    pub fn busy_sessions(&self) -> u32 {
        self.pool.busy_count().unwrap_or(0)
    }

    fn acquire(&self) -> Result<Connection, oracle::Error> {
        let conn = self.pool.get_with_options(&self.session)?;
        if conn.is_new_connection() {
            for stmt in &self.init_stmts {
                log::debug!("Running session init statement: {}", stmt);
                if let Err(e) = conn.execute(stmt, &[]) {
                    let _ = conn.close();
                    return Err(e);
                }
            }
        }
        Ok(conn)
    }

    /// Liveness check on one pooled session.
    pub fn ping(&self) -> Result<(), oracle::Error> {
        self.verify().map_err(|(_, e)| e)
    }

    fn verify(&self) -> Result<(), (ConnectStage, oracle::Error)> {
        let conn = self.acquire().map_err(|e| (ConnectStage::Open, e))?;
        conn.ping().map_err(|e| (ConnectStage::Ping, e))
    }

    /// Runs `sql` on a pooled session.
    pub fn query(&self, sql: &str) -> Result<QueryResult, QueryError> {
        let conn = self
            .acquire()
            .map_err(|e| QueryError::new(sql, QueryStage::Execute, e))?;
        query_connection(&conn, sql)
    }

    /// Closes the pool, including sessions still checked out.
    pub fn close(&self) {
        match self.pool.close(&CloseMode::Force) {
            Ok(()) => log::info!("Closed oracle pool on {}", self.address),
            Err(e) => log::warn!("Failed to close oracle pool on {}: {}", self.address, e),
        }
    }
}

/// Diagnostic for well-known ORA codes; logged, never part of the error text
pub fn ora_hint(code: i32) -> Option<&'static str> {
    match code {
        1017 => Some("invalid username or password"),
        1045 => Some("user lacks CREATE SESSION privilege"),
        12154 => Some("connect identifier could not be resolved"),
        12170 | 12541 => Some("database not reachable or listener not running"),
        12514 => Some("service name is not registered with the listener"),
        28000 => Some("account is locked"),
        _ => None,
    }
}

/// First `ORA-NNNNN` code in a driver message
pub fn ora_code(message: &str) -> Option<i32> {
    let start = message.find("ORA-")? + 4;
    let digits: String = message[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn log_hint(err: &oracle::Error) {
    let message = err.to_string();
    if let Some(hint) = ora_code(&message).and_then(ora_hint) {
        log::warn!("{}: {}", message, hint);
    } else if message.contains("DPI-1047") {
        log::warn!("Oracle client library could not be loaded, check libDir");
    }
}

/// Why provisioning failed, with the pool handle when one was created
#[derive(Debug)]
pub enum ProvisionFailure {
    /// Client priming or pool creation failed; there is nothing to close.
    Open(ConnectionError),
    /// The pool exists but its first session failed.
    Unverified(Unverified<OraclePool>),
}

impl ProvisionFailure {
    /// Closes the pool, if any, and returns the error.
    pub fn close(self) -> ConnectionError {
        match self {
            ProvisionFailure::Open(error) => error,
            ProvisionFailure::Unverified(unverified) => {
                let (pool, error) = unverified.into_parts();
                pool.close();
                error
            }
        }
    }
}

/// Opens the source pool and checks one session.
pub fn provision(descriptor: &OracleDescriptor) -> Result<OraclePool, ProvisionFailure> {
    let address = descriptor.redacted_address();
    log::info!("Attempting to connect to Oracle database: {}", address);

    if let Some(dir) = descriptor.lib_dir.as_deref() {
        prime_client(dir).map_err(|e| {
            ProvisionFailure::Open(ConnectionError::new(Backend::Oracle, ConnectStage::Open, address.as_str(), e))
        })?;
    }

    let pool = OraclePool::new(descriptor, PoolPolicy::UNBOUNDED).map_err(|e| {
        log_hint(&e);
        ProvisionFailure::Open(ConnectionError::new(Backend::Oracle, ConnectStage::Open, address.as_str(), e))
    })?;

    if let Err((stage, e)) = pool.verify() {
        log_hint(&e);
        let error = ConnectionError::new(Backend::Oracle, stage, pool.address(), e);
        return Err(ProvisionFailure::Unverified(Unverified { handle: pool, error }));
    }

    log::info!("Successfully connected to {}", pool.address());
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dsn::{AuthMode, POOL_CONNECTION_CLASS};
    use crate::models::Password;

    fn descriptor(username: &str, heterogeneous: bool, params: &[(&str, &str)]) -> OracleDescriptor {
        OracleDescriptor {
            address: "oracle://@h:1521/svc".to_string(),
            auth_mode: AuthMode::ProxyHeterogeneous,
            username: username.to_string(),
            password: Password::from("adm1n"),
            connect_string: "h:1521/svc".to_string(),
            connection_class: POOL_CONNECTION_CLASS.to_string(),
            heterogeneous_pool: heterogeneous,
            params: params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            on_init_stmts: Vec::new(),
            lib_dir: None,
        }
    }

    #[test]
    fn test_heterogeneous_pool_checks_out_as_schema_user() {
        let d = descriptor("C##ADMIN[marvin]", true, &[]);
        let (builder, session) = pool_config(&d, PoolPolicy::UNBOUNDED).unwrap();

        let mut expected = PoolBuilder::new("C##ADMIN[marvin]", "adm1n", "h:1521/svc");
        expected
            .pool_type(PoolType::Heterogeneous)
            .max_connections(RETAINED_SESSIONS)
            .get_mode(GetMode::ForceGet);
        assert_eq!(builder, expected);
        assert_eq!(
            session,
            PoolOptions::new()
                .connection_class(POOL_CONNECTION_CLASS)
                .username("C##ADMIN[marvin]")
                .password("adm1n")
        );
    }

    #[test]
    fn test_homogeneous_pool_honors_sizing_params() {
        let d = descriptor(
            "marvin",
            false,
            &[
                ("poolMinSessions", "50"),
                ("poolIncrement", "5"),
                ("poolMaxSessions", "1000"),
                ("poolWaitTimeout", "360s"),
                ("poolSessionTimeout", "10m"),
                ("poolSessionMaxLifetime", "2h"),
            ],
        );
        let (builder, session) = pool_config(&d, PoolPolicy::UNBOUNDED).unwrap();

        let mut expected = PoolBuilder::new("marvin", "adm1n", "h:1521/svc");
        expected
            .pool_type(PoolType::Homogeneous)
            .min_connections(50)
            .connection_increment(5)
            .max_connections(1000)
            .get_mode(GetMode::TimedWait(Duration::from_secs(360)));
        expected.timeout(Duration::from_secs(600)).unwrap();
        expected.max_lifetime_connection(Duration::from_secs(7200)).unwrap();
        assert_eq!(builder, expected);
        assert_eq!(session, PoolOptions::new().connection_class(POOL_CONNECTION_CLASS));
    }

    #[test]
    fn test_capped_pool_without_wait_timeout_blocks() {
        let d = descriptor("marvin", true, &[("poolMaxSessions", "10")]);
        let (builder, _) = pool_config(&d, PoolPolicy::UNBOUNDED).unwrap();

        let mut expected = PoolBuilder::new("marvin", "adm1n", "h:1521/svc");
        expected
            .pool_type(PoolType::Heterogeneous)
            .max_connections(10)
            .get_mode(GetMode::Wait);
        assert_eq!(builder, expected);
    }

    #[test]
    fn test_first_pool_param_wins() {
        let d = descriptor("marvin", true, &[("poolMaxSessions", "10"), ("poolMaxSessions", "20")]);
        let (builder, _) = pool_config(&d, PoolPolicy::UNBOUNDED).unwrap();

        let mut expected = PoolBuilder::new("marvin", "adm1n", "h:1521/svc");
        expected
            .pool_type(PoolType::Heterogeneous)
            .max_connections(10)
            .get_mode(GetMode::Wait);
        assert_eq!(builder, expected);
    }

    #[test]
    fn test_ora_hint() {
        assert!(ora_hint(1017).unwrap().contains("password"));
        assert!(ora_hint(12514).unwrap().contains("service name"));
        assert_eq!(ora_hint(0), None);
        assert_eq!(ora_hint(942), None);
    }

    #[test]
    fn test_ora_code() {
        assert_eq!(ora_code("ORA-01017: invalid username/password; logon denied"), Some(1017));
        assert_eq!(ora_code("OCI Error: ORA-12514: TNS:listener does not currently know"), Some(12514));
        assert_eq!(ora_code("DPI-1047: Cannot locate a 64-bit Oracle Client library"), None);
        assert_eq!(ora_code("ORA-"), None);
    }
}
