/// Oracle source backend
///
/// Client library priming, the session pool with its liveness check, and
/// the result-set row source used by the generic query executor.

pub mod client;
pub mod connection;
pub mod rows;

pub use client::{is_client_primed, prime_client};
pub use connection::{pool_config, provision, OraclePool, ProvisionFailure};
pub use rows::{query_connection, OracleRowSource};
