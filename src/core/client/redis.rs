//! Redis-backed keyspace clients.
//!
//! Standalone mode holds a single connection; cluster mode discovers the
//! master nodes via CLUSTER NODES and holds one connection per master, so
//! each shard gets its own independent cursor sequence. Per-key queries go
//! to the shard that yielded the key - if a slot migrates mid-scan the
//! query fails with MOVED and that key is skipped, which is within the
//! best-effort coverage contract.

use super::{KeyBatch, KeyspaceClient, Topology};
use crate::core::classifier::{CardinalityKind, KeyType};
use crate::error::{ClientError, ConnectError};
use redis::{Connection, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::{debug, warn};

/// How to reach the store. Supplied once, immutable for the run.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    /// Logical database (standalone only; clusters always use db 0)
    pub db: i64,
}

impl ConnectOptions {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connect, run the preflight checks, and return a client matching the
/// server's topology.
///
/// `cluster_requested` is the operator's `--cluster` flag; a mismatch with
/// the server's actual mode is a configuration error, not something to
/// paper over silently.
pub fn connect(
    opts: &ConnectOptions,
    cluster_requested: bool,
) -> Result<Box<dyn KeyspaceClient>, ConnectError> {
    let mut seed = open_connection(opts, &opts.host, opts.port, opts.db)?;
    let topology = preflight(&mut seed, &opts.addr(), cluster_requested)?;

    match topology {
        Topology::Standalone => Ok(Box::new(RedisStandaloneClient {
            name: opts.addr(),
            conn: seed,
        })),
        Topology::Cluster => Ok(Box::new(RedisClusterClient::discover(opts, seed)?)),
    }
}

/// Single server: exactly one shard, one cursor sequence.
pub struct RedisStandaloneClient {
    name: String,
    conn: Connection,
}

impl RedisStandaloneClient {
    pub fn connect(opts: &ConnectOptions) -> Result<Self, ConnectError> {
        let conn = open_connection(opts, &opts.host, opts.port, opts.db)?;
        Ok(Self {
            name: opts.addr(),
            conn,
        })
    }
}

impl KeyspaceClient for RedisStandaloneClient {
    fn shard_count(&self) -> usize {
        1
    }

    fn shard_name(&self, _shard: usize) -> String {
        self.name.clone()
    }

    fn scan_batch(
        &mut self,
        _shard: usize,
        cursor: u64,
        count: usize,
    ) -> Result<KeyBatch, ClientError> {
        scan_batch_on(&mut self.conn, cursor, count)
    }

    fn memory_usage(&mut self, _shard: usize, key: &[u8]) -> Result<Option<u64>, ClientError> {
        memory_usage_on(&mut self.conn, key)
    }

    fn key_type(&mut self, _shard: usize, key: &[u8]) -> Result<KeyType, ClientError> {
        key_type_on(&mut self.conn, key)
    }

    fn cardinality(
        &mut self,
        _shard: usize,
        key: &[u8],
        kind: CardinalityKind,
    ) -> Result<u64, ClientError> {
        cardinality_on(&mut self.conn, key, kind)
    }
}

/// Cluster: one shard per master node, each with its own connection.
pub struct RedisClusterClient {
    shards: Vec<ClusterShard>,
}

struct ClusterShard {
    name: String,
    conn: Connection,
}

impl RedisClusterClient {
    pub fn connect(opts: &ConnectOptions) -> Result<Self, ConnectError> {
        let seed = open_connection(opts, &opts.host, opts.port, 0)?;
        Self::discover(opts, seed)
    }

    /// Discover master nodes through the seed connection and open one
    /// connection per master.
    fn discover(opts: &ConnectOptions, mut seed: Connection) -> Result<Self, ConnectError> {
        let raw: String = redis::cmd("CLUSTER")
            .arg("NODES")
            .query(&mut seed)
            .map_err(|e| ConnectError::ClusterDiscovery(e.to_string()))?;

        let masters = parse_cluster_nodes(&raw);
        if masters.is_empty() {
            return Err(ConnectError::ClusterDiscovery(
                "CLUSTER NODES advertised no reachable master nodes".to_string(),
            ));
        }
        debug!(masters = masters.len(), "discovered cluster masters");

        let mut shards = Vec::with_capacity(masters.len());
        for (host, port) in masters {
            // Clusters only expose db 0
            let conn = open_connection(opts, &host, port, 0)?;
            shards.push(ClusterShard {
                name: format!("{}:{}", host, port),
                conn,
            });
        }
        Ok(Self { shards })
    }
}

impl KeyspaceClient for RedisClusterClient {
    fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_name(&self, shard: usize) -> String {
        self.shards[shard].name.clone()
    }

    fn scan_batch(
        &mut self,
        shard: usize,
        cursor: u64,
        count: usize,
    ) -> Result<KeyBatch, ClientError> {
        scan_batch_on(&mut self.shards[shard].conn, cursor, count)
    }

    fn memory_usage(&mut self, shard: usize, key: &[u8]) -> Result<Option<u64>, ClientError> {
        memory_usage_on(&mut self.shards[shard].conn, key)
    }

    fn key_type(&mut self, shard: usize, key: &[u8]) -> Result<KeyType, ClientError> {
        key_type_on(&mut self.shards[shard].conn, key)
    }

    fn cardinality(
        &mut self,
        shard: usize,
        key: &[u8],
        kind: CardinalityKind,
    ) -> Result<u64, ClientError> {
        cardinality_on(&mut self.shards[shard].conn, key, kind)
    }
}

fn open_connection(
    opts: &ConnectOptions,
    host: &str,
    port: u16,
    db: i64,
) -> Result<Connection, ConnectError> {
    let addr = format!("{}:{}", host, port);
    let info = ConnectionInfo {
        addr: ConnectionAddr::Tcp(host.to_string(), port),
        redis: RedisConnectionInfo {
            db,
            username: None,
            password: opts.password.clone(),
            ..Default::default()
        },
    };

    let client = redis::Client::open(info).map_err(|source| ConnectError::Unreachable {
        addr: addr.clone(),
        source,
    })?;

    client.get_connection().map_err(|source| {
        if source.kind() == redis::ErrorKind::AuthenticationFailed {
            ConnectError::AuthenticationFailed { addr }
        } else {
            ConnectError::Unreachable { addr, source }
        }
    })
}

/// Version gate plus topology check, run once against the seed connection
/// before any scanning starts.
fn preflight(
    conn: &mut Connection,
    addr: &str,
    cluster_requested: bool,
) -> Result<Topology, ConnectError> {
    let server_info: String = redis::cmd("INFO")
        .arg("server")
        .query(conn)
        .map_err(|source| ConnectError::Unreachable {
            addr: addr.to_string(),
            source,
        })?;

    let version = info_field(&server_info, "redis_version")
        .unwrap_or("unknown")
        .to_string();
    if !supports_memory_usage(&version) {
        return Err(ConnectError::UnsupportedVersion { version });
    }

    let cluster_info: String = redis::cmd("INFO")
        .arg("cluster")
        .query(conn)
        .map_err(|source| ConnectError::Unreachable {
            addr: addr.to_string(),
            source,
        })?;
    let cluster_enabled = info_field(&cluster_info, "cluster_enabled") == Some("1");

    match (cluster_enabled, cluster_requested) {
        (true, false) => Err(ConnectError::ClusterRequired {
            addr: addr.to_string(),
        }),
        (false, true) => Err(ConnectError::NotACluster {
            addr: addr.to_string(),
        }),
        (true, true) => Ok(Topology::Cluster),
        (false, false) => Ok(Topology::Standalone),
    }
}

fn scan_batch_on(conn: &mut Connection, cursor: u64, count: usize) -> Result<KeyBatch, ClientError> {
    let (next_cursor, keys): (u64, Vec<Vec<u8>>) = redis::cmd("SCAN")
        .arg(cursor)
        .arg("MATCH")
        .arg("*")
        .arg("COUNT")
        .arg(count)
        .query(conn)?;
    Ok(KeyBatch { next_cursor, keys })
}

fn memory_usage_on(conn: &mut Connection, key: &[u8]) -> Result<Option<u64>, ClientError> {
    let size: Option<u64> = redis::cmd("MEMORY").arg("USAGE").arg(key).query(conn)?;
    Ok(size)
}

fn key_type_on(conn: &mut Connection, key: &[u8]) -> Result<KeyType, ClientError> {
    let name: String = redis::cmd("TYPE").arg(key).query(conn)?;
    Ok(KeyType::from_type_name(&name))
}

fn cardinality_on(
    conn: &mut Connection,
    key: &[u8],
    kind: CardinalityKind,
) -> Result<u64, ClientError> {
    let command = match kind {
        CardinalityKind::HashFields => "HLEN",
        CardinalityKind::ListEntries => "LLEN",
        CardinalityKind::SetMembers => "SCARD",
        CardinalityKind::SortedSetMembers => "ZCARD",
    };
    let count: u64 = redis::cmd(command).arg(key).query(conn)?;
    Ok(count)
}

/// Extract a `name:value` field from an INFO reply.
fn info_field<'a>(info: &'a str, name: &str) -> Option<&'a str> {
    info.lines().find_map(|line| {
        line.strip_prefix(name)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|value| value.trim_end_matches('\r'))
    })
}

/// MEMORY USAGE landed in Redis 4.0. Unparseable versions (forks, custom
/// builds) are let through; the first MEMORY USAGE call will tell.
fn supports_memory_usage(version: &str) -> bool {
    match parse_version(version) {
        Some((major, _, _)) => major >= 4,
        None => {
            warn!(version, "could not parse server version, proceeding");
            true
        }
    }
}

fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Some((major, minor, patch))
}

/// Parse CLUSTER NODES output down to the master node addresses.
///
/// Each line is `<id> <ip:port@cport> <flags> ...`; we keep nodes flagged
/// master that are not failed, and strip the cluster-bus suffix from the
/// address.
pub fn parse_cluster_nodes(raw: &str) -> Vec<(String, u16)> {
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _id = fields.next()?;
            let addr = fields.next()?;
            let flags = fields.next()?;

            if !flags.split(',').any(|f| f == "master") {
                return None;
            }
            if flags.split(',').any(|f| f == "fail" || f == "fail?") {
                return None;
            }

            let addr = addr.split('@').next()?;
            let (host, port) = addr.rsplit_once(':')?;
            let port: u16 = port.parse().ok()?;
            if host.is_empty() {
                return None;
            }
            Some((host.to_string(), port))
        })
        .collect()
}
