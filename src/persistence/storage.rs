//! RocksDB storage layer implementation
//!
//! Nodes and edges live in their own column families. Keys carry the network
//! name and the zero-padded arena index, so a prefix scan returns records in
//! insertion order and a reload rebuilds identical handles. The name is
//! percent-encoded so it never contains the ':' separator.

use super::GraphStorage;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use crate::graph::{
    EdgeKind, GraphError, Network, NodeId, NodeKind, PropertyMap, SimpleEdge, SimpleNode,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

const NODES_CF: &str = "nodes";
const EDGES_CF: &str = "edges";

/// Bytes escaped in the network segment of a key
const NAME_ESCAPES: &AsciiSet = &CONTROLS.add(b':').add(b'%');

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Column family error
    #[error("Column family error: {0}")]
    ColumnFamily(String),

    /// Stored records do not rebuild into a network
    #[error("Graph error while loading: {0}")]
    Graph(#[from] GraphError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Serialized node for storage
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredNode {
    key: String,
    kind: NodeKind,
    payload: PropertyMap,
}

/// Serialized edge for storage; endpoints by identity key
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEdge {
    key: String,
    kind: EdgeKind,
    source_key: String,
    target_key: String,
    payload: PropertyMap,
}

/// RocksDB-based network storage
pub struct RocksStorage {
    db: Arc<DB>,
    batch_size: usize,
}

impl RocksStorage {
    /// Open or create a store; writes are committed `batch_size` records at a time
    pub fn open(path: impl AsRef<Path>, batch_size: usize) -> StorageResult<Self> {
        let path = path.as_ref();
        info!("Opening network storage at: {:?}", path);

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(3);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new("default", Options::default()),
            ColumnFamilyDescriptor::new(NODES_CF, Self::cf_options()),
            ColumnFamilyDescriptor::new(EDGES_CF, Self::cf_options()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            batch_size: batch_size.max(1),
        })
    }

    fn cf_options() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf(&self, name: &str) -> StorageResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamily(name.to_string()))
    }

    /// Flush all data to disk
    pub fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        debug!("Flushed storage to disk");
        Ok(())
    }

    /// Names of every network with stored nodes
    pub fn list_networks(&self) -> StorageResult<Vec<String>> {
        let cf = self.cf(NODES_CF)?;
        let mut names = BTreeSet::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item?;
            let name = std::str::from_utf8(&key)
                .ok()
                .and_then(|k| k.split_once(':'))
                .and_then(|(name, _)| percent_decode_str(name).decode_utf8().ok());
            if let Some(name) = name {
                names.insert(name.into_owned());
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Write `records` into `cf`, committing every `batch_size` puts
    fn write_batched<I>(&self, cf: &ColumnFamily, records: I) -> StorageResult<usize>
    where
        I: IntoIterator<Item = StorageResult<(Vec<u8>, Vec<u8>)>>,
    {
        let mut batch = WriteBatch::default();
        let mut written = 0;
        for record in records {
            let (key, value) = record?;
            batch.put_cf(cf, key, value);
            written += 1;
            if batch.len() >= self.batch_size {
                debug!("Committing batch of {} records", batch.len());
                self.db.write(std::mem::take(&mut batch))?;
            }
        }
        if !batch.is_empty() {
            self.db.write(batch)?;
        }
        Ok(written)
    }

    /// Values under `prefix` in key order
    fn scan(&self, cf: &ColumnFamily, prefix: &[u8]) -> StorageResult<Vec<Box<[u8]>>> {
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            values.push(value);
        }
        Ok(values)
    }

    fn clear(&self, network: &str) -> StorageResult<()> {
        let mut batch = WriteBatch::default();
        for (cf_name, tag) in [(NODES_CF, 'n'), (EDGES_CF, 'e')] {
            let cf = self.cf(cf_name)?;
            let (from, to) = Self::prefix_range(network, tag);
            batch.delete_range_cf(cf, from, to);
        }
        self.db.write(batch)?;
        Ok(())
    }

    fn encode_name(network: &str) -> String {
        utf8_percent_encode(network, NAME_ESCAPES).to_string()
    }

    fn prefix(network: &str, tag: char) -> Vec<u8> {
        format!("{}:{}:", Self::encode_name(network), tag).into_bytes()
    }

    /// `[prefix, prefix-successor)`; ';' follows ':'
    fn prefix_range(network: &str, tag: char) -> (Vec<u8>, Vec<u8>) {
        (
            Self::prefix(network, tag),
            format!("{}:{};", Self::encode_name(network), tag).into_bytes(),
        )
    }

    fn node_key(network: &str, index: u64) -> Vec<u8> {
        format!("{}:n:{:016x}", Self::encode_name(network), index).into_bytes()
    }

    fn edge_key(network: &str, index: u64) -> Vec<u8> {
        format!("{}:e:{:016x}", Self::encode_name(network), index).into_bytes()
    }
}

impl GraphStorage for RocksStorage {
    fn save(&self, network: &Network) -> StorageResult<()> {
        let name = network.name();
        info!("Saving network {}", name);
        self.clear(name)?;

        let nodes = network.nodes().map(|node| -> StorageResult<(Vec<u8>, Vec<u8>)> {
            let stored = StoredNode {
                key: node.key.clone(),
                kind: node.kind,
                payload: node.payload.clone(),
            };
            Ok((Self::node_key(name, node.id.as_u64()), bincode::serialize(&stored)?))
        });
        let node_count = self.write_batched(self.cf(NODES_CF)?, nodes)?;

        let edges = network.edges().map(|edge| -> StorageResult<(Vec<u8>, Vec<u8>)> {
            let endpoint = |id: NodeId| {
                network
                    .node(id)
                    .map(|n| n.key.clone())
                    .ok_or_else(|| StorageError::Graph(GraphError::NodeNotFound(id.to_string())))
            };
            let stored = StoredEdge {
                key: edge.key.clone(),
                kind: edge.kind,
                source_key: endpoint(edge.source)?,
                target_key: endpoint(edge.target)?,
                payload: edge.payload.clone(),
            };
            Ok((Self::edge_key(name, edge.id.as_u64()), bincode::serialize(&stored)?))
        });
        let edge_count = self.write_batched(self.cf(EDGES_CF)?, edges)?;

        info!("Saved network {}: {} nodes, {} edges", name, node_count, edge_count);
        Ok(())
    }

    fn load(&self, name: &str) -> StorageResult<Network> {
        info!("Loading network {}", name);
        let mut network = Network::new(name);

        for value in self.scan(self.cf(NODES_CF)?, &Self::prefix(name, 'n'))? {
            let stored: StoredNode = bincode::deserialize(&value)?;
            let decl = SimpleNode::new(stored.key, stored.kind).with_payload(stored.payload);
            network.add_node(&decl);
        }

        for value in self.scan(self.cf(EDGES_CF)?, &Self::prefix(name, 'e'))? {
            let stored: StoredEdge = bincode::deserialize(&value)?;
            let decl = SimpleEdge {
                key: stored.key,
                kind: stored.kind,
                source: stored.source_key,
                target: stored.target_key,
                payload: stored.payload,
            };
            if let Err(e) = network.add_edge(&decl) {
                error!("Stored edge {} does not fit network {}", decl.key, name);
                return Err(e.into());
            }
        }

        info!(
            "Loaded network {}: {} nodes, {} edges",
            name,
            network.node_count(),
            network.edge_count()
        );
        Ok(network)
    }
}
