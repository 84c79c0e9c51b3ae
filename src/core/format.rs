// Data structures shared by the catalog, availability and read paths

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One column of a day file header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub unit: String,
    pub groups: Vec<String>,
}

/// Parsed header of a day file: preamble metadata plus the channel
/// columns in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub properties: BTreeMap<String, String>,
    pub channels: Vec<Channel>,
}

impl Schema {
    pub fn column_of(&self, id: &str) -> Option<usize> {
        self.channels.iter().position(|channel| channel.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Float64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representation {
    pub data_type: DataType,
    pub sample_period_secs: u32,
}

impl Representation {
    pub fn new(sample_period_secs: u32) -> Self {
        Self {
            data_type: DataType::Float64,
            sample_period_secs,
        }
    }

    /// Human-readable id such as `10_min` or `1_h`.
    pub fn id(&self) -> String {
        let secs = self.sample_period_secs;
        if secs % 3600 == 0 {
            format!("{}_h", secs / 3600)
        } else if secs % 60 == 0 {
            format!("{}_min", secs / 60)
        } else {
            format!("{}_s", secs)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub unit: String,
    pub groups: Vec<String>,
    pub representations: Vec<Representation>,
}

impl Resource {
    pub fn from_channel(channel: &Channel, sample_period_secs: u32) -> Self {
        Self {
            id: channel.id.clone(),
            unit: channel.unit.clone(),
            groups: channel.groups.clone(),
            representations: vec![Representation::new(sample_period_secs)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,
    pub properties: BTreeMap<String, String>,
    pub resources: Vec<Resource>,
}

/// Exactly what a read request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub catalog_id: String,
    pub resource: Resource,
    pub representation: Representation,
}

impl CatalogItem {
    pub fn new(catalog: &Catalog, resource: &Resource, representation: &Representation) -> Self {
        Self {
            catalog_id: catalog.id.clone(),
            resource: resource.clone(),
            representation: representation.clone(),
        }
    }
}

/// Caller-owned output of one read request. `data` and `status` are
/// parallel; a slot with status 0 keeps its initial 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub data: Vec<f64>,
    pub status: Vec<u8>,
}

impl SampleBuffer {
    pub fn new(slots: usize) -> Self {
        Self {
            data: vec![0.0; slots],
            status: vec![0; slots],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.status.iter().filter(|s| **s == 1).count()
    }
}

/// Binds a catalog item to the buffer the engine writes into. Each request
/// borrows its own buffer, so regions never alias.
#[derive(Debug)]
pub struct ReadRequest<'a> {
    pub item: CatalogItem,
    pub buffer: &'a mut SampleBuffer,
}

impl<'a> ReadRequest<'a> {
    pub fn new(item: CatalogItem, buffer: &'a mut SampleBuffer) -> Self {
        Self { item, buffer }
    }
}

/// One decoded data row. `values[i]` belongs to channel `i` of the
/// file's schema; `None` marks a missing value, distinct from zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub values: Vec<Option<f64>>,
}
