// WindCube day-file data source
// Main library entry point

pub mod core;

// Re-export main types
pub use core::config::SourceConfig;
pub use core::error::{DecodeWarning, Result, WindCubeError};
pub use core::format::{
    Catalog, CatalogItem, Channel, DataType, ReadRequest, Representation, Resource, SampleBuffer,
};
pub use core::grid::Grid;
pub use core::source::{DataSource, NoProgress, ProgressSink, WindCubeSource};
pub use tokio_util::sync::CancellationToken;
