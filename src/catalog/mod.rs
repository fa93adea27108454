//! Engine catalog: descriptor documents describing each upstream search
//! engine, served read-only as addressable resources.

pub mod builder;
pub mod loader;
pub mod registry;
pub mod types;

pub use loader::{parse_descriptor, scan_engines};
pub use registry::{CatalogDocument, EngineCatalog, ResourceEntry};
pub use types::{engine_uri, is_valid_engine_name, EngineDescriptor, EngineIndex, ParamDescriptor, INDEX_URI};
