//! Interactive editing of geographic features on a map.
//!
//! The map engine itself is external: everything here talks to it through the
//! [`surface::RenderSurface`] trait, and [`memory`] provides a headless implementation.
//!
//! * [`store`]: the feature collection, kept in sync with a surface source
//! * [`draw`]: pointer and keyboard driven drawing of points, lines and polygons
//! * [`vertex`]: vertex editing through a direct-manipulation widget
//! * [`measure_layer`]: measurement labels for the store's features
//! * [`style`]: layer style proxies and style switching
//! * [`camera`]: camera mirroring
//! * [`config`]: YAML configuration

pub mod camera;
pub mod config;
pub mod draw;
pub mod ids;
pub mod measure_layer;
pub mod memory;
pub mod store;
pub mod style;
pub mod surface;
pub mod vertex;

pub use config::EditorConfig;
pub use draw::{DrawManager, DrawMode, DrawOptions};
pub use measure_layer::MeasureLayer;
pub use store::{SharedStore, StoreEvent, StoreEventKind, SyncStrategy};
pub use surface::{MapEvent, RenderSurface, SharedSurface};
pub use vertex::VertexEditor;
