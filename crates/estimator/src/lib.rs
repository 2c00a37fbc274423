// Library crate: geometry analysis and print cost estimation.
// Container parsing lives in `loader` and is only a boundary adapter;
// everything else operates on already-parsed triangle buffers.

pub mod bounds;
pub mod cost;
pub mod error;
pub mod fixtures;
pub mod loader;
pub mod materials;
pub mod merge;
pub mod mesh;
pub mod model;
pub mod normalize;
pub mod scene;
pub mod session;
pub mod shading;
pub mod slicer_output;
pub mod validation;
pub mod volume;

pub use bounds::Bounds;
pub use error::{GeometryError, GeometryResult};
pub use materials::MaterialCatalog;
pub use mesh::TriangleBuffer;
pub use model::{LoadedModel, RawModel};
pub use scene::SceneNode;
pub use session::EstimateSession;
