pub(crate) mod coverage;
pub mod export;
pub mod hit;
pub mod raster;

pub use export::{ExportFormat, ExportedImage, encode, export_stage};
pub use hit::{HIT_TOLERANCE, hit_test, nodes_in_rect};
pub use raster::render_region;
