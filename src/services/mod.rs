//! File, image and timing services used by the pipeline stages

pub mod crop;
pub mod deadline;
pub mod io;

pub use crop::RegionExtractor;
pub use deadline::{cancellable, with_deadline};
pub use io::ImageIOService;
