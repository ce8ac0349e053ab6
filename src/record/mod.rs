mod engine;
mod model;

pub use engine::RecordEngine;
pub use model::{Record, RecordLog};
