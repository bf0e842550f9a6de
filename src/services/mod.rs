pub mod batch;
pub mod resolver;

pub use batch::BatchResolver;
pub use resolver::{WaterfallResolver, TELEMETRY_TARGET};
