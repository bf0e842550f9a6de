pub mod default_image;
pub mod media_tag;
pub mod open_graph;
pub mod stock_photo;
pub mod traits;

pub use default_image::DefaultImageStage;
pub use media_tag::MediaTagStage;
pub use open_graph::{extract_og_image, OpenGraphStage};
pub use stock_photo::{StockPhotoStage, DEFAULT_FALLBACK_QUERY};
pub use traits::{ImageStage, StageToolkit};
