pub mod pexels;
pub mod quota;
pub mod traits;
pub mod unsplash;

pub use pexels::PexelsProvider;
pub use quota::QuotaLimitedProvider;
pub use traits::{StockPhoto, StockPhotoProvider};
pub use unsplash::UnsplashProvider;
