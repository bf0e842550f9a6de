pub mod blocklist;
pub mod title_cleaner;
pub mod validator;

pub use blocklist::UrlBlocklist;
pub use title_cleaner::{BoilerplateRule, TitleCleaner, DEFAULT_BOILERPLATE};
pub use validator::{Dimensions, ImageValidator};
