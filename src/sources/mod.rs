pub mod rss_atom;

pub use rss_atom::RssFeedSource;
