use crate::errors::ProviderError;

/// One search hit from a stock photo provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockPhoto {
    pub id: String,
    pub image_url: String,
    pub width: u32,
    pub height: u32,
    pub photographer: Option<String>,
    pub alt_text: Option<String>,
    pub provider: &'static str,
}

impl StockPhoto {
    pub fn attribution(&self) -> String {
        match &self.photographer {
            Some(name) => format!("Photo by {} on {}", name, self.provider),
            None => format!("Photo from {}", self.provider),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait StockPhotoProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Results in the provider's own order.
    fn search(&self, query: &str) -> Result<Vec<StockPhoto>, ProviderError>;
}
