pub mod fetcher;
pub mod host_policy;
pub mod reqwest_transport;
pub mod traits;

pub use fetcher::{get_checked, parse_http_url, FetchedImage, ImageFetcher};
pub use host_policy::{HeaderProfile, HostMatch, HostPolicy, HostPolicyDocument, HostPolicyRegistry};
pub use reqwest_transport::ReqwestTransport;
pub use traits::{HttpRequest, HttpResponse, HttpTransport};
