//! Provider data structure passed to resources and data sources

use crate::api::Client;

/// `Client` is reference-counted internally, so cloning is cheap
#[derive(Clone)]
pub struct InfradotsProviderData {
    pub client: Client,
}

impl InfradotsProviderData {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}
