//! Registry root document fetching

use tracing::{debug, error, warn};
use url::Url;

use crate::api::RootDocument;
use crate::http::{FailureClass, TransportCode};
use crate::view::RegistryView;

use super::{join_url, RegistryFetcher};

/// File name of the root document
pub const ROOT_DOCUMENT: &str = "packages.json";

impl RegistryFetcher {
    /// Fetch `packages.json` and project it into a partial view.
    ///
    /// Every failure is soft: it is logged and `None` is returned so the
    /// caller can move on to the next registry.
    pub async fn fetch_root(&self, registry: &Url) -> Option<RegistryView> {
        let url = match join_url(registry, ROOT_DOCUMENT) {
            Ok(url) => url,
            Err(e) => {
                warn!(registry = %registry, error = %e, "Invalid registry URL");
                return None;
            },
        };
        let options = self.request_options(registry.as_str());

        match self.http.get_json::<RootDocument>(url.as_str(), &options).await {
            Ok(response) => {
                debug!(registry = %registry, "Fetched registry root");
                Some(RegistryView::from_root(response.body))
            },
            Err(err) => {
                match err.classify() {
                    FailureClass::Transport if err.code == TransportCode::Timeout => {
                        warn!(registry = %registry, "Registry unavailable (timeout)");
                    },
                    FailureClass::Unauthorized => {
                        warn!(registry = %registry, status = ?err.status, "Registry is not usable (access denied)");
                    },
                    FailureClass::NotFound if err.status == Some(404) => {
                        warn!(registry = %registry, "Registry not found");
                    },
                    _ => {
                        error!(registry = %registry, error = %err, "Unexpected error fetching registry root");
                    },
                }
                None
            },
        }
    }
}
