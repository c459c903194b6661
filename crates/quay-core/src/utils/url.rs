//! Registry URL helpers.

use url::Url;

use crate::error::{QuayError, QuayResult};

/// Parse a registry URL and make sure its path ends with `/`.
///
/// Relative file names are joined onto the result, so without the trailing
/// slash `https://host/repo` would resolve `packages.json` to
/// `https://host/packages.json`.
pub fn normalize_registry_url(raw: &str) -> QuayResult<Url> {
    let mut url = Url::parse(raw.trim()).map_err(|e| QuayError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(QuayError::InvalidUrl {
            url: raw.to_string(),
            reason: "registry URL cannot be used as a base".to_string(),
        });
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Host portion of a URL string, if it parses
pub fn url_host(raw: &str) -> Option<String> {
    Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
}
