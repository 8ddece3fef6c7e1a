//! Request URL construction.

use pipedrop_protocol::FILE_NAME_PARAM;
use url::Url;

use crate::error::UploadError;

/// Builds the final upload URL: `destination` with `fileName` set to
/// `file_name`.
///
/// Any existing `fileName` pairs are replaced; other query pairs keep
/// their order. Only absolute `http`/`https` URLs are accepted.
pub fn build_upload_url(destination: &str, file_name: &str) -> Result<Url, UploadError> {
    let invalid = |reason: String| UploadError::InvalidDestination {
        url: destination.to_string(),
        reason,
    };

    let mut url = Url::parse(destination.trim()).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".into()));
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != FILE_NAME_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(FILE_NAME_PARAM, file_name);

    Ok(url)
}
