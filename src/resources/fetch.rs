use anyhow::Context as _;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// `http://` and `https://` locations go over the network, anything else is a path.
pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve a URI found inside an asset against the asset's own location.
pub fn resolve_relative(base: &str, uri: &str) -> anyhow::Result<String> {
    if is_remote(uri) || is_data_uri(uri) {
        return Ok(uri.to_string());
    }
    if is_remote(base) {
        let base = reqwest::Url::parse(base).with_context(|| format!("invalid URL {base}"))?;
        let joined = base
            .join(uri)
            .with_context(|| format!("cannot resolve {uri} against {base}"))?;
        return Ok(joined.to_string());
    }
    Ok(match base.rfind(['/', '\\']) {
        Some(idx) => format!("{}/{}", &base[..idx], uri),
        None => uri.to_string(),
    })
}

pub fn is_data_uri(location: &str) -> bool {
    location.starts_with("data:")
}

/// Payload of a `data:[<mime>];base64,<payload>` URI, as written by glTF
/// exporters that embed their buffers and images.
pub fn decode_data_uri(uri: &str) -> anyhow::Result<Vec<u8>> {
    let (header, payload) = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .context("malformed data URI")?;
    if !header.ends_with(";base64") {
        anyhow::bail!("only base64 data URIs are supported, got {header:?}");
    }
    BASE64
        .decode(payload.trim())
        .context("invalid base64 in data URI")
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no browser window")?;
    let href = window
        .location()
        .href()
        .map_err(|_| anyhow::anyhow!("cannot read the page location"))?;
    let base = reqwest::Url::parse(&href)?;
    Ok(base.join(file_name)?)
}

async fn fetch_remote(url: &str) -> anyhow::Result<Vec<u8>> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Fetch the raw bytes behind a location.
///
/// Native paths are read from disk relative to the working directory. On the
/// web a path is relative to the page.
pub async fn load_binary(location: &str) -> anyhow::Result<Vec<u8>> {
    if is_data_uri(location) {
        return decode_data_uri(location);
    }
    if is_remote(location) {
        return fetch_remote(location).await;
    }

    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(location)?;
        fetch_remote(url.as_str()).await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(location)
        .await
        .with_context(|| format!("cannot read {location}"))?;

    Ok(data)
}
