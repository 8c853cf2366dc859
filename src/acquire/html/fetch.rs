use std::collections::HashMap;
use std::time::Duration;

use rand::rngs::StdRng;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, USER_AGENT};

use crate::acquire::pacing::random_user_agent;
use crate::error::AcquireError;

/// Plain GET dressed as a desktop browser. Descriptor headers are applied
/// last so a source can override any of ours.
pub async fn fetch_page(
    client: &Client,
    url: &str,
    headers: &HashMap<String, String>,
    timeout: Duration,
    rng: &mut StdRng,
) -> Result<String, AcquireError> {
    let mut map = HeaderMap::new();
    map.insert(USER_AGENT, HeaderValue::from_static(random_user_agent(rng)));
    map.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"));
    map.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    map.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    map.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
    merge_headers(&mut map, headers);

    let resp = client.get(url).timeout(timeout).headers(map).send().await.map_err(AcquireError::from_reqwest)?;
    let resp = resp.error_for_status().map_err(AcquireError::from_reqwest)?;
    resp.text().await.map_err(AcquireError::from_reqwest)
}

/// Insert caller headers over `map`, skipping names or values HTTP rejects.
pub fn merge_headers(map: &mut HeaderMap, headers: &HashMap<String, String>) {
    for (k, v) in headers {
        match (HeaderName::from_bytes(k.as_bytes()), HeaderValue::from_str(v)) {
            (Ok(name), Ok(value)) => { map.insert(name, value); }
            _ => tracing::debug!(header = %k, "skipping invalid header"),
        }
    }
}
