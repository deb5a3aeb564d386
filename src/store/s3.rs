//! Object store speaking the S3 REST protocol over plain HTTP(S).
//!
//! Requests are unsigned, so the bucket must allow anonymous reads or sit
//! behind a signing proxy. Listings use `ListObjectsV2` and follow
//! continuation tokens until the listing is complete.

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::{ObjectStore, StoreError};
use crate::http::{HttpTimeouts, build_http_client};

/// One page of a `ListObjectsV2` response.
#[derive(Debug, Default, PartialEq, Eq)]
struct ListPage {
    keys: Vec<String>,
    is_truncated: bool,
    next_continuation_token: Option<String>,
}

/// Bucket addressed by a base URL.
///
/// Both virtual-hosted (`https://bucket.s3.amazonaws.com`) and path-style
/// (`http://localhost:9000/bucket`) endpoints work.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: Client,
    endpoint: Url,
}

impl HttpObjectStore {
    /// Creates a store for `endpoint` using `client`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidEndpoint`] unless the endpoint is an
    /// `http`/`https` URL that can carry object paths.
    pub fn new(client: Client, endpoint: &str) -> Result<Self, StoreError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|error| StoreError::invalid_endpoint(endpoint, error.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.cannot_be_a_base() {
            return Err(StoreError::invalid_endpoint(
                endpoint.as_str(),
                "expected an http(s) base URL",
            ));
        }
        Ok(Self { client, endpoint })
    }

    /// Creates a store with a client built from `timeouts`.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new); a client build failure is reported as an
    /// invalid endpoint.
    pub fn with_timeouts(endpoint: &str, timeouts: HttpTimeouts) -> Result<Self, StoreError> {
        let client = build_http_client(timeouts)
            .map_err(|error| StoreError::invalid_endpoint(endpoint, error.to_string()))?;
        Self::new(client, endpoint)
    }

    /// Default AWS endpoint for a bucket name.
    #[must_use]
    pub fn default_endpoint(bucket: &str) -> String {
        format!("https://{bucket}.s3.amazonaws.com")
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn object_url(&self, key: &str) -> Result<Url, StoreError> {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|()| StoreError::invalid_endpoint(self.endpoint.as_str(), "not a base URL"))?
            .pop_if_empty()
            .extend(key.split('/'));
        Ok(url)
    }

    fn listing_url(&self, prefix: &str, continuation_token: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("list-type", "2")
                .append_pair("prefix", prefix)
                .append_pair("encoding-type", "url");
            if let Some(token) = continuation_token {
                query.append_pair("continuation-token", token);
            }
        }
        url
    }

    #[instrument(level = "debug", skip(self))]
    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListPage, StoreError> {
        let url = self.listing_url(prefix, continuation_token);
        let body = self.fetch(&url).await?;
        let text = String::from_utf8(body)
            .map_err(|error| StoreError::invalid_listing(url.as_str(), error.to_string()))?;
        parse_list_page(&text).map_err(|reason| StoreError::invalid_listing(url.as_str(), reason))
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, StoreError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| StoreError::network(url.as_str(), source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| StoreError::network(url.as_str(), source))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.list_page(prefix, continuation_token.as_deref()).await?;
            pages += 1;
            keys.extend(page.keys);

            if !page.is_truncated {
                break;
            }
            match page.next_continuation_token {
                Some(next) if continuation_token.as_deref() != Some(next.as_str()) => {
                    continuation_token = Some(next);
                }
                Some(_) => {
                    return Err(StoreError::invalid_listing(
                        self.endpoint.as_str(),
                        "continuation token did not advance",
                    ));
                }
                None => {
                    return Err(StoreError::invalid_listing(
                        self.endpoint.as_str(),
                        "truncated listing without NextContinuationToken",
                    ));
                }
            }
        }

        debug!(endpoint = %self.endpoint, prefix, pages, count = keys.len(), "Listed objects");
        Ok(keys)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let url = self.object_url(key)?;
        self.fetch(&url).await
    }

    fn location(&self) -> String {
        self.endpoint.to_string()
    }
}

/// Parses a `ListBucketResult` document.
fn parse_list_page(xml: &str) -> Result<ListPage, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut page = ListPage::default();
    let mut url_encoded = false;
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                stack.push(String::from_utf8_lossy(element.local_name().as_ref()).into_owned());
                text.clear();
            }
            Ok(Event::Text(content)) => text.push_str(&String::from_utf8_lossy(&content)),
            Ok(Event::GeneralRef(reference)) => {
                let name = String::from_utf8_lossy(&reference).into_owned();
                let resolved =
                    resolve_entity(&name).ok_or_else(|| format!("unknown entity &{name};"))?;
                text.push(resolved);
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().unwrap_or_default();
                let parent = stack.last().map(String::as_str);
                let value = std::mem::take(&mut text);
                match (parent, element.as_str()) {
                    (Some("Contents"), "Key") => page.keys.push(value),
                    (Some("ListBucketResult"), "IsTruncated") => {
                        page.is_truncated = value.eq_ignore_ascii_case("true");
                    }
                    (Some("ListBucketResult"), "NextContinuationToken") => {
                        page.next_continuation_token = Some(value);
                    }
                    (Some("ListBucketResult"), "EncodingType") => {
                        url_encoded = value.eq_ignore_ascii_case("url");
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                return Err(format!(
                    "malformed XML at position {}: {error}",
                    reader.buffer_position()
                ));
            }
        }
    }

    if url_encoded {
        page.keys = page
            .keys
            .iter()
            .map(|key| decode_key(key))
            .collect::<Result<_, _>>()?;
    }
    Ok(page)
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Decodes a key listed with `encoding-type=url`.
fn decode_key(key: &str) -> Result<String, String> {
    urlencoding::decode(&key.replace('+', " "))
        .map(std::borrow::Cow::into_owned)
        .map_err(|error| format!("key '{key}' is not valid URL encoding: {error}"))
}
