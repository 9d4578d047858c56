use crate::error::{Error, Result};
use crate::settings::Settings;
use crate::structs::{Id, RawAnnouncement, RawAssignment, RawCourse};

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub type Query = [(String, String)];

const MAX_ERROR_BODY: usize = 512;

/// One response from Canvas: the final URL, the raw body and its `Link` header.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub body: String,
    pub link: Option<String>,
}

/// Issues a single authenticated GET. Non-success statuses come back as
/// `Error::Http`.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, url: &str, query: &Query) -> Result<Page>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.access_token))
            .map_err(|_| Error::Config("access token is not a valid header value".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .gzip(true)
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &Query) -> Result<Page> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;

        let status = response.status();
        let url = response.url().to_string();
        let link = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Http {
                url,
                status: status.as_u16(),
                body: truncate(body, MAX_ERROR_BODY),
            });
        }
        Ok(Page { url, body, link })
    }
}

fn truncate(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut cut = max;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}

/// Finds the `rel="next"` target in a `Link` header such as
/// `<https://x/api/v1/courses?page=2>; rel="next", <https://x/api/v1/courses?page=9>; rel="last"`.
pub fn next_link(header: &str) -> Option<&str> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        let is_next = parts.any(|param| {
            let Some((key, value)) = param.split_once('=') else {
                return false;
            };
            key.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });
        is_next.then_some(url)
    })
}

fn resolve(base: &str, link: &str) -> Result<String> {
    let joined = match Url::parse(base) {
        Ok(base) => base.join(link),
        Err(_) => Url::parse(link),
    };
    joined.map(String::from).map_err(|err| Error::Link {
        link: link.to_owned(),
        reason: err.to_string(),
    })
}

fn decode<T: DeserializeOwned>(page: &Page) -> Result<T> {
    serde_json::from_str(&page.body).map_err(|source| Error::Decode {
        url: page.url.clone(),
        source,
    })
}

/// Follows `Link: rel="next"` until exhausted and concatenates every page in
/// server order. `query` goes out with the first request only; later requests
/// use the server's link verbatim.
pub async fn fetch_all<T, C>(transport: &C, url: &str, query: &Query) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    C: Transport,
{
    let mut items = Vec::new();
    let mut query = query;
    let mut next = Some(url.to_owned());

    while let Some(target) = next.take() {
        let page = transport.get(&target, query).await?;
        query = &[];

        let batch: Vec<T> = decode(&page)?;
        debug!("fetched {} items from {}", batch.len(), page.url);
        items.extend(batch);

        if let Some(link) = page.link.as_deref().and_then(next_link) {
            next = Some(resolve(&page.url, link)?);
        }
    }

    Ok(items)
}

/// The three Canvas endpoints the report needs.
pub struct CanvasApi<C> {
    transport: C,
    base_url: String,
    per_page: u32,
}

impl<C: Transport> CanvasApi<C> {
    pub fn new(transport: C, base_url: impl Into<String>, per_page: u32) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            per_page,
        }
    }

    pub async fn favorite_courses(&self) -> Result<Vec<RawCourse>> {
        let url = format!("{}/api/v1/users/self/favorites/courses", self.base_url);
        let page = self.transport.get(&url, &[]).await?;
        decode(&page)
    }

    pub async fn assignments(&self, course_id: Id) -> Result<Vec<RawAssignment>> {
        let url = format!("{}/api/v1/courses/{course_id}/assignments", self.base_url);
        let query = [
            ("include[]".to_owned(), "submission".to_owned()),
            ("per_page".to_owned(), self.per_page.to_string()),
        ];
        fetch_all(&self.transport, &url, &query).await
    }

    /// One batched request for every course; no request at all when there
    /// are no courses.
    pub async fn announcements(&self, course_ids: &[Id]) -> Result<Vec<RawAnnouncement>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/api/v1/announcements", self.base_url);
        let mut query: Vec<(String, String)> = course_ids
            .iter()
            .map(|id| ("context_codes[]".to_owned(), format!("course_{id}")))
            .collect();
        query.push(("per_page".to_owned(), self.per_page.to_string()));
        fetch_all(&self.transport, &url, &query).await
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned pages keyed by exact URL and records every request.
    #[derive(Default)]
    pub struct ScriptedTransport {
        pages: HashMap<String, (u16, String, Option<String>)>,
        pub requests: RefCell<Vec<(String, Vec<(String, String)>)>>,
    }

    impl ScriptedTransport {
        pub fn page(mut self, url: &str, body: serde_json::Value, next: Option<&str>) -> Self {
            let link = next.map(|next| {
                format!("<{next}>; rel=\"next\", <{url}>; rel=\"current\", <{url}>; rel=\"first\"")
            });
            self.pages
                .insert(url.to_owned(), (200, body.to_string(), link));
            self
        }

        pub fn failure(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(
                url.to_owned(),
                (status, "{\"errors\":[{\"message\":\"nope\"}]}".to_owned(), None),
            );
            self
        }
    }

    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str, query: &Query) -> Result<Page> {
            self.requests
                .borrow_mut()
                .push((url.to_owned(), query.to_vec()));
            match self.pages.get(url) {
                Some((200, body, link)) => Ok(Page {
                    url: url.to_owned(),
                    body: body.clone(),
                    link: link.clone(),
                }),
                Some((status, body, _)) => Err(Error::Http {
                    url: url.to_owned(),
                    status: *status,
                    body: body.clone(),
                }),
                None => Err(Error::Http {
                    url: url.to_owned(),
                    status: 404,
                    body: String::new(),
                }),
            }
        }
    }
}
