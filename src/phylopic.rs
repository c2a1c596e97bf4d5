use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::config::Settings;
use crate::domain::{ImageUuid, NormalizedName};
use crate::error::MarkerError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.phylopic.org";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://images.phylopic.org";

const INDEX_MEDIA_TYPE: &str = "application/vnd.phylopic.v2+json";
const SVG_MEDIA_TYPE: &str = "image/svg+xml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexItem {
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexLinks {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<IndexItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexPage {
    #[serde(rename = "_links", default, deserialize_with = "null_as_default")]
    pub links: IndexLinks,
    #[serde(default)]
    pub build: Option<i64>,
}

/// Treats an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl IndexPage {
    /// Build number to pin a follow-up query to, if the index reported one.
    pub fn pinned_build(&self) -> Option<i64> {
        self.build.filter(|build| *build > 0)
    }
}

pub trait PhylopicClient: Send + Sync {
    fn search_images(&self, name: &NormalizedName) -> Result<Vec<IndexItem>, MarkerError>;
    fn download_vector(&self, url: &str) -> Result<Vec<u8>, MarkerError>;
}

pub fn vector_url(uuid: &ImageUuid) -> String {
    vector_url_at(DEFAULT_IMAGE_BASE_URL, uuid)
}

pub fn vector_url_at(image_base_url: &str, uuid: &ImageUuid) -> String {
    format!(
        "{}/images/{}/vector.svg",
        image_base_url.trim_end_matches('/'),
        uuid.as_str()
    )
}

#[derive(Clone)]
pub struct PhylopicHttpClient {
    client: Client,
    api_base_url: String,
}

impl PhylopicHttpClient {
    pub fn new(settings: &Settings) -> Result<Self, MarkerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.user_agent)
                .map_err(|err| MarkerError::Http(err.to_string()))?,
        );
        let mut builder = Client::builder().default_headers(headers);
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|err| MarkerError::Http(err.to_string()))?;
        Ok(Self {
            client,
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn index_url(&self) -> String {
        format!("{}/images", self.api_base_url)
    }

    fn index_request(&self, name: &NormalizedName, build: Option<i64>) -> RequestBuilder {
        let mut params = vec![
            ("filter_name", name.as_str().to_string()),
            ("embed_items", "true".to_string()),
            ("embed_primaryImage", "true".to_string()),
            ("page", "0".to_string()),
        ];
        if let Some(build) = build {
            params.push(("build", build.to_string()));
        }
        self.client
            .get(self.index_url())
            .query(&params)
            .header(ACCEPT, INDEX_MEDIA_TYPE)
    }

    fn fetch_page(
        &self,
        name: &NormalizedName,
        build: Option<i64>,
    ) -> Result<IndexPage, MarkerError> {
        let request = self
            .index_request(name, build)
            .build()
            .map_err(MarkerError::from_transport)?;
        debug!(url = %request.url(), "calling PhyloPic index");
        let response = self
            .client
            .execute(request)
            .map_err(MarkerError::from_transport)?;
        let response = Self::handle_status(response)?;
        let body = response.text().map_err(MarkerError::from_transport)?;
        parse_index_page(&body)
    }

    fn handle_status(response: Response) -> Result<Response, MarkerError> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(MarkerError::Status {
            status: response.status().as_u16(),
            url: response.url().to_string(),
        })
    }
}

impl PhylopicClient for PhylopicHttpClient {
    fn search_images(&self, name: &NormalizedName) -> Result<Vec<IndexItem>, MarkerError> {
        let first = self.fetch_page(name, None)?;
        let Some(build) = first.pinned_build() else {
            return Ok(first.links.items);
        };
        debug!(build, "repeating index query pinned to build");
        let pinned = self.fetch_page(name, Some(build))?;
        Ok(pinned.links.items)
    }

    fn download_vector(&self, url: &str) -> Result<Vec<u8>, MarkerError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, SVG_MEDIA_TYPE)
            .send()
            .map_err(MarkerError::from_transport)?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(MarkerError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.bytes().map_err(MarkerError::from_transport)?;
        Ok(body.to_vec())
    }
}

pub fn parse_index_page(body: &str) -> Result<IndexPage, MarkerError> {
    serde_json::from_str(body).map_err(|err| MarkerError::Decode(err.to_string()))
}
