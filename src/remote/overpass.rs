//! Overpass API client for administrative relations around a point.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

#[derive(Debug, Error)]
pub enum OverpassError {
    #[error("Overpass request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Overpass returned status {status}")]
    Status { status: u16, body: String },

    #[error("failed to decode Overpass response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

/// A node, way or relation as returned with `out geom`.
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub element_type: String,
    pub id: i64,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    /// Present when the geometry is inlined on the element itself.
    #[serde(default)]
    pub geometry: Option<Vec<GeomPoint>>,
    #[serde(default)]
    pub members: Vec<OverpassMember>,
}

impl OverpassElement {
    pub fn is_relation(&self) -> bool {
        self.element_type == "relation"
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_ref()?.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverpassMember {
    #[serde(rename = "type")]
    pub member_type: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub geometry: Option<Vec<GeomPoint>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeomPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Query for every administrative relation whose area contains the point.
pub fn is_in_query(lat: f64, lon: f64) -> String {
    format!(
        r#"
      [out:json][timeout:25];
      is_in({},{})->.a;
      relation(area.a)["boundary"="administrative"];
      out body tags center;
      out geom;"#,
        lat, lon
    )
}

/// Thin client for one Overpass interpreter endpoint.
#[derive(Clone)]
pub struct OverpassClient {
    client: Client,
    url: Url,
}

impl OverpassClient {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, OverpassError> {
        let client = Client::builder()
            .user_agent(concat!("admin-overlap/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Administrative relations containing (lat, lon), with tags and geometry inline.
    ///
    /// A non-success status is returned as [`OverpassError::Status`] with the body attached.
    pub async fn relations_containing(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Vec<OverpassElement>, OverpassError> {
        let query = is_in_query(lat, lon);
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("data", &query)
            .finish();

        let response = self
            .client
            .post(self.url.clone())
            .header(
                CONTENT_TYPE,
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Overpass query failed with status {}", status);
            return Err(OverpassError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let data: OverpassResponse = serde_json::from_str(&text)?;

        debug!(
            "Overpass returned {} elements around ({}, {})",
            data.elements.len(),
            lat,
            lon
        );

        Ok(data.elements)
    }
}
