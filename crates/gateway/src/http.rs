use crate::provider::{PlaceProvider, PostcodeProvider};
use crate::{GatewayConfig, ProviderError, Result};
use address_protocol::{PlacePredictionsResponse, PostcodeLookupResponse, SessionToken};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

fn build_client(config: &GatewayConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(ProviderError::Transport)
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|err| ProviderError::Config(format!("{raw}: {err}")))
}

async fn decode_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Postcode provider reached over HTTP: `GET {base}/{postcode}`.
pub struct HttpPostcodeProvider {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

impl HttpPostcodeProvider {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            base: parse_url(&config.postcode_url)?,
            api_key: config.api_key.clone(),
        })
    }

    fn url_for(&self, postcode: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ProviderError::Config(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .push(postcode);
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }
}

#[async_trait]
impl PostcodeProvider for HttpPostcodeProvider {
    async fn addresses(&self, postcode: &str) -> Result<PostcodeLookupResponse> {
        let url = self.url_for(postcode)?;
        debug!("postcode lookup GET {}", url.path());
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(PostcodeLookupResponse {
                postcode: postcode.to_string(),
                addresses: Vec::new(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.path().to_string(),
            });
        }
        decode_body(response).await
    }
}

/// Place-autocomplete provider reached over HTTP:
/// `GET {url}?input=..&sessiontoken=..`.
pub struct HttpPlaceProvider {
    client: Client,
    url: Url,
    api_key: Option<String>,
}

impl HttpPlaceProvider {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            url: parse_url(&config.place_url)?,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl PlaceProvider for HttpPlaceProvider {
    async fn predictions(
        &self,
        input: &str,
        session: &SessionToken,
    ) -> Result<PlacePredictionsResponse> {
        let mut url = self.url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("input", input)
                .append_pair("sessiontoken", session.as_str());
            if let Some(key) = &self.api_key {
                pairs.append_pair("key", key);
            }
        }
        debug!("place lookup GET {} (session {session})", url.path());
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.path().to_string(),
            });
        }
        let body: PlacePredictionsResponse = decode_body(response).await?;
        if let Some(message) = body.error.as_deref() {
            return Err(ProviderError::Application(message.to_string()));
        }
        Ok(body)
    }
}
