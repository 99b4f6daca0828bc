// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue, PRAGMA};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tablesync_app::{FormPayload, Resource, ResourceError, Row, RowId};
use time::OffsetDateTime;
use tracing::debug;
use url::Url;

/// Anti-forgery token attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub header: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub csrf: Option<CsrfToken>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            csrf: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceClient {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl ResourceClient {
    pub fn new(resource_url: &str, options: &ClientOptions) -> Result<Self> {
        let base_url = validate_resource_url(resource_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        if let Some(csrf) = &options.csrf {
            let name = HeaderName::from_bytes(csrf.header.as_bytes())
                .with_context(|| format!("invalid CSRF header name {:?}", csrf.header))?;
            let value = HeaderValue::from_str(&csrf.token)
                .context("CSRF token contains characters not allowed in a header")?;
            headers.insert(name, value);
        }

        let http = HttpClient::builder()
            .timeout(options.timeout)
            .default_headers(headers)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout: options.timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn item_url(&self, id: RowId) -> String {
        format!("{}/{id}", self.base_url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ResourceError> {
        let response = self.send(self.http.get(url).query(&[("_", cache_buster())]), url)?;
        let body = response
            .text()
            .map_err(|error| ResourceError::Decode(format!("read response body: {error}")))?;
        serde_json::from_str(&body).map_err(|error| ResourceError::Decode(error.to_string()))
    }

    fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, ResourceError> {
        let response = request
            .send()
            .map_err(|error| connection_error(url, error))?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), "response received");
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ResourceError::from_response(status.as_u16(), &body));
        }
        Ok(response)
    }
}

impl Resource for ResourceClient {
    fn list(&mut self) -> Result<Vec<Row>, ResourceError> {
        self.get_json(&self.base_url)
    }

    fn get(&mut self, id: RowId) -> Result<Row, ResourceError> {
        self.get_json(&self.item_url(id))
    }

    fn save(&mut self, payload: &FormPayload) -> Result<(), ResourceError> {
        self.send(
            self.http.post(&self.base_url).form(&payload.pairs()),
            &self.base_url,
        )?;
        Ok(())
    }

    fn delete(&mut self, id: RowId) -> Result<(), ResourceError> {
        let url = self.item_url(id);
        self.send(self.http.delete(&url), &url)?;
        Ok(())
    }
}

pub fn validate_resource_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("resource url must not be empty");
    }
    let parsed =
        Url::parse(trimmed).with_context(|| format!("resource url {trimmed:?} is not a URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "resource url {trimmed:?} uses scheme {:?}; use http or https",
            parsed.scheme()
        );
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        bail!("resource url {trimmed:?} must not carry a query or fragment");
    }
    Ok(trimmed.to_owned())
}

fn cache_buster() -> String {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).to_string()
}

fn connection_error(url: &str, error: reqwest::Error) -> ResourceError {
    if error.is_timeout() {
        return ResourceError::Transport(format!("{url} -- request timed out"));
    }
    ResourceError::Transport(format!(
        "{url} -- check that the server is running and [resource].url is correct ({error})"
    ))
}

#[cfg(test)]
mod tests {
    use super::{ClientOptions, CsrfToken, ResourceClient, cache_buster, validate_resource_url};

    #[test]
    fn resource_url_trims_trailing_slashes() {
        assert_eq!(
            validate_resource_url("http://localhost:8080/rest/meals///").expect("valid url"),
            "http://localhost:8080/rest/meals"
        );
    }

    #[test]
    fn resource_url_rejects_other_schemes_and_queries() {
        assert!(validate_resource_url("").is_err());
        assert!(validate_resource_url("/api/meals").is_err());
        assert!(validate_resource_url("ftp://host/meals").is_err());
        assert!(validate_resource_url("http://host/meals?page=2").is_err());
    }

    #[test]
    fn invalid_csrf_header_is_rejected() {
        let options = ClientOptions {
            csrf: Some(CsrfToken {
                header: "bad header".to_owned(),
                token: "t".to_owned(),
            }),
            ..ClientOptions::default()
        };
        let error = ResourceClient::new("http://localhost/meals", &options)
            .expect_err("space in header name should fail");
        assert!(error.to_string().contains("invalid CSRF header name"));
    }

    #[test]
    fn cache_buster_is_numeric() {
        assert!(cache_buster().chars().all(|c| c.is_ascii_digit()));
    }
}
