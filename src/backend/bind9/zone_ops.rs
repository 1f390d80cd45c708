// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone operations against the bindcar HTTP API.

use anyhow::Context;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

use super::types::{CreateZoneRequest, ZoneResponse};
use crate::backend::retry::{with_retry, RetryPolicy};
use crate::errors::BackendError;

type Result<T> = std::result::Result<T, BackendError>;

/// Build the API base URL from a server address.
///
/// `"bindcar:8080"` becomes `"http://bindcar:8080"`; an explicit scheme is kept.
pub(crate) fn build_api_url(server: &str) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        server.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", server.trim_end_matches('/'))
    }
}

/// Client for one bindcar endpoint.
#[derive(Clone, Debug)]
pub struct BindcarClient {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl BindcarClient {
    #[must_use]
    pub fn new(http: HttpClient, server: &str, token: Option<String>, max_retry: Duration) -> Self {
        Self {
            http,
            base_url: build_api_url(server),
            token,
            retry: RetryPolicy::http(max_retry),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a request, retrying transient failures within the retry budget.
    async fn request<T: Serialize + std::fmt::Debug>(
        &self,
        method: &str,
        path: &str,
        body: Option<&T>,
    ) -> Result<String> {
        let url = format!("{}{path}", self.base_url);
        let operation = format!("{method} {path}");
        with_retry(&self.retry, &operation, || self.request_once(method, &url, body)).await
    }

    async fn request_once<T: Serialize + std::fmt::Debug>(
        &self,
        method: &str,
        url: &str,
        body: Option<&T>,
    ) -> Result<String> {
        info!(
            method = %method,
            url = %url,
            body = ?body,
            auth_enabled = self.token.is_some(),
            "HTTP API request to bindcar"
        );

        let mut request = match method {
            "GET" => self.http.get(url),
            "POST" => self.http.post(url),
            "DELETE" => self.http.delete(url),
            _ => {
                return Err(BackendError::Driver(anyhow::anyhow!(
                    "Unsupported HTTP method: {method}"
                )))
            }
        };
        if let Some(body_data) = body {
            request = request.json(body_data);
        }
        if let Some(token_value) = &self.token {
            request = request.header("Authorization", format!("Bearer {token_value}"));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send HTTP request to {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                method = %method,
                url = %url,
                status = %status,
                error = %message,
                "HTTP API request failed"
            );
            return Err(BackendError::Http {
                endpoint: self.base_url.clone(),
                status: status.as_u16(),
                message,
            });
        }

        let text = response
            .text()
            .await
            .context("Failed to read response body")?;

        debug!(
            method = %method,
            url = %url,
            status = %status,
            response_len = text.len(),
            "HTTP API request successful"
        );

        Ok(text)
    }

    /// Create a zone. An existing zone counts as success.
    ///
    /// Returns `Ok(true)` if the zone was added, `Ok(false)` if it already existed.
    ///
    /// # Errors
    ///
    /// Returns an error if bindcar rejects the zone.
    pub async fn create_zone(&self, request: &CreateZoneRequest) -> Result<bool> {
        let zone_name = &request.zone_name;
        match self.request("POST", "/api/v1/zones", Some(request)).await {
            Ok(text) => {
                let response: ZoneResponse = serde_json::from_str(&text).unwrap_or_default();
                if response.success || response.message.is_empty() {
                    info!(zone = %zone_name, endpoint = %self.base_url, "Created zone");
                    return Ok(true);
                }
                if is_already_exists(&response.message) {
                    info!(zone = %zone_name, "Zone already exists, treating as success");
                    return Ok(false);
                }
                error!(
                    zone = %zone_name,
                    message = %response.message,
                    details = ?response.details,
                    "API returned error when creating zone"
                );
                Err(BackendError::Http {
                    endpoint: self.base_url.clone(),
                    status: StatusCode::OK.as_u16(),
                    message: response.message,
                })
            }
            Err(BackendError::Http {
                status, message, ..
            }) if status == StatusCode::CONFLICT.as_u16() || is_already_exists(&message) => {
                info!(zone = %zone_name, "Zone already exists, treating as success");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a zone. A missing zone counts as success.
    ///
    /// Returns `Ok(true)` if the zone was deleted, `Ok(false)` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if bindcar fails to delete the zone.
    pub async fn delete_zone(&self, zone_name: &str) -> Result<bool> {
        let path = format!("/api/v1/zones/{zone_name}");
        match self.request("DELETE", &path, None::<&()>).await {
            Ok(_) => {
                info!(zone = %zone_name, endpoint = %self.base_url, "Deleted zone");
                Ok(true)
            }
            Err(BackendError::Http {
                status, message, ..
            }) if status == StatusCode::NOT_FOUND.as_u16()
                || message.to_lowercase().contains("not found") =>
            {
                debug!(zone = %zone_name, "Zone already deleted");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Reload a zone from its zone file.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn reload_zone(&self, zone_name: &str) -> Result<()> {
        let path = format!("/api/v1/zones/{zone_name}/reload");
        self.request("POST", &path, None::<&()>).await?;
        info!(zone = %zone_name, "Reloaded zone");
        Ok(())
    }

    /// Get server status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn server_status(&self) -> Result<String> {
        self.request("GET", "/api/v1/server/status", None::<&()>)
            .await
    }
}

fn is_already_exists(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("already exists")
        || lower.contains("already serves")
        || lower.contains("duplicate zone")
}

#[cfg(test)]
#[path = "zone_ops_tests.rs"]
mod zone_ops_tests;
