//! Typed HTTP access to the wishlist API, plus the router's fragment fetcher.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use super::{Fetch, FetchResponse, HostError};
use crate::api::APIResponse;
use crate::db::WriteResult;
use crate::wishlist::{Wish, Wishlist};

const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Status { status: u16, message: String },
    #[error("response carried no data")]
    MissingData,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is the server origin, e.g. `http://localhost:5000`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder().timeout(TIMEOUT).build()?;
        Ok(ApiClient {
            http_client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client.request(method, format!("{}{}", self.base_url, path))
    }

    /// Sends the request and unwraps the envelope. Non-2xx answers become
    /// [`ClientError::Status`] carrying the server's message.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<APIResponse<T>, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<APIResponse>(&body)
                .map(|envelope| envelope.message)
                .unwrap_or(body);
            tracing::debug!(status = status.as_u16(), message = %message, "api request failed");
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<APIResponse<T>>().await?)
    }

    async fn data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.send(request).await?.data.ok_or(ClientError::MissingData)
    }

    pub async fn ping(&self) -> Result<String, ClientError> {
        let envelope: APIResponse = self.send(self.request(Method::GET, "/ping")).await?;
        Ok(envelope.message)
    }

    pub async fn wishlists(&self) -> Result<Vec<Wishlist>, ClientError> {
        self.data(self.request(Method::GET, "/wishlists")).await
    }

    pub async fn wishlist(&self, wishlist_id: i64) -> Result<Wishlist, ClientError> {
        self.data(self.request(Method::GET, &format!("/wishlists/{}", wishlist_id)))
            .await
    }

    pub async fn create_wishlist(&self, name: &str, date: &str) -> Result<WriteResult, ClientError> {
        let body = json!({ "wishlist_name": name, "wishlist_date": date });
        self.data(self.request(Method::POST, "/wishlists").json(&body)).await
    }

    pub async fn update_wishlist(&self, wishlist_id: i64, name: &str, date: &str) -> Result<WriteResult, ClientError> {
        let body = json!({ "wishlist_name": name, "wishlist_date": date });
        self.data(
            self.request(Method::PUT, &format!("/wishlists/{}", wishlist_id))
                .json(&body),
        )
        .await
    }

    pub async fn delete_wishlist(&self, wishlist_id: i64) -> Result<WriteResult, ClientError> {
        self.data(self.request(Method::DELETE, &format!("/wishlists/{}", wishlist_id)))
            .await
    }

    pub async fn wishes(&self, wishlist_id: i64) -> Result<Vec<Wish>, ClientError> {
        self.data(self.request(Method::GET, &format!("/wishlists/{}/wishes", wishlist_id)))
            .await
    }

    pub async fn wish(&self, wishlist_id: i64, wish_id: i64) -> Result<Wish, ClientError> {
        let path = format!("/wishlists/{}/wishes/{}", wishlist_id, wish_id);
        self.data(self.request(Method::GET, &path)).await
    }

    pub async fn create_wish(&self, wishlist_id: i64, name: &str, price: f64, link: &str) -> Result<WriteResult, ClientError> {
        let body = json!({ "wish_name": name, "wish_price": price, "wish_link": link });
        let path = format!("/wishlists/{}/wishes", wishlist_id);
        self.data(self.request(Method::POST, &path).json(&body)).await
    }

    pub async fn update_wish(
        &self,
        wishlist_id: i64,
        wish_id: i64,
        name: &str,
        price: f64,
        link: &str,
    ) -> Result<WriteResult, ClientError> {
        let body = json!({ "wish_name": name, "wish_price": price, "wish_link": link });
        let path = format!("/wishlists/{}/wishes/{}", wishlist_id, wish_id);
        self.data(self.request(Method::PUT, &path).json(&body)).await
    }

    pub async fn delete_wish(&self, wishlist_id: i64, wish_id: i64) -> Result<WriteResult, ClientError> {
        let path = format!("/wishlists/{}/wishes/{}", wishlist_id, wish_id);
        self.data(self.request(Method::DELETE, &path)).await
    }
}

/// Resolves router fragment and dictionary paths against a site origin.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http_client: reqwest::Client,
    origin: String,
}

impl HttpFetcher {
    pub fn new(origin: &str) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder().timeout(TIMEOUT).build()?;
        Ok(HttpFetcher {
            http_client,
            origin: origin.trim_end_matches('/').to_owned(),
        })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, HostError> {
        let full = format!("{}{}", self.origin, url);
        let network = |e: reqwest::Error| HostError::Network {
            url: full.clone(),
            reason: e.to_string(),
        };

        let response = self.http_client.get(&full).send().await.map_err(network)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(network)?;
        Ok(FetchResponse { status, body })
    }
}
