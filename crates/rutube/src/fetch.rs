use bytes::Bytes;
use reqwest::{Client, Response, Url};

use crate::error::{RutubeError, RutubeResult};

async fn get(client: &Client, url: Url) -> RutubeResult<Response> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        if let Ok(body) = response.text().await {
            tracing::debug!("Error body: {body}");
        }
        return Err(RutubeError::HttpError(status));
    }
    Ok(response)
}

pub(crate) async fn fetch_bytes(client: &Client, url: Url) -> RutubeResult<Bytes> {
    Ok(get(client, url).await?.bytes().await?)
}

pub(crate) async fn fetch_text(client: &Client, url: Url) -> RutubeResult<String> {
    Ok(get(client, url).await?.text().await?)
}
