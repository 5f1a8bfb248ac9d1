use std::process;

use futures_util::StreamExt;
use reqwest::Url;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        handshake::client::Request,
        http::{header::AUTHORIZATION, HeaderValue},
        Message,
    },
};

use crate::error::ApiError;

/// Exits with status 0 on interrupt. Streams have nothing to flush.
pub fn exit_on_interrupt() -> eyre::Result<()> {
    ctrlc::set_handler(|| process::exit(0))?;
    Ok(())
}

/// `base` + `path` with `query` appended and escaped.
pub fn endpoint(base: &str, path: &str, query: &[(&str, &str)]) -> Result<String, ApiError> {
    Url::parse_with_params(&format!("{base}{path}"), query)
        .map(String::from)
        .map_err(|e| ApiError::Request(format!("invalid stream url: {e}")))
}

fn authorized_request(url: &str, api_key: &str) -> Result<Request, ApiError> {
    let mut request = url.into_client_request()?;
    let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|e| ApiError::Request(e.to_string()))?;
    request.headers_mut().insert(AUTHORIZATION, bearer);
    Ok(request)
}

/// Reads messages from `url` until the server closes the socket, handing
/// every text payload to `on_message`.
pub async fn listen<F>(url: &str, api_key: &str, mut on_message: F) -> Result<(), ApiError>
where
    F: FnMut(&str),
{
    let request = authorized_request(url, api_key)?;
    let (mut socket, _) = connect_async(request).await?;
    tracing::info!("connected to {url}");

    while let Some(message) = socket.next().await {
        match message? {
            Message::Text(text) => on_message(&text),
            Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => on_message(text),
                Err(_) => tracing::warn!("skipping binary message of {} bytes", bytes.len()),
            },
            Message::Close(frame) => {
                tracing::info!("stream closed by server: {frame:?}");
                break;
            }
            _ => {}
        }
    }

    Ok(())
}
