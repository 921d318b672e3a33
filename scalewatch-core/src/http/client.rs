use bytes::Bytes;
use http_body_util::{BodyExt as _, Empty};
use hyper::Request;
use hyper::body::Incoming;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

use super::{Error, HttpResponse, Result, host_header_value};

#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client<HttpConnector, Empty<Bytes>>,
}

impl Default for HttpClient {
    fn default() -> Self {
        let mut connector = HttpConnector::new();
        connector.enforce_http(false);

        let inner = Client::builder(TokioExecutor::new()).build(connector);

        Self { inner }
    }
}

impl HttpClient {
    /// GET `url`; `timeout` covers the whole exchange, body included.
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        let parsed = url::Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
        if parsed.scheme() != "http" {
            return Err(Error::OnlyHttpSupported(url.to_string()));
        }

        let uri: hyper::Uri = url
            .parse()
            .map_err(|_| Error::InvalidUrl(url.to_string()))?;

        let mut builder = Request::get(uri);
        if let Some(host) = host_header_value(&parsed) {
            builder = builder.header(http::header::HOST, host);
        }

        let req: Request<Empty<Bytes>> = builder.body(Empty::new())?;

        let exchange = async {
            let res: hyper::Response<Incoming> = self.inner.request(req).await?;
            let (parts, body) = res.into_parts();
            let body = body.collect().await?.to_bytes();
            Ok::<_, Error>(HttpResponse {
                status: parts.status.as_u16(),
                body,
            })
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout(timeout)),
        }
    }
}
