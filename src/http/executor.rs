use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Request, Response, Url};
use tokio::time::Instant;

use crate::error::HttpError;
use crate::metrics::{MetricTitles, MetricsRecorder};

use super::outcome::Outcome;

/// How a response body is consumed after classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyMode {
    /// Read the whole body into memory and hand it back.
    Capture,
    /// Stream the body to completion without buffering it.
    #[default]
    Discard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Captured(Bytes),
    /// Number of body bytes drained.
    Drained(u64),
}

/// Notifies the latency histogram when dropped, whichever way the attempt
/// ends.
struct LatencyGuard<'rec> {
    recorder: &'rec dyn MetricsRecorder,
    title: &'static str,
    begin: Instant,
}

impl<'rec> LatencyGuard<'rec> {
    fn start(recorder: &'rec dyn MetricsRecorder, title: &'static str) -> Self {
        Self {
            recorder,
            title,
            begin: Instant::now(),
        }
    }
}

impl Drop for LatencyGuard<'_> {
    fn drop(&mut self) {
        let elapsed_us = u64::try_from(self.begin.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.recorder.notify(self.title, elapsed_us);
    }
}

/// Issues single HTTP requests and reports each attempt to the run's
/// recorder: one outcome counter increment and one latency sample.
#[derive(Clone)]
pub struct RequestExecutor {
    client: Client,
    recorder: Arc<dyn MetricsRecorder>,
    titles: MetricTitles,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("titles", &self.titles)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    #[must_use]
    pub fn new(client: Client, recorder: Arc<dyn MetricsRecorder>, titles: MetricTitles) -> Self {
        Self {
            client,
            recorder,
            titles,
        }
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub const fn titles(&self) -> &MetricTitles {
        &self.titles
    }

    /// Execute a prepared request.
    ///
    /// # Errors
    ///
    /// Returns an error when no response was obtained or, in capture mode,
    /// the body could not be read. The attempt is recorded either way.
    pub async fn execute(
        &self,
        request: Request,
        mode: BodyMode,
    ) -> Result<ResponseBody, HttpError> {
        let response = self.dispatch(Ok(request)).await?;
        consume(response, mode).await
    }

    /// Execute a clone of a request template.
    ///
    /// A template that cannot be cloned (streaming body) is recorded as a
    /// transport failure.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn execute_template(
        &self,
        template: &Request,
        mode: BodyMode,
    ) -> Result<ResponseBody, HttpError> {
        let request = template.try_clone().ok_or(HttpError::CloneRequestFailed);
        let response = self.dispatch(request).await?;
        consume(response, mode).await
    }

    /// Build and send one request, returning the full response body.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn request(
        &self,
        method: Method,
        url: &Url,
        body: Option<Bytes>,
        headers: &HeaderMap,
    ) -> Result<Bytes, HttpError> {
        let request = self.build(method, url, body, headers);
        let response = self.dispatch(request).await?;
        response
            .bytes()
            .await
            .map_err(|err| HttpError::ReadBodyFailed { source: err })
    }

    /// Build and send one request, draining the body without keeping it.
    ///
    /// Use this for high-rate traffic generation where content is irrelevant.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn request_discard(
        &self,
        method: Method,
        url: &Url,
        body: Option<Bytes>,
        headers: &HeaderMap,
    ) -> Result<u64, HttpError> {
        let request = self.build(method, url, body, headers);
        let response = self.dispatch(request).await?;
        drain_response_body(response)
            .await
            .map_err(|err| HttpError::ReadBodyFailed { source: err })
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<Bytes, HttpError> {
        self.request(Method::GET, url, None, headers).await
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn get_discard(&self, url: &Url, headers: &HeaderMap) -> Result<u64, HttpError> {
        self.request_discard(Method::GET, url, None, headers).await
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn post(
        &self,
        url: &Url,
        body: Bytes,
        headers: &HeaderMap,
    ) -> Result<Bytes, HttpError> {
        self.request(Method::POST, url, Some(body), headers).await
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn post_discard(
        &self,
        url: &Url,
        body: Bytes,
        headers: &HeaderMap,
    ) -> Result<u64, HttpError> {
        self.request_discard(Method::POST, url, Some(body), headers)
            .await
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn put(
        &self,
        url: &Url,
        body: Bytes,
        headers: &HeaderMap,
    ) -> Result<Bytes, HttpError> {
        self.request(Method::PUT, url, Some(body), headers).await
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn patch(
        &self,
        url: &Url,
        body: Bytes,
        headers: &HeaderMap,
    ) -> Result<Bytes, HttpError> {
        self.request(Method::PATCH, url, Some(body), headers).await
    }

    fn build(
        &self,
        method: Method,
        url: &Url,
        body: Option<Bytes>,
        headers: &HeaderMap,
    ) -> Result<Request, HttpError> {
        let mut request_builder = self
            .client
            .request(method, url.clone())
            .headers(headers.clone());
        if let Some(body) = body {
            request_builder = request_builder.body(body);
        }
        request_builder
            .build()
            .map_err(|err| HttpError::BuildRequestFailed { source: err })
    }

    /// Sends the request and records exactly one outcome and one latency
    /// sample. Timing covers the round trip up to response headers or the
    /// transport error, timeouts included.
    async fn dispatch(&self, request: Result<Request, HttpError>) -> Result<Response, HttpError> {
        let _latency = LatencyGuard::start(self.recorder.as_ref(), self.titles.latency);

        let result = match request {
            Ok(request) => self
                .client
                .execute(request)
                .await
                .map_err(|err| HttpError::RequestFailed { source: err }),
            Err(err) => Err(err),
        };

        let outcome = match &result {
            Ok(response) => Outcome::from_status(response.status().as_u16()),
            Err(_) => Outcome::TransportFail,
        };
        self.recorder.notify(outcome.counter(&self.titles), 1);

        result
    }
}

async fn consume(response: Response, mode: BodyMode) -> Result<ResponseBody, HttpError> {
    match mode {
        BodyMode::Capture => response
            .bytes()
            .await
            .map(ResponseBody::Captured)
            .map_err(|err| HttpError::ReadBodyFailed { source: err }),
        BodyMode::Discard => drain_response_body(response)
            .await
            .map(ResponseBody::Drained)
            .map_err(|err| HttpError::ReadBodyFailed { source: err }),
    }
}

async fn drain_response_body(response: Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
