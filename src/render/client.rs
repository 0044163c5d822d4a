use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, StatusCode, Url};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{
    constants::{
        DEFAULT_MAX_TRANSPORT_RETRIES, DEFAULT_MAX_WAIT_SECS, DEFAULT_POLL_INTERVAL_SECS,
    },
    PollError, RenderError, Result, SubmissionError, TalkgenError,
};

use super::{
    job::{Credentials, JobHandle, JobResult, JobStatus, RenderRequest},
    structs::{
        create_talk_request::CreateTalkRequest, create_talk_response::CreateTalkResponse,
        talk_status_response::TalkStatusResponse,
    },
};

/// How long and how often to poll a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub poll_interval: Duration,
    pub max_wait: Duration,
    /// Consecutive failed status requests tolerated before giving up.
    pub max_transport_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_wait: Duration::from_secs(DEFAULT_MAX_WAIT_SECS),
            max_transport_retries: DEFAULT_MAX_TRANSPORT_RETRIES,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct StatusFetchError {
    pub message: String,
    /// `false` when asking again cannot help, e.g. a rejected credential.
    pub retryable: bool,
}

impl StatusFetchError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}

/// Anything the poll loop can read job status from.
#[async_trait]
pub trait StatusSource {
    async fn fetch_status(
        &self,
        handle: &JobHandle,
        credentials: &Credentials,
    ) -> std::result::Result<TalkStatusResponse, StatusFetchError>;
}

/// Client for the job based talking-avatar render API.
///
/// Credentials are passed per call and never kept by the client.
#[derive(Clone, Debug)]
pub struct RenderJobClient {
    client: reqwest::Client,
    base_url: Url,
}

impl RenderJobClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(Self::user_agent())
            .timeout(request_timeout)
            .build()?;
        Self::with_http_client(base_url, client)
    }

    pub fn with_http_client(base_url: &str, client: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TalkgenError::config(format!("Invalid render base URL {base_url}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(TalkgenError::config(format!(
                "Render base URL must be http or https: {base_url}"
            )));
        }
        Ok(Self { client, base_url })
    }

    pub fn user_agent() -> &'static str {
        concat!("talkgen/", env!("CARGO_PKG_VERSION"))
    }

    fn talks_url(&self, handle: Option<&JobHandle>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("talks");
            if let Some(handle) = handle {
                segments.push(handle.as_str());
            }
        }
        url
    }

    /// Submit a render request. Only `201 Created` counts as success.
    #[tracing::instrument(skip(self, request, credentials), fields(voice_id = request.voice_id()))]
    pub async fn submit(
        &self,
        request: &RenderRequest,
        credentials: &Credentials,
    ) -> std::result::Result<JobHandle, SubmissionError> {
        let body = CreateTalkRequest::from(request);

        let response = self
            .client
            .post(self.talks_url(None))
            .header(header::AUTHORIZATION, credentials.basic_header())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status != StatusCode::CREATED {
            warn!(status = status.as_u16(), body = %text, "Render submission rejected");
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let created: CreateTalkResponse = serde_json::from_str(&text)
            .map_err(|e| SubmissionError::MalformedResponse(format!("{e}: {text}")))?;
        let id = created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SubmissionError::MalformedResponse(format!("missing id in {text}")))?;

        info!(job_id = %id, "Render job submitted");
        Ok(JobHandle::new(id))
    }

    /// Poll `handle` until it reaches a terminal state.
    ///
    /// Example:
    /// ```rust,no_run
    /// # async fn run() -> talkgen::Result<()> {
    /// use std::time::Duration;
    /// use talkgen::render::{client::{PollPolicy, RenderJobClient}, job::{Credentials, JobHandle}};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// let client = RenderJobClient::new("https://api.d-id.com", Duration::from_secs(30))?;
    /// let result = client
    ///     .await_completion(
    ///         &JobHandle::new("tlk_123"),
    ///         &Credentials::new("token"),
    ///         PollPolicy::default(),
    ///         &CancellationToken::new(),
    ///     )
    ///     .await?;
    /// println!("{:?}", result.result_url());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn await_completion(
        &self,
        handle: &JobHandle,
        credentials: &Credentials,
        policy: PollPolicy,
        cancel: &CancellationToken,
    ) -> std::result::Result<JobResult, PollError> {
        poll_until_terminal(self, handle, credentials, policy, cancel).await
    }

    /// Submit and then wait for the render to finish.
    pub async fn render(
        &self,
        request: &RenderRequest,
        credentials: &Credentials,
        policy: PollPolicy,
        cancel: &CancellationToken,
    ) -> std::result::Result<JobResult, RenderError> {
        let handle = self.submit(request, credentials).await?;
        Ok(self
            .await_completion(&handle, credentials, policy, cancel)
            .await?)
    }
}

#[async_trait]
impl StatusSource for RenderJobClient {
    #[tracing::instrument(skip(self, credentials), fields(job_id = %handle))]
    async fn fetch_status(
        &self,
        handle: &JobHandle,
        credentials: &Credentials,
    ) -> std::result::Result<TalkStatusResponse, StatusFetchError> {
        let response = self
            .client
            .get(self.talks_url(Some(handle)))
            .header(header::AUTHORIZATION, credentials.basic_header())
            .send()
            .await
            .map_err(|e| StatusFetchError::transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("status {status} body {text}");
            // 4xx other than timeout and rate limiting will not change on retry
            let permanent = status.is_client_error()
                && status != StatusCode::REQUEST_TIMEOUT
                && status != StatusCode::TOO_MANY_REQUESTS;
            return Err(if permanent {
                StatusFetchError::permanent(message)
            } else {
                StatusFetchError::transient(message)
            });
        }

        response
            .json::<TalkStatusResponse>()
            .await
            .map_err(|e| StatusFetchError::transient(format!("failed to parse body: {e}")))
    }
}

/// The poll state machine, independent of how status is fetched.
///
/// The first request is issued immediately, later ones `poll_interval`
/// apart. No request starts after `max_wait` has elapsed.
pub async fn poll_until_terminal<S>(
    source: &S,
    handle: &JobHandle,
    credentials: &Credentials,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> std::result::Result<JobResult, PollError>
where
    S: StatusSource + Sync + ?Sized,
{
    let started_at = Instant::now();
    // None when max_wait is too large to represent, i.e. no deadline
    let deadline = started_at.checked_add(policy.max_wait);
    let mut status = JobStatus::Submitted;
    let mut consecutive_failures = 0u32;
    let mut polls = 0u32;

    loop {
        if cancel.is_cancelled() {
            info!(job_id = %handle, polls = polls, "Render polling cancelled");
            return Err(PollError::Cancelled);
        }

        polls += 1;
        match source.fetch_status(handle, credentials).await {
            Ok(response) => {
                consecutive_failures = 0;
                let observed = JobStatus::from_wire(response.status.as_deref());

                if let Some(raw) = response.status.as_deref() {
                    if observed == JobStatus::Started && raw != "started" {
                        warn!(job_id = %handle, status = raw, "Unknown render status, still waiting");
                    }
                }

                if status.can_transition_to(observed) {
                    status = observed;
                } else {
                    debug!(job_id = %handle, from = ?status, to = ?observed, "Ignoring status regression");
                }

                match status {
                    JobStatus::Done => {
                        return match response.result_url {
                            Some(result_url) => {
                                info!(job_id = %handle, polls = polls, result_url = %result_url, "Render job done");
                                Ok(JobResult::Succeeded { result_url })
                            }
                            None => Err(PollError::RemoteFailure {
                                message: "render job reported done without result_url".to_string(),
                            }),
                        };
                    }
                    JobStatus::Errored => {
                        let message = response.error_message();
                        warn!(job_id = %handle, polls = polls, error = %message, "Render job failed");
                        return Err(PollError::RemoteFailure { message });
                    }
                    _ => debug!(job_id = %handle, polls = polls, status = ?status, "Render job in progress"),
                }
            }
            Err(fetch_error) => {
                consecutive_failures += 1;
                if !fetch_error.retryable || consecutive_failures > policy.max_transport_retries {
                    error!(
                        job_id = %handle,
                        attempts = consecutive_failures,
                        error = %fetch_error,
                        "Render status unavailable, giving up"
                    );
                    return Err(PollError::Transport {
                        attempts: consecutive_failures,
                        message: fetch_error.message,
                    });
                }

                warn!(
                    job_id = %handle,
                    attempt = consecutive_failures,
                    max_retries = policy.max_transport_retries,
                    error = %fetch_error,
                    "Render status request failed, retrying"
                );
            }
        }

        let next_poll = Instant::now().checked_add(policy.poll_interval);
        let out_of_time = match (next_poll, deadline) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(next_poll), Some(deadline)) => next_poll > deadline,
        };
        if out_of_time {
            warn!(job_id = %handle, polls = polls, status = ?status, "Render job timed out");
            return Err(PollError::Timeout {
                waited: started_at.elapsed(),
                last_status: status,
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                info!(job_id = %handle, polls = polls, "Render polling cancelled");
                return Err(PollError::Cancelled);
            }
            _ = tokio::time::sleep(policy.poll_interval) => {}
        }
    }
}
