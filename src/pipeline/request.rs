//! The lifecycle of one in-flight recognition request.
//!
//! A dispatched request is raced by three finalizers: the network
//! transfer completing, the deadline timer firing, and the caller
//! cancelling. Whichever claims the validity gate first performs cleanup
//! and delivers the single terminal outcome; the others observe the gate
//! already claimed and do nothing. This guarantees exactly one outcome
//! and exactly one resource release per request, no matter how the three
//! interleave.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::config::ClientConfig;
use crate::core::constants::{AUTH_HEADER, UPLOAD_FIELD_NAME, UPLOAD_FILE_NAME, UPLOAD_MIME};
use crate::core::errors::TransportError;
use crate::domain::{EncodedPayload, RecognitionOutcome};
use crate::pipeline::response::parse_response;

const GATE_ACTIVE: u8 = 0;
const GATE_COMPLETING: u8 = 1;
const GATE_RETIRED: u8 = 2;

/// Single-writer gate arbitrating which of completion, timeout, and
/// cancellation finalizes a request.
///
/// The gate moves `Active -> Completing -> Retired` exactly once. The
/// compare-and-swap in [`claim`](ValidityGate::claim) admits one writer;
/// every later claim fails and the loser must not touch the request
/// further.
pub(crate) struct ValidityGate(AtomicU8);

impl ValidityGate {
    fn new() -> Self {
        Self(AtomicU8::new(GATE_ACTIVE))
    }

    /// Attempts to become the finalizer. Returns false if another path
    /// already claimed or retired the request.
    fn claim(&self) -> bool {
        self.0
            .compare_exchange(
                GATE_ACTIVE,
                GATE_COMPLETING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn retire(&self) {
        self.0.store(GATE_RETIRED, Ordering::Release);
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.0.load(Ordering::Acquire) == GATE_RETIRED
    }
}

/// Shared state of one outstanding request: the validity gate, the stop
/// token tearing down the transfer and the timer, and the single-use
/// outcome channel.
pub(crate) struct RequestContext {
    gate: ValidityGate,
    stop: CancellationToken,
    outcome_tx: Mutex<Option<oneshot::Sender<RecognitionOutcome>>>,
}

impl RequestContext {
    fn new() -> (Arc<Self>, oneshot::Receiver<RecognitionOutcome>) {
        let (tx, rx) = oneshot::channel();
        let ctx = Arc::new(Self {
            gate: ValidityGate::new(),
            stop: CancellationToken::new(),
            outcome_tx: Mutex::new(Some(tx)),
        });
        (ctx, rx)
    }

    /// Claims the gate; the winner must follow up with [`deliver`](Self::deliver).
    fn claim(&self) -> bool {
        self.gate.claim()
    }

    /// Releases resources, retires the gate, and delivers the outcome.
    /// Must only be called by the path that won [`claim`](Self::claim).
    fn deliver(&self, outcome: RecognitionOutcome) {
        self.stop.cancel();
        self.gate.retire();
        if let Ok(mut slot) = self.outcome_tx.lock() {
            if let Some(tx) = slot.take() {
                let _ = tx.send(outcome);
            }
        }
    }

    /// Claims the gate and delivers in one step. Returns whether this
    /// caller was the finalizer.
    fn finalize(&self, outcome: RecognitionOutcome) -> bool {
        if !self.claim() {
            return false;
        }
        self.deliver(outcome);
        true
    }
}

/// Handle to one outstanding recognition request.
///
/// [`outcome`](Self::outcome) resolves exactly once with the terminal
/// result. [`cancel`](Self::cancel) may be called at any time and races
/// completion and timeout under the request's validity gate. Dropping the
/// handle without awaiting leaks nothing; the background tasks finish on
/// their own and delivery into the dropped channel is a no-op.
pub struct RecognitionRequest {
    ctx: Arc<RequestContext>,
    outcome_rx: oneshot::Receiver<RecognitionOutcome>,
}

impl RecognitionRequest {
    /// Requests cancellation. A no-op when the request already finished.
    pub fn cancel(&self) {
        if self.ctx.finalize(RecognitionOutcome::Cancelled) {
            debug!("recognition request cancelled by caller");
        } else if self.ctx.gate.is_retired() {
            debug!("cancellation after retirement; ignoring");
        }
    }

    /// Waits for the terminal outcome of this request.
    pub async fn outcome(self) -> RecognitionOutcome {
        match self.outcome_rx.await {
            Ok(outcome) => outcome,
            // Both tasks died without finalizing; only reachable when the
            // runtime is torn down underneath the request.
            Err(_) => RecognitionOutcome::Transport(TransportError::Aborted(
                "outcome channel closed before delivery".to_string(),
            )),
        }
    }

    /// Creates an already-finished request carrying the given outcome.
    pub(crate) fn resolved(outcome: RecognitionOutcome) -> Self {
        let (ctx, outcome_rx) = RequestContext::new();
        ctx.finalize(outcome);
        Self { ctx, outcome_rx }
    }
}

/// Dispatches an encoded payload to the recognition endpoint.
///
/// Spawns the transfer task and the deadline timer; both observe the
/// request context's stop token and the validity gate. Must be called
/// from within a tokio runtime.
pub(crate) fn dispatch(
    http: reqwest::Client,
    config: &ClientConfig,
    payload: EncodedPayload,
) -> RecognitionRequest {
    let (ctx, outcome_rx) = RequestContext::new();
    let timeout = config.timeout();
    let endpoint = config.endpoint.clone();
    let token = config.token.clone();

    let transfer_ctx = Arc::clone(&ctx);
    tokio::spawn(async move {
        let stop = transfer_ctx.stop.clone();
        tokio::select! {
            biased;
            // Dropping the transfer future here aborts the connection.
            _ = stop.cancelled() => {}
            result = send_and_read(http, endpoint, token, payload) => match result {
                Ok(body) => complete(transfer_ctx, body).await,
                Err(err) => {
                    if transfer_ctx.finalize(RecognitionOutcome::Transport(err.clone())) {
                        warn!("recognition transfer failed: {err}");
                    }
                }
            }
        }
    });

    let timer_ctx = Arc::clone(&ctx);
    tokio::spawn(async move {
        let stop = timer_ctx.stop.clone();
        tokio::select! {
            _ = stop.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                if timer_ctx.finalize(RecognitionOutcome::Timeout) {
                    warn!("recognition request timed out after {timeout:?}");
                }
            }
        }
    });

    RecognitionRequest { ctx, outcome_rx }
}

/// Completion path: claims the gate, halts the timer, and parses the body
/// off the I/O task before delivering.
async fn complete(ctx: Arc<RequestContext>, body: Bytes) {
    if !ctx.claim() {
        // Stale completion: the timer or a cancellation already retired
        // the request. It must not alter state.
        debug!("completion arrived after retirement; ignoring");
        return;
    }
    ctx.stop.cancel();
    let outcome = match tokio::task::spawn_blocking(move || parse_response(&body)).await {
        Ok(outcome) => outcome,
        Err(err) => RecognitionOutcome::Malformed(format!("response handling failed: {err}")),
    };
    ctx.deliver(outcome);
}

/// Performs the multipart POST and accumulates the full response body.
async fn send_and_read(
    http: reqwest::Client,
    endpoint: String,
    token: String,
    payload: EncodedPayload,
) -> Result<Bytes, TransportError> {
    let part = reqwest::multipart::Part::bytes(payload.bytes)
        .file_name(UPLOAD_FILE_NAME)
        .mime_str(UPLOAD_MIME)
        .map_err(TransportError::classify)?;
    let mut form = reqwest::multipart::Form::new().part(UPLOAD_FIELD_NAME, part);
    for (name, value) in payload.fields {
        form = form.text(name, value);
    }

    let response = http
        .post(&endpoint)
        .header(AUTH_HEADER, token)
        .multipart(form)
        .send()
        .await
        .map_err(TransportError::classify)?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Aborted(format!("HTTP status {status}")));
    }

    response.bytes().await.map_err(TransportError::classify)
}
