//! Plan execution against the backend clients.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;

use helpdesk_core::config::DispatchSettings;
use helpdesk_core::traits::BackendClient;
use helpdesk_core::types::{
    BackendCallResult, BackendInput, BackendKind, BackendOutcome, DispatchPlan, FailureKind,
    Necessity, SupportRequest,
};

/// Timeout, retry, and deadline knobs for one dispatch.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    /// Upper bound for one backend call.
    pub call_timeout: Duration,
    /// Upper bound on total wall-clock time for the whole dispatch.
    pub global_deadline: Duration,
    /// Retries after the first attempt, required backends only.
    pub max_retries: u32,
    /// Base delay for exponential backoff between attempts.
    pub backoff_base: Duration,
}

impl DispatchPolicy {
    pub fn from_settings(settings: &DispatchSettings) -> Self {
        Self {
            call_timeout: Duration::from_millis(settings.call_timeout_ms),
            global_deadline: Duration::from_millis(settings.global_deadline_ms),
            max_retries: settings.max_retries,
            backoff_base: Duration::from_millis(settings.backoff_base_ms),
        }
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self::from_settings(&helpdesk_core::config::AppConfig::default().dispatch)
    }
}

/// Everything the dispatcher learned about one request.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// One terminal result per planned backend, in plan order.
    pub outcomes: Vec<BackendOutcome>,
    /// Whether the global deadline fired before every backend finished.
    pub deadline_exceeded: bool,
}

/// Executes dispatch plans with bounded concurrency.
///
/// Stateless across requests; clients are shared `Arc`s and each dispatch
/// owns its own tasks and result slots, so concurrent requests never touch
/// shared mutable state.
pub struct Dispatcher {
    clients: HashMap<BackendKind, Arc<dyn BackendClient>>,
    policy: DispatchPolicy,
}

impl Dispatcher {
    pub fn new(clients: HashMap<BackendKind, Arc<dyn BackendClient>>, policy: DispatchPolicy) -> Self {
        Self { clients, policy }
    }

    /// Execute `plan` for `request` and collect every terminal result.
    ///
    /// Never fails the request: required-backend failures and timeouts are
    /// recorded and handed onward for the aggregator to judge. Backends
    /// still pending when the global deadline fires are cancelled and
    /// recorded as `TimedOut`.
    pub async fn dispatch(&self, request: &SupportRequest, plan: &DispatchPlan) -> DispatchOutcome {
        let deadline = Instant::now() + self.policy.global_deadline;
        // Each task reports every terminal outcome as soon as it exists, so
        // cancelling a still-running task never discards results its earlier
        // steps already produced.
        let (results_tx, mut results_rx) = mpsc::unbounded_channel::<BackendOutcome>();
        let mut tasks: JoinSet<()> = JoinSet::new();

        if plan.contains(BackendKind::Vision) {
            if let Some(client) = self.clients.get(&BackendKind::Vision) {
                let client = client.clone();
                let policy = self.policy.clone();
                let necessity = plan.necessity(BackendKind::Vision).unwrap_or(Necessity::Optional);
                let input = BackendInput::ImageRef(request.image_ref.clone().unwrap_or_default());
                let tx = results_tx.clone();
                tasks.spawn(async move {
                    let _ = tx.send(call_with_retry(client, input, necessity, &policy, deadline).await);
                });
            }
        }

        // Speech feeds its transcript into QA, so the two run as one
        // sequential task; everything else interleaves freely.
        let speech_client = plan
            .contains(BackendKind::Speech)
            .then(|| self.clients.get(&BackendKind::Speech).cloned())
            .flatten();
        let qa_client = plan
            .contains(BackendKind::Qa)
            .then(|| self.clients.get(&BackendKind::Qa).cloned())
            .flatten();

        if speech_client.is_some() || qa_client.is_some() {
            let policy = self.policy.clone();
            let speech_necessity = plan.necessity(BackendKind::Speech).unwrap_or(Necessity::Optional);
            let qa_necessity = plan.necessity(BackendKind::Qa).unwrap_or(Necessity::Optional);
            let audio_ref = request.audio_ref.clone().unwrap_or_default();
            let text_query = request.text_query.clone().filter(|q| !q.is_empty());
            let tx = results_tx.clone();

            tasks.spawn(async move {
                let mut qa_input = text_query;

                if let Some(client) = speech_client {
                    let outcome = call_with_retry(
                        client,
                        BackendInput::AudioRef(audio_ref),
                        speech_necessity,
                        &policy,
                        deadline,
                    )
                    .await;

                    if let BackendCallResult::Success { ref answer, .. } = outcome.result {
                        qa_input = Some(match qa_input {
                            Some(text) => format!("{}\n\n[voice transcript] {}", text, answer),
                            None => answer.clone(),
                        });
                    }
                    let _ = tx.send(outcome);
                }

                if let Some(client) = qa_client {
                    let outcome = match qa_input {
                        Some(query) => {
                            call_with_retry(
                                client,
                                BackendInput::Text(query),
                                qa_necessity,
                                &policy,
                                deadline,
                            )
                            .await
                        }
                        // Nothing to ask: the transcript never materialized
                        // and the request carried no text.
                        None => BackendOutcome {
                            backend: BackendKind::Qa,
                            result: BackendCallResult::Failure {
                                kind: FailureKind::InvalidInput,
                                message: "no transcript available for question answering".into(),
                            },
                            attempts: 0,
                        },
                    };
                    let _ = tx.send(outcome);
                }
            });
        }
        drop(results_tx);

        let mut collected: HashMap<BackendKind, BackendOutcome> = HashMap::new();
        let mut deadline_exceeded = false;

        loop {
            tokio::select! {
                // Deadline first so a result landing exactly at the deadline
                // still marks the dispatch as exceeded.
                biased;
                _ = tokio::time::sleep_until(deadline) => {
                    deadline_exceeded = true;
                    tasks.abort_all();
                    // Outcomes sent before the abort are still in the channel.
                    while let Ok(outcome) = results_rx.try_recv() {
                        collected.insert(outcome.backend, outcome);
                    }
                    break;
                }
                received = results_rx.recv() => match received {
                    Some(outcome) => {
                        collected.insert(outcome.backend, outcome);
                    }
                    None => break,
                },
            }
        }

        let outcomes = plan
            .entries
            .iter()
            .map(|entry| {
                collected.remove(&entry.backend).unwrap_or(BackendOutcome {
                    backend: entry.backend,
                    result: BackendCallResult::TimedOut,
                    attempts: 0,
                })
            })
            .collect();

        DispatchOutcome {
            outcomes,
            deadline_exceeded,
        }
    }
}

/// One backend call, retried on retryable results while the plan and retry
/// policy allow it.
async fn call_with_retry(
    client: Arc<dyn BackendClient>,
    input: BackendInput,
    necessity: Necessity,
    policy: &DispatchPolicy,
    deadline: Instant,
) -> BackendOutcome {
    let backend = client.kind();
    let mut attempts = 0u32;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return BackendOutcome {
                backend,
                result: BackendCallResult::TimedOut,
                attempts,
            };
        }

        attempts += 1;
        let timeout = policy.call_timeout.min(remaining);
        let result = client.invoke(&input, timeout).await;

        let may_retry = necessity == Necessity::Required
            && result.is_retryable()
            && attempts <= policy.max_retries;

        if !may_retry {
            return BackendOutcome {
                backend,
                result,
                attempts,
            };
        }

        let backoff = policy.backoff_base * 2u32.saturating_pow(attempts - 1);
        tracing::warn!(
            backend = %backend,
            attempt = attempts,
            backoff_ms = backoff.as_millis() as u64,
            "Retrying backend after retryable result"
        );
        tokio::time::sleep(backoff).await;
    }
}
