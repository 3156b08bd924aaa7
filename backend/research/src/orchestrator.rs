use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{info, warn};

use sportsgpt_core::{ProgressStatus, Publisher, ResearchProvider, ResearchRequest, ResearchResult};
use sportsgpt_logging::{ResearchAuditEvent, ResearchAuditLog, redact_sensitive_data};

use crate::error::ResearchError;
use crate::prompts::RESEARCH_SYSTEM_PROMPT;
use crate::query::{enhance_query, filter_internal_content};

const SEARCHING_PCT: u8 = 25;
const SYNTHESIZING_PCT: u8 = 80;
/// Upper bound for `retrieving` events while falling back through providers.
const RETRIEVING_MAX_PCT: u8 = 75;

/// Drives one research request through the provider fallback chain and
/// publishes its progress.
///
/// Every run that gets past session creation ends in exactly one terminal
/// event, including when the `run` future is dropped before completing.
pub struct ResearchOrchestrator {
    publisher: Publisher,
    providers: Vec<Arc<dyn ResearchProvider>>,
    timeout: Duration,
}

impl ResearchOrchestrator {
    pub fn new(
        publisher: Publisher,
        providers: Vec<Arc<dyn ResearchProvider>>,
        timeout: Duration,
    ) -> Self {
        Self {
            publisher,
            providers,
            timeout,
        }
    }

    /// Provider names in fallback order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub async fn run(&self, session_id: &str, query: &str) -> Result<ResearchResult, ResearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResearchError::InvalidQuery);
        }
        if self.providers.is_empty() {
            return Err(ResearchError::NoProviders);
        }

        self.publisher.start_new(session_id)?;
        let guard = CancelGuard::new(&self.publisher, session_id);
        let started = Instant::now();

        info!(session_id, providers = self.providers.len(), "Research started");
        ResearchAuditLog::record(
            session_id,
            ResearchAuditEvent::QueryReceived {
                query: query.to_string(),
            },
        );

        let outcome = self.research_with_fallback(session_id, query).await;
        guard.disarm();

        let outcome = match outcome {
            Ok(result) => self
                .publisher
                .finish(session_id, "Research complete")
                .map(|_| result)
                .map_err(ResearchError::from),
            Err(err) => {
                if let Err(close_err) = self.publisher.fail(session_id, err.user_message()) {
                    warn!(session_id, error = %close_err, "Could not close failed session");
                }
                Err(err)
            }
        };

        let processing_ms = started.elapsed().as_millis() as u64;
        let label = match &outcome {
            Ok(_) => "completed".to_string(),
            Err(err) => err.user_message().to_string(),
        };
        info!(session_id, processing_ms, outcome = %label, "Research finished");
        ResearchAuditLog::record(
            session_id,
            ResearchAuditEvent::Finished {
                processing_ms,
                outcome: label,
            },
        );

        outcome
    }

    async fn research_with_fallback(
        &self,
        session_id: &str,
        query: &str,
    ) -> Result<ResearchResult, ResearchError> {
        self.publisher.report(
            session_id,
            ProgressStatus::Searching,
            "Searching cricket sources",
            SEARCHING_PCT,
        )?;

        let request = ResearchRequest {
            query: query.to_string(),
            prompt: enhance_query(query),
            system_prompt: RESEARCH_SYSTEM_PROMPT.to_string(),
        };

        let total = self.providers.len();
        let mut last_error = String::new();
        let mut last_timed_out = false;

        for (attempt, provider) in self.providers.iter().enumerate() {
            let name = provider.name();
            if attempt > 0 {
                self.publisher.report(
                    session_id,
                    ProgressStatus::Retrieving,
                    &format!("Primary source unavailable, trying {name}"),
                    retrieving_pct(attempt, total),
                )?;
            }

            let call_started = Instant::now();
            let failure = match timeout(self.timeout, provider.research(&request)).await {
                Ok(Ok(mut result)) => {
                    let latency_ms = call_started.elapsed().as_millis() as u64;
                    info!(session_id, provider = %name, latency_ms, sources = result.sources.len(), "Provider responded");
                    ResearchAuditLog::record(
                        session_id,
                        ResearchAuditEvent::ProviderSucceeded {
                            provider: name.to_string(),
                            latency_ms,
                            sources: result.sources.len(),
                        },
                    );

                    self.publisher.report(
                        session_id,
                        ProgressStatus::Synthesizing,
                        "Synthesizing research results",
                        SYNTHESIZING_PCT,
                    )?;
                    result.content = filter_internal_content(&result.content);
                    return Ok(result);
                }
                Ok(Err(e)) => {
                    last_timed_out = false;
                    redact_sensitive_data(&format!("{e:#}"))
                }
                Err(_) => {
                    last_timed_out = true;
                    format!("timed out after {}s", self.timeout.as_secs())
                }
            };

            let latency_ms = call_started.elapsed().as_millis() as u64;
            warn!(session_id, provider = %name, latency_ms, error = %failure, "Provider failed");
            ResearchAuditLog::record(
                session_id,
                ResearchAuditEvent::ProviderFailed {
                    provider: name.to_string(),
                    latency_ms,
                    error_msg: failure.clone(),
                },
            );
            last_error = failure;
        }

        if last_timed_out {
            Err(ResearchError::Timeout(self.timeout))
        } else {
            Err(ResearchError::ProvidersFailed {
                attempts: total,
                last: last_error,
            })
        }
    }
}

/// Progress for the `attempt`-th fallback, spread between searching and synthesizing.
fn retrieving_pct(attempt: usize, total: usize) -> u8 {
    let span = (RETRIEVING_MAX_PCT - SEARCHING_PCT) as usize;
    let pct = SEARCHING_PCT as usize + span * attempt / total.max(1);
    pct.min(RETRIEVING_MAX_PCT as usize) as u8
}

/// Closes the session with an error if the run is dropped mid-flight.
struct CancelGuard<'a> {
    publisher: &'a Publisher,
    session_id: &'a str,
    armed: bool,
}

impl<'a> CancelGuard<'a> {
    fn new(publisher: &'a Publisher, session_id: &'a str) -> Self {
        Self {
            publisher,
            session_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(session_id = self.session_id, "Research cancelled before completion");
        if let Err(e) = self.publisher.fail(self.session_id, "Research cancelled") {
            warn!(session_id = self.session_id, error = %e, "Could not close cancelled session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;
    use sportsgpt_core::{EventStore, ProgressError, ProgressEvent, ProgressLog};

    fn orchestrator(
        providers: Vec<Arc<dyn ResearchProvider>>,
        timeout: Duration,
    ) -> (Arc<EventStore>, ResearchOrchestrator) {
        let store = Arc::new(EventStore::new());
        let publisher = Publisher::new(store.clone());
        (store.clone(), ResearchOrchestrator::new(publisher, providers, timeout))
    }

    fn events(store: &EventStore, session_id: &str) -> Vec<ProgressEvent> {
        store.read_since(session_id, 0).unwrap()
    }

    fn assert_single_terminal(events: &[ProgressEvent], status: ProgressStatus) {
        let terminals: Vec<&ProgressEvent> = events.iter().filter(|e| e.is_terminal).collect();
        assert_eq!(terminals.len(), 1);
        assert_eq!(terminals[0].status, status);
        assert!(events.last().unwrap().is_terminal);
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, (1..=events.len() as u64).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_success_path() {
        let provider = MockProvider::new("mock").with_response(ResearchResult {
            content: "<think>draft</think>Kohli averages 58.".into(),
            ..Default::default()
        });
        let (store, orch) = orchestrator(vec![Arc::new(provider)], Duration::from_secs(5));

        let result = orch.run("s1", "Kohli ODI average").await.unwrap();
        assert_eq!(result.content, "Kohli averages 58.");

        let events = events(&store, "s1");
        let statuses: Vec<ProgressStatus> = events.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                ProgressStatus::Initiated,
                ProgressStatus::Searching,
                ProgressStatus::Synthesizing,
                ProgressStatus::Completed,
            ]
        );
        let pcts: Vec<u8> = events.iter().map(|e| e.completed_pct).collect();
        assert_eq!(pcts, vec![0, 25, 80, 100]);
        assert_single_terminal(&events, ProgressStatus::Completed);
    }

    #[tokio::test]
    async fn test_fallback_to_second_provider() {
        let primary = Arc::new(MockProvider::new("perplexity").failing("503 Service Unavailable"));
        let fallback = Arc::new(MockProvider::new("openai"));
        let (store, orch) = orchestrator(
            vec![primary.clone(), fallback.clone()],
            Duration::from_secs(5),
        );

        let result = orch.run("s1", "Best IPL captain").await.unwrap();
        assert!(result.content.contains("Best IPL captain"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);

        let events = events(&store, "s1");
        let retrieving = events
            .iter()
            .find(|e| e.status == ProgressStatus::Retrieving)
            .unwrap();
        assert!(retrieving.message.contains("openai"));
        assert_eq!(retrieving.completed_pct, 50);
        assert_single_terminal(&events, ProgressStatus::Completed);
    }

    #[tokio::test]
    async fn test_all_providers_fail() {
        let (store, orch) = orchestrator(
            vec![
                Arc::new(MockProvider::new("a").failing("boom")),
                Arc::new(MockProvider::new("b").failing("bang")),
            ],
            Duration::from_secs(5),
        );

        let err = orch.run("s1", "Ashes 2005").await.unwrap_err();
        match err {
            ResearchError::ProvidersFailed { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(last.contains("bang"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let events = events(&store, "s1");
        assert_single_terminal(&events, ProgressStatus::Error);
        let last = events.last().unwrap();
        assert_eq!(last.message, "Research failed");
        // error keeps the highest percentage reached
        assert_eq!(last.completed_pct, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let slow = MockProvider::new("slow").with_delay(Duration::from_secs(600));
        let (store, orch) = orchestrator(vec![Arc::new(slow)], Duration::from_secs(300));

        let err = orch.run("s1", "Longest test match").await.unwrap_err();
        assert!(matches!(err, ResearchError::Timeout(_)));

        let events = events(&store, "s1");
        assert_single_terminal(&events, ProgressStatus::Error);
        assert_eq!(events.last().unwrap().message, "Research timed out");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_run_closes_session() {
        let slow = MockProvider::new("slow").with_delay(Duration::from_secs(600));
        let (store, orch) = orchestrator(vec![Arc::new(slow)], Duration::from_secs(300));

        let run = orch.run("s1", "Sachin centuries");
        let cancelled = tokio::time::timeout(Duration::from_secs(1), run).await;
        assert!(cancelled.is_err());

        let events = events(&store, "s1");
        assert_single_terminal(&events, ProgressStatus::Error);
        assert_eq!(events.last().unwrap().message, "Research cancelled");
    }

    #[tokio::test]
    async fn test_invalid_query_starts_no_session() {
        let (store, orch) = orchestrator(vec![Arc::new(MockProvider::new("mock"))], Duration::from_secs(5));
        assert!(matches!(orch.run("s1", "   ").await, Err(ResearchError::InvalidQuery)));
        assert!(store.session("s1").is_err());
    }

    #[tokio::test]
    async fn test_no_providers() {
        let (store, orch) = orchestrator(Vec::new(), Duration::from_secs(5));
        assert!(matches!(orch.run("s1", "query").await, Err(ResearchError::NoProviders)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_session_id_reuse_rejected() {
        let (store, orch) = orchestrator(vec![Arc::new(MockProvider::new("mock"))], Duration::from_secs(5));
        orch.run("s1", "first").await.unwrap();

        let err = orch.run("s1", "second").await.unwrap_err();
        assert!(matches!(err, ResearchError::Progress(ProgressError::SessionExists(_))));
        assert_eq!(events(&store, "s1").len(), 4);
    }

    #[test]
    fn test_retrieving_pct_stays_between_stages() {
        assert_eq!(retrieving_pct(1, 2), 50);
        assert_eq!(retrieving_pct(1, 3), 41);
        assert_eq!(retrieving_pct(2, 3), 58);
        assert!(retrieving_pct(9, 10) < SYNTHESIZING_PCT);
    }
}
