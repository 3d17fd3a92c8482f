//! Map-reduce orchestration over large documents

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use tokio::time::{self, Instant};
use tracing::{debug, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use super::config::{FailurePolicy, ProcessingConfig};
use super::error::ProcessingError;
use super::prompts;
use super::reducer::reduce;
use super::worker_pool::WorkerPool;
use crate::domain::document::{
    has_contiguous_ordinals, into_ordered_texts, DocumentFile, DocumentFormat, Fragment,
    PartialResult, Question,
};
use crate::domain::inference::{DocumentPayload, InferenceClient, InferenceRequest, TextStream};
use crate::domain::progress::{Notifier, ProgressSink};
use crate::domain::splitting::{FragmentSplitter, SplitError};
use crate::domain::DomainError;

/// Answer text as it is generated. Ends after the first error.
pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<String, ProcessingError>> + Send>>;

/// Answers questions about documents, splitting those too large for one call
#[derive(Clone)]
pub struct DocumentProcessor {
    client: Arc<dyn InferenceClient>,
    splitter: Arc<dyn FragmentSplitter>,
    config: Arc<ProcessingConfig>,
}

impl std::fmt::Debug for DocumentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentProcessor")
            .field("client", &self.client)
            .field("splitter", &self.splitter.name())
            .field("config", &self.config)
            .finish()
    }
}

impl DocumentProcessor {
    /// Create a processor with a validated configuration
    pub fn new(
        client: Arc<dyn InferenceClient>,
        splitter: Arc<dyn FragmentSplitter>,
        config: ProcessingConfig,
    ) -> Result<Self, ProcessingError> {
        config.validate().map_err(ProcessingError::Configuration)?;

        Ok(Self {
            client,
            splitter,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Answer `question` about one file.
    ///
    /// Nothing runs until the stream is first polled. Dropping the stream
    /// cancels every outstanding remote call.
    pub fn process(
        &self,
        file: DocumentFile,
        question: Question,
        sink: Arc<dyn ProgressSink>,
    ) -> AnswerStream {
        let this = self.clone();
        let notifier = Notifier::new(sink);

        Box::pin(async_stream::stream! {
            let name = file.sanitized_name();
            let span = info_span!("process", run_id = %Uuid::new_v4(), file = %name);

            let prepared = this
                .prepare(&file, &name, &question, &notifier)
                .instrument(span.clone())
                .await;
            let (request, whole_file) = match prepared {
                Ok(prepared) => prepared,
                Err(e) => {
                    notifier.error(&e.to_string()).await;
                    yield Err(e);
                    return;
                }
            };

            let mut deltas = match this.open_answer(request).instrument(span.clone()).await {
                Ok(deltas) => deltas,
                Err(e) => {
                    notifier.error(&e.to_string()).await;
                    yield Err(e);
                    return;
                }
            };

            while let Some(delta) = deltas.next().await {
                match delta {
                    Ok(text) => yield Ok(text),
                    Err(e) => {
                        let e = ProcessingError::Synthesis(e);
                        notifier.error(&e.to_string()).await;
                        yield Err(e);
                        return;
                    }
                }
            }

            if whole_file {
                notifier.processing_end(&name).await;
            }
            span.in_scope(|| info!("Answer complete"));
        })
    }

    /// Answer `question` across several files.
    ///
    /// A single file is delegated to [`process`](Self::process). Otherwise each
    /// file is answered concurrently and the answers are combined by one more
    /// call.
    pub fn process_many(
        &self,
        mut files: Vec<DocumentFile>,
        question: Question,
        sink: Arc<dyn ProgressSink>,
    ) -> AnswerStream {
        if files.len() == 1 {
            let file = files.remove(0);
            return self.process(file, question, sink);
        }

        let this = self.clone();

        Box::pin(async_stream::stream! {
            if files.is_empty() {
                yield Err(ProcessingError::Configuration(DomainError::validation(
                    "at least one file is required",
                )));
                return;
            }

            let notifier = Notifier::new(sink.clone());
            info!(files = files.len(), "Processing several files");

            let per_file = files.into_iter().map(|file| {
                let name = file.sanitized_name();
                let answer = this.process(file, question.clone(), sink.clone());
                async move {
                    let parts: Vec<String> = answer.try_collect().await?;
                    Ok::<_, ProcessingError>((name, parts.concat()))
                }
            });

            let answers = match futures::future::try_join_all(per_file).await {
                Ok(answers) => answers,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            notifier.summary_start().await;

            let request = InferenceRequest::builder()
                .system(prompts::JOIN_DIRECTIVE)
                .text(prompts::join_text(&answers, question.as_str()))
                .build();

            let mut deltas = match this.open_answer(request).await {
                Ok(deltas) => deltas,
                Err(e) => {
                    notifier.error(&e.to_string()).await;
                    yield Err(e);
                    return;
                }
            };

            while let Some(delta) = deltas.next().await {
                match delta {
                    Ok(text) => yield Ok(text),
                    Err(e) => {
                        let e = ProcessingError::Synthesis(e);
                        notifier.error(&e.to_string()).await;
                        yield Err(e);
                        return;
                    }
                }
            }

            notifier.summary_end().await;
        })
    }

    /// Read the file and build the request whose output is the answer.
    ///
    /// Returns the request and whether it carries the whole file.
    async fn prepare(
        &self,
        file: &DocumentFile,
        name: &str,
        question: &Question,
        notifier: &Notifier,
    ) -> Result<(InferenceRequest, bool), ProcessingError> {
        let bytes = tokio::fs::read(file.path())
            .await
            .map(Bytes::from)
            .map_err(|e| ProcessingError::io(file.path(), e))?;
        let format = file.format().clone();

        let oversized = bytes.len() > self.config.bytes_threshold;
        let needs_split = oversized && self.splitter.supports(&format);

        if oversized && !needs_split {
            info!(%format, bytes = bytes.len(), "No split strategy for format, sending whole file");
        }

        if !needs_split {
            info!(bytes = bytes.len(), "Processing file in a single call");
            notifier.processing_start(name, 1).await;

            let request = InferenceRequest::builder()
                .system(prompts::SYNTHESIS_DIRECTIVE)
                .document(DocumentPayload::new(format, name, bytes))
                .text(prompts::whole_document_text(question.as_str()))
                .build();

            return Ok((request, true));
        }

        let fragments = self.split(bytes, format).await?;
        info!(
            fragments = fragments.len(),
            max_workers = self.config.max_workers,
            "Processing file in fragments"
        );
        notifier.processing_start(name, fragments.len()).await;

        let results = self
            .map_fragments(fragments, name, question, notifier)
            .await?;
        notifier.processing_end(name).await;

        let degraded = results.iter().filter(|r| r.degraded).count();
        if degraded > 0 {
            warn!(
                degraded,
                total = results.len(),
                "Synthesizing with placeholder fragments"
            );
        }

        let texts = into_ordered_texts(results);
        let context = reduce(&texts, self.config.max_context_chars);
        info!(
            chars = context.as_str().chars().count(),
            truncated = context.is_truncated(),
            "Context consolidated"
        );

        let request = InferenceRequest::builder()
            .system(prompts::SYNTHESIS_DIRECTIVE)
            .text(prompts::synthesis_text(
                context.fragments(),
                context.as_str(),
                question.as_str(),
            ))
            .build();

        Ok((request, false))
    }

    async fn split(
        &self,
        bytes: Bytes,
        format: DocumentFormat,
    ) -> Result<Vec<Fragment>, ProcessingError> {
        let splitter = self.splitter.clone();
        let limit = self.config.max_fragment_bytes;

        let fragments =
            tokio::task::spawn_blocking(move || splitter.split(&bytes, &format, limit)).await??;

        if !has_contiguous_ordinals(&fragments) {
            return Err(SplitError::InvalidOutput(
                "fragment ordinals must run from 1 to N in order".to_string(),
            )
            .into());
        }

        Ok(fragments)
    }

    #[instrument(skip_all, fields(fragments = fragments.len()))]
    async fn map_fragments(
        &self,
        fragments: Vec<Fragment>,
        name: &str,
        question: &Question,
        notifier: &Notifier,
    ) -> Result<Vec<PartialResult>, ProcessingError> {
        let name: Arc<str> = Arc::from(name);

        let tasks: Vec<_> = fragments
            .into_iter()
            .map(|fragment| {
                FragmentTask {
                    client: self.client.clone(),
                    notifier: notifier.clone(),
                    name: name.clone(),
                    question: question.clone(),
                    fragment,
                    timeout: self.config.call_timeout(),
                    policy: self.config.failure_policy,
                }
                .run()
                .in_current_span()
            })
            .collect();

        WorkerPool::new(self.config.max_workers).run(tasks).await
    }

    /// Open the answer stream. One deadline covers opening it and every delta.
    async fn open_answer(&self, request: InferenceRequest) -> Result<TextStream, ProcessingError> {
        let timeout = self.config.call_timeout();
        let deadline = Instant::now() + timeout;

        let mut deltas = match time::timeout_at(deadline, self.client.invoke_stream(request)).await
        {
            Ok(result) => result.map_err(ProcessingError::Synthesis)?,
            Err(_) => return Err(ProcessingError::Synthesis(DomainError::timeout(timeout))),
        };

        Ok(Box::pin(async_stream::stream! {
            loop {
                match time::timeout_at(deadline, deltas.next()).await {
                    Ok(Some(delta)) => yield delta,
                    Ok(None) => break,
                    Err(_) => {
                        yield Err(DomainError::timeout(timeout));
                        break;
                    }
                }
            }
        }))
    }
}

/// Analysis of one fragment. Owns everything it touches.
struct FragmentTask {
    client: Arc<dyn InferenceClient>,
    notifier: Notifier,
    name: Arc<str>,
    question: Question,
    fragment: Fragment,
    timeout: Duration,
    policy: FailurePolicy,
}

impl FragmentTask {
    async fn run(self) -> Result<PartialResult, ProcessingError> {
        let ordinal = self.fragment.ordinal();
        self.notifier.chunk_start(ordinal, &self.name).await;
        debug!(ordinal, bytes = self.fragment.len(), "Analyzing fragment");

        let payload = DocumentPayload::new(
            self.fragment.format().clone(),
            self.fragment.payload_name(&self.name),
            self.fragment.into_bytes(),
        );
        let request = InferenceRequest::builder()
            .system(prompts::fragment_directive())
            .document(payload)
            .text(prompts::fragment_text(self.question.as_str()))
            .build();

        let outcome = match time::timeout(self.timeout, self.client.invoke(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DomainError::timeout(self.timeout)),
        };

        let result = match outcome {
            Ok(text) => PartialResult::new(ordinal, text),
            Err(e) if self.policy == FailurePolicy::Placeholder => {
                warn!(ordinal, error = %e, "Fragment call failed, using placeholder");
                self.notifier
                    .error(&format!("Fragment {} failed: {}", ordinal, e))
                    .await;
                PartialResult::placeholder(ordinal)
            }
            Err(e) => return Err(ProcessingError::fragment_call(ordinal, e)),
        };

        debug!(ordinal, chars = result.text.len(), "Fragment analyzed");
        self.notifier
            .chunk_end(ordinal, &self.name, &result.text)
            .await;

        Ok(result)
    }
}
