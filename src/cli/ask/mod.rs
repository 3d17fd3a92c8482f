//! Ask command - streams an answer to stdout

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use futures::StreamExt;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::{
    DocumentFile, DocumentFormat, DocumentProcessor, ProgressEvent, ProgressSink, Question,
};
use crate::infrastructure::llm::InferenceClientFactory;
use crate::infrastructure::progress::{ChannelProgressSink, FanOutSink, LoggingProgressSink};
use crate::infrastructure::splitters::SplitterRegistry;

/// Arguments for the ask command
#[derive(Args, Clone, Debug)]
pub struct AskArgs {
    /// Documents to analyze
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Question to answer
    #[arg(long, short)]
    pub question: String,

    /// Maximum concurrent fragment calls (overrides config)
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Format to assume for every file instead of the extension (e.g. pdf, csv)
    #[arg(long)]
    pub format: Option<String>,

    /// Model identifier (overrides config)
    #[arg(long)]
    pub model: Option<String>,

    /// Log each fragment's text when it finishes
    #[arg(long)]
    pub verbose_fragments: bool,

    /// Write progress events to stderr as JSON lines
    #[arg(long)]
    pub events: bool,
}

#[derive(Serialize)]
struct TimedEvent {
    at: DateTime<Utc>,
    #[serde(flatten)]
    event: ProgressEvent,
}

/// Run the ask command
pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let mut config = super::bootstrap()?;

    if let Some(max_workers) = args.max_workers {
        config.processing = config.processing.with_max_workers(max_workers);
    }
    if let Some(model) = args.model {
        config.inference.model_id = model;
    }

    let client = InferenceClientFactory::create_bedrock(&config.inference)
        .await
        .context("Failed to create the inference client")?;
    let processor = DocumentProcessor::new(
        client,
        Arc::new(SplitterRegistry::with_defaults()),
        config.processing,
    )?;

    let format = args.format.as_deref().map(DocumentFormat::from_extension);
    let files: Vec<DocumentFile> = args
        .files
        .into_iter()
        .map(|path| {
            let file = DocumentFile::from_path(path);
            match &format {
                Some(format) => file.with_format(format.clone()),
                None => file,
            }
        })
        .collect();
    info!(files = files.len(), "Asking question");

    let mut sink = FanOutSink::new().with_sink(Arc::new(
        LoggingProgressSink::new().with_results(args.verbose_fragments),
    ));
    let mut writer = None;

    if args.events {
        let (channel, receiver) = ChannelProgressSink::channel();
        sink = sink.with_sink(Arc::new(channel));
        writer = Some(spawn_event_writer(receiver));
    }

    let sink: Arc<dyn ProgressSink> = Arc::new(sink);
    let mut answer = processor.process_many(files, Question::new(&args.question), sink);
    let mut stdout = tokio::io::stdout();

    while let Some(delta) = answer.next().await {
        stdout.write_all(delta?.as_bytes()).await?;
        stdout.flush().await?;
    }
    stdout.write_all(b"\n").await?;

    // Closes the channel so the writer drains and exits
    drop(answer);
    if let Some(writer) = writer {
        writer.await?;
    }

    Ok(())
}

fn spawn_event_writer(mut receiver: UnboundedReceiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stderr = tokio::io::stderr();

        while let Some(event) = receiver.recv().await {
            let line = match serde_json::to_string(&TimedEvent {
                at: Utc::now(),
                event,
            }) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to encode progress event");
                    continue;
                }
            };

            if stderr.write_all(format!("{line}\n").as_bytes()).await.is_err() {
                break;
            }
        }
    })
}
