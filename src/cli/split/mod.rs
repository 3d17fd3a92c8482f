//! Split command - prints the fragment plan for a document

use std::path::PathBuf;

use anyhow::Context;
use bytes::Bytes;
use clap::Args;

use crate::domain::{DocumentFile, DocumentFormat, FragmentSplitter};
use crate::infrastructure::splitters::SplitterRegistry;

/// Arguments for the split command
#[derive(Args, Clone, Debug)]
pub struct SplitArgs {
    /// Document to inspect
    pub file: PathBuf,

    /// Format to assume instead of the extension (e.g. pdf, csv)
    #[arg(long)]
    pub format: Option<String>,

    /// Fragment size limit in bytes (overrides config)
    #[arg(long)]
    pub max_fragment_bytes: Option<usize>,
}

/// Run the split command
pub async fn run(args: SplitArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let max_fragment_bytes = args
        .max_fragment_bytes
        .unwrap_or(config.processing.max_fragment_bytes);

    let mut file = DocumentFile::from_path(&args.file);
    if let Some(format) = &args.format {
        file = file.with_format(DocumentFormat::from_extension(format));
    }
    let bytes = Bytes::from(
        tokio::fs::read(file.path())
            .await
            .with_context(|| format!("Failed to read {}", file.path().display()))?,
    );

    println!("{} ({}, {} bytes)", file.name(), file.format(), bytes.len());

    let registry = SplitterRegistry::with_defaults();
    if bytes.len() <= config.processing.bytes_threshold {
        println!(
            "below the split threshold of {} bytes; sent whole",
            config.processing.bytes_threshold
        );
        return Ok(());
    }
    if !registry.supports(file.format()) {
        println!("no splitter for {}; sent whole", file.format());
        return Ok(());
    }

    let format = file.format().clone();
    let fragments = tokio::task::spawn_blocking(move || {
        registry.split(&bytes, &format, max_fragment_bytes)
    })
    .await??;

    for fragment in &fragments {
        println!("{:>4}  {:>12} bytes", fragment.ordinal(), fragment.len());
    }
    println!("{} fragments", fragments.len());

    Ok(())
}
