use std::sync::Arc;

use anyhow::Context;
use sweepr_common::ports::{RecordSink, TargetSource};
use sweepr_core::Pipeline;
use sweepr_core::scanner::NmapScanner;
use sweepr_core::sink::JsonLinesSink;
use sweepr_core::sources::{ExpressionSource, JsonFileSource};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span, warn};

use crate::commands::ScanArgs;
use crate::terminal::{print, progress::ProgressObserver};

pub async fn scan(args: ScanArgs) -> anyhow::Result<()> {
    let source: Box<dyn TargetSource> = match &args.input {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(ExpressionSource::new(args.targets.iter().cloned())),
    };

    let sink: Box<dyn RecordSink> = match &args.output {
        Some(path) => Box::new(
            JsonLinesSink::create(path)
                .await
                .with_context(|| format!("opening output file {}", path.display()))?,
        ),
        None => Box::new(JsonLinesSink::stdout()),
    };

    let span = info_span!("scan", indicatif.pb_show = true);
    let observer = Arc::new(ProgressObserver::new(span.clone()));
    let pipeline = Pipeline::new(
        args.pipeline_config(),
        Arc::new(NmapScanner::new(args.scan_profile())),
        sink,
        observer,
    )
    .with_filter(args.record_filter());

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, saving results gathered so far...");
            interrupt.cancel();
        }
    });

    match pipeline.run(source.as_ref(), cancel).instrument(span).await {
        Ok(summary) => {
            print::summary(&summary);
            Ok(())
        }
        Err(err) => {
            if let Some(summary) = err.summary() {
                print::summary(summary);
            }
            Err(anyhow::Error::new(err).context("scan did not complete"))
        }
    }
}
