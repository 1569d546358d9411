use std::time::Duration;

use indicatif::ProgressStyle;
use sweepr_common::error::{ScanError, SinkError};
use sweepr_common::network::target::Target;
use sweepr_common::ports::PipelineObserver;
use sweepr_common::summary::PipelineSummary;
use sweepr_core::observer::TracingObserver;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

const BAR_TEMPLATE: &str = "{spinner:.blue} {msg} [{bar:32.green/white}] {pos}/{len} ({elapsed})";
const TICKS: &[&str] = &[
    "▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁", "▁▁▁▁▁",
];

/// Logs every pipeline event and advances the progress bar of `span`.
pub struct ProgressObserver {
    span: Span,
    log: TracingObserver,
}

impl ProgressObserver {
    pub fn new(span: Span) -> Self {
        if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
            span.pb_set_style(&style.tick_strings(TICKS));
        }
        span.pb_set_message("scanning");
        Self {
            span,
            log: TracingObserver,
        }
    }
}

impl PipelineObserver for ProgressObserver {
    fn pipeline_started(&self, targets: usize, workers: usize) {
        self.span.pb_set_length(targets as u64);
        self.log.pipeline_started(targets, workers);
    }

    fn scan_finished(&self, target: &Target, elapsed: Duration, records: usize) {
        self.span.pb_inc(1);
        self.log.scan_finished(target, elapsed, records);
    }

    fn scan_failed(&self, error: &ScanError, elapsed: Duration) {
        self.span.pb_inc(1);
        self.log.scan_failed(error, elapsed);
    }

    fn record_persisted(&self, subject: &str) {
        self.log.record_persisted(subject);
    }

    fn persist_failed(&self, error: &SinkError) {
        self.log.persist_failed(error);
    }

    fn pipeline_finished(&self, summary: &PipelineSummary) {
        self.log.pipeline_finished(summary);
    }
}
