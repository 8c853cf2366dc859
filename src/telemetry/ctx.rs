use anyhow::Result;
use serde::Serialize;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{info, debug, warn, error, Span};

use crate::acquire::types::{SourceReport, SourceStatus};
use crate::output::types::Meta;

use super::emit;

pub trait PhaseSpan {
    fn name(&self) -> &'static str;
    fn span(&self) -> Span;
}

pub trait OpMarker {
    const NAME: &'static str;
    type Phase: PhaseSpan;
    fn root_span() -> Span;
}

pub struct LogCtx<O: OpMarker> {
    pub(crate) json: bool,
    pub(crate) _marker: PhantomData<O>,
}

impl<O: OpMarker> LogCtx<O> {
    fn op_name(&self) -> &'static str { O::NAME }

    pub fn root_span(&self) -> Span { O::root_span() }

    pub fn root_span_kv<'a, T>(&self, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.root_span();
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), "start");
        } else {
            info!(op = %self.op_name(), details = %details, "start");
        }
        span
    }

    pub fn span(&self, ph: &O::Phase) -> Span { ph.span() }

    pub fn span_kv<'a, T>(&self, ph: &O::Phase, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.span(ph);
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), phase = ph.name(), "span_start");
        } else {
            info!(op = %self.op_name(), phase = ph.name(), details = %details, "span_start");
        }
        span
    }

    pub fn info(&self, msg: impl AsRef<str>) { if self.json { info!(op = %self.op_name(), "{}", msg.as_ref()); } else { info!("{}", msg.as_ref()); } }
    pub fn debug(&self, msg: impl AsRef<str>) { if self.json { debug!(op = %self.op_name(), "{}", msg.as_ref()); } else { debug!("{}", msg.as_ref()); } }
    pub fn warn(&self, msg: impl AsRef<str>) { if self.json { warn!(op = %self.op_name(), "{}", msg.as_ref()); } else { warn!("{}", msg.as_ref()); } }

    pub fn info_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); info!(op = %self.op_name(), details = %details, "{}", msg); }
        else { info!("{}", msg); }
    }

    pub fn debug_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); debug!(op = %self.op_name(), details = %details, "{}", msg); }
        else { debug!("{}", msg); }
    }

    pub fn warn_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); warn!(op = %self.op_name(), details = %details, "{}", msg); }
        else { warn!("{}", msg); }
    }

    pub fn error_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); error!(op = %self.op_name(), details = %details, "{}", msg); }
        else { error!("{}", msg); }
    }

    pub fn result<T: Serialize>(&self, result: &T) -> Result<()> { emit::print_result(self.op_name(), result, None) }

    /// As `result`, with the command's wall time recorded in `meta`.
    pub fn result_timed<T: Serialize>(&self, result: &T, elapsed: Duration) -> Result<()> {
        emit::print_result(self.op_name(), result, Some(Meta { duration_ms: Some(elapsed.as_millis()) }))
    }
}

// Dispatch-specific helpers
impl LogCtx<crate::telemetry::ops::dispatch::Dispatch> {
    pub fn source_summary(&self, r: &SourceReport) {
        let status = format!("{:?}", r.status).to_lowercase();
        if self.json { info!(op = %self.op_name(), source = %r.name, kind = %r.kind, status = %status, jobs = r.jobs, elapsed_ms = r.elapsed_ms as u64, "source_summary"); }
        else {
            let mark = match r.status { SourceStatus::Ok => "✅", SourceStatus::Failed => "❌", SourceStatus::Skipped => "⏭️" };
            info!("{} Source {} ({}) jobs={} elapsed_ms={}", mark, r.name, r.kind, r.jobs, r.elapsed_ms);
        }
    }

    pub fn totals(&self, reports: &[SourceReport], jobs: usize) {
        let count = |s: SourceStatus| reports.iter().filter(|r| r.status == s).count();
        let (ok, failed, skipped) = (count(SourceStatus::Ok), count(SourceStatus::Failed), count(SourceStatus::Skipped));
        if self.json { info!(op = %self.op_name(), jobs, ok, failed, skipped, "dispatch_totals"); }
        else { info!("📊 Dispatch totals: jobs={} ok={} failed={} skipped={}", jobs, ok, failed, skipped); }
    }
}

fn kv_to_string<'a, T>(kv: T) -> String
where
    T: IntoIterator<Item = (&'a str, String)>,
{
    let mut parts: Vec<String> = Vec::new();
    for (k, v) in kv { parts.push(format!("{}={}", k, v)); }
    parts.join(" ")
}
