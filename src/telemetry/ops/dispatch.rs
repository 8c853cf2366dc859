use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Dispatch;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Source, FetchApi, FetchBrowser, FetchHttp, Parse, Paginate }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Source => "source",
        Phase::FetchApi => "fetch_api",
        Phase::FetchBrowser => "fetch_browser",
        Phase::FetchHttp => "fetch_http",
        Phase::Parse => "parse",
        Phase::Paginate => "paginate",
    }}
    fn span(&self) -> Span { match self {
        Phase::Source => info_span!("source"),
        Phase::FetchApi => info_span!("fetch_api"),
        Phase::FetchBrowser => info_span!("fetch_browser"),
        Phase::FetchHttp => info_span!("fetch_http"),
        Phase::Parse => info_span!("parse"),
        Phase::Paginate => info_span!("paginate"),
    }}
}

impl OpMarker for Dispatch {
    const NAME: &'static str = "dispatch";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("dispatch") }
}
