use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Skills;

#[derive(Copy, Clone, Debug)]
pub enum Phase { List, Extract }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::List => "list",
        Phase::Extract => "extract",
    }}
    fn span(&self) -> Span { match self {
        Phase::List => info_span!("list"),
        Phase::Extract => info_span!("extract"),
    }}
}

impl OpMarker for Skills {
    const NAME: &'static str = "skills";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("skills") }
}
