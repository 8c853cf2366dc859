pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

// One typed log context per command
pub fn dispatch() -> LogCtx<ops::dispatch::Dispatch> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn probe() -> LogCtx<ops::probe::Probe> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn stats() -> LogCtx<ops::stats::Stats> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn skills() -> LogCtx<ops::skills::Skills> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
