//! Control operations
//!
//! `start` and the repeat containers carry no effect of their own; their
//! bodies are walked by the chain executor.

use super::HandlerFuture;
use crate::interpreter::context::ExecutionContext;
use crate::interpreter::program::Block;
use crate::interpreter::tween::{seconds, Outcome};

pub const DEFAULT_WAIT_SECONDS: f64 = 1.0;

pub fn structural<'a>(_ctx: &'a ExecutionContext, _block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(async { Outcome::Completed })
}

pub fn wait<'a>(ctx: &'a ExecutionContext, block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(async move {
        let secs = block.number("seconds").unwrap_or(DEFAULT_WAIT_SECONDS);
        ctx.pause(seconds(secs)).await
    })
}
