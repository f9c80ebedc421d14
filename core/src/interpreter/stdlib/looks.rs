//! Looks operations: speech bubbles and visibility
//!
//! Speech is never cleared by the engine once set; it stays until another
//! `say`/`think` replaces it or the next run resets the stage.

use super::HandlerFuture;
use crate::interpreter::context::ExecutionContext;
use crate::interpreter::program::Block;
use crate::interpreter::tween::{SPEECH_DURATION, VISIBILITY_DURATION};
use crate::types::{ActorPatch, Speech};

pub fn say<'a>(ctx: &'a ExecutionContext, block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(async move {
        ctx.patch(ActorPatch::speech(Speech::Say(message(block))));
        ctx.pause(SPEECH_DURATION).await
    })
}

pub fn think<'a>(ctx: &'a ExecutionContext, block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(async move {
        ctx.patch(ActorPatch::speech(Speech::Think(message(block))));
        ctx.pause(SPEECH_DURATION).await
    })
}

pub fn show<'a>(ctx: &'a ExecutionContext, _block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(async move {
        ctx.patch(ActorPatch::visible(true));
        ctx.pause(VISIBILITY_DURATION).await
    })
}

pub fn hide<'a>(ctx: &'a ExecutionContext, _block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(async move {
        ctx.patch(ActorPatch::visible(false));
        ctx.pause(VISIBILITY_DURATION).await
    })
}

fn message(block: &Block) -> String {
    block.text("message").unwrap_or_default()
}
