//! Chain execution
//!
//! ## Function Organization
//! 1. run_chain() - walks a chain along `next`, executing each block
//! 2. run_body() - drains a container's body chains once
//!
//! Containers run their body after their own operation and before moving on
//! to their `next`. A missing block ends the chain. Cycles are not detected;
//! a cyclic chain runs until the run is stopped.

use std::future::Future;
use std::pin::Pin;
use tracing::debug;

use super::context::ExecutionContext;
use super::program::{Block, OperationKind, Program};
use super::stdlib::OperationRegistry;
use super::tween::Outcome;

/// Iterations of a `repeatForever` body. Not configurable.
pub const FOREVER_ITERATIONS: u64 = 3;
/// Iterations of a `repeatCount` without a usable `times`
pub const DEFAULT_REPEAT_TIMES: f64 = 10.0;

/* ===================== Public API ===================== */

/// Execute the chain starting at `head` to completion or cancellation
pub async fn run_chain(
    registry: &OperationRegistry,
    program: &Program,
    ctx: &ExecutionContext,
    head: Option<&Block>,
) -> Outcome {
    let mut current = head;

    while let Some(block) = current {
        if ctx.is_cancelled() {
            return Outcome::Cancelled;
        }

        debug!(block = %block.id, kind = %block.operation_kind, actor = ?ctx.owner(), "executing block");
        ctx.record_operation();

        if registry.dispatch(ctx, block).await.is_cancelled() {
            return Outcome::Cancelled;
        }

        for _ in 0..iterations(block) {
            if ctx.is_cancelled() || run_body(registry, program, ctx, block).await.is_cancelled() {
                return Outcome::Cancelled;
            }
        }

        current = program.next(block);
    }

    Outcome::Completed
}

/// How many times a block's body runs: zero for non-containers
pub fn iterations(block: &Block) -> u64 {
    match block.operation_kind {
        OperationKind::RepeatCount => {
            let times = block.number("times").unwrap_or(DEFAULT_REPEAT_TIMES).round();
            if times > 0.0 {
                times as u64
            } else {
                0
            }
        }
        OperationKind::RepeatForever => FOREVER_ITERATIONS,
        _ => 0,
    }
}

/* ===================== Bodies ===================== */

/// Drain every body chain of `container` once, in order
///
/// Boxed because bodies recurse back into `run_chain`.
fn run_body<'a>(
    registry: &'a OperationRegistry,
    program: &'a Program,
    ctx: &'a ExecutionContext,
    container: &'a Block,
) -> Pin<Box<dyn Future<Output = Outcome> + Send + 'a>> {
    Box::pin(async move {
        for head in &container.children {
            let outcome = run_chain(registry, program, ctx, program.find_by_id(head)).await;
            if outcome.is_cancelled() {
                return Outcome::Cancelled;
            }
        }
        Outcome::Completed
    })
}
