//! Operation registry and built-in operations
//!
//! Each operation kind maps to an `OperationHandler`. The chain walker never
//! matches on kinds itself (containers aside), so new kinds are added by
//! registering a handler rather than editing the dispatcher.

pub mod control;
pub mod looks;
pub mod motion;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::warn;

use super::context::ExecutionContext;
use super::events::EngineEvent;
use super::program::Block;
use super::tween::{Outcome, UNKNOWN_OPERATION_DURATION};

/* ===================== Handler Types ===================== */

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Outcome> + Send + 'a>>;

pub trait OperationHandler: Send + Sync {
    fn execute<'a>(&'a self, ctx: &'a ExecutionContext, block: &'a Block) -> HandlerFuture<'a>;
}

impl<F> OperationHandler for F
where
    F: for<'a> Fn(&'a ExecutionContext, &'a Block) -> HandlerFuture<'a> + Send + Sync,
{
    fn execute<'a>(&'a self, ctx: &'a ExecutionContext, block: &'a Block) -> HandlerFuture<'a> {
        self(ctx, block)
    }
}

/* ===================== Registry ===================== */

#[derive(Clone, Default)]
pub struct OperationRegistry {
    handlers: HashMap<String, Arc<dyn OperationHandler>>,
}

impl OperationRegistry {
    /// An empty registry; every kind falls back to the unknown-operation delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in operation
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register("start", control::structural);
        registry.register("repeatCount", control::structural);
        registry.register("repeatForever", control::structural);
        registry.register("wait", control::wait);

        registry.register("moveUp", motion::move_up);
        registry.register("moveDown", motion::move_down);
        registry.register("moveLeft", motion::move_left);
        registry.register("moveRight", motion::move_right);
        registry.register("moveSteps", motion::move_steps);
        registry.register("turnRight", motion::turn_right);
        registry.register("turnLeft", motion::turn_left);
        registry.register("gotoXY", motion::goto_xy);

        registry.register("say", looks::say);
        registry.register("think", looks::think);
        registry.register("show", looks::show);
        registry.register("hide", looks::hide);

        registry
    }

    /// Register (or replace) the handler for a kind
    pub fn register<H>(&mut self, kind: impl Into<String>, handler: H) -> &mut Self
    where
        H: OperationHandler + 'static,
    {
        self.handlers.insert(kind.into(), Arc::new(handler));
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Execute one block's own operation (not its body)
    pub async fn dispatch(&self, ctx: &ExecutionContext, block: &Block) -> Outcome {
        let kind = block.operation_kind.as_str();
        match self.handlers.get(kind) {
            Some(handler) => handler.execute(ctx, block).await,
            None => {
                warn!(block = %block.id, kind, "unknown operation; skipping");
                ctx.emit(EngineEvent::UnknownOperation {
                    block: block.id.clone(),
                    kind: kind.to_string(),
                });
                ctx.pause(UNKNOWN_OPERATION_DURATION).await
            }
        }
    }
}
