//! Motion operations: nudges, steps, turns and goto

use super::HandlerFuture;
use crate::interpreter::context::ExecutionContext;
use crate::interpreter::program::Block;
use crate::interpreter::tween::{lerp, Outcome, MOVE_DURATION, TURN_DURATION};
use crate::types::{ActorPatch, Position};

/// Offset applied by `moveUp`/`moveDown`/`moveLeft`/`moveRight`
pub const NUDGE_DISTANCE: f64 = 50.0;
/// Stage units per step of `moveSteps`
pub const STEP_SIZE: f64 = 20.0;
/// `moveSteps` keeps both axes within `[-STAGE_LIMIT, STAGE_LIMIT]`
pub const STAGE_LIMIT: f64 = 150.0;
/// `gotoXY` takes grid coordinates in `[-GRID_LIMIT, GRID_LIMIT]`
pub const GRID_LIMIT: f64 = 15.0;
pub const GRID_SCALE: f64 = 10.0;
pub const DEFAULT_TURN_DEGREES: f64 = 15.0;
pub const DEFAULT_STEPS: f64 = 10.0;

pub fn move_up<'a>(ctx: &'a ExecutionContext, _block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(nudge(ctx, 0.0, NUDGE_DISTANCE))
}

pub fn move_down<'a>(ctx: &'a ExecutionContext, _block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(nudge(ctx, 0.0, -NUDGE_DISTANCE))
}

pub fn move_left<'a>(ctx: &'a ExecutionContext, _block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(nudge(ctx, -NUDGE_DISTANCE, 0.0))
}

pub fn move_right<'a>(ctx: &'a ExecutionContext, _block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(nudge(ctx, NUDGE_DISTANCE, 0.0))
}

/// Move along the current heading. Heading 0 decreases the model's `y`;
/// the renderer flips the axis so this reads as "up" on screen.
pub fn move_steps<'a>(ctx: &'a ExecutionContext, block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(async move {
        let Some(actor) = ctx.actor() else {
            return ctx.pause(MOVE_DURATION).await;
        };

        let distance = block.number("steps").unwrap_or(DEFAULT_STEPS) * STEP_SIZE;
        let theta = (actor.heading - 90.0).to_radians();
        let from = actor.position;
        let to = Position::new(
            step_axis(from.x, distance * theta.cos()),
            step_axis(from.y, distance * theta.sin()),
        );

        glide(ctx, from, to).await
    })
}

pub fn turn_right<'a>(ctx: &'a ExecutionContext, block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(turn(ctx, block, 1.0))
}

pub fn turn_left<'a>(ctx: &'a ExecutionContext, block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(turn(ctx, block, -1.0))
}

/// Glide to a grid cell: each coordinate is rounded, clamped to the grid, then scaled
pub fn goto_xy<'a>(ctx: &'a ExecutionContext, block: &'a Block) -> HandlerFuture<'a> {
    Box::pin(async move {
        let Some(actor) = ctx.actor() else {
            return ctx.pause(MOVE_DURATION).await;
        };

        let to = Position::new(
            grid(block.number("x").unwrap_or(0.0)),
            grid(block.number("y").unwrap_or(0.0)),
        );

        glide(ctx, actor.position, to).await
    })
}

/* ===================== Helpers ===================== */

/// Halves round toward positive infinity: -2.5 -> -2, 2.5 -> 3
fn grid(raw: f64) -> f64 {
    (raw + 0.5).floor().clamp(-GRID_LIMIT, GRID_LIMIT) * GRID_SCALE
}

/// Offset one axis and clamp it to the stage; an undefined result
/// (infinite distance along a zero component) leaves the axis in place
fn step_axis(from: f64, offset: f64) -> f64 {
    let to = from + offset;
    if to.is_nan() {
        from
    } else {
        to.clamp(-STAGE_LIMIT, STAGE_LIMIT)
    }
}

async fn nudge(ctx: &ExecutionContext, dx: f64, dy: f64) -> Outcome {
    let Some(actor) = ctx.actor() else {
        return ctx.pause(MOVE_DURATION).await;
    };
    let from = actor.position;
    glide(ctx, from, Position::new(from.x + dx, from.y + dy)).await
}

async fn glide(ctx: &ExecutionContext, from: Position, to: Position) -> Outcome {
    ctx.animate(MOVE_DURATION, |t| {
        ActorPatch::position(Position::new(lerp(from.x, to.x, t), lerp(from.y, to.y, t)))
    })
    .await
}

/// Headings are never wrapped; repeated turns accumulate past ±360
async fn turn(ctx: &ExecutionContext, block: &Block, sign: f64) -> Outcome {
    let Some(actor) = ctx.actor() else {
        return ctx.pause(TURN_DURATION).await;
    };

    let degrees = block.number("degrees").unwrap_or(DEFAULT_TURN_DEGREES);
    let from = actor.heading;
    let to = from + sign * degrees;

    ctx.animate(TURN_DURATION, |t| ActorPatch::heading(lerp(from, to, t)))
        .await
}
