//! Program model
//!
//! A program is a set of blocks addressable by id. Chains are formed by
//! following `next`; container blocks (`repeatCount`, `repeatForever`) hold
//! the ids of their body chains in `children`. Blocks may be declared at the
//! top level or nested inside the container that uses them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::Result;

pub type BlockId = String;

/* ===================== Operation Kinds ===================== */

/// Tag identifying what a block does
///
/// Unrecognized tags survive as `Custom` so a registered handler (or the
/// unknown-operation fallback) can deal with them at run time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationKind {
    Start,
    MoveSteps,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    TurnRight,
    TurnLeft,
    GotoXy,
    Say,
    Think,
    Show,
    Hide,
    Wait,
    RepeatCount,
    RepeatForever,
    Custom(String),
}

impl OperationKind {
    pub fn as_str(&self) -> &str {
        match self {
            OperationKind::Start => "start",
            OperationKind::MoveSteps => "moveSteps",
            OperationKind::MoveUp => "moveUp",
            OperationKind::MoveDown => "moveDown",
            OperationKind::MoveLeft => "moveLeft",
            OperationKind::MoveRight => "moveRight",
            OperationKind::TurnRight => "turnRight",
            OperationKind::TurnLeft => "turnLeft",
            OperationKind::GotoXy => "gotoXY",
            OperationKind::Say => "say",
            OperationKind::Think => "think",
            OperationKind::Show => "show",
            OperationKind::Hide => "hide",
            OperationKind::Wait => "wait",
            OperationKind::RepeatCount => "repeatCount",
            OperationKind::RepeatForever => "repeatForever",
            OperationKind::Custom(name) => name,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, OperationKind::RepeatCount | OperationKind::RepeatForever)
    }
}

impl From<&str> for OperationKind {
    fn from(tag: &str) -> Self {
        match tag {
            "start" => OperationKind::Start,
            "moveSteps" => OperationKind::MoveSteps,
            "moveUp" => OperationKind::MoveUp,
            "moveDown" => OperationKind::MoveDown,
            "moveLeft" => OperationKind::MoveLeft,
            "moveRight" => OperationKind::MoveRight,
            "turnRight" => OperationKind::TurnRight,
            "turnLeft" => OperationKind::TurnLeft,
            "gotoXY" => OperationKind::GotoXy,
            "say" => OperationKind::Say,
            "think" => OperationKind::Think,
            "show" => OperationKind::Show,
            "hide" => OperationKind::Hide,
            "wait" => OperationKind::Wait,
            "repeatCount" => OperationKind::RepeatCount,
            "repeatForever" => OperationKind::RepeatForever,
            other => OperationKind::Custom(other.to_string()),
        }
    }
}

impl From<String> for OperationKind {
    fn from(tag: String) -> Self {
        OperationKind::from(tag.as_str())
    }
}

impl From<OperationKind> for String {
    fn from(kind: OperationKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/* ===================== Parameters ===================== */

/// Scalar block parameter
///
/// Editors frequently send numbers as strings, so numeric access parses text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        let n = match self {
            ParamValue::Number(n) => Some(*n),
            ParamValue::Text(s) => s.trim().parse::<f64>().ok(),
        };
        n.filter(|n| n.is_finite())
    }

    pub fn as_text(&self) -> String {
        match self {
            ParamValue::Number(n) => n.to_string(),
            ParamValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        ParamValue::Number(n)
    }
}

impl From<i32> for ParamValue {
    fn from(n: i32) -> Self {
        ParamValue::Number(n as f64)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

/* ===================== Blocks ===================== */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(alias = "kind")]
    pub operation_kind: OperationKind,
    #[serde(default)]
    pub parameters: HashMap<String, ParamValue>,
    /// Heads of the body chain(s); only meaningful for containers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<BlockId>,
    /// Blocks declared inside this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: impl Into<OperationKind>) -> Self {
        Self {
            id: id.into(),
            operation_kind: kind.into(),
            parameters: HashMap::new(),
            children: Vec::new(),
            next: None,
            blocks: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn then(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn child(mut self, head: impl Into<String>) -> Self {
        self.children.push(head.into());
        self
    }

    pub fn nest(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).and_then(ParamValue::as_f64)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.parameters.get(name).map(ParamValue::as_text)
    }

    /// Copy of this block without its nested declarations
    fn shallow(&self) -> Block {
        Block {
            id: self.id.clone(),
            operation_kind: self.operation_kind.clone(),
            parameters: self.parameters.clone(),
            children: self.children.clone(),
            next: self.next.clone(),
            blocks: Vec::new(),
        }
    }
}

/* ===================== Program ===================== */

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProgramDef {
    #[serde(default)]
    blocks: Vec<Block>,
}

/// Read-only block graph for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ProgramDef", into = "ProgramDef")]
pub struct Program {
    roots: Vec<Block>,
    index: HashMap<BlockId, Block>,
}

impl Program {
    pub fn new(blocks: Vec<Block>) -> Self {
        let mut index = HashMap::new();
        for block in &blocks {
            index_block(&mut index, block);
        }
        Self { roots: blocks, index }
    }

    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Top-level blocks in declaration order
    pub fn blocks(&self) -> &[Block] {
        &self.roots
    }

    /// Number of addressable blocks, nested ones included
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Look a block up anywhere in the program, nested bodies included
    pub fn find_by_id(&self, id: &str) -> Option<&Block> {
        self.index.get(id)
    }

    /// Top-level `start` blocks, in declaration order
    pub fn start_blocks(&self) -> Vec<&Block> {
        self.roots
            .iter()
            .filter(|b| b.operation_kind == OperationKind::Start)
            .collect()
    }

    /// The block after `block` in its chain; `None` when absent or dangling
    pub fn next(&self, block: &Block) -> Option<&Block> {
        block.next.as_deref().and_then(|id| self.find_by_id(id))
    }
}

/// First declaration of an id wins
fn index_block(index: &mut HashMap<BlockId, Block>, block: &Block) {
    if !index.contains_key(&block.id) {
        index.insert(block.id.clone(), block.shallow());
    } else {
        tracing::debug!(block = %block.id, "duplicate block id; keeping first declaration");
    }
    for nested in &block.blocks {
        index_block(index, nested);
    }
}

impl From<ProgramDef> for Program {
    fn from(def: ProgramDef) -> Self {
        Program::new(def.blocks)
    }
}

impl From<Program> for ProgramDef {
    fn from(program: Program) -> Self {
        ProgramDef {
            blocks: program.roots,
        }
    }
}
