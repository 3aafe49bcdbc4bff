//! Errors raised while building or rendering a graph.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can go wrong while constructing a graph or handing its
/// output to a sink.
///
/// Graph-shape problems are reported when the graph is built, never at tick
/// time. An idle node is not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("nothing found at `{0}`")]
    NotFound(String),
    #[error("`{0}` is already used in this patch")]
    DuplicateIdentifier(String),
    #[error("control `{0}` already exists in this patch")]
    DuplicateControl(String),
    #[error("invalid identifier `{0}`: identifiers are non-empty and contain no '.'")]
    InvalidIdentifier(String),
    #[error("node id {0} does not belong to this patch")]
    InvalidNode(usize),
    #[error("`{node}` has {available} inputs, cannot connect to input {index}")]
    InputOutOfRange {
        node: String,
        index: usize,
        available: usize,
    },
    #[error("`{node}` has {available} outputs, cannot connect from output {index}")]
    OutputOutOfRange {
        node: String,
        index: usize,
        available: usize,
    },
    #[error("`{node}` accepts {available} control values, cannot bind index {index}")]
    ControlIndexOutOfRange {
        node: String,
        index: usize,
        available: usize,
    },
    #[error("`{0}` is not a patch")]
    NotAPatch(String),
    #[error("the input pass-through of a patch mirrors the patch inputs and cannot be connected to")]
    ConnectToInlet,
    #[error("sub-patch buffer size {found} does not match the parent's {expected}")]
    BufferSizeMismatch { expected: usize, found: usize },
    #[error("sink needs room for {needed} samples but only {available} are free")]
    SinkOverflow { needed: usize, available: usize },
}
