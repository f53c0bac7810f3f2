//! Nonlinear conversation memory.
//!
//! A thread is stored as a directed graph rather than a linear log:
//!
//! ```text
//!            ┌──────────────┐
//!            │ user: prompt │  ◄── current context
//!            └──────┬───────┘
//!          reply    │    reply
//!        ┌──────────┴──────────┐
//!        ▼                     ▼
//! ┌──────────────┐      ┌──────────────┐
//! │ theorist     │      │ tutor        │
//! └──────────────┘      └──────────────┘
//! ```
//!
//! Several characters can answer the same prompt in parallel branches, a
//! linear view is derived on demand, and paths between any two nodes can be
//! queried.

mod document;
mod edge;
mod node;
mod thread;

pub use document::{NodeMap, ThreadDocument};
pub use edge::{EdgeType, MemoryEdge, DEFAULT_WEIGHT};
pub use node::{MemoryNode, NodeDecodeError, NodeKind, Role};
pub use thread::{CrochetThread, LinearMessage};
