//! `epi-agent` — index-stable agent storage for the `rust_epi` framework.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                 |
//! |-------------|----------------------------------------------------------|
//! | [`mask`]    | `Mask` handle, `MaskLayout` construction-time registry   |
//! | [`arena`]   | `AgentArena<T>` slot arena, `AgentHandle`                |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `parallel` | `parallel_masked_apply` runs on Rayon's thread pool.     |
//! | `serde`    | Propagates serde derives to `epi-core` types.            |
//!
//! The arena guarantees that a slot's *index* may be recycled after a free
//! while the agent's *permanent identifier* (held inside `T`) never is;
//! generation counters catch accidental use of a stale index.

pub mod arena;
pub mod mask;

#[cfg(test)]
mod tests;

pub use arena::{AgentArena, AgentHandle};
pub use mask::{Mask, MaskLayout};
