//! Random Seed Generator
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SEED GENERATOR                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  sequencer.rs - next / fulfill / reveal state machine       │
//! │  store.rs     - Write-once input and secret seed history    │
//! │  admin.rs     - Key / oracle rotation, pause control        │
//! │  access.rs    - Owner and executor roles                    │
//! │  events.rs    - Emitted notifications                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod access;
pub mod admin;
pub mod events;
pub mod sequencer;
pub mod store;

pub use access::{AccessControl, Role};
pub use events::SeedEvent;
pub use sequencer::{GeneratorParams, PendingRequest, RandomSeedGenerator, Sequences};
pub use store::SeedStore;
