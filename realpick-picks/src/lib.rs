//! RealPick episode pick reconciliation
//!
//! Headless state for the couple-matching board of a multi-episode mission:
//! - Local drafts per episode, mirrored to client storage
//! - A submission ledger that freezes submitted episodes
//! - Episode selection driving single-edit and multi-view display
//! - Drag-to-connect gestures resolved against a bounds registry
//! - Verified submission through a pluggable vote gateway
//! - Ranked cross-user results refreshed on submission events
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 PickSession                  │
//! │  selection ─▶ displayed connections          │
//! │  drag ─▶ DraftStore ─▶ submit ─▶ Ledger       │
//! └──────┬──────────────┬───────────────┬────────┘
//!        ▼              ▼               ▼
//! ┌─────────────┐ ┌─────────────┐ ┌─────────────┐
//! │ VoteGateway │ │ClientStorage│ │ VoteEvents  │──▶ AggregationView
//! │ (REST/Mem)  │ │ (key/value) │ │ (broadcast) │
//! └─────────────┘ └─────────────┘ └─────────────┘
//! ```

pub mod aggregation;
pub mod board;
pub mod config;
pub mod draft;
pub mod drag;
pub mod error;
pub mod events;
pub mod gateway;
pub mod geometry;
pub mod identity;
pub mod ledger;
pub mod selection;
pub mod session;
pub mod storage;

// Re-export main types for convenience
pub use aggregation::{AggregationView, RankedResults, ResultsScope};
pub use board::{connection_lines, group_connections, GroupedPair, PairLine};
pub use config::PickConfig;
pub use draft::{ConnectOutcome, DraftStore};
pub use drag::{DragController, DragState, PointerKind};
pub use error::{ErrorKind, PickError};
pub use events::{VoteEvent, VoteEvents};
pub use gateway::{GatewayError, MemoryGateway, RestGateway, RestGatewayConfig, VoteGateway, WriteMode};
pub use geometry::{BoundsRegistry, Point, Rect, Segment};
pub use identity::{Identity, SessionIdentity};
pub use ledger::SubmissionLedger;
pub use selection::{EpisodeSelection, SelectionMode};
pub use session::{Collaborators, DropOutcome, LoadReport, PickSession, SubmitReceipt};
pub use storage::{ClientStorage, MemoryStorage, StorageError, StorageKeys};

pub use realpick_model as model;
