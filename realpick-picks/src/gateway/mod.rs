//! Remote vote gateway.
//!
//! The [`VoteGateway`] trait is the only seam between a pick session and the
//! backend. [`RestGateway`] talks to a PostgREST vote table; [`MemoryGateway`]
//! keeps votes in process and can inject latency and write failures.

pub mod memory;
pub mod rest;
pub mod traits;

pub use memory::{MemoryGateway, WriteMode};
pub use rest::{RestGateway, RestGatewayConfig};
pub use traits::{GatewayError, GatewayResult, VoteGateway};
