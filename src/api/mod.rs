//! HTTP gateway and wire types for the journal backend.

mod gateway;
mod types;

pub use gateway::ApiGateway;
pub use types::*;
