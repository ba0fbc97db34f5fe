//! `kasir-gateway`: the remote backend boundary.
//!
//! [`Gateway`] is the single seam between the terminal and persistence:
//! [`RestGateway`] talks to the hosted backend, [`InMemoryGateway`] serves
//! demos and tests from process memory.

pub mod error;
pub mod gateway;
pub mod memory;
pub mod rest;
pub mod seed;

pub use error::GatewayError;
pub use gateway::Gateway;
pub use memory::InMemoryGateway;
pub use rest::RestGateway;
pub use seed::demo_menu;
