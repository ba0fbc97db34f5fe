//! `kasir-pos`: the cashier terminal.
//!
//! Wires configuration, a [`Gateway`] and the domain crates into a
//! [`Terminal`]. The `kasir` binary drives it from the command line.

use std::sync::Arc;

use secrecy::SecretString;

use kasir_auth::Role;
use kasir_gateway::{Gateway, GatewayError, InMemoryGateway, RestGateway};

pub mod config;
pub mod terminal;

pub use config::{ConfigError, GatewayConfig, PosConfig};
pub use terminal::{CheckoutOutcome, History, Terminal, TerminalError, TerminalSettings};

/// Staff accounts seeded into the in-memory backend: (email, password, name, role).
pub const DEMO_STAFF: [(&str, &str, &str, Role); 2] = [
    ("admin@kasir.local", "admin123", "Admin Toko", Role::Admin),
    ("kasir@kasir.local", "kasir123", "Kasir Satu", Role::Cashier),
];

/// Build the backend described by `config`.
pub fn connect(config: &PosConfig) -> Result<Arc<dyn Gateway>, GatewayError> {
    match &config.gateway {
        GatewayConfig::Rest { url, anon_key } => {
            tracing::info!(url = %url, "using hosted backend");
            Ok(Arc::new(RestGateway::new(url.clone(), anon_key.clone())?))
        }
        GatewayConfig::InMemory => {
            tracing::info!("using in-memory demo backend");
            Ok(Arc::new(demo_gateway(config.utc_offset)))
        }
    }
}

/// In-memory backend with the demo menu and [`DEMO_STAFF`].
pub fn demo_gateway(offset: chrono::FixedOffset) -> InMemoryGateway {
    DEMO_STAFF.iter().fold(
        InMemoryGateway::new(offset).with_demo_menu(),
        |gateway, (email, password, name, role)| {
            gateway.with_staff(email, SecretString::from(password.to_string()), name, *role)
        },
    )
}

impl TerminalSettings {
    pub fn from_config(config: &PosConfig) -> Self {
        Self {
            viewport: config.viewport(),
            offset: config.utc_offset,
            shop: config.shop.clone(),
        }
    }
}

/// Connect and build a terminal in one step.
pub async fn open_terminal(config: &PosConfig) -> Result<Terminal, TerminalError> {
    let gateway = connect(config)?;
    let mut terminal = Terminal::new(gateway, TerminalSettings::from_config(config));
    terminal.restore().await?;
    Ok(terminal)
}
