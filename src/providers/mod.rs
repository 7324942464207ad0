//! Contract client and wallet implementations

pub mod gateway_client;
pub mod memory_client;
pub mod wallet;

// Re-export for convenience
pub use gateway_client::{GatewayClient, GatewayConfig};
pub use memory_client::MemoryContractClient;
pub use wallet::{DaemonWallet, MemoryWallet};
