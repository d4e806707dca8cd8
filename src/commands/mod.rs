pub mod encode;
pub mod pending;
pub mod stop_bridge;
pub mod transfer_tokens;
