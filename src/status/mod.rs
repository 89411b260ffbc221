mod handlers;
mod server;
#[cfg(test)]
mod tests;

pub use handlers::{HealthSnapshot, LIVENESS_MESSAGE};
pub use server::{ServerState, StatusServer};
