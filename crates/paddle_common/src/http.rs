// --- File: crates/paddle_common/src/http.rs ---

pub mod client;
