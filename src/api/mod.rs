pub mod traffic;

pub use traffic::{router, run_query, serve, ProxyState};
