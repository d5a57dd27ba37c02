// Server module entry
// Listener creation, connection serving, readiness gating and shutdown

pub mod connection;
pub mod listener;
pub mod readiness;
pub mod signal;

// `loop` is a keyword, so the module is exposed as `server_loop`
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_listener;
pub use readiness::Readiness;
pub use server_loop::start_server_loop;
pub use signal::{start_signal_handler, SignalHandler};
