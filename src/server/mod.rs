// Server module entry point
// Listener setup, connection serving and shutdown

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is exposed as `server_loop`
#[path = "loop.rs"]
pub mod server_loop;

use std::sync::Arc;

use crate::config::AppState;
use crate::error::Result;
use crate::logger;

pub use listener::create_listener;
pub use server_loop::start_server_loop;

/// Bind the configured address and serve until SIGINT/SIGTERM
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let addr = state.config.get_socket_addr()?;
    let listener = create_listener(addr)?;
    let bound = listener.local_addr()?;

    logger::log_server_start(&bound, &state.config, &state.plan);
    signal::start_signal_handler(Arc::clone(&state.shutdown))?;

    // Connections run as local tasks
    let local = tokio::task::LocalSet::new();
    local.run_until(start_server_loop(listener, state)).await;
    Ok(())
}
