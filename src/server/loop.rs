// Server loop module
// Waits for readiness, then accepts connections until shutdown

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::readiness::Readiness;
use super::signal::SignalHandler;
use crate::dispatcher::Dispatcher;
use crate::logger;

/// How long open connections may keep running after shutdown is requested
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Accept loop
///
/// Nothing is accepted before `readiness` flips, so requests never observe
/// a partially loaded route table. Returns once shutdown is requested and
/// open connections have closed or [`DRAIN_TIMEOUT`] has passed.
pub async fn start_server_loop(
    listener: TcpListener,
    dispatcher: Rc<Dispatcher>,
    readiness: Readiness,
    signals: Arc<SignalHandler>,
) {
    serve(listener, dispatcher, readiness, signals, DRAIN_TIMEOUT).await;
}

async fn serve(
    listener: TcpListener,
    dispatcher: Rc<Dispatcher>,
    readiness: Readiness,
    signals: Arc<SignalHandler>,
    drain_timeout: Duration,
) {
    tokio::select! {
        () = readiness.wait() => {}
        () = signals.shutdown.notified() => return,
    }

    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &dispatcher, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = signals.shutdown.notified() => {
                logger::log_info("Server stopped accepting connections");
                break;
            }
        }
    }

    drop(listener);
    drain(&active_connections, drain_timeout).await;
}

/// Wait for connection tasks on this `LocalSet` to finish
async fn drain(active_connections: &AtomicUsize, timeout: Duration) {
    let open = active_connections.load(Ordering::SeqCst);
    if open == 0 {
        return;
    }
    logger::log_info(&format!("Waiting for {open} open connection(s) to finish"));

    let closed = tokio::time::timeout(timeout, async {
        while active_connections.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(DRAIN_POLL).await;
        }
    })
    .await;

    if closed.is_err() {
        logger::log_warning(&format!(
            "Shutdown timeout: {} connection(s) still open",
            active_connections.load(Ordering::SeqCst)
        ));
    }
}
