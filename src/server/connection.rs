// Connection handling module
// Accepts a single TCP connection and serves it with the dispatcher

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::dispatcher::Dispatcher;
use crate::logger;

/// Accept a connection unless the connection limit is reached.
///
/// Returns `false` if the connection was rejected.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    dispatcher: &Rc<Dispatcher>,
    conn_counter: &Arc<AtomicUsize>,
) -> bool {
    // Increment first, then check, so concurrent accepts cannot overshoot
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = dispatcher.config().performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return false;
        }
    }

    handle_connection(
        stream,
        peer_addr,
        Rc::clone(dispatcher),
        Arc::clone(conn_counter),
    );
    true
}

/// Serve one connection on the current `LocalSet`.
///
/// The counter is decremented when the connection closes.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    dispatcher: Rc<Dispatcher>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(dispatcher.config().performance.keep_alive);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let dispatcher = Rc::clone(&dispatcher);
                async move {
                    Ok::<_, Infallible>(dispatcher.handle(req, Some(peer_addr)).await)
                }
            }),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
