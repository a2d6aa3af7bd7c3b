use std::net::TcpListener;

pub use httpmock::{Method::POST, MockServer};

/// A base URL on which nothing is listening.
///
/// The port is reserved by binding to it, and released again before
/// returning, so connecting to it is refused.
#[must_use]
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local address").port();
    drop(listener);

    format!("http://127.0.0.1:{port}")
}
