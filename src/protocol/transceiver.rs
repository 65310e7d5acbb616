//! Blocking HTTP transceiver. Owns the connection to the robot controller,
//! sends one formatted request at a time, and hands each parsed reply to a
//! mailbox shared with the consuming side.

use std::time::Duration;

use log::debug;

use super::mailbox::Mailbox;
use super::response::ResponsePayload;
use crate::error::ClientResult;

/// One-request-at-a-time HTTP GET transceiver.
///
/// The path passed to [`Transceiver::send`] is used verbatim; callers are
/// responsible for URL-encoding any embedded parameter values. Network
/// failures propagate immediately and are never retried; reconnecting is
/// the owning client's job (drop and reopen).
pub struct Transceiver {
    base_url: String,
    http: reqwest::blocking::Client,
    mailbox: Mailbox<ResponsePayload>,
}

impl Transceiver {
    /// Window [`Transceiver::get_response`] waits before reporting the
    /// "no response" sentinel. The controller can silently drop a
    /// connection, so the consuming side must never hang forever.
    pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);
    const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn open(base_url: &str) -> ClientResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Self::HTTP_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            mailbox: Mailbox::new(),
        })
    }

    /// Issue one GET of `path` against the held connection, read the full
    /// reply body, parse it, and deposit the payload into the mailbox.
    ///
    /// Either the payload is deposited and signaled exactly once, or this
    /// fails and nothing is deposited; a parse failure never leaves the
    /// mailbox half-updated.
    pub fn send(&self, path: &str) -> ClientResult<()> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let body = self.http.get(&url).send()?.bytes()?;
        let payload = ResponsePayload::parse(&body)?;
        self.mailbox.put(payload);
        Ok(())
    }

    /// Block until the reply for the previous `send` has been deposited,
    /// up to [`Transceiver::RESPONSE_TIMEOUT`]. `None` means no response
    /// arrived in the window; callers must check for it explicitly.
    pub fn get_response(&self) -> Option<ResponsePayload> {
        self.mailbox.take(Self::RESPONSE_TIMEOUT)
    }

    /// Handle to the response mailbox, for consumers running in a
    /// different thread than the sender.
    pub fn mailbox(&self) -> Mailbox<ResponsePayload> {
        self.mailbox.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve exactly one canned HTTP response on a loopback port and report
    /// the request line of whatever arrives.
    fn one_shot_server(body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 2048];
                let n = stream.read(&mut buf).unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let first_line = request.lines().next().unwrap_or("").to_string();
                let _ = tx.send(first_line);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        (format!("http://{}", addr), rx)
    }

    const REPLY: &str = r#"{"Time":"t","Status":{"Status":"Idle"},"LastID":7,"ErrorCode":0,"ErrorMessage":"NA","Result":["Home","Waste"]}"#;

    #[test]
    fn test_send_deposits_parsed_reply() {
        let (base_url, requests) = one_shot_server(REPLY);
        let transceiver = Transceiver::open(&base_url).unwrap();

        transceiver.send("/DoD/get/PositionNames").unwrap();
        let request_line = requests.recv().unwrap();
        assert_eq!(request_line, "GET /DoD/get/PositionNames HTTP/1.1");

        let payload = transceiver.get_response().expect("reply was deposited");
        assert_eq!(payload.last_id, 7);
        assert_eq!(payload.result, serde_json::json!(["Home", "Waste"]));
    }

    #[test]
    fn test_malformed_body_deposits_nothing() {
        let (base_url, _requests) = one_shot_server("<html>robot says what</html>");
        let transceiver = Transceiver::open(&base_url).unwrap();

        let result = transceiver.send("/DoD/get/Status");
        assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
        assert!(
            transceiver
                .mailbox
                .take(Duration::from_millis(50))
                .is_none()
        );
    }

    #[test]
    fn test_connection_failure_propagates() {
        // Bind then drop to get a port nothing is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transceiver = Transceiver::open(&format!("http://{}", addr)).unwrap();
        let result = transceiver.send("/DoD/get/Status");
        assert!(matches!(result, Err(ClientError::Connection(_))));
    }
}
