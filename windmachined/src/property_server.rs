//! Telemetry property server client
//!
//! Line protocol over TCP: the client sends `subscribe <property>\n` for each
//! property it wants, the server streams `Property <name> <type> <value>`
//! lines. Missing values arrive as `(null)`.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{tcp::OwnedWriteHalf, TcpStream};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use windmachine_plugin::parse_property_value;

/// One accepted value line.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyUpdate {
    pub name: String,
    /// `None` when the server reports no usable value
    pub value: Option<f64>,
}

/// Parse a `Property <name> <type> <value>` line.
///
/// Returns `None` for anything that is not a property line.
pub fn parse_property_line(line: &str) -> Option<PropertyUpdate> {
    let mut parts = line.trim().splitn(4, char::is_whitespace);
    if parts.next()? != "Property" {
        return None;
    }
    let name = parts.next().filter(|n| !n.is_empty())?;
    let _kind = parts.next()?;
    let value = parts.next()?;

    Some(PropertyUpdate {
        name: name.to_string(),
        value: parse_property_value(value),
    })
}

pub fn subscribe_command(property: &str) -> String {
    format!("subscribe {}\n", property)
}

enum SessionEnd {
    /// Server closed the connection or it failed
    Disconnected,
    /// The bridge went away
    Closed,
}

/// Reconnecting subscriber feeding property updates to the bridge.
#[derive(Debug, Clone)]
pub struct PropertyClient {
    addr: String,
    reconnect_delay: Duration,
}

impl PropertyClient {
    pub fn new(addr: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            addr: addr.into(),
            reconnect_delay,
        }
    }

    /// Connect, subscribe and forward updates until the bridge hangs up.
    ///
    /// Every (re)connection subscribes to the current property list, and
    /// properties added to the list while connected are subscribed on the fly.
    pub async fn run(
        self,
        mut subscriptions: watch::Receiver<Vec<String>>,
        updates: mpsc::Sender<PropertyUpdate>,
    ) {
        loop {
            match self.session(&mut subscriptions, &updates).await {
                Ok(SessionEnd::Closed) => return,
                Ok(SessionEnd::Disconnected) => {
                    info!("Connection to {} lost. Retrying...", self.addr)
                }
                Err(e) => warn!("Connection to {} failed: {}", self.addr, e),
            }
            if updates.is_closed() {
                return;
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn session(
        &self,
        subscriptions: &mut watch::Receiver<Vec<String>>,
        updates: &mpsc::Sender<PropertyUpdate>,
    ) -> std::io::Result<SessionEnd> {
        let stream = TcpStream::connect(&self.addr).await?;
        info!("Connected to property server at {}", self.addr);
        let (reader, mut writer) = stream.into_split();

        let mut subscribed: Vec<String> = Vec::new();
        let wanted = subscriptions.borrow_and_update().clone();
        subscribe_missing(&mut writer, &mut subscribed, &wanted).await?;

        let mut lines = BufReader::new(reader).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        return Ok(SessionEnd::Disconnected);
                    };
                    let Some(update) = parse_property_line(&line) else {
                        continue;
                    };
                    if updates.send(update).await.is_err() {
                        return Ok(SessionEnd::Closed);
                    }
                }
                changed = subscriptions.changed() => {
                    if changed.is_err() {
                        return Ok(SessionEnd::Closed);
                    }
                    let wanted = subscriptions.borrow_and_update().clone();
                    subscribe_missing(&mut writer, &mut subscribed, &wanted).await?;
                }
            }
        }
    }
}

async fn subscribe_missing(
    writer: &mut OwnedWriteHalf,
    subscribed: &mut Vec<String>,
    wanted: &[String],
) -> std::io::Result<()> {
    for property in wanted {
        if subscribed.contains(property) {
            continue;
        }
        writer
            .write_all(subscribe_command(property).as_bytes())
            .await?;
        debug!("Subscribed to: {}", property);
        subscribed.push(property.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_parse_valid_line() {
        let update = parse_property_line("Property ShakeItWindPlugin.OutputLeft double 42.5").unwrap();
        assert_eq!(update.name, "ShakeItWindPlugin.OutputLeft");
        assert_eq!(update.value, Some(42.5));
    }

    #[test]
    fn test_parse_null_value() {
        let update = parse_property_line("Property Game.Speed double (null)\r").unwrap();
        assert_eq!(update.value, None);
    }

    #[test]
    fn test_parse_malformed_lines() {
        assert!(parse_property_line("").is_none());
        assert!(parse_property_line("Hello SimHub").is_none());
        assert!(parse_property_line("Property OnlyName").is_none());
        assert!(parse_property_line("Property Name double").is_none());

        let text = parse_property_line("Property Car.Name string Some Car").unwrap();
        assert_eq!(text.name, "Car.Name");
        assert_eq!(text.value, None);
    }

    #[test]
    fn test_subscribe_command() {
        assert_eq!(subscribe_command("A.B"), "subscribe A.B\n");
    }

    async fn read_until(stream: &mut TcpStream, needle: &str) -> String {
        let mut received = String::new();
        let mut buf = [0u8; 256];
        while !received.contains(needle) {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed before sending {:?}", needle);
            received.push_str(std::str::from_utf8(&buf[..n]).unwrap());
        }
        received
    }

    #[tokio::test]
    async fn test_subscribes_and_forwards_updates() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (subs_tx, subs_rx) = watch::channel(vec!["A.Center".to_string()]);
        let (tx, mut rx) = mpsc::channel(16);
        let client = PropertyClient::new(addr.to_string(), Duration::from_millis(10));
        let task = tokio::spawn(client.run(subs_rx, tx));

        let (mut server, _) = listener.accept().await.unwrap();
        read_until(&mut server, "subscribe A.Center\n").await;

        server
            .write_all(b"Welcome\nProperty A.Center double 12.25\n")
            .await
            .unwrap();
        let update = rx.recv().await.unwrap();
        assert_eq!(update.name, "A.Center");
        assert_eq!(update.value, Some(12.25));

        subs_tx
            .send(vec!["A.Center".to_string(), "A.Left".to_string()])
            .unwrap();
        let received = read_until(&mut server, "subscribe A.Left\n").await;
        assert!(!received.contains("A.Center"));

        drop(rx);
        drop(subs_tx);
        server.write_all(b"Property A.Left double 1\n").await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_reconnects_and_resubscribes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (_subs_tx, subs_rx) = watch::channel(vec!["A.Center".to_string()]);
        let (tx, mut rx) = mpsc::channel(16);
        let client = PropertyClient::new(addr.to_string(), Duration::from_millis(10));
        tokio::spawn(client.run(subs_rx, tx));

        let (mut first, _) = listener.accept().await.unwrap();
        read_until(&mut first, "subscribe A.Center\n").await;
        drop(first);

        let (mut second, _) = listener.accept().await.unwrap();
        read_until(&mut second, "subscribe A.Center\n").await;
        second
            .write_all(b"Property A.Center double 7\n")
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap().value, Some(7.0));
    }
}
