//! Shared utilities for integration tests.

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use alertmanager_config_controller::assembler::{AlertmanagerValidator, Assembler};
use alertmanager_config_controller::config::{InstanceIdentity, ReloadConfig};
use alertmanager_config_controller::fragment::intent::ANNOTATION_ID;
use alertmanager_config_controller::fragment::Bundle;
use alertmanager_config_controller::lifecycle::ShutdownSignal;
use alertmanager_config_controller::reload::ReloadClient;
use alertmanager_config_controller::store::StoreSet;
use alertmanager_config_controller::Reconciler;

#[allow(dead_code)]
pub const TEMPLATE: &str = "global:\n  resolve_timeout: 5m\nroute:\n  receiver: default\n  group_by: [alertname]\n  routes:\n  {{ .Routes }}\nreceivers:\n- name: default\n{{ .Receivers }}\ninhibit_rules:\n{{ .InhibitRules }}\n";

/// A fake Alertmanager reload endpoint that counts requests.
pub struct MockReload {
    addr: SocketAddr,
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockReload {
    pub fn url(&self) -> String {
        format!("http://{}/-/reload", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Start a reload endpoint on an ephemeral port.
#[allow(dead_code)]
pub async fn start_reload_endpoint(status: u16, body: &'static str) -> MockReload {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    serve(listener, status, body)
}

/// Start a reload endpoint on a given address.
#[allow(dead_code)]
pub async fn start_reload_endpoint_at(
    addr: SocketAddr,
    status: u16,
    body: &'static str,
) -> MockReload {
    let listener = TcpListener::bind(addr).await.unwrap();
    serve(listener, status, body)
}

fn serve(listener: TcpListener, status: u16, body: &'static str) -> MockReload {
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let counter = counter.clone();
                    tokio::spawn(async move {
                        read_request(&mut socket).await;
                        counter.fetch_add(1, Ordering::SeqCst);
                        let status_text = match status {
                            200 => "200 OK",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "400 Bad Request",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockReload { addr, calls }
}

async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
}

/// An address nothing listens on.
#[allow(dead_code)]
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Reload settings pointing at `url` with a short retry interval.
#[allow(dead_code)]
pub fn reload_config(url: String) -> ReloadConfig {
    ReloadConfig {
        url,
        retry_interval_secs: 1,
        timeout_secs: 5,
    }
}

/// A controller wired to a temporary on-disk layout and a mock reload endpoint.
#[allow(dead_code)]
pub struct Harness {
    pub dir: TempDir,
    pub identity: InstanceIdentity,
    pub reload: MockReload,
    pub reconciler: Reconciler<ReloadClient>,
}

#[allow(dead_code)]
impl Harness {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let identity = InstanceIdentity {
            id: 1,
            key: "secret".into(),
            config_path: dir.path().join("alertmanager"),
            template_path: dir.path().join("template").join("alertmanager.tmpl"),
        };
        fs::create_dir_all(identity.template_dir()).unwrap();
        fs::write(&identity.template_path, TEMPLATE).unwrap();

        let reload = start_reload_endpoint(200, "").await;
        let client =
            ReloadClient::new(&reload_config(reload.url()), ShutdownSignal::never()).unwrap();
        let reconciler = Reconciler::new(
            identity.clone(),
            StoreSet::on_disk(&identity),
            Assembler::new(&identity, Arc::new(AlertmanagerValidator)),
            client,
        );

        Self {
            dir,
            identity,
            reload,
            reconciler,
        }
    }

    pub fn output(&self) -> Option<String> {
        fs::read_to_string(self.identity.output_path()).ok()
    }

    pub fn stored(&self, dir: &str, file: &str) -> Option<String> {
        fs::read_to_string(self.path(dir).join(file)).ok()
    }

    pub fn path(&self, dir: &str) -> PathBuf {
        self.identity.config_path.join(dir)
    }

    /// File names in a store directory; empty when it does not exist.
    pub fn listed(&self, dir: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.path(dir)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// A bundle addressed to instance `id` with one type flag set.
#[allow(dead_code)]
pub fn bundle(id: &str, flag: &str, name: &str, key: &str, payload: &str) -> Bundle {
    Bundle::new("monitoring", name)
        .with_annotation(ANNOTATION_ID, id)
        .with_annotation(flag, "true")
        .with_data(key, payload)
}
