//! mDNS advertisement so mobile clients can find the gateway without
//! typing an address.

use anyhow::Result;
use mdns_sd::{ServiceDaemon, ServiceInfo};
use std::net::{IpAddr, UdpSocket};
use tracing::{debug, info, warn};

pub const SERVICE_TYPE: &str = "_tunebridge._tcp.local.";
const INSTANCE_NAME: &str = "TuneBridge";

/// Keeps the mDNS registration alive for the lifetime of the process.
pub struct ServiceAdvertiser {
    daemon: ServiceDaemon,
    fullname: String,
}

impl ServiceAdvertiser {
    /// Register the gateway on the local network.
    pub fn register(port: u16) -> Result<Self> {
        let local_ip = get_local_ip()?;
        let host = hostname::get()?.to_string_lossy().into_owned();
        let hostname = format!("{host}.local.");

        let properties = [("version", env!("CARGO_PKG_VERSION")), ("name", INSTANCE_NAME)];
        let service = ServiceInfo::new(
            SERVICE_TYPE,
            INSTANCE_NAME,
            &hostname,
            local_ip,
            port,
            &properties[..],
        )?;
        let fullname = service.get_fullname().to_string();

        let daemon = ServiceDaemon::new()?;
        daemon.register(service)?;
        info!("mDNS service registered: {fullname} at {local_ip}:{port}");

        Ok(Self { daemon, fullname })
    }

    /// Withdraw the registration and stop the daemon.
    pub fn shutdown(self) {
        if let Err(e) = self.daemon.unregister(&self.fullname) {
            warn!("mDNS unregister failed: {e}");
        }
        // The daemon can already be gone at process teardown.
        if let Err(e) = self.daemon.shutdown() {
            debug!("mDNS daemon shutdown error: {e}");
        }
    }
}

/// Best local IP guess: the address an outbound connection would use.
pub fn get_local_ip() -> Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("8.8.8.8:80")?;
    let addr = socket.local_addr()?;
    Ok(addr.ip())
}
