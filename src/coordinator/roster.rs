//! Roster Persistence
//!
//! The coordinator remembers participant addresses as
//! `{"servers":[{"host":..,"port":..}]}`, loaded once at startup and
//! rewritten on every registration, so a restarted coordinator reconnects to
//! the same participants without re-registration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerAddr {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RosterFile {
    pub servers: Vec<ServerAddr>,
}

/// Loads the persisted participant addresses. A missing file is an empty
/// roster, not an error.
pub fn load_roster(path: &Path) -> Result<Vec<SocketAddr>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No roster file at {}, starting empty", path.display());
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read roster {}", path.display()));
        }
    };

    let roster: RosterFile = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse roster {}", path.display()))?;

    let addrs: Vec<SocketAddr> = roster
        .servers
        .into_iter()
        .map(|server| SocketAddr::new(server.host, server.port))
        .collect();
    tracing::info!("Loaded {} participant(s) from {}", addrs.len(), path.display());

    Ok(addrs)
}

/// Rewrites the roster file with the full current address list.
pub fn save_roster(path: &Path, addrs: &[SocketAddr]) -> Result<()> {
    let roster = RosterFile {
        servers: addrs
            .iter()
            .map(|addr| ServerAddr {
                host: addr.ip(),
                port: addr.port(),
            })
            .collect(),
    };

    let contents = serde_json::to_string(&roster).context("failed to serialize roster")?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write roster {}", path.display()))?;

    Ok(())
}
