//! We can have a little hard-coded config, [as a
//! snack](https://knowyourmeme.com/memes/cats-can-have-a-little-salami).
//! Everything else comes from the environment (or a `.env` file).

use anyhow::{bail, Context, Result};
use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

/// The single durable record holding the whole document.
pub const STORAGE_KEY: &str = "bizdesk.document";

/// How long a toast stays on screen unless overridden.
pub const TOAST_TTL_SECS: u64 = 4;

/// How often the notifier sweeps expired toasts.
pub const TOAST_SWEEP_INTERVAL: Duration = Duration::from_millis(500);

pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Where the document lives. `memory` is a throwaway demo mode: nothing
/// survives a restart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    File,
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub storage: StorageKind,
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub toast_ttl: Duration,
    pub session_secret: Vec<u8>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let addr = env::var("BIZDESK_ADDR")
            .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
            .parse()
            .context("BIZDESK_ADDR must be a socket address")?;
        let storage = match env::var("BIZDESK_STORAGE").as_deref() {
            Err(_) | Ok("file") => StorageKind::File,
            Ok("memory") => StorageKind::Memory,
            Ok(other) => bail!("unknown BIZDESK_STORAGE {other:?}"),
        };
        let data_dir = env::var("BIZDESK_DATA_DIR")
            .unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string())
            .into();
        let storage_key = env::var("BIZDESK_STORAGE_KEY")
            .unwrap_or_else(|_| STORAGE_KEY.to_string());
        let toast_ttl = match env::var("BIZDESK_TOAST_TTL_SECS") {
            Ok(v) => v
                .parse()
                .context("BIZDESK_TOAST_TTL_SECS must be a whole number")?,
            Err(_) => TOAST_TTL_SECS,
        };
        let session_secret = env::var("SESSION_SECRET")
            .context("session secret to be defined in the environment")?
            .into_bytes();

        Ok(Self {
            addr,
            storage,
            data_dir,
            storage_key,
            toast_ttl: Duration::from_secs(toast_ttl),
            session_secret,
        })
    }
}
