//! Alternate endpoint discovery.
//!
//! When Ollama runs on a VM or WSL host, `localhost` inside the guest does not
//! reach it, but the host usually doubles as the guest's DNS server. The first
//! IPv4 `nameserver` in the resolver configuration is then a usable address.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default resolver configuration file.
pub const RESOLV_CONF: &str = "/etc/resolv.conf";

/// Where to look for an alternate server host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackSource {
    /// Use the first IPv4 nameserver listed in a resolver file.
    ResolvConf(PathBuf),
    /// Never offer an alternate host.
    Disabled,
}

impl Default for FallbackSource {
    fn default() -> Self {
        FallbackSource::ResolvConf(PathBuf::from(RESOLV_CONF))
    }
}

impl FallbackSource {
    /// Alternate host to try, if any. Read and parse failures yield `None`.
    pub fn alternate_host(&self) -> Option<Ipv4Addr> {
        match self {
            FallbackSource::ResolvConf(path) => read_nameserver(path),
            FallbackSource::Disabled => None,
        }
    }
}

fn read_nameserver(path: &Path) -> Option<Ipv4Addr> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let ip = first_nameserver(&contents);
            debug!("Nameserver from {}: {:?}", path.display(), ip);
            ip
        }
        Err(e) => {
            debug!("Could not read {}: {}", path.display(), e);
            None
        }
    }
}

/// First `nameserver <IPv4>` entry in resolver file contents.
fn first_nameserver(contents: &str) -> Option<Ipv4Addr> {
    contents.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        if fields.next()? != "nameserver" {
            return None;
        }
        fields.next()?.parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_nameserver() {
        let contents = "# generated by resolvconf\nsearch lan\nnameserver 10.0.0.1\nnameserver 8.8.8.8\n";
        assert_eq!(first_nameserver(contents), Some(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn test_skips_ipv6_and_comments() {
        let contents = "# nameserver 1.1.1.1\nnameserver fe80::1\n  nameserver\t172.20.0.1\n";
        assert_eq!(first_nameserver(contents), Some(Ipv4Addr::new(172, 20, 0, 1)));
    }

    #[test]
    fn test_no_nameserver() {
        assert_eq!(first_nameserver("search lan\noptions ndots:1\n"), None);
        assert_eq!(first_nameserver("nameserver\n"), None);
        assert_eq!(first_nameserver(""), None);
    }

    #[test]
    fn test_resolv_conf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolv.conf");
        std::fs::write(&path, "nameserver 10.0.0.1\n").unwrap();

        let source = FallbackSource::ResolvConf(path);
        assert_eq!(source.alternate_host(), Some(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FallbackSource::ResolvConf(dir.path().join("absent"));
        assert_eq!(source.alternate_host(), None);
    }

    #[test]
    fn test_disabled() {
        assert_eq!(FallbackSource::Disabled.alternate_host(), None);
    }
}
