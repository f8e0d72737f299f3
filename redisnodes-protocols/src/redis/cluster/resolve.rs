//! Best-effort host name resolution for cluster node addresses
//!
//! Reverse lookups are an enrichment: a lookup that does not produce a name
//! leaves the raw host in place and is never reported as an
//! error.

use std::io;
use std::net::IpAddr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Reverse name lookup capability
pub trait HostResolver {
    /// Return the names registered for `host`, best match first
    fn lookup(&self, host: &str) -> io::Result<Vec<String>>;
}

impl<F> HostResolver for F
where
    F: Fn(&str) -> io::Result<Vec<String>>,
{
    fn lookup(&self, host: &str) -> io::Result<Vec<String>> {
        self(host)
    }
}

/// Resolver that never resolves anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

impl HostResolver for NoopResolver {
    fn lookup(&self, _host: &str) -> io::Result<Vec<String>> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "name resolution disabled"))
    }
}

/// Reverse DNS through the system resolver, bounded by a timeout
#[derive(Debug, Clone, Copy)]
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl HostResolver for SystemResolver {
    fn lookup(&self, host: &str) -> io::Result<Vec<String>> {
        let ip: IpAddr = host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("{host}: {e}")))?;

        // getnameinfo has no timeout of its own; a late answer is dropped
        let (tx, rx) = mpsc::channel();
        thread::Builder::new().name("reverse-lookup".to_string()).spawn(move || {
            let _ = tx.send(dns_lookup::lookup_addr(&ip));
        })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result.map(|name| vec![name]),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("reverse lookup of {ip} took longer than {:?}", self.timeout),
            )),
        }
    }
}

/// Derive the display host for a node address
///
/// The candidate host is everything before the last `:`. An address without a
/// `:` (or starting with one) is returned unchanged without a lookup.
///
/// ```
/// use redisnodes_protocols::{display_host, NoopResolver};
///
/// assert_eq!(display_host("10.0.0.7:6379@16379", &NoopResolver), "10.0.0.7");
/// assert_eq!(display_host("noaddr", &NoopResolver), "noaddr");
/// ```
pub fn display_host(address: &str, resolver: &dyn HostResolver) -> String {
    let host = match address.rfind(':') {
        Some(pos) if pos > 0 => &address[..pos],
        _ => return address.to_string(),
    };

    match resolver.lookup(host) {
        Ok(names) => match names.into_iter().find(|name| !name.is_empty()) {
            Some(name) => name.trim_end_matches('.').to_string(),
            None => host.to_string(),
        },
        Err(e) => {
            tracing::debug!("Reverse lookup of {} failed: {}", host, e);
            host.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &'static [&'static str]) -> impl Fn(&str) -> io::Result<Vec<String>> {
        move |_: &str| Ok(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_first_name_used() {
        let resolver = names(&["db-1.example.com.", "alias.example.com."]);
        assert_eq!(display_host("10.1.2.3:7000", &resolver), "db-1.example.com");
    }

    #[test]
    fn test_empty_answer_falls_back() {
        let resolver = names(&[]);
        assert_eq!(display_host("10.1.2.3:7000@17000", &resolver), "10.1.2.3");
    }

    #[test]
    fn test_failure_falls_back() {
        assert_eq!(display_host("10.1.2.3:7000", &NoopResolver), "10.1.2.3");
    }

    #[test]
    fn test_last_colon_splits_ipv6() {
        let seen = std::cell::RefCell::new(String::new());
        let resolver = |host: &str| -> io::Result<Vec<String>> {
            *seen.borrow_mut() = host.to_string();
            Err(io::Error::new(io::ErrorKind::NotFound, "none"))
        };
        assert_eq!(display_host("::1:6379@16379", &resolver), "::1");
        assert_eq!(*seen.borrow(), "::1");
    }

    #[test]
    fn test_no_colon_skips_lookup() {
        let resolver = |_: &str| -> io::Result<Vec<String>> { panic!("lookup must not run") };
        assert_eq!(display_host("noaddr", &resolver), "noaddr");
        assert_eq!(display_host(":6379", &resolver), ":6379");
    }

    #[test]
    fn test_system_resolver_rejects_hostnames() {
        let resolver = SystemResolver::new(Duration::from_millis(100));
        let err = resolver.lookup("not-an-ip").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(display_host("not-an-ip:6379", &resolver), "not-an-ip");
    }
}
