//! Format validators for manifest field values
//!
//! Pure predicates over `&str`. Empty input is the dispatcher's concern
//! (an empty value passes unless the field is required), so every predicate
//! here reports what a non-empty value *is*, not whether one must be given.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Longest domain name accepted, in bytes
const MAX_DOMAIN_LEN: usize = 253;

/// Longest single domain label accepted, in bytes
const MAX_LABEL_LEN: usize = 63;

/// Returns true if `s` is a dotted-quad IPv4 address
pub fn is_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

/// Returns true if `s` is an IPv6 address (including `::` compression)
pub fn is_ipv6(s: &str) -> bool {
    s.parse::<Ipv6Addr>().is_ok()
}

/// Returns true if `s` is a fully qualified domain name
///
/// Requires at least two dot-separated labels. Labels are 1-63 ASCII
/// alphanumeric or hyphen characters and may not start or end with a hyphen.
/// The whole name is capped at 253 bytes.
pub fn is_domain(s: &str) -> bool {
    if s.len() > MAX_DOMAIN_LEN {
        return false;
    }
    let mut labels = 0;
    for label in s.split('.') {
        if !is_domain_label(label) {
            return false;
        }
        labels += 1;
    }
    labels >= 2
}

fn is_domain_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_LABEL_LEN {
        return false;
    }
    if bytes[0] == b'-' || bytes[bytes.len() - 1] == b'-' {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
}

/// Returns true if `s` is a DNS-1123 subdomain
///
/// Lowercase alphanumeric or hyphen labels separated by dots, each label
/// starting and ending alphanumeric. A single label is accepted, so plain
/// resource names pass too.
pub fn is_subdomain(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_DOMAIN_LEN {
        return false;
    }
    s.split('.').all(is_dns1123_label)
}

fn is_dns1123_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_LABEL_LEN {
        return false;
    }
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !alnum(bytes[0]) || !alnum(bytes[bytes.len() - 1]) {
        return false;
    }
    bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

/// Returns true if `s` consists only of ASCII digits
///
/// Numeric-only names collide with ID-based lookups downstream, so name
/// checks reject them even though they are valid DNS-1123 labels.
pub fn is_all_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Returns true if `s` is a domain followed by one or more path segments
///
/// Accepts registry mirror paths like `harbor.corp.example/library`. Every
/// segment after the domain must be non-empty.
pub fn is_domain_path(s: &str) -> bool {
    let Some((host, path)) = s.split_once('/') else {
        return false;
    };
    if !is_domain(host) || path.is_empty() {
        return false;
    }
    path.split('/').all(|segment| !segment.is_empty())
}

/// Returns true if `s` is `host:port` with a domain or IPv4 host
///
/// The port must be in 1-65535. Port zero means "unspecified" everywhere a
/// registry endpoint is consumed, so it is rejected here.
pub fn is_host_port(s: &str) -> bool {
    let Some((host, port)) = s.rsplit_once(':') else {
        return false;
    };
    let Ok(port) = port.parse::<u16>() else {
        return false;
    };
    if port == 0 {
        return false;
    }
    is_domain(host) || is_ipv4(host)
}

/// Returns true if `s` is any accepted registry endpoint shape
///
/// Registries may be given as a domain, a domain with a mirror path, a bare
/// IPv4 address, or `host:port`.
pub fn is_registry_host(s: &str) -> bool {
    is_domain(s) || is_domain_path(s) || is_ipv4(s) || is_host_port(s)
}

/// Returns true if `s` is an exact IPv4 CIDR block (`addr/prefix`, prefix 0-32)
pub fn is_cidr_v4(s: &str) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    is_ipv4(addr) && is_prefix_len(prefix, 32)
}

/// Returns true if `s` is an exact IPv6 CIDR block (`addr/prefix`, prefix 0-128)
pub fn is_cidr_v6(s: &str) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    is_ipv6(addr) && is_prefix_len(prefix, 128)
}

// Digits only: integer parsing would accept a leading '+'.
fn is_prefix_len(s: &str, max: u8) -> bool {
    if s.is_empty() || s.len() > 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match s.parse::<u8>() {
        Ok(prefix) => prefix <= max,
        Err(_) => false,
    }
}

/// Returns true if `s` is a dotted three-component release version (`X.Y.Z`)
pub fn is_release_version(s: &str) -> bool {
    let mut components = 0;
    for part in s.split('.') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        components += 1;
    }
    components == 3
}
