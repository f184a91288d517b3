//! Helpers for IPv4 addresses written in CIDR notation (`a.b.c.d/n`).

use ipnet::Ipv4Net;
use log::debug;

/// Returns the bare address portion of a CIDR string, discarding the prefix length.
///
/// An address without a `/` is returned as-is. Empty input yields `None`.
pub fn bare_ip(cidr: &str) -> Option<&str> {
    cidr.split('/').next().filter(|ip| !ip.is_empty())
}

/// Derives the dotted-decimal subnet mask for a CIDR string.
///
/// `"10.0.0.5/24"` yields `"255.255.255.0"`. The full `/0` to `/32` range is supported.
///
/// # Returns
/// * `None` if the string has no prefix length, the address is not IPv4, or the prefix is
///   non-numeric or outside `0..=32`
pub fn derive_subnet_mask(cidr: &str) -> Option<String> {
    match cidr.trim().parse::<Ipv4Net>() {
        Ok(net) => Some(net.netmask().to_string()),
        Err(e) => {
            debug!("Unable to derive subnet mask from '{cidr}': {e}");
            None
        }
    }
}
