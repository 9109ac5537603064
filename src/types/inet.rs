//! inet binary codec.
//!
//! Wire format:
//! - family (1 byte): 2 = IPv4, 3 = IPv6
//! - bits (1 byte): netmask length, always the full address width
//! - is_cidr (1 byte): always 0
//! - address length (1 byte): 4 or 16
//! - address bytes in network order

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, BytesMut};

use crate::config::ColumnType;
use crate::error::{EncodeError, EncodeResult};
use crate::protocol::format::{INET_FAMILY_V4, INET_FAMILY_V6, INET_HEADER_LEN};

/// Write an inet field for a host address.
pub fn encode_inet(buf: &mut BytesMut, addr: &IpAddr) {
    match addr {
        IpAddr::V4(v4) => {
            buf.put_i32((INET_HEADER_LEN + 4) as i32);
            buf.put_u8(INET_FAMILY_V4);
            buf.put_u8(32);
            buf.put_u8(0);
            buf.put_u8(4);
            buf.extend_from_slice(&v4.octets());
        }
        IpAddr::V6(v6) => {
            buf.put_i32((INET_HEADER_LEN + 16) as i32);
            buf.put_u8(INET_FAMILY_V6);
            buf.put_u8(128);
            buf.put_u8(0);
            buf.put_u8(16);
            buf.extend_from_slice(&v6.octets());
        }
    }
}

/// Parse `addr` or `addr/prefix`. With a prefix, host bits are cleared.
pub fn parse_inet(text: &str) -> Option<IpAddr> {
    let (addr, prefix) = match text.trim().split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix.parse::<u8>().ok()?)),
        None => (text.trim(), None),
    };
    let addr: IpAddr = addr.parse().ok()?;
    let Some(prefix) = prefix else {
        return Some(addr);
    };

    match addr {
        IpAddr::V4(v4) => {
            let host_bits = 32u32.checked_sub(u32::from(prefix))?;
            let mask = u32::MAX.checked_shl(host_bits).unwrap_or(0);
            Some(IpAddr::V4(Ipv4Addr::from(u32::from(v4) & mask)))
        }
        IpAddr::V6(v6) => {
            let host_bits = 128u32.checked_sub(u32::from(prefix))?;
            let mask = u128::MAX.checked_shl(host_bits).unwrap_or(0);
            Some(IpAddr::V6(Ipv6Addr::from(u128::from(v6) & mask)))
        }
    }
}

/// Parse address text (optionally with a `/prefix`) and write it as inet.
pub fn encode_inet_text(buf: &mut BytesMut, text: &str) -> EncodeResult<()> {
    let addr = parse_inet(text).ok_or_else(|| EncodeError::invalid_text(ColumnType::Inet, text))?;
    encode_inet(buf, &addr);
    Ok(())
}
