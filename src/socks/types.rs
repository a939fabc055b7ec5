//! SOCKS5 address types
//!
//! A SOCKS5 address is exactly one of an IPv4 address, an IPv6 address or a
//! length-limited domain name, followed by a port. The same encoding is used
//! for DST.ADDR in requests and BND.ADDR in replies.

use super::consts::*;
use super::frame::FrameBuf;
use crate::error::{ErrorCode, Result};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Domain name of 1 to 255 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainName(Vec<u8>);

impl DomainName {
    /// Validate and wrap a name
    pub fn new(name: &[u8]) -> Result<Self> {
        if name.is_empty() {
            return Err(ErrorCode::InvalidArgument.into());
        }
        if name.len() > MAX_DOMAIN_LEN {
            return Err(ErrorCode::ValueTooLong.into());
        }
        Ok(DomainName(name.to_vec()))
    }

    /// Raw name bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes, always in `1..=255`
    pub fn len(&self) -> u8 {
        self.0.len() as u8
    }

    /// Whether the name is empty; never true for a validated name
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Host part of a SOCKS5 address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAddr {
    /// IPv4 address
    Ipv4(Ipv4Addr),
    /// IPv6 address
    Ipv6(Ipv6Addr),
    /// Domain name, resolved by the proxy
    Domain(DomainName),
}

impl HostAddr {
    /// ATYP byte for this host
    pub fn addr_type(&self) -> u8 {
        match self {
            HostAddr::Ipv4(_) => SOCKS5_ADDR_TYPE_IPV4,
            HostAddr::Ipv6(_) => SOCKS5_ADDR_TYPE_IPV6,
            HostAddr::Domain(_) => SOCKS5_ADDR_TYPE_DOMAIN,
        }
    }
}

/// Address and port as carried on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocksAddr {
    /// Host part
    pub host: HostAddr,
    /// Port in host byte order
    pub port: u16,
}

impl SocksAddr {
    /// Parse a textual IPv4 address and port
    pub fn ipv4(ip: &str, port: &str) -> Result<Self> {
        require_non_empty(ip, port)?;
        let ip: Ipv4Addr = ip.parse().map_err(|_| ErrorCode::AddressNotSupported)?;
        Ok(SocksAddr {
            host: HostAddr::Ipv4(ip),
            port: parse_port(port)?,
        })
    }

    /// Parse a textual IPv6 address and port
    pub fn ipv6(ip: &str, port: &str) -> Result<Self> {
        require_non_empty(ip, port)?;
        let ip: Ipv6Addr = ip.parse().map_err(|_| ErrorCode::AddressNotSupported)?;
        Ok(SocksAddr {
            host: HostAddr::Ipv6(ip),
            port: parse_port(port)?,
        })
    }

    /// Wrap a domain name and port; the proxy resolves the name
    pub fn domain(name: &str, port: &str) -> Result<Self> {
        require_non_empty(name, port)?;
        let name = DomainName::new(name.as_bytes())?;
        Ok(SocksAddr {
            host: HostAddr::Domain(name),
            port: parse_port(port)?,
        })
    }

    /// ATYP byte
    pub fn addr_type(&self) -> u8 {
        self.host.addr_type()
    }

    /// Append ATYP, ADDR and PORT to `frame`
    pub fn encode_into<const N: usize>(&self, frame: &mut FrameBuf<N>) -> Result<()> {
        frame.push(self.addr_type())?;
        match &self.host {
            HostAddr::Ipv4(ip) => frame.extend(&ip.octets())?,
            HostAddr::Ipv6(ip) => frame.extend(&ip.octets())?,
            HostAddr::Domain(name) => frame.push_len_prefixed(name.as_bytes())?,
        }
        frame.extend(&self.port.to_be_bytes())
    }

    /// Decode ADDR and PORT from `data`, given the ATYP that preceded them
    ///
    /// Returns the address and the number of bytes consumed.
    pub fn decode(addr_type: u8, data: &[u8]) -> Result<(Self, usize)> {
        let (host, addr_len) = match addr_type {
            SOCKS5_ADDR_TYPE_IPV4 => {
                let octets: [u8; 4] = take(data, 0, 4)?
                    .try_into()
                    .map_err(|_| ErrorCode::EmptyRequestOrResponse)?;
                (HostAddr::Ipv4(Ipv4Addr::from(octets)), 4)
            }
            SOCKS5_ADDR_TYPE_IPV6 => {
                let octets: [u8; 16] = take(data, 0, 16)?
                    .try_into()
                    .map_err(|_| ErrorCode::EmptyRequestOrResponse)?;
                (HostAddr::Ipv6(Ipv6Addr::from(octets)), 16)
            }
            SOCKS5_ADDR_TYPE_DOMAIN => {
                let len = take(data, 0, 1)?[0] as usize;
                let name = DomainName::new(take(data, 1, len)?)
                    .map_err(|_| ErrorCode::AddressNotSupported)?;
                (HostAddr::Domain(name), 1 + len)
            }
            _ => return Err(ErrorCode::AddressNotSupported.into()),
        };

        let port = take(data, addr_len, 2)?;
        let port = u16::from_be_bytes([port[0], port[1]]);
        Ok((SocksAddr { host, port }, addr_len + 2))
    }

    /// Read ADDR and PORT from a stream, given the ATYP already read
    pub async fn read_from<S>(stream: &mut S, addr_type: u8) -> Result<Self>
    where
        S: AsyncRead + Unpin,
    {
        let host = match addr_type {
            SOCKS5_ADDR_TYPE_IPV4 => {
                let mut octets = [0u8; 4];
                stream.read_exact(&mut octets).await?;
                HostAddr::Ipv4(Ipv4Addr::from(octets))
            }
            SOCKS5_ADDR_TYPE_IPV6 => {
                let mut octets = [0u8; 16];
                stream.read_exact(&mut octets).await?;
                HostAddr::Ipv6(Ipv6Addr::from(octets))
            }
            SOCKS5_ADDR_TYPE_DOMAIN => {
                let len = stream.read_u8().await? as usize;
                let mut name = vec![0u8; len];
                stream.read_exact(&mut name).await?;
                HostAddr::Domain(
                    DomainName::new(&name).map_err(|_| ErrorCode::AddressNotSupported)?,
                )
            }
            _ => return Err(ErrorCode::AddressNotSupported.into()),
        };

        let port = stream.read_u16().await?;
        Ok(SocksAddr { host, port })
    }
}

impl fmt::Display for SocksAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            HostAddr::Ipv4(ip) => write!(f, "{}:{}", ip, self.port),
            HostAddr::Ipv6(ip) => write!(f, "[{}]:{}", ip, self.port),
            HostAddr::Domain(name) => write!(f, "{}:{}", name, self.port),
        }
    }
}

/// Parse a decimal port string
pub fn parse_port(port: &str) -> Result<u16> {
    port.trim()
        .parse::<u16>()
        .map_err(|_| ErrorCode::InvalidArgument.into())
}

fn require_non_empty(host: &str, port: &str) -> Result<()> {
    if host.is_empty() || port.is_empty() {
        return Err(ErrorCode::InvalidArgument.into());
    }
    Ok(())
}

fn take(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    data.get(offset..offset + len)
        .ok_or_else(|| ErrorCode::EmptyRequestOrResponse.into())
}
