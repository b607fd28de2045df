//! DNS provider identifiers.

use anyhow::bail;
use std::fmt;
use std::str::FromStr;

/// Closed set of supported DNS credential providers.
///
/// Two identifiers may map to the same client backend (regional variants of
/// one API); the registry table owns that relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsProvider {
    Cloudflare,
    DnspodCom,
    DnspodCn,
    Aliyun,
    Route53,
    GoDaddy,
    Namesilo,
    HuaweiCloud,
}

impl DnsProvider {
    pub const ALL: &'static [DnsProvider] = &[
        DnsProvider::Cloudflare,
        DnsProvider::DnspodCom,
        DnsProvider::DnspodCn,
        DnsProvider::Aliyun,
        DnsProvider::Route53,
        DnsProvider::GoDaddy,
        DnsProvider::Namesilo,
        DnsProvider::HuaweiCloud,
    ];

    /// Stable identifier used on the command line and in reports.
    pub fn id(&self) -> &'static str {
        match self {
            DnsProvider::Cloudflare => "cf",
            DnsProvider::DnspodCom => "dnspod-com",
            DnsProvider::DnspodCn => "dnspod-cn",
            DnsProvider::Aliyun => "aliyun",
            DnsProvider::Route53 => "route53",
            DnsProvider::GoDaddy => "godaddy",
            DnsProvider::Namesilo => "namesilo",
            DnsProvider::HuaweiCloud => "huaweicloud",
        }
    }
}

impl fmt::Display for DnsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for DnsProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for provider in Self::ALL {
            if provider.id() == s {
                return Ok(*provider);
            }
        }
        bail!(
            "unknown provider '{}' (known: {})",
            s,
            Self::ALL
                .iter()
                .map(|p| p.id())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_ids() {
        for provider in DnsProvider::ALL {
            assert_eq!(provider.id().parse::<DnsProvider>().unwrap(), *provider);
        }
    }

    #[test]
    fn test_unknown_id_is_error() {
        let err = "gandalf".parse::<DnsProvider>().unwrap_err();
        assert!(err.to_string().contains("unknown provider"));
    }
}
