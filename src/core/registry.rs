//! Static provider registry: credential keys, defaults, client backends.
//!
//! Pure lookup tables, no I/O. Validation logic lives once here; regional
//! variants of one API share a backend and a key set and differ only in
//! their endpoint default.

use crate::models::provider::DnsProvider;
use anyhow::Result;

/// One way to authenticate against a provider. Most providers have exactly
/// one; Cloudflare offers a token or a legacy key+email pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthMode {
    pub name: &'static str,
    /// Required, non-empty credential keys, in prompt order.
    pub keys: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct ProviderDescriptor {
    pub provider: DnsProvider,
    pub label: &'static str,
    /// Challenge-backend identifier passed verbatim to the client.
    pub backend: &'static str,
    /// Auth modes in preference order; the first satisfied one is used.
    pub modes: &'static [AuthMode],
    /// Optional keys written with these defaults unless overridden.
    pub defaults: &'static [(&'static str, &'static str)],
}

static DESCRIPTORS: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        provider: DnsProvider::Cloudflare,
        label: "Cloudflare",
        backend: "dns_cf",
        modes: &[
            AuthMode { name: "token", keys: &["CF_Token"] },
            AuthMode { name: "key-email", keys: &["CF_Key", "CF_Email"] },
        ],
        defaults: &[],
    },
    ProviderDescriptor {
        provider: DnsProvider::DnspodCom,
        label: "DNSPod (international)",
        backend: "dns_dp",
        modes: &[AuthMode { name: "api-id-key", keys: &["DP_Id", "DP_Key"] }],
        defaults: &[("DP_ENDPOINT", "https://api.dnspod.com")],
    },
    ProviderDescriptor {
        provider: DnsProvider::DnspodCn,
        label: "DNSPod (China)",
        backend: "dns_dp",
        modes: &[AuthMode { name: "api-id-key", keys: &["DP_Id", "DP_Key"] }],
        defaults: &[("DP_ENDPOINT", "https://dnsapi.cn")],
    },
    ProviderDescriptor {
        provider: DnsProvider::Aliyun,
        label: "Alibaba Cloud DNS",
        backend: "dns_ali",
        modes: &[AuthMode { name: "access-key", keys: &["Ali_Key", "Ali_Secret"] }],
        defaults: &[],
    },
    ProviderDescriptor {
        provider: DnsProvider::Route53,
        label: "Amazon Route 53",
        backend: "dns_aws",
        modes: &[AuthMode {
            name: "access-key",
            keys: &["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"],
        }],
        defaults: &[],
    },
    ProviderDescriptor {
        provider: DnsProvider::GoDaddy,
        label: "GoDaddy",
        backend: "dns_gd",
        modes: &[AuthMode { name: "api-key", keys: &["GD_Key", "GD_Secret"] }],
        defaults: &[],
    },
    ProviderDescriptor {
        provider: DnsProvider::Namesilo,
        label: "NameSilo",
        backend: "dns_namesilo",
        modes: &[AuthMode { name: "api-key", keys: &["Namesilo_Key"] }],
        defaults: &[],
    },
    ProviderDescriptor {
        provider: DnsProvider::HuaweiCloud,
        label: "Huawei Cloud DNS",
        backend: "dns_huaweicloud",
        modes: &[AuthMode {
            name: "iam-user",
            keys: &[
                "HUAWEICLOUD_Username",
                "HUAWEICLOUD_Password",
                "HUAWEICLOUD_DomainName",
            ],
        }],
        defaults: &[],
    },
];

/// All descriptors, in display order.
pub fn all() -> &'static [ProviderDescriptor] {
    DESCRIPTORS
}

/// Descriptor for a provider variant.
pub fn descriptor(provider: DnsProvider) -> &'static ProviderDescriptor {
    DESCRIPTORS
        .iter()
        .find(|d| d.provider == provider)
        .expect("every DnsProvider variant has a descriptor")
}

/// Resolve a provider id. An unknown id is an error, never an empty
/// descriptor: "no requirements" and "no such provider" must not blur.
pub fn lookup(id: &str) -> Result<&'static ProviderDescriptor> {
    let provider: DnsProvider = id.parse()?;
    Ok(descriptor(provider))
}

impl ProviderDescriptor {
    pub fn id(&self) -> &'static str {
        self.provider.id()
    }

    /// Required keys of the preferred auth mode.
    pub fn required_keys(&self) -> &'static [&'static str] {
        self.modes[0].keys
    }

    pub fn mode(&self, name: &str) -> Option<&'static AuthMode> {
        self.modes.iter().find(|m| m.name == name)
    }

    /// Every key this provider may have written: all modes plus defaults.
    pub fn all_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = Vec::new();
        for mode in self.modes {
            for &key in mode.keys {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        for &(key, _) in self.defaults {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_descriptor() {
        for provider in DnsProvider::ALL {
            let d = descriptor(*provider);
            assert_eq!(d.provider, *provider);
            assert!(!d.modes.is_empty());
            assert!(d.modes.iter().all(|m| !m.keys.is_empty()));
        }
    }

    #[test]
    fn test_unknown_provider_is_error_not_empty() {
        assert!(lookup("nope").is_err());
    }

    #[test]
    fn test_dnspod_variants_share_backend_and_keys() {
        let com = lookup("dnspod-com").unwrap();
        let cn = lookup("dnspod-cn").unwrap();
        assert_eq!(com.backend, "dns_dp");
        assert_eq!(com.backend, cn.backend);
        assert_eq!(com.required_keys(), cn.required_keys());
        assert_ne!(com.defaults, cn.defaults);
    }

    #[test]
    fn test_dnspod_cn_endpoint_default() {
        let cn = lookup("dnspod-cn").unwrap();
        assert_eq!(cn.defaults, &[("DP_ENDPOINT", "https://dnsapi.cn")]);
    }

    #[test]
    fn test_cloudflare_two_modes() {
        let cf = lookup("cf").unwrap();
        assert_eq!(cf.modes.len(), 2);
        assert_eq!(cf.mode("token").unwrap().keys, &["CF_Token"]);
        assert_eq!(cf.mode("key-email").unwrap().keys, &["CF_Key", "CF_Email"]);
    }

    #[test]
    fn test_all_keys_union() {
        let cf = lookup("cf").unwrap();
        assert_eq!(cf.all_keys(), vec!["CF_Token", "CF_Key", "CF_Email"]);
        let cn = lookup("dnspod-cn").unwrap();
        assert_eq!(cn.all_keys(), vec!["DP_Id", "DP_Key", "DP_ENDPOINT"]);
    }
}
