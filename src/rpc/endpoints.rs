//! Push endpoint derivation
//!
//! Maps a node's HTTP(S) RPC URL to its websocket pubsub URL using an ordered
//! provider table. Hosts that match no entry get a plain scheme swap.

use crate::logger::{self, LogTag};
use url::Url;

/// How a matched provider's URL is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteRule {
    /// http -> ws, https -> wss, everything else kept
    SchemeSwap,
    /// Scheme swap plus a port shift (local validators listen on rpc port + 1)
    PortOffset(u16),
    /// Scheme swap plus a path prefix replacement
    PathPrefix {
        from: &'static str,
        to: &'static str,
    },
}

/// One row of the provider table
#[derive(Debug, Clone, Copy)]
pub struct ProviderRule {
    pub name: &'static str,
    /// Matched against the end of the host name
    pub host_suffix: &'static str,
    pub rule: RewriteRule,
}

/// Known providers, first match wins
pub const PROVIDER_RULES: &[ProviderRule] = &[
    ProviderRule {
        name: "helius",
        host_suffix: "helius-rpc.com",
        rule: RewriteRule::SchemeSwap,
    },
    ProviderRule {
        name: "quicknode",
        host_suffix: "quiknode.pro",
        rule: RewriteRule::SchemeSwap,
    },
    ProviderRule {
        name: "alchemy",
        host_suffix: "alchemy.com",
        rule: RewriteRule::SchemeSwap,
    },
    ProviderRule {
        name: "triton",
        host_suffix: "rpcpool.com",
        rule: RewriteRule::SchemeSwap,
    },
    ProviderRule {
        name: "shyft",
        host_suffix: "shyft.to",
        rule: RewriteRule::SchemeSwap,
    },
    ProviderRule {
        name: "ankr",
        host_suffix: "rpc.ankr.com",
        rule: RewriteRule::PathPrefix {
            from: "/solana",
            to: "/solana/ws",
        },
    },
    ProviderRule {
        name: "solana-labs",
        host_suffix: "solana.com",
        rule: RewriteRule::SchemeSwap,
    },
    ProviderRule {
        name: "local",
        host_suffix: "localhost",
        rule: RewriteRule::PortOffset(1),
    },
    ProviderRule {
        name: "local",
        host_suffix: "127.0.0.1",
        rule: RewriteRule::PortOffset(1),
    },
];

/// Derives pubsub URLs from RPC URLs
#[derive(Debug, Clone)]
pub struct EndpointRewriter {
    rules: Vec<ProviderRule>,
}

impl Default for EndpointRewriter {
    fn default() -> Self {
        Self::new(PROVIDER_RULES.to_vec())
    }
}

impl EndpointRewriter {
    pub fn new(rules: Vec<ProviderRule>) -> Self {
        Self { rules }
    }

    /// Provider rule matching a host, if any
    pub fn match_host(&self, host: &str) -> Option<&ProviderRule> {
        let host = host.to_lowercase();
        self.rules.iter().find(|rule| {
            host == rule.host_suffix || host.ends_with(&format!(".{}", rule.host_suffix))
        })
    }

    /// Pubsub URL for `http_url`
    ///
    /// ws/wss URLs pass through untouched. Returns None when the URL cannot
    /// be parsed or uses a scheme other than http/https/ws/wss.
    pub fn pubsub_url(&self, http_url: &str) -> Option<String> {
        let mut url = match Url::parse(http_url.trim()) {
            Ok(url) => url,
            Err(e) => {
                logger::warning(
                    LogTag::Websocket,
                    &format!("Cannot derive pubsub endpoint from '{}': {}", http_url, e),
                );
                return None;
            }
        };

        let ws_scheme = match url.scheme() {
            "ws" | "wss" => return Some(url.to_string()),
            "http" => "ws",
            "https" => "wss",
            other => {
                logger::warning(
                    LogTag::Websocket,
                    &format!("Unsupported RPC scheme '{}' in {}", other, http_url),
                );
                return None;
            }
        };

        let host = url.host_str().unwrap_or_default().to_string();
        let rule = match self.match_host(&host) {
            Some(provider) => {
                logger::debug(
                    LogTag::Websocket,
                    &format!("Pubsub endpoint for {} uses {} rule", host, provider.name),
                );
                provider.rule
            }
            None => {
                logger::warning(
                    LogTag::Websocket,
                    &format!(
                        "Unknown RPC provider '{}', deriving pubsub endpoint by scheme swap",
                        host
                    ),
                );
                RewriteRule::SchemeSwap
            }
        };

        url.set_scheme(ws_scheme).ok()?;

        match rule {
            RewriteRule::SchemeSwap => {}
            RewriteRule::PortOffset(offset) => {
                // Only an explicit port is shifted
                if let Some(port) = url.port() {
                    url.set_port(Some(port.checked_add(offset)?)).ok()?;
                }
            }
            RewriteRule::PathPrefix { from, to } => {
                let path = url.path().to_string();
                if let Some(rest) = path.strip_prefix(from) {
                    if rest.is_empty() || rest.starts_with('/') {
                        url.set_path(&format!("{}{}", to, rest));
                    }
                }
            }
        }

        Some(url.to_string())
    }
}

/// Pubsub URL using the built-in provider table
pub fn derive_pubsub_url(http_url: &str) -> Option<String> {
    EndpointRewriter::default().pubsub_url(http_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_providers_keep_path_and_query() {
        let rewriter = EndpointRewriter::default();
        assert_eq!(
            rewriter
                .pubsub_url("https://mainnet.helius-rpc.com/?api-key=abc")
                .as_deref(),
            Some("wss://mainnet.helius-rpc.com/?api-key=abc")
        );
        assert_eq!(
            rewriter
                .pubsub_url("https://example.solana-mainnet.quiknode.pro/token123/")
                .as_deref(),
            Some("wss://example.solana-mainnet.quiknode.pro/token123/")
        );
        assert_eq!(
            rewriter
                .pubsub_url("https://api.mainnet-beta.solana.com")
                .as_deref(),
            Some("wss://api.mainnet-beta.solana.com/")
        );
    }

    #[test]
    fn test_ankr_path_rewrite() {
        let rewriter = EndpointRewriter::default();
        assert_eq!(
            rewriter
                .pubsub_url("https://rpc.ankr.com/solana/key42")
                .as_deref(),
            Some("wss://rpc.ankr.com/solana/ws/key42")
        );
    }

    #[test]
    fn test_local_validator_port_shift() {
        let rewriter = EndpointRewriter::default();
        assert_eq!(
            rewriter.pubsub_url("http://127.0.0.1:8899").as_deref(),
            Some("ws://127.0.0.1:8900/")
        );
        assert_eq!(
            rewriter.pubsub_url("http://localhost").as_deref(),
            Some("ws://localhost/")
        );
    }

    #[test]
    fn test_unknown_provider_scheme_swap() {
        let rewriter = EndpointRewriter::default();
        assert_eq!(
            rewriter
                .pubsub_url("http://node.internal.example:8080/rpc")
                .as_deref(),
            Some("ws://node.internal.example:8080/rpc")
        );
        assert!(rewriter.match_host("node.internal.example").is_none());
    }

    #[test]
    fn test_suffix_match_requires_label_boundary() {
        let rewriter = EndpointRewriter::default();
        assert!(rewriter.match_host("mainnet.helius-rpc.com").is_some());
        assert!(rewriter.match_host("nothelius-rpc.com").is_none());
    }

    #[test]
    fn test_websocket_urls_pass_through() {
        assert_eq!(
            derive_pubsub_url("wss://custom.node/ws").as_deref(),
            Some("wss://custom.node/ws")
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(derive_pubsub_url("not a url").is_none());
        assert!(derive_pubsub_url("ftp://files.example.com").is_none());
    }

    #[test]
    fn test_custom_table() {
        let rewriter = EndpointRewriter::new(vec![ProviderRule {
            name: "custom",
            host_suffix: "mynode.io",
            rule: RewriteRule::PathPrefix { from: "/rpc", to: "/ws" },
        }]);
        assert_eq!(
            rewriter.pubsub_url("https://a.mynode.io/rpc/v1").as_deref(),
            Some("wss://a.mynode.io/ws/v1")
        );
    }
}
