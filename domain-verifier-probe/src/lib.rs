//! DNS probes for custom-domain ownership verification.
//!
//! 提供三种独立的 DNS 检查：IPv4 地址集合、`www` CNAME 别名、TXT 验证码。
//! 每个检查返回期望值与实际值之间的差集 ([`DnsDiff`])。

mod error;
mod services;
mod traits;
mod types;

pub use error::{ProbeError, ProbeResult};
pub use services::{HickoryDnsProbe, DEFAULT_PROBE_TIMEOUT};
pub use traits::DnsProbe;
pub use types::DnsDiff;
