//! 类型定义模块

mod domain_record;
mod events;
mod status;
mod verification;

pub use domain_record::{CreateDomainOptions, DomainRecord};
pub use events::WebsiteDeployedEvent;
pub use status::{reasons, RecordStatus, StatusInfo, StatusScope};
pub use verification::{
    generate_code, ChannelResult, PartialResults, Verification, VerificationResult,
    VerificationWindow, DEFAULT_VERIFICATION_SUBDOMAIN, VERIFICATION_METHOD_DNS_SUBDOMAIN,
};

// Re-export probe 库的公共类型
pub use domain_verifier_probe::DnsDiff;
