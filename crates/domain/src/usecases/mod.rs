//! Application use cases / business logic

pub mod accounts;
pub mod analyze;
pub mod notify;
pub mod waitlist;

pub use accounts::{AccountsConfig, AccountsError, AccountsUseCase, Entitlement};
pub use analyze::{
    AnalysisOutcome, AnalysisRequest, AnalyzeConfig, AnalyzeUseCase, FallbackPolicy,
    FallbackTier, REQUEST_TIMEOUT, describe_error_envelope,
};
pub use notify::{report_email, send_best_effort, waitlist_email};
pub use waitlist::{WaitlistError, WaitlistJoin, WaitlistUseCase};
