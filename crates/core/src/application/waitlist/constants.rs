// Waitlist engine constants (ADR: No magic values)

/// CAS attempts per request before `ConcurrencyExhausted`
pub const DEFAULT_MAX_CAS_ATTEMPTS: u32 = 5;

/// Base backoff between CAS attempts (5ms, doubled per lost race)
pub const DEFAULT_CAS_BACKOFF_MS: u64 = 5;
