// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display).
pub const APP_NAME: &str = "Linger";

/// Application name in lowercase (for identifiers).
pub const APP_NAME_LOWER: &str = "linger";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name, looked for in the current directory if `--config` /
/// `LINGER_CONFIG` isn't given.
pub const CONFIG_FILE_NAME: &str = "linger.json";

/// Environment variable for config file path.
pub const ENV_CONFIG: &str = "LINGER_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

pub const ENV_HOST: &str = "LINGER_HOST";
pub const ENV_PORT: &str = "LINGER_PORT";
pub const ENV_LOG: &str = "LINGER_LOG";

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8998;

// =============================================================================
// Delivery Defaults
// =============================================================================

/// Environment variable for the default visibility timeout (seconds).
pub const ENV_DEFAULT_TIMEOUT: &str = "LINGER_DEFAULT_TIMEOUT";
/// Environment variable for the default linger/TTL (seconds, 0 = never purge).
pub const ENV_DEFAULT_LINGER: &str = "LINGER_DEFAULT_LINGER";
/// Environment variable for the default delivery cap (0 = unlimited).
pub const ENV_DEFAULT_DELIVER: &str = "LINGER_DEFAULT_DELIVER";

/// Default visibility timeout applied when a request omits `timeout`.
pub const DEFAULT_TIMEOUT_SECS: f64 = 60.0;
/// Default linger: never purge unless the caller asks for one.
pub const DEFAULT_LINGER_SECS: Option<f64> = None;
/// Default delivery cap: unlimited.
pub const DEFAULT_DELIVER: u32 = 0;
/// Default message priority.
pub const DEFAULT_PRIORITY: i64 = 0;

// =============================================================================
// HTTP Long-Poll
// =============================================================================

/// Maximum `wait` a GET on a channel may request, in seconds. Keeps a
/// single slow client from pinning a connection (and a tokio task) forever.
pub const MAX_LONG_POLL_SECS: f64 = 3600.0;

/// Body limit for channel/topic ingestion requests (4 MB).
pub const DEFAULT_BODY_LIMIT: usize = 4 * 1024 * 1024;

// =============================================================================
// SNS Ingestion Adapter
// =============================================================================

/// Header used by SNS to mark a message's type.
pub const SNS_MESSAGE_TYPE_HEADER: &str = "x-amz-sns-message-type";
pub const SNS_MESSAGE_TYPE_SUBSCRIPTION_CONFIRMATION: &str = "SubscriptionConfirmation";
pub const SNS_MESSAGE_TYPE_NOTIFICATION: &str = "Notification";

/// Timeout for the fire-and-forget `SubscribeURL` confirmation fetch.
pub const SNS_CONFIRM_FETCH_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Shutdown
// =============================================================================

/// Graceful shutdown timeout in seconds.
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Message Header
// =============================================================================

/// Response header carrying the id of a newly created message.
pub const HEADER_MESSAGE_ID: &str = "X-LINGER-MSG-ID";
