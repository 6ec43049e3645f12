use std::path::PathBuf;

/// Portal login credentials: the account identifier and password pair.
///
/// The source of the pair (env vars, `.env` file) is the loader's concern;
/// everything downstream treats it as opaque.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub base_url: String,
    pub gadget_id: u32,
    pub page_length: u32,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_attempts: u32,
    pub backoff_base_secs: u64,
    pub accept_invalid_certs: bool,
    pub cache_ttl_mins: u64,
    pub cache_path: PathBuf,
    pub log_level: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("gadget_id", &self.gadget_id)
            .field("page_length", &self.page_length)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_base_secs", &self.backoff_base_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("cache_ttl_mins", &self.cache_ttl_mins)
            .field("cache_path", &self.cache_path)
            .field("log_level", &self.log_level)
            .finish()
    }
}
