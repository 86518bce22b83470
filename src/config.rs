use std::time::Duration;

pub const INSECURE_SSL_ENV: &str = "LOCALIZE_IMAGES_INSECURE_SSL";
pub const TIMEOUT_ENV: &str = "LOCALIZE_IMAGES_TIMEOUT_SECS";

pub const DEFAULT_IMAGES_DIR: &str = "images";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const IMAGE_ACCEPT: &str = "image/webp,image/apng,image/*,*/*;q=0.8";

/// HTTP settings for image downloads.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub accept: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Accept invalid TLS certificates.
    pub insecure: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept: IMAGE_ACCEPT.to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
            max_redirects: 10,
            insecure: false,
        }
    }
}

impl FetchConfig {
    /// Defaults overlaid with `LOCALIZE_IMAGES_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if lookup(INSECURE_SSL_ENV).as_deref() == Some("1") {
            config.insecure = true;
        }
        if let Some(secs) = lookup(TIMEOUT_ENV).and_then(|v| v.trim().parse::<u64>().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }

    pub fn with_timeout(mut self, secs: Option<u64>) -> Self {
        if let Some(secs) = secs {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }
}

/// Per-invocation knobs of the localize command.
#[derive(Debug, Clone)]
pub struct LocalizeOptions {
    /// Directory name created under the workspace root.
    pub images_dir: String,
    /// Fetch each distinct URL once instead of once per `<img>` tag.
    pub dedup: bool,
}

impl Default for LocalizeOptions {
    fn default() -> Self {
        Self {
            images_dir: DEFAULT_IMAGES_DIR.to_string(),
            dedup: false,
        }
    }
}
