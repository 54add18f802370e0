use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub output_dir: PathBuf,
    pub jobs_path: PathBuf,
    pub search_base_url: String,
    pub language: String,
    pub browser_headless: bool,
    pub browser_executable: Option<PathBuf>,
    pub enrich_emails: bool,
    pub navigation_timeout_secs: u64,
    pub consent_timeout_ms: u64,
    pub feed_timeout_ms: u64,
    pub detail_timeout_ms: u64,
    pub card_settle_ms: u64,
    pub detail_settle_ms: u64,
    pub scroll_settle_ms: u64,
    pub scroll_step_px: u32,
    pub enrich_timeout_ms: u64,
    pub max_stale_rounds: u32,
    pub end_stale_rounds: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("output_dir", &self.output_dir)
            .field("jobs_path", &self.jobs_path)
            .field("search_base_url", &self.search_base_url)
            .field("language", &self.language)
            .field("browser_headless", &self.browser_headless)
            .field(
                "browser_executable",
                &self.browser_executable.as_ref().map(|p| p.display().to_string()),
            )
            .field("enrich_emails", &self.enrich_emails)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("consent_timeout_ms", &self.consent_timeout_ms)
            .field("feed_timeout_ms", &self.feed_timeout_ms)
            .field("detail_timeout_ms", &self.detail_timeout_ms)
            .field("card_settle_ms", &self.card_settle_ms)
            .field("detail_settle_ms", &self.detail_settle_ms)
            .field("scroll_settle_ms", &self.scroll_settle_ms)
            .field("scroll_step_px", &self.scroll_step_px)
            .field("enrich_timeout_ms", &self.enrich_timeout_ms)
            .field("max_stale_rounds", &self.max_stale_rounds)
            .field("end_stale_rounds", &self.end_stale_rounds)
            .finish()
    }
}
