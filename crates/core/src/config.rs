use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub segmentation: SegmentationConfig,
    pub pages: PagesConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub ocr: OcrConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `DECKSEG_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("DECKSEG_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            segmentation: SegmentationConfig::from_env_profiled(p),
            pages: PagesConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
            ocr: OcrConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  segmentation: max_pages={}, max_depth={}, concurrency={}",
            self.segmentation.max_pages_per_segment,
            self.segmentation.max_depth,
            self.segmentation.concurrency
        );
        tracing::info!("  pages:        temp_dir={}", self.pages.temp_dir.display());
        tracing::info!("  llm:          provider={}", self.llm.provider);
        tracing::info!("  ollama:       url={}, model={}", self.ollama.url, self.ollama.model);
        tracing::info!(
            "  ocr:          command={}, timeout={}s",
            self.ocr.command.as_deref().unwrap_or("(disabled)"),
            self.ocr.timeout_secs
        );
    }
}

// ── Segmentation engine ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Segments longer than this are re-scanned under a narrower topic.
    pub max_pages_per_segment: usize,
    /// Refinement depth bound; segments still oversized at this depth are irreducible.
    pub max_depth: u32,
    /// Maximum in-flight oracle calls / refinement branches.
    pub concurrency: usize,
    pub oracle_timeout_secs: u64,
    pub provider_timeout_secs: u64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_pages_per_segment: 8,
            max_depth: 3,
            concurrency: 4,
            oracle_timeout_secs: 120,
            provider_timeout_secs: 60,
        }
    }
}

impl SegmentationConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            max_pages_per_segment: profiled_env_parse(p, "SEG_MAX_PAGES", d.max_pages_per_segment)
                .max(1),
            max_depth: profiled_env_parse(p, "SEG_MAX_DEPTH", d.max_depth),
            concurrency: profiled_env_parse(p, "SEG_CONCURRENCY", d.concurrency).max(1),
            oracle_timeout_secs: profiled_env_parse(p, "SEG_ORACLE_TIMEOUT_SECS", d.oracle_timeout_secs),
            provider_timeout_secs: profiled_env_parse(
                p,
                "SEG_PROVIDER_TIMEOUT_SECS",
                d.provider_timeout_secs,
            ),
        }
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

// ── Page extraction ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    /// Directory for split single-page PDFs and extracted images.
    pub temp_dir: PathBuf,
}

impl PagesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            temp_dir: PathBuf::from(profiled_env_or(p, "PAGES_TEMP_DIR", "pdf_proc_temp")),
        }
    }
}

// ── LLM (OpenAI / Anthropic / Ollama) ─────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "anthropic", "ollama"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Retries after the first failed completion call.
    pub max_retries: u32,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "ollama"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            anthropic_api_key: profiled_env_opt(p, "ANTHROPIC_API_KEY"),
            anthropic_model: profiled_env_or(p, "ANTHROPIC_MODEL", "claude-sonnet-4-5-20250929"),
            temperature: profiled_env_parse(p, "LLM_TEMPERATURE", 0.0),
            max_tokens: profiled_env_parse(p, "LLM_MAX_TOKENS", 1024),
            max_retries: profiled_env_parse(p, "LLM_MAX_RETRIES", 2),
        }
    }

}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    /// Sampling seed so repeated runs over the same deck give the same verdicts.
    pub seed: Option<i64>,
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            model: profiled_env_or(p, "OLLAMA_MODEL", "qwen3:4b-instruct"),
            seed: Some(profiled_env_parse(p, "OLLAMA_SEED", 1234)),
        }
    }
}

// ── OCR ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// External command (whitespace-separated argv); the image path is appended.
    pub command: Option<String>,
    /// Per-image limit for the OCR command.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout_secs: 60,
        }
    }
}

impl OcrConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            command: profiled_env_opt(p, "OCR_COMMAND"),
            timeout_secs: profiled_env_parse(p, "OCR_TIMEOUT_SECS", d.timeout_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Split the command line into program + args.
    pub fn argv(&self) -> Option<Vec<String>> {
        let argv: Vec<String> = self
            .command
            .as_deref()?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if argv.is_empty() { None } else { Some(argv) }
    }
}
