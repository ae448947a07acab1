//! Command-line interface for the concierge
//!
//! Provides argument parsing and subcommand handling for the concierge binary.

use clap::{Parser, Subcommand};

/// AI concierge service for residential properties
#[derive(Parser)]
#[command(name = "concierge")]
#[command(version)]
#[command(about = "AI concierge service for residential properties")]
#[command(
    long_about = "Elysia answers resident service requests over HTTP, classifying each request \
    and generating a reply with the best available backend: a downloaded model file, a hosted \
    inference API, a local model runtime, or built-in rule-based templates."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Elysia Concierge Configuration
# ==============================
#
# This file configures the HTTP server, the property profile, the reply
# generation backends and observability settings.
#
# Environment variables override the backend section at startup:
#   ELYSIA_USE_LLAMACPP, ELYSIA_LLAMACPP_REPO_ID, ELYSIA_LLAMACPP_FILENAME
#   ELYSIA_USE_HOSTED, ELYSIA_HOSTED_API_KEY, ELYSIA_HOSTED_MODEL
#   ELYSIA_USE_BLOOM, PORT

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 8000

# ─────────────────────────────────────────────────────────────────────────────
# PROPERTY PROFILE
# ─────────────────────────────────────────────────────────────────────────────
#
# Every field is optional and defaults to The Avant (Centennial, Colorado).
# Request identifiers look like <id_prefix>-<YYYYMMDD>-<NNNN>.

[property]
name = "The Avant"
location = "Centennial, Colorado"
management_company = "Kairoi Residential"
id_prefix = "AVT"

# ─────────────────────────────────────────────────────────────────────────────
# GENERATION BACKENDS
# ─────────────────────────────────────────────────────────────────────────────
#
# Precedence when several are enabled:
#   file_model > hosted > local_model > rule-based templates
#
# A backend that fails to initialize is skipped; the rule-based templates
# are always available.

[backend.file_model]
enabled = false
repo_id = "HagalazAI/Elysia-Trismegistus-Mistral-7B-v02-GGUF"
filename = "Elysia-Trismegistus-Mistral-7B-v02-IQ3_M.gguf"
hub_url = "https://huggingface.co"
cache_dir = "./models/cache"
# The download is abandoned if the hub stops sending for this long
connect_timeout_seconds = 10
stall_timeout_seconds = 60
# OpenAI-compatible runtime serving the downloaded file (must end with /v1)
runtime_url = "http://127.0.0.1:8080/v1"
max_tokens = 256
temperature = 0.7

[backend.hosted]
enabled = false
# api_key = "hf_..."
# model = "bigscience/bloom-560m"
api_url = "https://api-inference.huggingface.co"
max_new_tokens = 200
temperature = 0.7

[backend.local_model]
enabled = true
model = "bigscience/bloom-560m"
base_url = "http://127.0.0.1:8080/v1"
max_new_tokens = 128
temperature = 0.7
top_p = 0.9
top_k = 50
max_reply_chars = 500

# ─────────────────────────────────────────────────────────────────────────────
# ACTIVE REQUEST REGISTRY
# ─────────────────────────────────────────────────────────────────────────────

[registry]
# Maximum records kept; the oldest is evicted when full
capacity = 10000

# Records older than this are purged (24 hours)
ttl_seconds = 86400

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port

# ─────────────────────────────────────────────────────────────────────────────
# TIMEOUTS (Optional)
# ─────────────────────────────────────────────────────────────────────────────
#
# Per-backend generation timeouts in seconds, each in (0, 300].

[timeouts]
hosted = 30
local_model = 60
file_model = 120
"#
}
