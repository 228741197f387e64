use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::state::ensure_tally_home;

const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
const ANTHROPIC_KEY_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub anthropic_token: Option<String>,
    pub openai_api_key: Option<String>,
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    let p = auth_path()?;
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth(auth: &AuthState) -> Result<()> {
    let p = auth_path()?;
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Environment first, then `auth.json`.
pub fn openai_api_key() -> Result<String> {
    if let Some(key) = env_secret(OPENAI_KEY_ENV) {
        return Ok(key);
    }
    load_auth()?
        .openai_api_key
        .ok_or_else(|| anyhow::anyhow!("missing OpenAI API key; set {OPENAI_KEY_ENV} or run: tally auth paste-openai-api-key"))
}

/// Environment first, then `auth.json`.
pub fn anthropic_token() -> Result<String> {
    if let Some(token) = env_secret(ANTHROPIC_KEY_ENV) {
        return Ok(token);
    }
    load_auth()?
        .anthropic_token
        .ok_or_else(|| anyhow::anyhow!("missing Anthropic token; set {ANTHROPIC_KEY_ENV} or run: tally auth paste-anthropic-token"))
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

/// Prompt for a secret, check its prefix and store it in `auth.json`.
fn paste_secret(what: &str, prefix: &str, store: impl FnOnce(&mut AuthState, String)) -> Result<()> {
    let secret = prompt_secret(&format!("Paste {what} (starts with {prefix})"))?;
    if !secret.starts_with(prefix) {
        bail!("that didn't look like an {what} (expected prefix {prefix})");
    }
    let mut auth = load_auth()?;
    store(&mut auth, secret);
    save_auth(&auth)?;
    println!("Saved {what} to {}", auth_path()?.display());
    Ok(())
}

pub fn anthropic_paste_token() -> Result<()> {
    paste_secret("Anthropic token", "sk-ant-", |a, t| a.anthropic_token = Some(t))
}

pub fn openai_paste_api_key() -> Result<()> {
    paste_secret("OpenAI API key", "sk-", |a, k| a.openai_api_key = Some(k))
}
