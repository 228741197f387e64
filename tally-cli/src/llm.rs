use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tally_finance::CompletionBackend;

use crate::auth;
use crate::config::LlmSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAI,
    Anthropic,
}

impl Provider {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAI),
            "anthropic" => Ok(Provider::Anthropic),
            other => bail!("unknown llm provider '{other}' (expected ollama, openai or anthropic)"),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Ollama => "http://localhost:11434",
            Provider::OpenAI => "https://api.openai.com",
            Provider::Anthropic => "https://api.anthropic.com",
        }
    }
}

/// One configured model, called synchronously once per unseen description.
pub struct LlmBackend {
    provider: Provider,
    model: String,
    base_url: String,
    temperature: f32,
    client: reqwest::Client,
}

impl LlmBackend {
    pub fn from_config(section: &LlmSection) -> Result<Self> {
        let provider = Provider::parse(&section.provider)?;
        let base_url = section
            .base_url
            .clone()
            .unwrap_or_else(|| provider.default_base_url().to_string());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            provider,
            model: section.model.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: section.temperature,
            client,
        })
    }

    async fn complete_async(&self, prompt: &str) -> Result<String> {
        match self.provider {
            Provider::Ollama => self.ollama_generate(prompt).await,
            Provider::OpenAI => self.openai_complete(prompt).await,
            Provider::Anthropic => self.anthropic_complete(prompt).await,
        }
    }

    async fn ollama_generate(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Options {
            temperature: f32,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
            options: Options,
        }

        #[derive(Deserialize)]
        struct Resp {
            response: String,
        }

        let body = Req {
            model: &self.model,
            prompt,
            stream: false,
            options: Options {
                temperature: self.temperature,
            },
        };

        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .context("ollama request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("ollama error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse ollama response")?;
        Ok(out.response.trim().to_string())
    }

    async fn openai_complete(&self, prompt: &str) -> Result<String> {
        let key = auth::openai_api_key()?;

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("openai error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse openai response")?;
        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }

    async fn anthropic_complete(&self, prompt: &str) -> Result<String> {
        let token = auth::anthropic_token()?;

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: i32,
            temperature: f32,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            t: String,
            text: Option<String>,
        }

        // a category label is a handful of tokens
        let body = Req {
            model: &self.model,
            max_tokens: 32,
            temperature: self.temperature,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&token)?);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("anthropic request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("anthropic error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse anthropic response")?;
        let mut s = String::new();
        for b in out.content {
            if b.t == "text" {
                if let Some(t) = b.text {
                    s.push_str(&t);
                }
            }
        }
        Ok(s.trim().to_string())
    }
}

impl CompletionBackend for LlmBackend {
    fn identity(&self) -> String {
        format!("{}/{}", self.provider.key(), self.model)
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        // main runs on a multi-thread runtime; nesting block_on there would panic
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.complete_async(prompt)))
        } else {
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(self.complete_async(prompt))
        }
    }
}
