// ==========================================
// 工艺主数据目录 - 翻译适配器
// ==========================================
// 源语言 pt → 目标语言 en / es
// 翻译失败不致命: 任一目标失败时整体回退为原文
// ==========================================

use crate::config::TranslationConfig;
use crate::domain::catalog::LocalizedText;
use crate::domain::types::Locale;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// 翻译错误（仅在适配器内部流转，不向上抛出）
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("翻译服务不可用: {0}")]
    Unavailable(String),

    #[error("翻译响应无效: {0}")]
    InvalidResponse(String),
}

pub type TranslationResult<T> = Result<T, TranslationError>;

// ==========================================
// Translator - 翻译能力接口
// ==========================================
pub trait Translator: Send + Sync {
    /// 将源语言文本翻译为指定目标语言
    fn translate_to(&self, text: &str, target: Locale) -> TranslationResult<String>;

    /// 翻译为 (en, es)
    ///
    /// - 空白 → ("", "")
    /// - 任一目标失败 → (text, text)
    fn translate(&self, text: &str) -> (String, String) {
        if text.trim().is_empty() {
            return (String::new(), String::new());
        }
        match (
            self.translate_to(text, Locale::En),
            self.translate_to(text, Locale::Es),
        ) {
            (Ok(en), Ok(es)) => (en, es),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "翻译失败，回退为原文");
                (text.to_string(), text.to_string())
            }
        }
    }
}

/// 直通翻译器：返回原文（离线默认）
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughTranslator;

impl Translator for PassThroughTranslator {
    fn translate_to(&self, text: &str, _target: Locale) -> TranslationResult<String> {
        Ok(text.to_string())
    }
}

// ==========================================
// HttpTranslator - LibreTranslate 兼容接口
// ==========================================
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

pub struct HttpTranslator {
    agent: ureq::Agent,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTranslator {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout_ms: u64) -> Self {
        let timeout = Duration::from_millis(timeout_ms.max(100));
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();
        Self {
            agent,
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

impl Translator for HttpTranslator {
    fn translate_to(&self, text: &str, target: Locale) -> TranslationResult<String> {
        let request = TranslateRequest {
            q: text,
            source: Locale::SOURCE.iso(),
            target: target.iso(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let response = self
            .agent
            .post(&self.endpoint)
            .set("content-type", "application/json")
            .send_json(&request)
            .map_err(|e| match e {
                ureq::Error::Status(status, _) => {
                    TranslationError::Unavailable(format!("http status {}", status))
                }
                ureq::Error::Transport(transport) => {
                    TranslationError::Unavailable(transport.to_string())
                }
            })?;
        let body: TranslateResponse = response
            .into_json()
            .map_err(|e| TranslationError::InvalidResponse(e.to_string()))?;
        Ok(body.translated_text)
    }
}

/// 按配置构建翻译器：未启用或未配置端点时使用直通翻译器
pub fn build_translator(config: &TranslationConfig) -> Box<dyn Translator> {
    match config.endpoint.as_deref() {
        Some(endpoint) if config.enabled && !endpoint.trim().is_empty() => Box::new(
            HttpTranslator::new(endpoint, config.api_key.clone(), config.timeout_ms),
        ),
        _ => Box::new(PassThroughTranslator),
    }
}

// ==========================================
// 三语文本补全
// ==========================================

/// 源语言文本存在时，空白的目标语言由翻译补全；显式给出的目标文本保持不变
pub fn fill_missing_targets(translator: &dyn Translator, text: &mut LocalizedText) {
    let source = match text.source() {
        Some(s) => s.to_string(),
        None => return,
    };
    if Locale::TARGETS.iter().all(|l| text.get(*l).is_some()) {
        return;
    }
    let (en, es) = translator.translate(&source);
    if text.en.is_none() {
        text.set(Locale::En, Some(en));
    }
    if text.es.is_none() {
        text.set(Locale::Es, Some(es));
    }
}

/// 由源语言文本重新生成全部目标语言（源为空时目标清空）
pub fn translated_from_source(translator: &dyn Translator, source: Option<&str>) -> LocalizedText {
    let source = source.map(str::trim).filter(|s| !s.is_empty());
    match source {
        Some(s) => {
            let (en, es) = translator.translate(s);
            LocalizedText::new(Some(s.to_string()), Some(en), Some(es))
        }
        None => LocalizedText::default(),
    }
}
