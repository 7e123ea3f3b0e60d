use crate::config::RedactionConfig;
use crate::defaults::REDACTION_PLACEHOLDER;
use crate::error::Result;
use crate::rules::compile_patterns;
use log;
use regex::{NoExpand, Regex};
use std::borrow::Cow;

#[derive(Debug, Clone)]
pub struct SecretPattern {
    pub name: String,
    regex: Regex,
}

impl SecretPattern {
    pub fn builtin(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            regex: Regex::new(pattern).expect("Invalid built-in secret pattern"),
        }
    }

    pub fn from_regex(name: impl Into<String>, regex: Regex) -> Self {
        Self {
            name: name.into(),
            regex,
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Built-in patterns, narrow and high-confidence first, the generic
/// `name = value` matcher last.
pub fn builtin_patterns() -> Vec<SecretPattern> {
    vec![
        SecretPattern::builtin(
            "aws_access_key_id",
            r"\b(?:AKIA|ASIA|ABIA|ACCA|AGPA|AIDA|AROA|ANPA)[0-9A-Z]{16}\b",
        ),
        SecretPattern::builtin(
            "private_key_block",
            r"(?s)-----BEGIN [A-Z0-9 ]*PRIVATE KEY( BLOCK)?-----.*-----END [A-Z0-9 ]*PRIVATE KEY( BLOCK)?-----",
        ),
        SecretPattern::builtin(
            "jwt",
            r"\beyJ[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}",
        ),
        SecretPattern::builtin(
            "bearer_token",
            r"(?i)\bbearer\s+[A-Za-z0-9._~+/-]{20,}=*",
        ),
        SecretPattern::builtin(
            "connection_string",
            r#"(?i)\b(?:postgres(?:ql)?|mysql|mariadb|mongodb(?:\+srv)?|rediss?|amqps?|mssql|sqlserver)://[^\s:/@'"]+:[^\s@/'"]+@[^\s'"]+"#,
        ),
        SecretPattern::builtin(
            "secret_assignment",
            r#"(?i)\b[A-Za-z0-9_.-]*(?:secret|passwd|password|pwd|token|api[_-]?key|access[_-]?key|private[_-]?key|auth[_-]?key|credentials?)(?:[_-]?(?:key|id|value))?["']?\s*[:=]\s*["']?[^\s"',;()\[\]{}<>]{8,}["']?"#,
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redacted<'t> {
    pub text: Cow<'t, str>,
    pub replacements: usize,
}

/// Sequential, order-dependent secret replacement.
///
/// Pattern `i + 1` sees the output of pattern `i`, so anything a narrow
/// pattern already replaced is never matched again by a broader one.
#[derive(Debug, Clone)]
pub struct SecretRedactor {
    enabled: bool,
    placeholder: String,
    patterns: Vec<SecretPattern>,
}

impl Default for SecretRedactor {
    fn default() -> Self {
        Self::new(builtin_patterns())
    }
}

impl SecretRedactor {
    pub fn new(patterns: Vec<SecretPattern>) -> Self {
        Self {
            enabled: true,
            placeholder: REDACTION_PLACEHOLDER.to_string(),
            patterns,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            placeholder: REDACTION_PLACEHOLDER.to_string(),
            patterns: Vec::new(),
        }
    }

    pub fn from_config(config: &RedactionConfig) -> Result<Self> {
        if !config.enabled {
            log::debug!("Secret redaction disabled.");
            return Ok(Self::disabled());
        }
        let mut patterns = builtin_patterns();
        let extra = compile_patterns("redaction", &config.extra_patterns)?;
        patterns.extend(
            extra
                .into_iter()
                .enumerate()
                .map(|(i, regex)| SecretPattern::from_regex(format!("custom_{}", i + 1), regex)),
        );
        log::debug!("Secret redaction enabled with {} patterns.", patterns.len());
        Ok(Self::new(patterns).with_placeholder(&config.placeholder))
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn patterns(&self) -> &[SecretPattern] {
        &self.patterns
    }

    pub fn redact(&self, text: &str) -> String {
        self.redact_counted(text).text.into_owned()
    }

    pub fn redact_counted<'t>(&self, text: &'t str) -> Redacted<'t> {
        if !self.enabled {
            return Redacted {
                text: Cow::Borrowed(text),
                replacements: 0,
            };
        }
        self.patterns.iter().fold(
            Redacted {
                text: Cow::Borrowed(text),
                replacements: 0,
            },
            |acc, pattern| {
                let hits = pattern.regex.find_iter(&acc.text).count();
                if hits == 0 {
                    return acc;
                }
                log::trace!("Pattern '{}' redacted {} match(es)", pattern.name, hits);
                let replaced = pattern
                    .regex
                    .replace_all(&acc.text, NoExpand(&self.placeholder))
                    .into_owned();
                Redacted {
                    text: Cow::Owned(replaced),
                    replacements: acc.replacements + hits,
                }
            },
        )
    }
}
