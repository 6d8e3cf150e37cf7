mod token;

pub use token::{join_tokens, tokenize, Token};

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

static READABLE_OPERATORS: &[(&str, &str)] = &[
    (">=", "greater than or equal to"),
    ("<=", "less than or equal to"),
    (">", "greater than"),
    ("<", "less than"),
    ("&&", "and"),
    ("||", "or"),
];

/// Surface-syntax expression used by the WP trace.
///
/// Expressions are immutable: substitution hands back either the receiver
/// itself (nothing to replace) or a freshly built expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Variable { name: String },
    Constant { literal: String },
    /// Anything that is neither a bare identifier nor a numeric literal.
    Complex { tokens: Vec<Token> },
}

impl Expression {
    /// Classifies trimmed text as a constant, then a variable, then complex
    /// text. Never fails.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if is_numeric_literal(text) {
            return Self::Constant {
                literal: text.to_string(),
            };
        }
        if IDENTIFIER.is_match(text) {
            return Self::Variable {
                name: text.to_string(),
            };
        }
        Self::Complex {
            tokens: tokenize(text),
        }
    }

    /// Replaces the free variable `variable` with `replacement`.
    ///
    /// Inside complex text only whole identifiers are replaced, each one by
    /// `(replacement)`; `results` or `result_2` never match `result`.
    pub fn substitute(&self, variable: &str, replacement: &str) -> Cow<'_, Expression> {
        match self {
            Self::Variable { name } if name == variable => Cow::Owned(Self::parse(replacement)),
            Self::Variable { .. } | Self::Constant { .. } => Cow::Borrowed(self),
            Self::Complex { tokens } => {
                let spliced = tokenize(&format!("({})", replacement));
                let mut substituted = Vec::with_capacity(tokens.len());
                for token in tokens {
                    if token.as_word() == Some(variable) {
                        substituted.extend(spliced.iter().cloned());
                    } else {
                        substituted.push(token.clone());
                    }
                }
                Cow::Owned(Self::Complex {
                    tokens: substituted,
                })
            }
        }
    }

    pub fn to_human_readable(&self) -> String {
        match self {
            Self::Variable { name } => format!("variable {}", name),
            Self::Constant { literal } => format!("value {}", literal),
            Self::Complex { tokens } => tokens
                .iter()
                .map(|token| match token {
                    Token::Operator(op) => READABLE_OPERATORS
                        .iter()
                        .find(|(symbol, _)| symbol == op)
                        .map(|(_, words)| (*words).to_string())
                        .unwrap_or_else(|| (*op).to_string()),
                    other => other.to_string(),
                })
                .collect::<String>()
                .trim()
                .to_string(),
        }
    }

    /// Side conditions (division-by-zero guards and the like) that must hold
    /// for the expression to be defined.
    ///
    /// No variant tracks any yet, so this is always empty. It stays so the
    /// WP trace keeps a stable line for it once a variant needs one.
    pub fn definiteness_conditions(&self) -> Vec<String> {
        Vec::new()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable { name } => f.write_str(name),
            Self::Constant { literal } => f.write_str(literal),
            Self::Complex { tokens } => f.write_str(&join_tokens(tokens)),
        }
    }
}

fn is_numeric_literal(text: &str) -> bool {
    text.bytes().any(|byte| byte.is_ascii_digit()) && text.parse::<f64>().is_ok()
}
