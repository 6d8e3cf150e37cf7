//! Custom filter conditions.
//!
//! Conditions are parsed once per request into a small predicate tree and
//! evaluated per task. The grammar is intentionally tiny: four task fields,
//! integer/boolean literals, comparisons, `&&`/`||`/`!` (also `&`, `|`,
//! `and`, `or`, `not`) and parentheses. Text outside that grammar falls back
//! to the legacy substring matcher, which lets anything it does not
//! recognise through unfiltered.

use crate::errors::{AppError, AppResult};
use crate::expr::{tokenize, Token};
use crate::models::{FilterNotice, FilterStage, Task};
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Priority,
    IsOverdue,
    IsUrgent,
    IsCompleted,
}

impl Field {
    fn from_word(word: &str) -> Option<Self> {
        [Self::Priority, Self::IsOverdue, Self::IsUrgent, Self::IsCompleted]
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(word))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "Priority",
            Self::IsOverdue => "IsOverdue",
            Self::IsUrgent => "IsUrgent",
            Self::IsCompleted => "IsCompleted",
        }
    }

    fn is_flag(self) -> bool {
        !matches!(self, Self::Priority)
    }

    fn read(self, task: &Task, now: NaiveDateTime) -> Value {
        match self {
            Self::Priority => Value::Int(i64::from(task.priority)),
            Self::IsOverdue => Value::Bool(task.is_overdue(now)),
            Self::IsUrgent => Value::Bool(task.is_urgent(now)),
            Self::IsCompleted => Value::Bool(task.completed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Passes every task.
    Always,
    Equals(Field, Value),
    GreaterThan(Field, Value),
    LessThan(Field, Value),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn parse(text: &str) -> AppResult<Self> {
        let tokens: Vec<Token> = tokenize(text)
            .into_iter()
            .filter(|token| !token.is_space())
            .collect();
        if tokens.is_empty() {
            return Err(AppError::Parse("Condition is empty".to_string()));
        }

        let mut parser = Parser { tokens, pos: 0 };
        let predicate = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(AppError::Parse(format!("Unexpected '{}' in condition", token)));
        }
        Ok(predicate)
    }

    /// Substring sniffing for conditions outside the grammar: the first known
    /// fragment wins.
    pub fn from_legacy_pattern(text: &str) -> Option<Self> {
        if text.contains("Priority == 1") {
            Some(Self::Equals(Field::Priority, Value::Int(1)))
        } else if text.contains("IsOverdue") {
            Some(Self::Equals(Field::IsOverdue, Value::Bool(true)))
        } else if text.contains("IsUrgent") {
            Some(Self::Equals(Field::IsUrgent, Value::Bool(true)))
        } else {
            None
        }
    }

    pub fn evaluate(&self, task: &Task, now: NaiveDateTime) -> bool {
        match self {
            Self::Always => true,
            Self::Equals(field, expected) => field.read(task, now) == *expected,
            Self::GreaterThan(field, bound) => match (field.read(task, now), bound) {
                (Value::Int(actual), Value::Int(bound)) => actual > *bound,
                _ => false,
            },
            Self::LessThan(field, bound) => match (field.read(task, now), bound) {
                (Value::Int(actual), Value::Int(bound)) => actual < *bound,
                _ => false,
            },
            Self::And(left, right) => left.evaluate(task, now) && right.evaluate(task, now),
            Self::Or(left, right) => left.evaluate(task, now) || right.evaluate(task, now),
            Self::Not(inner) => !inner.evaluate(task, now),
        }
    }
}

/// Compiles a custom filter, degrading to the legacy matcher and then to
/// [`Predicate::Always`]. Any degradation is reported as a notice.
pub fn compile_condition(text: &str) -> (Predicate, Option<FilterNotice>) {
    match Predicate::parse(text) {
        Ok(predicate) => (predicate, None),
        Err(error) => match Predicate::from_legacy_pattern(text) {
            Some(predicate) => {
                tracing::warn!(
                    filter = %text,
                    error = %error,
                    "custom filter not parsed; using legacy pattern match"
                );
                (
                    predicate,
                    Some(FilterNotice::Fallback {
                        stage: FilterStage::Custom,
                        filter: text.to_string(),
                    }),
                )
            }
            None => {
                tracing::warn!(
                    filter = %text,
                    error = %error,
                    "custom filter not recognised; passing all tasks"
                );
                (
                    Predicate::Always,
                    Some(FilterNotice::Ignored {
                        stage: FilterStage::Custom,
                        reason: error.to_string(),
                    }),
                )
            }
        },
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, matches: impl Fn(&Token) -> bool) -> bool {
        if self.peek().map(&matches).unwrap_or(false) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn parse_or(&mut self) -> AppResult<Predicate> {
        let mut left = self.parse_and()?;
        while self.eat(|token| is_connective(token, &["||", "|"], "or")) {
            let right = self.parse_and()?;
            left = Predicate::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> AppResult<Predicate> {
        let mut left = self.parse_unary()?;
        while self.eat(|token| is_connective(token, &["&&", "&"], "and")) {
            let right = self.parse_unary()?;
            left = Predicate::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> AppResult<Predicate> {
        if self.eat(|token| is_connective(token, &["!"], "not")) {
            return Ok(Predicate::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> AppResult<Predicate> {
        match self.advance() {
            Some(Token::Punct('(')) => {
                let inner = self.parse_or()?;
                if !self.eat(|token| *token == Token::Punct(')')) {
                    return Err(AppError::Parse("Missing closing parenthesis".to_string()));
                }
                Ok(inner)
            }
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("true") => Ok(Predicate::Always),
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("false") => {
                Ok(Predicate::Not(Box::new(Predicate::Always)))
            }
            Some(Token::Word(word)) => {
                let field = Field::from_word(&word)
                    .ok_or_else(|| AppError::Parse(format!("Unknown field '{}'", word)))?;
                match self.peek() {
                    Some(Token::Operator(op)) if is_comparison(op) => {
                        let op = *op;
                        self.pos += 1;
                        let value = self.parse_value()?;
                        comparison(field, op, value)
                    }
                    _ if field.is_flag() => Ok(Predicate::Equals(field, Value::Bool(true))),
                    _ => Err(AppError::Parse(format!(
                        "Field '{}' needs a comparison",
                        field.as_str()
                    ))),
                }
            }
            Some(token) => Err(AppError::Parse(format!("Unexpected '{}' in condition", token))),
            None => Err(AppError::Parse("Condition ends unexpectedly".to_string())),
        }
    }

    fn parse_value(&mut self) -> AppResult<Value> {
        match self.advance() {
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            Some(Token::Word(word)) => Ok(Value::Int(word.parse::<i64>()?)),
            Some(token) => Err(AppError::Parse(format!("Expected a value, found '{}'", token))),
            None => Err(AppError::Parse("Missing value after comparison".to_string())),
        }
    }
}

fn is_connective(token: &Token, operators: &[&str], word: &str) -> bool {
    match token {
        Token::Operator(op) => operators.contains(op),
        Token::Word(text) => text.eq_ignore_ascii_case(word),
        _ => false,
    }
}

fn is_comparison(op: &str) -> bool {
    matches!(op, "==" | "=" | "!=" | ">" | "<" | ">=" | "<=")
}

fn comparison(field: Field, op: &str, value: Value) -> AppResult<Predicate> {
    let ordered = matches!(op, ">" | "<" | ">=" | "<=");
    match (field.is_flag(), value) {
        (true, Value::Int(_)) | (false, Value::Bool(_)) => {
            return Err(AppError::Parse(format!(
                "Field '{}' cannot be compared with that value",
                field.as_str()
            )));
        }
        (true, Value::Bool(_)) if ordered => {
            return Err(AppError::Parse(format!(
                "Field '{}' has no ordering",
                field.as_str()
            )));
        }
        _ => {}
    }

    let predicate = match op {
        "==" | "=" => Predicate::Equals(field, value),
        "!=" => Predicate::Not(Box::new(Predicate::Equals(field, value))),
        ">" => Predicate::GreaterThan(field, value),
        "<" => Predicate::LessThan(field, value),
        ">=" => Predicate::Or(
            Box::new(Predicate::GreaterThan(field, value)),
            Box::new(Predicate::Equals(field, value)),
        ),
        "<=" => Predicate::Or(
            Box::new(Predicate::LessThan(field, value)),
            Box::new(Predicate::Equals(field, value)),
        ),
        other => return Err(AppError::Parse(format!("Unsupported operator '{}'", other))),
    };
    Ok(predicate)
}
