use std::fmt;

/// Longest operators first so `>=` never splits into `>` `=`.
const OPERATORS: &[&str] = &[">=", "<=", "==", "!=", "&&", "||", ">", "<", "=", "!", "&", "|"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Maximal run of alphanumeric or `_` characters.
    Word(String),
    Operator(&'static str),
    Space(String),
    Punct(char),
}

impl Token {
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Self::Word(word) => Some(word.as_str()),
            _ => None,
        }
    }

    pub fn is_space(&self) -> bool {
        matches!(self, Self::Space(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(text) | Self::Space(text) => f.write_str(text),
            Self::Operator(op) => f.write_str(op),
            Self::Punct(ch) => write!(f, "{}", ch),
        }
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Splits surface text into tokens. Joining the tokens back together yields
/// the input unchanged.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = input;

    while let Some(ch) = rest.chars().next() {
        if is_word_char(ch) {
            let end = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
            tokens.push(Token::Word(rest[..end].to_string()));
            rest = &rest[end..];
            continue;
        }

        if ch.is_whitespace() {
            let end = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
            tokens.push(Token::Space(rest[..end].to_string()));
            rest = &rest[end..];
            continue;
        }

        if let Some(op) = OPERATORS.iter().copied().find(|op| rest.starts_with(op)) {
            tokens.push(Token::Operator(op));
            rest = &rest[op.len()..];
            continue;
        }

        tokens.push(Token::Punct(ch));
        rest = &rest[ch.len_utf8()..];
    }

    tokens
}

pub fn join_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::{join_tokens, tokenize, Token};

    #[test]
    fn joining_tokens_restores_input() {
        for input in [
            "result >= 3 && !done",
            "  x*(y+1) ",
            "",
            "Überfällig || 2result",
            "a.b != c",
        ] {
            assert_eq!(join_tokens(&tokenize(input)), input);
        }
    }

    #[test]
    fn splits_adjacent_operators_by_longest_match() {
        let tokens = tokenize("IsUrgent&&!IsOverdue");
        assert_eq!(
            tokens,
            vec![
                Token::Word("IsUrgent".to_string()),
                Token::Operator("&&"),
                Token::Operator("!"),
                Token::Word("IsOverdue".to_string()),
            ]
        );
    }

    #[test]
    fn digits_stay_inside_words() {
        let tokens = tokenize("2result result_2");
        assert_eq!(tokens[0].as_word(), Some("2result"));
        assert!(tokens[1].is_space());
        assert_eq!(tokens[2].as_word(), Some("result_2"));
    }

    #[test]
    fn unknown_symbols_become_punctuation() {
        assert_eq!(tokenize("(∀)"), vec![Token::Punct('('), Token::Punct('∀'), Token::Punct(')')]);
    }
}
