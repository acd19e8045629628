//! Tokenizer for the small CREATE TABLE / INSERT / SELECT grammar (spec §1).
//!
//! Character-at-a-time scanning over a `Peekable<Chars>`, same shape as a
//! hand-rolled recursive-descent front end: no regex, no lookahead beyond
//! one character.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Create,
    Table,
    Primary,
    Key,
    Not,
    Null,
    And,
    Integer,
    Text,

    Identifier(String),
    Number(i64),
    StringLiteral(String),

    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Star,

    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    Eof,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::LeftParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RightParen);
                chars.next();
            }
            ',' => {
                tokens.push(Token::Comma);
                chars.next();
            }
            ';' => {
                tokens.push(Token::Semicolon);
                chars.next();
            }
            '*' => {
                tokens.push(Token::Star);
                chars.next();
            }
            '=' => {
                tokens.push(Token::Equal);
                chars.next();
            }
            '<' => {
                chars.next();
                if let Some(&'=') = chars.peek() {
                    tokens.push(Token::LessThanOrEqual);
                    chars.next();
                } else if let Some(&'>') = chars.peek() {
                    tokens.push(Token::NotEqual);
                    chars.next();
                } else {
                    tokens.push(Token::LessThan);
                }
            }
            '>' => {
                chars.next();
                if let Some(&'=') = chars.peek() {
                    tokens.push(Token::GreaterThanOrEqual);
                    chars.next();
                } else {
                    tokens.push(Token::GreaterThan);
                }
            }
            '!' => {
                chars.next();
                if let Some(&'=') = chars.peek() {
                    tokens.push(Token::NotEqual);
                    chars.next();
                } else {
                    return Err("Unexpected character: !".to_string());
                }
            }
            '-' => {
                chars.next();
                if let Some(&next_ch) = chars.peek() {
                    if next_ch.is_ascii_digit() {
                        let num = read_number(&mut chars);
                        tokens.push(Token::Number(-num.parse::<i64>().unwrap()));
                        continue;
                    }
                }
                return Err("Unexpected character: -".to_string());
            }
            '\'' => {
                chars.next();
                let string_val = read_string(&mut chars, '\'')?;
                tokens.push(Token::StringLiteral(string_val));
            }
            '"' => {
                chars.next();
                let string_val = read_string(&mut chars, '"')?;
                tokens.push(Token::StringLiteral(string_val));
            }
            _ if ch.is_ascii_digit() => {
                let num = read_number(&mut chars);
                tokens.push(Token::Number(num.parse::<i64>().unwrap()));
            }
            _ if ch.is_ascii_alphabetic() || ch == '_' => {
                let ident = read_identifier(&mut chars);
                tokens.push(match_keyword(&ident));
            }
            _ => {
                return Err(format!("Unexpected character: {ch}"));
            }
        }
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}

fn read_identifier(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut ident = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            ident.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

fn read_number(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut num = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_digit() {
            num.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    num
}

fn read_string(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    delimiter: char,
) -> Result<String, String> {
    let mut string_val = String::new();
    let mut escaped = false;

    while let Some(&ch) = chars.peek() {
        chars.next();

        if escaped {
            string_val.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == delimiter {
            return Ok(string_val);
        } else {
            string_val.push(ch);
        }
    }

    Err("Unterminated string literal".to_string())
}

fn match_keyword(ident: &str) -> Token {
    match ident.to_uppercase().as_str() {
        "SELECT" => Token::Select,
        "FROM" => Token::From,
        "WHERE" => Token::Where,
        "INSERT" => Token::Insert,
        "INTO" => Token::Into,
        "VALUES" => Token::Values,
        "CREATE" => Token::Create,
        "TABLE" => Token::Table,
        "PRIMARY" => Token::Primary,
        "KEY" => Token::Key,
        "NOT" => Token::Not,
        "NULL" => Token::Null,
        "AND" => Token::And,
        "INTEGER" | "INT" => Token::Integer,
        "TEXT" | "VARCHAR" | "STRING" => Token::Text,
        _ => Token::Identifier(ident.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_create_table() {
        let tokens = tokenize("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Create,
                Token::Table,
                Token::Identifier("users".into()),
                Token::LeftParen,
                Token::Identifier("id".into()),
                Token::Integer,
                Token::Primary,
                Token::Key,
                Token::Comma,
                Token::Identifier("name".into()),
                Token::Text,
                Token::Not,
                Token::Null,
                Token::RightParen,
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_negative_number_and_operators() {
        let tokens = tokenize("WHERE age >= -5 AND name <> 'x'").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Where,
                Token::Identifier("age".into()),
                Token::GreaterThanOrEqual,
                Token::Number(-5),
                Token::And,
                Token::Identifier("name".into()),
                Token::NotEqual,
                Token::StringLiteral("x".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_errors() {
        assert!(tokenize("'unterminated").is_err());
    }
}
