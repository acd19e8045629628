//! Recursive-descent parser producing [`Statement`] from a token stream
//! (spec §1, §4.3). Grammar is deliberately small: CREATE TABLE, INSERT,
//! and SELECT with an optional WHERE conjunction of simple predicates.

use crate::ast::*;
use crate::lexer::Token;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

pub fn parse(tokens: Vec<Token>) -> Result<Statement, String> {
    let mut parser = Parser::new(tokens);
    let stmt = parser.parse_statement()?;
    parser.consume(Token::Semicolon).ok();
    parser.expect_eof()?;
    Ok(stmt)
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0 }
    }

    fn current_token(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&Token::Eof)
    }

    fn consume(&mut self, expected: Token) -> Result<(), String> {
        if *self.current_token() == expected {
            self.current += 1;
            Ok(())
        } else {
            Err(format!(
                "Expected {:?}, found {:?}",
                expected,
                self.current_token()
            ))
        }
    }

    fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        self.current += 1;
        token
    }

    fn expect_eof(&self) -> Result<(), String> {
        match self.current_token() {
            Token::Eof => Ok(()),
            other => Err(format!("Unexpected trailing token: {other:?}")),
        }
    }

    fn expect_identifier(&mut self) -> Result<String, String> {
        match self.advance() {
            Token::Identifier(name) => Ok(name),
            other => Err(format!("Expected identifier, found {other:?}")),
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, String> {
        match self.current_token() {
            Token::Select => self.parse_select(),
            Token::Insert => self.parse_insert(),
            Token::Create => self.parse_create(),
            other => Err(format!("Unexpected token: {other:?}")),
        }
    }

    fn parse_create(&mut self) -> Result<Statement, String> {
        self.consume(Token::Create)?;
        self.consume(Token::Table)?;
        let name = self.expect_identifier()?;
        self.consume(Token::LeftParen)?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_def()?);
            if *self.current_token() == Token::Comma {
                self.advance();
                continue;
            }
            break;
        }
        self.consume(Token::RightParen)?;

        Ok(Statement::CreateTable(CreateTableStatement { name, columns }))
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef, String> {
        let name = self.expect_identifier()?;
        let data_type = match self.advance() {
            Token::Integer => DataType::Integer,
            Token::Text => DataType::Text,
            other => return Err(format!("Expected a column type, found {other:?}")),
        };

        let mut primary_key = false;
        let mut not_null = false;
        loop {
            match self.current_token() {
                Token::Primary => {
                    self.advance();
                    self.consume(Token::Key)?;
                    primary_key = true;
                    not_null = true;
                }
                Token::Not => {
                    self.advance();
                    self.consume(Token::Null)?;
                    not_null = true;
                }
                _ => break,
            }
        }

        Ok(ColumnDef {
            name,
            data_type,
            primary_key,
            not_null,
            unique: false,
        })
    }

    fn parse_insert(&mut self) -> Result<Statement, String> {
        self.consume(Token::Insert)?;
        self.consume(Token::Into)?;
        let table = self.expect_identifier()?;

        let columns = if *self.current_token() == Token::LeftParen {
            self.advance();
            let mut names = Vec::new();
            loop {
                names.push(self.expect_identifier()?);
                if *self.current_token() == Token::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
            self.consume(Token::RightParen)?;
            Some(names)
        } else {
            None
        };

        self.consume(Token::Values)?;
        self.consume(Token::LeftParen)?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_literal()?);
            if *self.current_token() == Token::Comma {
                self.advance();
                continue;
            }
            break;
        }
        self.consume(Token::RightParen)?;

        Ok(Statement::Insert(InsertStatement {
            table,
            columns,
            values,
        }))
    }

    fn parse_literal(&mut self) -> Result<Literal, String> {
        match self.advance() {
            Token::Number(n) => Ok(Literal::Integer(n)),
            Token::StringLiteral(s) => Ok(Literal::Text(s)),
            Token::Null => Ok(Literal::Null),
            other => Err(format!("Expected a literal value, found {other:?}")),
        }
    }

    fn parse_select(&mut self) -> Result<Statement, String> {
        self.consume(Token::Select)?;
        let columns = self.parse_select_columns()?;
        self.consume(Token::From)?;
        let table = self.expect_identifier()?;

        let where_clause = if *self.current_token() == Token::Where {
            self.advance();
            self.parse_where_conjunction()?
        } else {
            Vec::new()
        };

        Ok(Statement::Select(SelectStatement {
            table,
            columns,
            where_clause,
        }))
    }

    fn parse_select_columns(&mut self) -> Result<Vec<SelectColumn>, String> {
        if *self.current_token() == Token::Star {
            self.advance();
            return Ok(vec![SelectColumn::All]);
        }
        let mut columns = Vec::new();
        loop {
            columns.push(SelectColumn::Named(self.expect_identifier()?));
            if *self.current_token() == Token::Comma {
                self.advance();
                continue;
            }
            break;
        }
        Ok(columns)
    }

    fn parse_where_conjunction(&mut self) -> Result<Vec<Predicate>, String> {
        let mut predicates = vec![self.parse_predicate()?];
        while *self.current_token() == Token::And {
            self.advance();
            predicates.push(self.parse_predicate()?);
        }
        Ok(predicates)
    }

    fn parse_predicate(&mut self) -> Result<Predicate, String> {
        let column = self.expect_identifier()?;
        let op = match self.advance() {
            Token::Equal => Operator::Eq,
            Token::NotEqual => Operator::Ne,
            Token::LessThan => Operator::Lt,
            Token::LessThanOrEqual => Operator::Le,
            Token::GreaterThan => Operator::Gt,
            Token::GreaterThanOrEqual => Operator::Ge,
            other => return Err(format!("Expected a comparison operator, found {other:?}")),
        };
        let value = self.parse_literal()?;
        Ok(Predicate { column, op, value })
    }
}
