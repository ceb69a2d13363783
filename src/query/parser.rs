use nom::{IResult, Parser};
use nom::branch::alt;
use nom::bytes::complete::{tag, take_until, take_while, take_while1};
use nom::character::complete::{char, one_of};
use nom::combinator::{opt, value};
use nom::sequence::{delimited, terminated};
use tracing::debug;
use crate::core::error::{Error, ErrorKind, Result};
use crate::query::ast::{Query, ANY_FIELD};

/// Query lexemes; `AND` never reaches the parser
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Open,
    NotOpen,
    Close,
    Or,
    Word(String),
    Phrase { field: Option<String>, text: String },
}

/// Query parser for converting string queries to AST
///
/// - `hello world` -> AND of terms
/// - `hello OR world` -> OR of terms
/// - `title:hello` -> fielded term
/// - `rend*`, `title:rend*` -> prefix
/// - `"exact phrase"`, `title:"exact phrase"` -> full text
/// - `( ... )` groups, `NOT( ... )` excludes
pub struct QueryParser {
    pub default_field: String,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new(ANY_FIELD)
    }
}

impl QueryParser {
    pub fn new(default_field: &str) -> Self {
        QueryParser {
            default_field: default_field.to_string(),
        }
    }

    pub fn parse(&self, input: &str) -> Result<Query> {
        let tokens = lex(input)?;
        let mut pointer = 0;
        let query = self.parse_tokens(&tokens, &mut pointer, 0);
        debug!(input, query = %query, "Parsed query");
        Ok(query)
    }

    fn parse_tokens(&self, tokens: &[Lexeme], pointer: &mut usize, depth: usize) -> Query {
        let mut subqueries = Vec::new();
        let mut saw_or = false;

        while *pointer < tokens.len() {
            match &tokens[*pointer] {
                Lexeme::Open | Lexeme::NotOpen => {
                    let negate = tokens[*pointer] == Lexeme::NotOpen;
                    *pointer += 1;
                    let subquery = self.parse_tokens(tokens, pointer, depth + 1);
                    // Step over the closing parenthesis, if any
                    if *pointer < tokens.len() {
                        *pointer += 1;
                    }
                    subqueries.push(if negate { Query::not(subquery) } else { subquery });
                    continue;
                }
                Lexeme::Close if depth > 0 => break,
                Lexeme::Close => {}
                Lexeme::Or => saw_or = true,
                Lexeme::Word(word) => subqueries.push(self.word_query(word)),
                Lexeme::Phrase { field, text } => {
                    let field = field.as_deref().unwrap_or(&self.default_field);
                    subqueries.push(Query::full_text(field, text));
                }
            }
            *pointer += 1;
        }

        match subqueries.len() {
            0 if depth == 0 => Query::null("Empty Query"),
            0 => Query::null("Empty Group"),
            1 => subqueries.remove(0),
            _ if saw_or => Query::or(subqueries),
            _ => Query::and(subqueries),
        }
    }

    fn word_query(&self, word: &str) -> Query {
        let (prefix, body) = match word.strip_suffix('*') {
            Some(body) if !body.is_empty() => (true, body),
            _ => (false, word),
        };

        let (field, value) = match body.split_once(':') {
            Some((field, value)) if !field.is_empty() && !value.is_empty() => (field, value),
            _ => (self.default_field.as_str(), body),
        };

        if prefix {
            Query::prefix(field, value)
        } else {
            Query::term(field, value)
        }
    }
}

fn is_field_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '*'
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '"' | '\'')
}

/// `field:"text"` or `"text"`
fn phrase(input: &str) -> IResult<&str, Option<Lexeme>> {
    let (rest, (field, text)) = (
        opt(terminated(take_while1(is_field_char), char(':'))),
        delimited(char('"'), take_until("\""), char('"')),
    ).parse(input)?;

    Ok((rest, Some(Lexeme::Phrase {
        field: field.map(str::to_string),
        text: text.to_string(),
    })))
}

fn word(input: &str) -> IResult<&str, Option<Lexeme>> {
    let (rest, word) = take_while1(is_word_char).parse(input)?;
    let lexeme = match word {
        "AND" => None,
        "OR" => Some(Lexeme::Or),
        _ => Some(Lexeme::Word(word.to_string())),
    };
    Ok((rest, lexeme))
}

/// One lexeme; unbalanced quotes lex to nothing
fn lexeme(input: &str) -> IResult<&str, Option<Lexeme>> {
    alt((
        value(Some(Lexeme::NotOpen), tag("NOT(")),
        value(Some(Lexeme::Open), tag("(")),
        value(Some(Lexeme::Close), tag(")")),
        phrase,
        value(None, one_of("\"'")),
        word,
    )).parse(input)
}

fn lex(input: &str) -> Result<Vec<Lexeme>> {
    let mut tokens = Vec::new();
    let mut rest = input;

    loop {
        let (remaining, _) = take_while(|c: char| c.is_whitespace())
            .parse(rest)
            .map_err(|e: nom::Err<nom::error::Error<&str>>| lex_error(input, e))?;
        if remaining.is_empty() {
            break;
        }

        let (remaining, token) = lexeme(remaining).map_err(|e| lex_error(input, e))?;
        tokens.extend(token);
        rest = remaining;
    }

    Ok(tokens)
}

fn lex_error(input: &str, err: nom::Err<nom::error::Error<&str>>) -> Error {
    Error::new(ErrorKind::Parse, format!("Cannot tokenize query `{}`: {}", input, err))
}
