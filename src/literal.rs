//! Literal expression evaluator
//!
//! Reads the array-literal surface used by ALLOWED and VALUE-ALIASES fields:
//!
//! ```text
//! 'none', 'left', 'right'
//! 'utf8' => 'UTF-8', 'latin1' => 'ISO-8859-1'
//! 1, 2.5, true, null, ['nested', 'list']
//! ```
//!
//! The input is parsed as data with nom combinators. Nothing in it is ever
//! executed, and bare words other than `true`, `false` and `null` are
//! syntax errors.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case},
    character::complete::{anychar, char, digit1, multispace0, one_of},
    combinator::{all_consuming, cut, map, opt, recognize, value},
    error::{Error as NomError, ErrorKind},
    multi::{fold_many0, separated_list0},
    sequence::{delimited, pair, preceded, tuple},
    Err as NomErr, IResult,
};
use thiserror::Error;

/// Default bracket nesting limit
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Literal evaluation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("Literal syntax error at offset {offset} near '{near}'")]
    Syntax { offset: usize, near: String },

    #[error("Literal nesting deeper than {max_depth} at offset {offset}")]
    TooDeep { max_depth: usize, offset: usize },

    #[error("Array key at offset {offset} must be a scalar")]
    NonScalarKey { offset: usize },

    #[error("Entry {index} must be a scalar, not a nested list")]
    NotScalar { index: usize },

    #[error("Entry {index} has no key")]
    MissingKey { index: usize },
}

/// A single evaluated literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Quoted string, unescaped
    String(String),
    /// Number, kept as written
    Number(String),
    Bool(bool),
    Null,
    List(LiteralArray),
}

impl Literal {
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Literal::List(_))
    }

    /// Raw token text of a scalar, `None` for lists
    pub fn token(&self) -> Option<&str> {
        match self {
            Literal::String(s) | Literal::Number(s) => Some(s),
            Literal::Bool(true) => Some("true"),
            Literal::Bool(false) => Some("false"),
            Literal::Null => Some("null"),
            Literal::List(_) => None,
        }
    }
}

/// One `value` or `key => value` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralEntry {
    pub key: Option<Literal>,
    pub value: Literal,
}

/// Ordered entries of an array literal
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiteralArray {
    entries: Vec<LiteralEntry>,
}

impl LiteralArray {
    pub fn entries(&self) -> &[LiteralEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value tokens in order; keys are ignored
    pub fn into_tokens(self) -> Result<Vec<String>, LiteralError> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                entry
                    .value
                    .token()
                    .map(String::from)
                    .ok_or(LiteralError::NotScalar { index })
            })
            .collect()
    }

    /// `key => value` token pairs in order; every entry must be keyed
    pub fn into_pairs(self) -> Result<Vec<(String, String)>, LiteralError> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let key = entry
                    .key
                    .as_ref()
                    .ok_or(LiteralError::MissingKey { index })?
                    .token()
                    .ok_or(LiteralError::NotScalar { index })?;
                let value = entry
                    .value
                    .token()
                    .ok_or(LiteralError::NotScalar { index })?;
                Ok((key.to_string(), value.to_string()))
            })
            .collect()
    }
}

type ParseResult<'a, T> = IResult<&'a str, T>;

enum Chunk<'a> {
    Text(&'a str),
    Escaped(char),
}

fn quoted<'a>(
    input: &'a str,
    quote: char,
    stop: &'static str,
    unescape: fn(&mut String, char),
) -> ParseResult<'a, String> {
    let chunk = alt((
        map(is_not(stop), Chunk::Text),
        map(preceded(char('\\'), anychar), Chunk::Escaped),
    ));
    let body = fold_many0(chunk, String::new, move |mut acc, chunk| {
        match chunk {
            Chunk::Text(text) => acc.push_str(text),
            Chunk::Escaped(c) => unescape(&mut acc, c),
        }
        acc
    });
    delimited(char(quote), body, cut(char(quote)))(input)
}

/// Only `\'` and `\\` are escapes; any other backslash is kept
fn unescape_single(acc: &mut String, c: char) {
    if c != '\'' && c != '\\' {
        acc.push('\\');
    }
    acc.push(c);
}

fn unescape_double(acc: &mut String, c: char) {
    match c {
        'n' => acc.push('\n'),
        't' => acc.push('\t'),
        'r' => acc.push('\r'),
        other => acc.push(other),
    }
}

fn single_quoted(input: &str) -> ParseResult<'_, String> {
    quoted(input, '\'', "\\'", unescape_single)
}

fn double_quoted(input: &str) -> ParseResult<'_, String> {
    quoted(input, '"', "\\\"", unescape_double)
}

fn number(input: &str) -> ParseResult<'_, Literal> {
    map(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            opt(pair(char('.'), digit1)),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |text: &str| Literal::Number(text.to_string()),
    )(input)
}

fn keyword(input: &str) -> ParseResult<'_, Literal> {
    alt((
        value(Literal::Bool(true), tag_no_case("true")),
        value(Literal::Bool(false), tag_no_case("false")),
        value(Literal::Null, tag_no_case("null")),
    ))(input)
}

fn ws(input: &str) -> ParseResult<'_, &str> {
    multispace0(input)
}

fn trailing_comma(input: &str) -> ParseResult<'_, Option<char>> {
    opt(preceded(multispace0, char(',')))(input)
}

fn scalar(input: &str) -> ParseResult<'_, Literal> {
    alt((
        map(single_quoted, Literal::String),
        map(double_quoted, Literal::String),
        number,
        keyword,
    ))(input)
}

/// Non-executing evaluator for array literals
#[derive(Debug, Clone, Copy)]
pub struct LiteralEvaluator {
    max_depth: usize,
}

impl Default for LiteralEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl LiteralEvaluator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Evaluate the body of an array literal (without surrounding brackets)
    pub fn evaluate<'a>(&self, src: &'a str) -> Result<LiteralArray, LiteralError> {
        match all_consuming(|i: &'a str| self.body(i, 0))(src) {
            Ok((_, entries)) => Ok(LiteralArray { entries }),
            Err(NomErr::Error(e)) | Err(NomErr::Failure(e)) => Err(self.convert_error(src, e)),
            Err(NomErr::Incomplete(_)) => Err(LiteralError::Syntax {
                offset: src.len(),
                near: String::new(),
            }),
        }
    }

    fn convert_error(&self, src: &str, e: NomError<&str>) -> LiteralError {
        let offset = src.len() - e.input.len();
        match e.code {
            ErrorKind::TooLarge => LiteralError::TooDeep {
                max_depth: self.max_depth,
                offset,
            },
            ErrorKind::Verify => LiteralError::NonScalarKey { offset },
            _ => LiteralError::Syntax {
                offset,
                near: e.input.chars().take(16).collect(),
            },
        }
    }

    // body := (entry ("," entry)* ","?)?
    fn body<'a>(&self, input: &'a str, depth: usize) -> ParseResult<'a, Vec<LiteralEntry>> {
        let (rest, entries) = preceded(
            ws,
            separated_list0(
                delimited(ws, char(','), ws),
                |i: &'a str| self.entry(i, depth),
            ),
        )(input)?;
        if entries.is_empty() {
            let (rest, _) = ws(rest)?;
            return Ok((rest, entries));
        }
        let (rest, _) = pair(trailing_comma, ws)(rest)?;
        Ok((rest, entries))
    }

    // entry := value ("=>" value)?
    fn entry<'a>(&self, input: &'a str, depth: usize) -> ParseResult<'a, LiteralEntry> {
        let (rest, first) = self.value(input, depth)?;
        let (rest, second) = opt(preceded(
            delimited(ws, tag("=>"), ws),
            cut(|i: &'a str| self.value(i, depth)),
        ))(rest)?;
        match second {
            None => Ok((
                rest,
                LiteralEntry {
                    key: None,
                    value: first,
                },
            )),
            Some(_) if !first.is_scalar() => {
                Err(NomErr::Failure(NomError::new(input, ErrorKind::Verify)))
            }
            Some(value) => Ok((
                rest,
                LiteralEntry {
                    key: Some(first),
                    value,
                },
            )),
        }
    }

    fn value<'a>(&self, input: &'a str, depth: usize) -> ParseResult<'a, Literal> {
        if input.starts_with('[') {
            self.list(input, depth + 1)
        } else {
            scalar(input)
        }
    }

    fn list<'a>(&self, input: &'a str, depth: usize) -> ParseResult<'a, Literal> {
        if depth > self.max_depth {
            return Err(NomErr::Failure(NomError::new(input, ErrorKind::TooLarge)));
        }
        map(
            delimited(
                char('['),
                |i: &'a str| self.body(i, depth),
                cut(char(']')),
            ),
            |entries| Literal::List(LiteralArray { entries }),
        )(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> Result<LiteralArray, LiteralError> {
        LiteralEvaluator::default().evaluate(src)
    }

    #[test]
    fn test_list_of_strings() {
        let tokens = eval("'none', 'left',\n  \"right\"").unwrap().into_tokens().unwrap();
        assert_eq!(tokens, vec!["none", "left", "right"]);
    }

    #[test]
    fn test_pairs() {
        let pairs = eval("'utf8' => 'UTF-8', 'latin1'=>'ISO-8859-1',")
            .unwrap()
            .into_pairs()
            .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("utf8".to_string(), "UTF-8".to_string()),
                ("latin1".to_string(), "ISO-8859-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_scalar_tokens() {
        let tokens = eval("1, -2.5e3, TRUE, false, null").unwrap().into_tokens().unwrap();
        assert_eq!(tokens, vec!["1", "-2.5e3", "true", "false", "null"]);
    }

    #[test]
    fn test_escapes() {
        let tokens = eval(r#"'it\'s', "a\"b", 'back\\slash', ''"#)
            .unwrap()
            .into_tokens()
            .unwrap();
        assert_eq!(tokens, vec!["it's", "a\"b", "back\\slash", ""]);
    }

    #[test]
    fn test_single_quotes_keep_other_backslashes() {
        let tokens = eval(r#"'C:\new', '\t', "\t\n""#).unwrap().into_tokens().unwrap();
        assert_eq!(tokens, vec!["C:\\new", "\\t", "\t\n"]);
        assert_eq!(tokens[0].len(), 6);
        assert_eq!(tokens[1].len(), 2);
    }

    #[test]
    fn test_empty_body() {
        assert!(eval("").unwrap().is_empty());
        assert!(eval("  \n ").unwrap().is_empty());
    }

    #[test]
    fn test_nested_lists() {
        let array = eval("'a', ['b', ['c']]").unwrap();
        assert_eq!(array.len(), 2);
        match &array.entries()[1].value {
            Literal::List(inner) => assert_eq!(inner.len(), 2),
            other => panic!("Expected list, got {:?}", other),
        }
        assert_eq!(array.into_tokens(), Err(LiteralError::NotScalar { index: 1 }));
    }

    #[test]
    fn test_depth_limit() {
        let evaluator = LiteralEvaluator::new(1);
        assert_eq!(evaluator.max_depth(), 1);
        assert_eq!(LiteralEvaluator::default().max_depth(), DEFAULT_MAX_DEPTH);
        assert!(evaluator.evaluate("['a']").is_ok());
        assert!(matches!(
            evaluator.evaluate("[['a']]"),
            Err(LiteralError::TooDeep { max_depth: 1, offset: 1 })
        ));
    }

    #[test]
    fn test_rejects_code() {
        for src in ["system('rm -rf /')", "PHP_EOL", "'a' . 'b'", "$x", "'a' 'b'"] {
            assert!(
                matches!(eval(src), Err(LiteralError::Syntax { .. })),
                "{src} should be rejected"
            );
        }
    }

    #[test]
    fn test_syntax_error_offsets() {
        assert_eq!(
            eval("'a', b"),
            Err(LiteralError::Syntax {
                offset: 5,
                near: "b".to_string()
            })
        );
        assert!(matches!(eval("'unterminated"), Err(LiteralError::Syntax { offset: 13, .. })));
        assert!(matches!(eval("'a' =>"), Err(LiteralError::Syntax { .. })));
        assert!(matches!(eval("['a'"), Err(LiteralError::Syntax { .. })));
    }

    #[test]
    fn test_list_keys_are_rejected() {
        assert_eq!(eval("['a'] => 'b'"), Err(LiteralError::NonScalarKey { offset: 0 }));
    }

    #[test]
    fn test_pairs_require_keys() {
        assert_eq!(
            eval("'a' => 'b', 'c'").unwrap().into_pairs(),
            Err(LiteralError::MissingKey { index: 1 })
        );
    }
}
