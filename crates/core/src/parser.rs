// Path: crates/core/src/parser.rs
//! Tokenizes line-numbered contract source.
//!
//! Only the structure needed for template comparison is recovered: function
//! names and, per numbered line, its token list. Expressions are not parsed.
//! String literals are one token with their quotes kept, identifiers and
//! numbers are one token, and every other non-space character stands alone.

use tela_api::contract::{Contract, ContractParser, Function};
use tela_types::error::ValidationError;

/// A [`ContractParser`] for line-numbered BASIC-style contracts.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicParser;

impl ContractParser for BasicParser {
    fn parse(&self, source: &str) -> Result<Contract, ValidationError> {
        parse_contract(source)
    }
}

fn err(line: usize, msg: &str) -> ValidationError {
    ValidationError::Parse(format!("line {}: {}", line, msg))
}

/// Returns the rest of `line` if it starts with `keyword` as a whole word, ignoring case.
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let head = line.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = line.get(keyword.len()..)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest.trim_start()),
        Some(_) => None,
    }
}

fn is_end_function(line: &str) -> bool {
    strip_keyword(line, "End")
        .and_then(|rest| strip_keyword(rest, "Function"))
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("//"))
}

fn function_name(header: &str) -> Option<String> {
    let (name, _) = header.split_once('(')?;
    let name = name.trim();
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then(|| name.to_string())
}

fn split_line_number(line: &str) -> Option<(u64, &str)> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    let (num, rest) = (line.get(..digits)?, line.get(digits..)?);
    if num.is_empty() || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((num.parse().ok()?, rest))
}

/// Splits a statement into tokens. A `//` outside a string literal ends the line.
pub fn tokenize(statement: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = statement.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '"' => {
                let mut end = None;
                for (i, d) in chars.by_ref() {
                    if d == '"' {
                        end = Some(i);
                        break;
                    }
                }
                let literal = end
                    .and_then(|end| statement.get(start..=end))
                    .ok_or_else(|| "unterminated string literal".to_string())?;
                tokens.push(literal.to_string());
            }
            '/' if matches!(chars.peek(), Some((_, '/'))) => break,
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, d)) = chars.peek() {
                    if !(d.is_ascii_alphanumeric() || d == '_') {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                tokens.extend(statement.get(start..end).map(str::to_string));
            }
            c => tokens.push(c.to_string()),
        }
    }
    Ok(tokens)
}

fn parse_contract(source: &str) -> Result<Contract, ValidationError> {
    let mut contract = Contract::default();
    let mut current: Option<Function> = None;
    let mut in_comment = false;

    for (idx, raw) in source.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();

        let Some(function) = current.as_mut() else {
            // Outside of functions only headers and comment state matter.
            if in_comment {
                in_comment = !line.contains("*/");
                continue;
            }
            if let Some(rest) = line.strip_prefix("/*") {
                in_comment = !rest.contains("*/");
                continue;
            }
            if is_end_function(line) {
                return Err(err(lineno, "End Function without Function"));
            }
            if let Some(header) = strip_keyword(line, "Function") {
                let name =
                    function_name(header).ok_or_else(|| err(lineno, "malformed function header"))?;
                if contract.functions.contains_key(&name) {
                    return Err(err(lineno, "duplicate function"));
                }
                current = Some(Function {
                    name,
                    ..Default::default()
                });
            }
            continue;
        };

        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if is_end_function(line) {
            if let Some(done) = current.take() {
                contract.functions.insert(done.name.clone(), done);
            }
            continue;
        }

        let (number, statement) =
            split_line_number(line).ok_or_else(|| err(lineno, "statement without line number"))?;
        let tokens = tokenize(statement).map_err(|e| err(lineno, &e))?;
        if tokens.is_empty() {
            return Err(err(lineno, "empty statement"));
        }
        if function.lines.insert(number, tokens).is_some() {
            return Err(err(lineno, "duplicate line number"));
        }
    }

    if current.is_some() {
        return Err(ValidationError::Parse("missing End Function".into()));
    }
    Ok(contract)
}
