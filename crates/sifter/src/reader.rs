//! S-expression reader for clause text.
//!
//! Splits a clause into atoms, quoted strings, `( ... )` lists and
//! `[ ... ]` vectors. Commas count as whitespace.

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Sexp {
    Atom(String),
    Quoted(String),
    List(Vec<Sexp>),
    Vector(Vec<Sexp>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open(char),
    Close(char),
    Atom(String),
    Quoted(String),
}

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() || c == ',' => {
                chars.next();
            }
            '(' | '[' => {
                chars.next();
                tokens.push(Token::Open(c));
            }
            ')' | ']' => {
                chars.next();
                tokens.push(Token::Close(c));
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some(escaped) => s.push(escaped),
                            None => break,
                        },
                        '"' => {
                            closed = true;
                            break;
                        }
                        other => s.push(other),
                    }
                }
                if !closed {
                    return Err("unterminated string literal".to_string());
                }
                tokens.push(Token::Quoted(s));
            }
            _ => {
                let mut s = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '"' | ',') {
                        break;
                    }
                    s.push(c);
                    chars.next();
                }
                tokens.push(Token::Atom(s));
            }
        }
    }

    Ok(tokens)
}

/// Reads every top-level form in `src`.
pub(crate) fn read_all(src: &str) -> Result<Vec<Sexp>, String> {
    let tokens = tokenize(src)?;
    // Each frame: the opening delimiter and the forms collected so far.
    let mut stack: Vec<(char, Vec<Sexp>)> = Vec::new();
    let mut top = Vec::new();

    for token in tokens {
        let form = match token {
            Token::Open(c) => {
                stack.push((c, Vec::new()));
                continue;
            }
            Token::Close(c) => {
                let (open, items) = stack
                    .pop()
                    .ok_or_else(|| format!("unexpected `{}`", c))?;
                match (open, c) {
                    ('(', ')') => Sexp::List(items),
                    ('[', ']') => Sexp::Vector(items),
                    _ => return Err(format!("`{}` closed by `{}`", open, c)),
                }
            }
            Token::Atom(s) => Sexp::Atom(s),
            Token::Quoted(s) => Sexp::Quoted(s),
        };
        match stack.last_mut() {
            Some((_, items)) => items.push(form),
            None => top.push(form),
        }
    }

    if let Some((open, _)) = stack.last() {
        return Err(format!("unclosed `{}`", open));
    }
    Ok(top)
}
