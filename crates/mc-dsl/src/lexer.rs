use crate::DslError;

/// Split one rule line into tokens, then run the allowed-symbol policy over
/// the result.
pub fn tokenize(line: &str) -> Result<Vec<String>, DslError> {
    let tokens = split(line)?;
    let rejected = invalid_tokens(&tokens);
    if !rejected.is_empty() {
        return Err(DslError::InvalidTokens { tokens: rejected });
    }
    Ok(tokens)
}

/// Shell-style word splitting. Whitespace separates tokens; word characters
/// are ASCII alphanumerics plus `_` and `.` (so identifiers and decimal
/// numbers stay one token); a quoted span joins the current word with the
/// quotes stripped; any other character ends the word run and becomes a
/// single-character token of its own, which is how `(`, `)`, `,` and `>`
/// surface.
fn split(line: &str) -> Result<Vec<String>, DslError> {
    if line.trim().is_empty() {
        return Err(DslError::EmptyInput);
    }

    let mut tokens = Vec::new();
    let mut word: Option<String> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        if ch.is_whitespace() {
            if let Some(done) = word.take() {
                tokens.push(done);
            }
        } else if ch == '\'' || ch == '"' {
            let quoted = read_quoted(&mut chars, ch)?;
            word.get_or_insert_with(String::new).push_str(&quoted);
        } else if is_word_char(ch) {
            word.get_or_insert_with(String::new).push(ch);
        } else {
            if let Some(done) = word.take() {
                tokens.push(done);
            }
            tokens.push(ch.to_string());
        }
    }
    if let Some(done) = word.take() {
        tokens.push(done);
    }

    Ok(tokens)
}

fn read_quoted(chars: &mut std::str::Chars<'_>, quote: char) -> Result<String, DslError> {
    let mut out = String::new();
    for ch in chars.by_ref() {
        if ch == quote {
            return Ok(out);
        }
        out.push(ch);
    }
    Err(DslError::UnterminatedQuote)
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

/// Allowed-symbol policy over the token stream. Returns the tokens to
/// reject; currently permissive.
// TODO: reject symbols outside the `( ) , > .` set and heads that are not
// identifiers.
#[must_use]
pub fn invalid_tokens(_tokens: &[String]) -> Vec<String> {
    Vec::new()
}
