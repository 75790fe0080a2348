//! POSIX shell-style word splitting for command arguments.
//!
//! Arguments are split the way `sh` splits words, without any expansion:
//! - Unquoted blanks (space, tab, newline, carriage return) separate words
//! - `'...'` keeps everything literally
//! - `"..."` keeps everything except `\` before `$`, `` ` ``, `"`, `\` or a newline
//! - An unquoted `\` keeps the next character literally (`\` + newline joins lines)
//!
//! Empty quotes produce an empty argument.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
  #[error("unterminated {quote} quote starting at position {position}")]
  UnterminatedQuote { quote: char, position: usize },

  #[error("trailing backslash with no character to escape")]
  TrailingEscape,
}

/// Split `input` into arguments.
pub fn split(input: &str) -> Result<Vec<String>, SplitError> {
  let mut words = Vec::new();
  let mut word = String::new();
  let mut in_word = false;
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    match ch {
      ' ' | '\t' | '\n' | '\r' => {
        if in_word {
          words.push(std::mem::take(&mut word));
          in_word = false;
        }
      }
      '\\' => match chars.next() {
        Some((_, '\n')) => {}
        Some((_, escaped)) => {
          word.push(escaped);
          in_word = true;
        }
        None => return Err(SplitError::TrailingEscape),
      },
      '\'' => {
        in_word = true;
        let mut closed = false;
        for (_, c) in chars.by_ref() {
          if c == '\'' {
            closed = true;
            break;
          }
          word.push(c);
        }
        if !closed {
          return Err(SplitError::UnterminatedQuote {
            quote: '\'',
            position: pos,
          });
        }
      }
      '"' => {
        in_word = true;
        let mut closed = false;
        while let Some((_, c)) = chars.next() {
          match c {
            '"' => {
              closed = true;
              break;
            }
            '\\' => match chars.peek().map(|&(_, next)| next) {
              Some('\n') => {
                chars.next();
              }
              Some(next @ ('$' | '`' | '"' | '\\')) => {
                word.push(next);
                chars.next();
              }
              _ => word.push('\\'),
            },
            _ => word.push(c),
          }
        }
        if !closed {
          return Err(SplitError::UnterminatedQuote {
            quote: '"',
            position: pos,
          });
        }
      }
      _ => {
        word.push(ch);
        in_word = true;
      }
    }
  }

  if in_word {
    words.push(word);
  }

  Ok(words)
}
