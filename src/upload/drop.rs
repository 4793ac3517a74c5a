//! Terminals deliver a file dragged onto the window as pasted text: the path,
//! shell-quoted or backslash-escaped, or a `file://` URI. This turns that text
//! back into paths.

use std::path::PathBuf;

use percent_encoding::percent_decode_str;

pub fn parse_dropped_paths(pasted: &str) -> Vec<PathBuf> {
    split_words(pasted)
        .into_iter()
        .map(|word| match word.strip_prefix("file://") {
            Some(uri_path) => {
                let uri_path = uri_path.strip_prefix("localhost").unwrap_or(uri_path);
                PathBuf::from(percent_decode_str(uri_path).decode_utf8_lossy().into_owned())
            }
            None => PathBuf::from(word),
        })
        .collect()
}

fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                for quoted in chars.by_ref() {
                    if quoted == '\'' {
                        break;
                    }
                    word.push(quoted);
                }
            }
            '"' => {
                in_word = true;
                while let Some(quoted) = chars.next() {
                    match quoted {
                        '"' => break,
                        '\\' => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => word.push(escaped),
                            Some(other) => {
                                word.push('\\');
                                word.push(other);
                            }
                            None => word.push('\\'),
                        },
                        _ => word.push(quoted),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.peek() {
                    // After a drive letter, backslashes are separators.
                    Some(_) if has_drive_prefix(&word) => word.push('\\'),
                    Some(&next) if is_shell_special(next) => {
                        word.push(next);
                        chars.next();
                    }
                    _ => word.push('\\'),
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            _ => {
                in_word = true;
                word.push(c);
            }
        }
    }

    if in_word {
        words.push(word);
    }

    words
}

fn has_drive_prefix(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}

/// Characters a shell-escaping terminal puts a backslash in front of.
fn is_shell_special(c: char) -> bool {
    c.is_whitespace() || "'\"\\()[]{}&;|<>$`!*?#~".contains(c)
}
