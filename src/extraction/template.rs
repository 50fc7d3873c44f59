//! `{name}` placeholder substitution for prompt templates.
//!
//! `{{` and `}}` produce literal braces. Any other brace usage is an error.

use crate::{ExtractorError, Result};

/// Substitute `{key}` placeholders with the matching values
pub fn render(template: &str, values: &[(&str, &str)]) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                output.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                output.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    match inner {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => {
                            return Err(ExtractorError::PromptTemplate(format!(
                                "unexpected '{{' inside placeholder at byte {}",
                                pos
                            )))
                        }
                        other => name.push(other),
                    }
                }

                if !closed {
                    return Err(ExtractorError::PromptTemplate(format!(
                        "unterminated placeholder at byte {}",
                        pos
                    )));
                }

                let value = values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| {
                        ExtractorError::PromptTemplate(format!("unknown placeholder '{{{}}}'", name))
                    })?;
                output.push_str(value);
            }
            '}' => {
                return Err(ExtractorError::PromptTemplate(format!(
                    "single '}}' at byte {}",
                    pos
                )))
            }
            other => output.push(other),
        }
    }

    Ok(output)
}
