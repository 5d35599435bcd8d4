use std::collections::HashMap;

use super::ParseError;

/// Result of splitting a command's argument string against its declared
/// prefixes: the preamble (text before the first recognized prefix) plus, per
/// prefix, the ordered list of values following each occurrence.
#[derive(Debug, Clone, Default)]
pub struct ArgumentTokens {
    preamble: String,
    values: HashMap<String, Vec<String>>,
}

impl ArgumentTokens {
    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// The value of the last occurrence of `prefix`, if any.
    pub fn value(&self, prefix: &str) -> Option<&str> {
        self.values
            .get(prefix)
            .and_then(|list| list.last())
            .map(String::as_str)
    }

    /// All values for `prefix` in input order. Absence is an empty slice, not
    /// an error.
    pub fn all_values(&self, prefix: &str) -> &[String] {
        self.values.get(prefix).map_or(&[], Vec::as_slice)
    }

    /// Fails if any of the given prefixes appears more than once, naming every
    /// offender.
    pub fn verify_no_duplicates(&self, prefixes: &[&str]) -> Result<(), ParseError> {
        let offenders: Vec<&str> = prefixes
            .iter()
            .copied()
            .filter(|prefix| self.all_values(prefix).len() > 1)
            .collect();
        if offenders.is_empty() {
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "Multiple values specified for the following single-valued field(s): {}",
                offenders.join(" ")
            )))
        }
    }
}

/// Splits `text` into a preamble and per-prefix value lists.
///
/// A prefix occurrence only counts when preceded by whitespace or the start of
/// the string, so `te/` input never registers as an `e/` occurrence. Every
/// character of input lands in either the preamble or exactly one value slice;
/// the tokenizer itself never fails.
pub fn tokenize(text: &str, prefixes: &[&str]) -> ArgumentTokens {
    let mut occurrences: Vec<(usize, &str)> = Vec::new();
    for &prefix in prefixes {
        let mut from = 0;
        while let Some(found) = text[from..].find(prefix) {
            let pos = from + found;
            let preceded = pos == 0
                || text[..pos]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_whitespace);
            if preceded {
                occurrences.push((pos, prefix));
            }
            from = pos + prefix.len();
        }
    }
    occurrences.sort_by_key(|&(pos, _)| pos);

    let first = occurrences.first().map_or(text.len(), |&(pos, _)| pos);
    let mut tokens = ArgumentTokens {
        preamble: text[..first].trim().to_string(),
        values: HashMap::new(),
    };
    for (i, &(pos, prefix)) in occurrences.iter().enumerate() {
        let value_start = pos + prefix.len();
        let value_end = occurrences
            .get(i + 1)
            .map_or(text.len(), |&(next, _)| next);
        tokens
            .values
            .entry(prefix.to_string())
            .or_default()
            .push(text[value_start..value_end].trim().to_string());
    }
    tokens
}
