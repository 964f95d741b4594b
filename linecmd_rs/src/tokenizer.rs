//! Quote-aware splitting of a command line into parameters.
//!
//! A line without quote characters is split on spaces. Otherwise the space
//! split is regrouped twice: first by `"`, then by `'`, so a double-quoted
//! span may carry single quotes literally. Finally one layer of quotes is
//! removed from every grouped token.
//!
//! ```
//! use linecmd::tokenizer::split_parameters;
//!
//! let params = split_parameters("say \"hello world\" twice").unwrap();
//! assert_eq!(params, ["say", "hello world", "twice"]);
//! ```

use crate::error::{ParameterParseError, ParseErrorKind};

pub const DOUBLE_QUOTE: char = '"';
pub const SINGLE_QUOTE: char = '\'';

/// Split a raw command line into parameters, honoring quote groups.
///
/// Empty input yields an empty vector; rejecting it is the caller's job.
pub fn split_parameters(input: &str) -> Result<Vec<String>, ParameterParseError> {
    let line = input.trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }
    if !line.contains([DOUBLE_QUOTE, SINGLE_QUOTE]) {
        return Ok(plain_split(line));
    }

    // Empty pieces are kept until grouping is done so quoted spans keep
    // their inner spacing and fault indices match the raw line.
    let splits: Vec<String> = line.split(' ').map(str::to_string).collect();
    let grouped = group(&group(&splits, DOUBLE_QUOTE)?, SINGLE_QUOTE)?;

    Ok(grouped
        .into_iter()
        .filter(|token| !token.is_empty())
        .map(|token| clean_outer_quotes(&token).to_string())
        .collect())
}

/// Split on single spaces, dropping the empty pieces runs of spaces leave.
pub fn plain_split(line: &str) -> Vec<String> {
    line.split(' ')
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// One grouping pass: fold every `delimiter`-opened run of tokens into one.
///
/// The folded token keeps its delimiters. A group that is still open at the
/// end of the input fails at the index where it was opened.
pub fn group(input: &[String], delimiter: char) -> Result<Vec<String>, ParameterParseError> {
    let mut result = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let param = &input[i];
        if !opens_group(param, delimiter) {
            result.push(param.clone());
            i += 1;
            continue;
        }

        let close = input[i + 1..]
            .iter()
            .position(|token| token.ends_with(delimiter))
            .ok_or_else(|| {
                ParameterParseError::new(ParseErrorKind::Grouping { delimiter }, input, i)
            })?;
        let end = i + 1 + close;
        result.push(input[i..=end].join(" "));
        i = end + 1;
    }

    Ok(result)
}

/// Like [`group`], but also strips `delimiter` from the grouped tokens.
pub fn group_and_clean(
    input: &[String],
    delimiter: char,
) -> Result<Vec<String>, ParameterParseError> {
    Ok(group(input, delimiter)?
        .into_iter()
        .map(|token| {
            match token
                .strip_prefix(delimiter)
                .and_then(|inner| inner.strip_suffix(delimiter))
            {
                Some(inner) => inner.to_string(),
                None => token,
            }
        })
        .collect())
}

/// A lone delimiter opens a group; it never counts as an empty closed one.
fn opens_group(token: &str, delimiter: char) -> bool {
    token.starts_with(delimiter)
        && (token.len() == delimiter.len_utf8() || !token.ends_with(delimiter))
}

fn clean_outer_quotes(token: &str) -> &str {
    if token.len() > 1 && token.starts_with([DOUBLE_QUOTE, SINGLE_QUOTE]) {
        &token[1..token.len() - 1]
    } else {
        token
    }
}
