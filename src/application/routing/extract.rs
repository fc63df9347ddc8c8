//! Argument extraction
//!
//! Parameters are positional relative to a keyword: a `Before`/`After`
//! parameter captures the single whitespace-delimited token on the matching
//! side of the keyword's occurrence in the raw text, a `Flag` parameter just
//! records whether the keyword occurs at all.

use regex_lite::Regex;

use crate::application::errors::ExtractError;
use crate::domain::entities::{ArgValue, Arguments, Parameter, ParameterKind};

/// Extract one value per declared parameter from the raw message text.
///
/// All-or-nothing: failure for any non-flag parameter fails the whole parse
/// and no argument map is produced. Purely a function of the text and the
/// declarations.
pub fn extract_arguments(text: &str, params: &[Parameter]) -> Result<Arguments, ExtractError> {
    let mut arguments = Arguments::new();

    for param in params {
        let present = text.contains(&param.keyword);

        if param.kind == ParameterKind::Flag {
            arguments.insert(param.keyword.clone(), ArgValue::Flag(present));
            continue;
        }

        // Only flags may be absent from the message.
        if !present {
            return Err(ExtractError::MissingKeyword(param.keyword.clone()));
        }

        // Keywords are literal tokens, not patterns.
        let keyword = regex_lite::escape(&param.keyword);
        let pattern = match param.kind {
            ParameterKind::Before => format!(r"\s(\S+)\s{keyword}"),
            _ => format!(r"{keyword}\s(\S+)"),
        };
        let regex = Regex::new(&pattern).map_err(|err| ExtractError::Pattern {
            keyword: param.keyword.clone(),
            reason: err.to_string(),
        })?;

        let captures = regex
            .captures(text)
            .ok_or_else(|| ExtractError::NoValue {
                keyword: param.keyword.clone(),
                kind: param.kind,
            })?;
        // A match always carries group 1; anything else is reported as a
        // parse failure rather than panicking.
        let value = captures
            .get(1)
            .ok_or_else(|| ExtractError::InvariantViolation(param.keyword.clone()))?;

        arguments.insert(
            param.keyword.clone(),
            ArgValue::Text(value.as_str().to_string()),
        );
    }

    Ok(arguments)
}
