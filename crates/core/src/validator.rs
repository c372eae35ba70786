// Path: crates/core/src/validator.rs

//! Checks that contract code is an unmodified instance of a TELA template.
//!
//! Two contracts are equal when they define the same functions and every
//! function other than the initializers has the same numbered lines with the
//! same tokens. Initializers carry the per-install header values and are
//! exempt.

use crate::templates::{DOC_VERSIONS, INDEX_VERSIONS};
use tela_api::contract::{Contract, ContractParser};
use tela_types::app::Version;
use tela_types::error::ValidationError;

/// Functions exempt from comparison.
pub const INITIALIZERS: [&str; 2] = ["Initialize", "InitializePrivate"];

/// Parses `template` and `candidate` and compares them structurally.
///
/// Returns the candidate's parsed form when they are equal.
pub fn equal_contracts(
    parser: &dyn ContractParser,
    template: &str,
    candidate: &str,
) -> Result<Contract, ValidationError> {
    let expected = parser.parse(template)?;
    let actual = parser.parse(candidate)?;
    compare(&expected, &actual)?;
    Ok(actual)
}

fn compare(expected: &Contract, actual: &Contract) -> Result<(), ValidationError> {
    if !expected.function_names().eq(actual.function_names()) {
        return Err(ValidationError::FunctionSet);
    }

    for (name, function) in &expected.functions {
        if INITIALIZERS.contains(&name.as_str()) {
            continue;
        }
        let Some(other) = actual.function(name) else {
            return Err(ValidationError::FunctionSet);
        };
        if function.lines.len() != other.lines.len() {
            return Err(ValidationError::LineCount {
                function: name.clone(),
            });
        }
        for ((n, line), (m, other_line)) in function.lines.iter().zip(&other.lines) {
            if n != m {
                return Err(ValidationError::LineCount {
                    function: name.clone(),
                });
            }
            if line.len() != other_line.len() {
                return Err(ValidationError::LineParts {
                    function: name.clone(),
                });
            }
            if line != other_line {
                return Err(ValidationError::Token {
                    function: name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn match_versions(
    parser: &dyn ContractParser,
    versions: &[(Version, &str)],
    kind: &'static str,
    code: &str,
) -> Result<(Contract, Version), ValidationError> {
    let actual = parser.parse(code)?;
    for (version, template) in versions {
        let expected = parser.parse(template)?;
        if compare(&expected, &actual).is_ok() {
            return Ok((actual, *version));
        }
    }
    Err(ValidationError::NotTemplate { kind })
}

/// Matches `code` against every accepted TELA-DOC-1 version.
pub fn valid_doc_version(
    parser: &dyn ContractParser,
    code: &str,
) -> Result<(Contract, Version), ValidationError> {
    match_versions(parser, &DOC_VERSIONS, "DOC", code)
}

/// Matches `code` against every accepted TELA-INDEX-1 version.
pub fn valid_index_version(
    parser: &dyn ContractParser,
    code: &str,
) -> Result<(Contract, Version), ValidationError> {
    match_versions(parser, &INDEX_VERSIONS, "INDEX", code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::BasicParser;
    use crate::templates::{TELA_DOC_1, TELA_INDEX_1};
    use crate::test_support::{render_doc, render_index, DocSpec, IndexSpec};

    #[test]
    fn templates_equal_themselves() {
        for (_, tpl) in DOC_VERSIONS.iter().chain(INDEX_VERSIONS.iter()) {
            equal_contracts(&BasicParser, tpl, tpl).unwrap();
        }
    }

    #[test]
    fn initializer_changes_are_tolerated() {
        let code = render_doc(&DocSpec::new("index.html", "TELA-HTML-1", "<h1>hi</h1>"));
        let (_, version) = valid_doc_version(&BasicParser, &code).unwrap();
        assert_eq!(version, Version::new(1, 0, 0));

        let code = render_index(&IndexSpec::new("app.tela", &["a", "b"]));
        let (contract, version) = valid_index_version(&BasicParser, &code).unwrap();
        assert_eq!(version, Version::new(1, 1, 0));
        assert!(contract.function("InitializePrivate").is_some());
    }

    #[test]
    fn older_index_version_is_recognized() {
        let (_, v1_0) = INDEX_VERSIONS[0];
        let (_, version) = valid_index_version(&BasicParser, v1_0).unwrap();
        assert_eq!(version, Version::new(1, 0, 0));
    }

    #[test]
    fn token_change_outside_initializers_is_rejected() {
        let tampered = TELA_DOC_1.replace(
            "30 STORE(\"owner\", address())",
            "30 STORE(\"owner\", SIGNER())",
        );
        let err = equal_contracts(&BasicParser, TELA_DOC_1, &tampered).unwrap_err();
        assert!(matches!(err, ValidationError::Token { ref function } if function == "init"));
    }

    #[test]
    fn extra_part_is_a_line_parts_error() {
        let tampered = TELA_DOC_1.replace("20 RETURN 1", "20 RETURN 1 + 1");
        let err = equal_contracts(&BasicParser, TELA_DOC_1, &tampered).unwrap_err();
        assert!(matches!(err, ValidationError::LineParts { .. }));
    }

    #[test]
    fn extra_line_is_a_line_count_error() {
        let tampered = TELA_DOC_1.replace("40 RETURN \"anon\"", "40 RETURN \"anon\"\n45 RETURN \"x\"");
        let err = equal_contracts(&BasicParser, TELA_DOC_1, &tampered).unwrap_err();
        assert!(matches!(err, ValidationError::LineCount { ref function } if function == "address"));
    }

    #[test]
    fn doc_is_not_an_index() {
        let err = valid_index_version(&BasicParser, TELA_DOC_1).unwrap_err();
        assert!(matches!(err, ValidationError::NotTemplate { kind: "INDEX" }));
        let err = equal_contracts(&BasicParser, TELA_INDEX_1, TELA_DOC_1).unwrap_err();
        assert!(matches!(err, ValidationError::FunctionSet));
    }
}
