//! Parser for SPICE text meta-kernels (`.tm` files).
//!
//! Only the `\begindata` sections are read. Assignments use `=` or `+=`, and
//! values are either a single item or a parenthesized list of items separated by
//! whitespace or commas. String items are single-quoted with `''` as the escaped
//! quote. A string ending with `+` is continued by the next string of the list.
//!
//! ```text
//! \begindata
//!   PATH_VALUES     = ( '/data/juno' )
//!   PATH_SYMBOLS    = ( 'JUNO' )
//!   KERNELS_TO_LOAD = ( '$JUNO/spk/juno_rec_orbit.bsp',
//!                       '$JUNO/spk/de440s.bsp' )
//! \begintext
//! ```
//!
//! `$SYMBOL` prefixes in `KERNELS_TO_LOAD` are substituted from the
//! `PATH_SYMBOLS`/`PATH_VALUES` pairs. Relative paths are kept relative, so
//! they resolve against the working directory like they do in SPICE.
use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_till1},
    character::complete::{char, multispace0},
    combinator::opt,
    multi::many0,
    sequence::preceded,
    IResult, Parser,
};

use crate::boundary_errors::BoundaryError;

const KERNELS_TO_LOAD: &str = "KERNELS_TO_LOAD";
const PATH_SYMBOLS: &str = "PATH_SYMBOLS";
const PATH_VALUES: &str = "PATH_VALUES";

/// Variables assigned in the data sections of a meta-kernel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetaKernel {
    pub variables: HashMap<String, Vec<String>>,
}

impl MetaKernel {
    pub fn from_file(path: &Utf8Path) -> Result<Self, BoundaryError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|e| match e {
            BoundaryError::InvalidMetaKernel(reason) => {
                BoundaryError::InvalidMetaKernel(format!("{path}: {reason}"))
            }
            other => other,
        })
    }

    /// Parse the text of a meta-kernel.
    pub fn parse(text: &str) -> Result<Self, BoundaryError> {
        let mut variables: HashMap<String, Vec<String>> = HashMap::new();

        for block in data_blocks(text) {
            let (rest, assignments) = many0(assignment)
                .parse(block.as_str())
                .map_err(|e| BoundaryError::NomParsingError(e.to_string()))?;
            if !rest.trim().is_empty() {
                let line = rest.trim().lines().next().unwrap_or_default();
                return Err(BoundaryError::InvalidMetaKernel(format!(
                    "cannot parse assignment near {line:?}"
                )));
            }

            for (name, append, values) in assignments {
                let entry = variables.entry(name).or_default();
                if !append {
                    entry.clear();
                }
                entry.extend(values);
            }
        }

        Ok(MetaKernel { variables })
    }

    /// Kernel paths listed by `KERNELS_TO_LOAD`, with path symbols substituted.
    pub fn kernels(&self) -> Result<Vec<Utf8PathBuf>, BoundaryError> {
        let listed = self.variables.get(KERNELS_TO_LOAD).ok_or_else(|| {
            BoundaryError::InvalidMetaKernel(format!("no {KERNELS_TO_LOAD} assignment"))
        })?;

        let symbols = join_continued(self.variables.get(PATH_SYMBOLS).map_or(&[][..], Vec::as_slice));
        let values = join_continued(self.variables.get(PATH_VALUES).map_or(&[][..], Vec::as_slice));
        if symbols.len() != values.len() {
            return Err(BoundaryError::InvalidMetaKernel(format!(
                "{} path symbols for {} path values",
                symbols.len(),
                values.len()
            )));
        }
        let substitutions: HashMap<&str, &str> = symbols
            .iter()
            .map(String::as_str)
            .zip(values.iter().map(String::as_str))
            .collect();

        join_continued(listed)
            .into_iter()
            .map(|kernel| substitute(&kernel, &substitutions).map(Utf8PathBuf::from))
            .collect()
    }
}

/// Concatenated content of every `\begindata` ... `\begintext` section.
fn data_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        match line.trim() {
            "\\begindata" => {
                current.get_or_insert_with(String::new);
            }
            "\\begintext" => {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
            }
            _ => {
                if let Some(block) = current.as_mut() {
                    block.push_str(line);
                    block.push('\n');
                }
            }
        }
    }
    blocks.extend(current);
    blocks
}

/// `NAME = value` or `NAME += value`, returned as `(name, is_append, values)`.
fn assignment(input: &str) -> IResult<&str, (String, bool, Vec<String>)> {
    let (input, _) = multispace0(input)?;
    let (input, name) = take_till1(|c: char| c.is_whitespace() || c == '=' || c == '+')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, operator) = alt((tag("+="), tag("="))).parse(input)?;
    let (input, _) = multispace0(input)?;
    let (input, values) = alt((list, item.map(|v| vec![v]))).parse(input)?;
    Ok((input, (name.to_string(), operator == "+=", values)))
}

/// `( item item, item ... )`
fn list(input: &str) -> IResult<&str, Vec<String>> {
    let (input, _) = char('(')(input)?;
    let (input, values) =
        many0(preceded((multispace0, opt(char(',')), multispace0), item)).parse(input)?;
    let (input, _) = (multispace0, opt(char(',')), multispace0, char(')')).parse(input)?;
    Ok((input, values))
}

fn item(input: &str) -> IResult<&str, String> {
    alt((
        quoted,
        take_till1(|c: char| c.is_whitespace() || c == ',' || c == '(' || c == ')')
            .map(str::to_string),
    ))
    .parse(input)
}

/// Single-quoted string, `''` standing for one quote.
fn quoted(input: &str) -> IResult<&str, String> {
    let (mut input, _) = char('\'')(input)?;
    let mut value = String::new();
    loop {
        let (rest, chunk) = take_till(|c: char| c == '\'')(input)?;
        value.push_str(chunk);
        let (rest, _) = char('\'')(rest)?;
        match char::<&str, nom::error::Error<&str>>('\'')(rest) {
            Ok((rest, _)) => {
                value.push('\'');
                input = rest;
            }
            Err(_) => return Ok((rest, value)),
        }
    }
}

/// Join strings ending with the `+` continuation marker with their successor.
fn join_continued(values: &[String]) -> Vec<String> {
    let mut joined = Vec::new();
    let mut pending = String::new();
    for value in values {
        match value.strip_suffix('+') {
            Some(head) => pending.push_str(head),
            None => {
                pending.push_str(value);
                joined.push(std::mem::take(&mut pending));
            }
        }
    }
    if !pending.is_empty() {
        joined.push(pending);
    }
    joined
}

/// Replace a leading `$SYMBOL` by its path value.
fn substitute(kernel: &str, substitutions: &HashMap<&str, &str>) -> Result<String, BoundaryError> {
    let Some(symbolic) = kernel.strip_prefix('$') else {
        return Ok(kernel.to_string());
    };
    let end = symbolic.find(['/', '\\']).unwrap_or(symbolic.len());
    let (symbol, tail) = symbolic.split_at(end);
    substitutions
        .get(symbol)
        .map(|value| format!("{value}{tail}"))
        .ok_or_else(|| BoundaryError::InvalidMetaKernel(format!("unknown path symbol ${symbol}")))
}

#[cfg(test)]
mod test_metakernel {
    use super::*;

    const JUNO_TM: &str = r#"KPL/MK

   Juno meta-kernel used for the boundary crossing survey.

\begindata

   PATH_VALUES     = ( '/data/juno' )
   PATH_SYMBOLS    = ( 'JUNO' )

   KERNELS_TO_LOAD = ( '$JUNO/lsk/naif0012.tls',
                       '$JUNO/spk/juno_rec_orbit.bsp'
                       '$JUNO/spk/de440s.bsp' )

\begintext

   The second block appends one more trajectory file.

\begindata
   KERNELS_TO_LOAD += 'local/juno_pred_orbit_with_a_very_+'
   KERNELS_TO_LOAD += 'long_name.bsp'
   SCALE = 1.5
\begintext
"#;

    #[test]
    fn test_parse_metakernel() {
        let mk = MetaKernel::parse(JUNO_TM).unwrap();
        assert_eq!(mk.variables[PATH_SYMBOLS], vec!["JUNO"]);
        assert_eq!(mk.variables["SCALE"], vec!["1.5"]);
        assert_eq!(
            mk.kernels().unwrap(),
            vec![
                Utf8PathBuf::from("/data/juno/lsk/naif0012.tls"),
                Utf8PathBuf::from("/data/juno/spk/juno_rec_orbit.bsp"),
                Utf8PathBuf::from("/data/juno/spk/de440s.bsp"),
                Utf8PathBuf::from("local/juno_pred_orbit_with_a_very_long_name.bsp"),
            ]
        );
    }

    #[test]
    fn test_assignment_replaces_previous_value() {
        let text = "\\begindata\nKERNELS_TO_LOAD = 'a.bsp'\nKERNELS_TO_LOAD = ( 'b.bsp' )\n";
        let mk = MetaKernel::parse(text).unwrap();
        assert_eq!(mk.kernels().unwrap(), vec![Utf8PathBuf::from("b.bsp")]);
    }

    #[test]
    fn test_quoted_escape() {
        assert_eq!(
            quoted("'it''s here' rest").unwrap(),
            (" rest", "it's here".to_string())
        );
    }

    #[test]
    fn test_unknown_symbol() {
        let text = "\\begindata\nKERNELS_TO_LOAD = ( '$NOPE/a.bsp' )\n";
        let mk = MetaKernel::parse(text).unwrap();
        assert_eq!(
            mk.kernels(),
            Err(BoundaryError::InvalidMetaKernel(
                "unknown path symbol $NOPE".to_string()
            ))
        );
    }

    #[test]
    fn test_missing_kernels_to_load() {
        let mk = MetaKernel::parse("no data section at all").unwrap();
        assert!(mk.kernels().is_err());
    }

    #[test]
    fn test_garbage_in_data_section() {
        let text = "\\begindata\nKERNELS_TO_LOAD = ( 'a.bsp' \n";
        assert!(matches!(
            MetaKernel::parse(text),
            Err(BoundaryError::InvalidMetaKernel(_))
        ));
    }
}
