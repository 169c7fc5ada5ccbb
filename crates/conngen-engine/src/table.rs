// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Link-table description format.

```text
# source target weight delay
0 1 0.5 1.0
0 2 0.25 1.5
```

One link per line, whitespace separated. `#` starts a comment; blank lines
are skipped. Every link line must have the same number of columns, and the
arity is that count minus two. Value tokens that parse as numbers become
floats; any other token is kept as text and rejected when a generator reads it.
*/

use std::path::Path;

use conngen_core::{ConnGenError, ConnGenResult, Index, PayloadValue, RawLink};
use tracing::debug;

use crate::explicit::ExplicitSet;

/// Parse a link table from text
pub fn parse_table(text: &str) -> ConnGenResult<ExplicitSet> {
    let mut links = Vec::new();
    let mut columns: Option<usize> = None;

    for (n, line) in text.lines().enumerate() {
        let line_no = n + 1;
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = content.split_whitespace().collect();
        if tokens.len() < 2 {
            return Err(table_error(line_no, "expected at least source and target"));
        }
        match columns {
            None => columns = Some(tokens.len()),
            Some(c) if c != tokens.len() => {
                return Err(table_error(
                    line_no,
                    &format!("found {} columns, previous lines have {}", tokens.len(), c),
                ))
            }
            Some(_) => {}
        }
        let source = parse_index(tokens[0], line_no, "source")?;
        let target = parse_index(tokens[1], line_no, "target")?;
        let values = tokens[2..].iter().map(|t| parse_value(t)).collect();
        links.push(RawLink::new(source, target, values));
    }

    let arity = columns.map_or(0, |c| c - 2);
    debug!("Parsed link table: {} links, arity {}", links.len(), arity);
    ExplicitSet::new(arity, links)
}

/// Read and parse a link-table file
pub fn read_table(path: &Path) -> ConnGenResult<ExplicitSet> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConnGenError::Io(format!("{}: {}", path.display(), e)))?;
    parse_table(&text)
}

fn parse_index(token: &str, line_no: usize, what: &str) -> ConnGenResult<Index> {
    token
        .parse::<Index>()
        .map_err(|_| table_error(line_no, &format!("invalid {} index '{}'", what, token)))
}

fn parse_value(token: &str) -> PayloadValue {
    match token.parse::<f64>() {
        Ok(v) => PayloadValue::Float(v),
        Err(_) => PayloadValue::Text(token.to_string()),
    }
}

fn table_error(line_no: usize, msg: &str) -> ConnGenError {
    ConnGenError::Provider(format!("link table line {}: {}", line_no, msg))
}
