//! Program loader
//!
//! Turns raw program text into a [`Program`]:
//! - trims lines, strips BASIC line numbers
//! - drops blank and comment-only lines
//! - indexes `L:` labels and BASIC line numbers
//! - collects Logo `TO ... END` procedures and BASIC `DATA` values

use super::errors::LoadError;
use super::types::{Line, Procedure, Program, Value};
use tracing::{debug, warn};

/// Load program text
///
/// Fails only on a duplicate `L:` label; every other problem surfaces at run
/// time on the offending line.
pub fn load(text: &str) -> Result<Program, LoadError> {
    let mut program = Program::default();

    for (offset, raw) in text.lines().enumerate() {
        let source_line = offset + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (number, body) = split_line_number(trimmed);
        if number.is_none() && is_comment(body) {
            continue;
        }
        if number.is_some() && body.is_empty() {
            continue;
        }
        program.lines.push(Line {
            source_line,
            number,
            text: body.to_string(),
        });
    }

    index_labels(&mut program)?;
    index_line_numbers(&mut program);
    collect_procedures(&mut program);
    collect_data(&mut program);

    debug!(
        lines = program.lines.len(),
        labels = program.labels.len(),
        procedures = program.procedures.len(),
        data = program.data.len(),
        "Program loaded"
    );
    Ok(program)
}

/* ===================== Line Parsing ===================== */

/// Split a leading run of digits followed by whitespace (or nothing)
fn split_line_number(line: &str) -> (Option<u32>, &str) {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return (None, line);
    }
    let rest = &line[digits..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return (None, line);
    }
    match line[..digits].parse::<u32>() {
        Ok(n) => (Some(n), rest.trim()),
        Err(_) => (None, line),
    }
}

fn is_comment(text: &str) -> bool {
    if text.starts_with('#') || text.starts_with("//") || text.starts_with(';') || text.starts_with('\'') {
        return true;
    }
    let word = first_word(text);
    word.eq_ignore_ascii_case("REM")
}

fn first_word(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

/* ===================== Indexes ===================== */

fn index_labels(program: &mut Program) -> Result<(), LoadError> {
    for (index, line) in program.lines.iter().enumerate() {
        let Some(name) = label_name(&line.text) else {
            continue;
        };
        if let Some(&first) = program.labels.get(&name) {
            return Err(LoadError::DuplicateLabel {
                name,
                first: program.lines[first].source_line,
                second: line.source_line,
            });
        }
        program.labels.insert(name, index);
    }
    Ok(())
}

/// Upper-cased name declared by an `L:name` line
pub(crate) fn label_name(text: &str) -> Option<String> {
    let rest = text
        .strip_prefix("L:")
        .or_else(|| text.strip_prefix("l:"))?;
    let name = rest.trim();
    (!name.is_empty()).then(|| name.to_ascii_uppercase())
}

fn index_line_numbers(program: &mut Program) {
    for (index, line) in program.lines.iter().enumerate() {
        let Some(number) = line.number else {
            continue;
        };
        if let Some(previous) = program.line_numbers.insert(number, index) {
            warn!(
                number,
                first = program.lines[previous].source_line,
                second = line.source_line,
                "Duplicate line number, the later line wins"
            );
        }
    }
}

/// Collect `TO name :params ... END` blocks
fn collect_procedures(program: &mut Program) {
    let mut index = 0;
    while index < program.lines.len() {
        let mut words = program.lines[index].text.split_whitespace();
        let is_to = words.next().map_or(false, |w| w.eq_ignore_ascii_case("TO"));
        let Some(name) = words.next().filter(|_| is_to) else {
            index += 1;
            continue;
        };
        let name = name.to_ascii_uppercase();
        let params: Vec<String> = words
            .map(|p| p.trim_start_matches(':').to_ascii_uppercase())
            .filter(|p| !p.is_empty())
            .collect();

        let end = (index + 1..program.lines.len())
            .find(|&i| program.lines[i].text.eq_ignore_ascii_case("END"))
            .unwrap_or(program.lines.len() - 1);
        let body_end = if program.lines[end].text.eq_ignore_ascii_case("END") {
            end
        } else {
            end + 1
        };
        let body = program.lines[index + 1..body_end]
            .iter()
            .map(|l| l.text.clone())
            .collect();

        let procedure = Procedure {
            name: name.clone(),
            params,
            body,
            start: index,
            end,
        };
        if program.procedures.insert(name.clone(), procedure).is_some() {
            warn!(procedure = %name, "Procedure redefined, the later definition wins");
        }
        index = end + 1;
    }
}

fn collect_data(program: &mut Program) {
    let mut data = Vec::new();
    for line in &program.lines {
        let word = first_word(&line.text);
        if word.eq_ignore_ascii_case("DATA") {
            let rest = line.text[word.len()..].trim();
            data.extend(split_data_items(rest));
        }
    }
    program.data = data;
}

/// Comma-separated DATA items; quoted items are always text
fn split_data_items(text: &str) -> Vec<Value> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut was_quoted = false;

    for c in text.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                was_quoted = true;
            }
            ',' if !quoted => {
                items.push(data_value(&current, was_quoted));
                current.clear();
                was_quoted = false;
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() || was_quoted || !items.is_empty() {
        items.push(data_value(&current, was_quoted));
    }
    items
}

fn data_value(item: &str, quoted: bool) -> Value {
    if quoted {
        Value::Text(item.trim().to_string())
    } else {
        Value::parse_input(item)
    }
}
