//! Post-pass normalizers
//!
//! Small textual fixes applied to the assembled output, in a fixed order.
//! Each one is idempotent, so running the converter on its own output is a
//! no-op. Continuation lines belong to the statement they continue.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref PERIM: Regex = Regex::new(r"(?i)\bperim\s*=").unwrap();
    static ref SQRT_CALL: Regex = Regex::new(r"\bsqrt\(\s*([A-Za-z_]\w*)\s*\)").unwrap();
    static ref MULT_DECL: Regex = Regex::new(r"(?i)\bmult\s*=").unwrap();
    static ref TC_R: Regex = Regex::new(r"(?i)\btc([12])r\s*=").unwrap();
    static ref SUBCKT: Regex = Regex::new(r"^(?i:\.subckt)\b").unwrap();
    static ref ENDS: Regex = Regex::new(r"^(?i:\.ends)\b").unwrap();
}

/// Run all normalizers in order
pub fn normalize(lines: Vec<String>, multiplicity_var: &str) -> Vec<String> {
    let lines = rename_for_owner(lines, 'd', &PERIM, "pj=");
    let lines = sqrt_multiplicity(lines, multiplicity_var);
    rename_for_owner(lines, 'r', &TC_R, "tc${1}=")
}

fn is_passive(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with('*')
}

/// Tracks which statement a line belongs to
#[derive(Default)]
struct Owner(Option<char>);

impl Owner {
    /// Leading character of the statement `line` belongs to
    fn of(&mut self, line: &str) -> Option<char> {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('*') {
            return None;
        }
        if !trimmed.starts_with('+') {
            self.0 = trimmed.chars().next().map(|c| c.to_ascii_lowercase());
        }
        self.0
    }
}

fn rename_for_owner(lines: Vec<String>, prefix: char, pattern: &Regex, replacement: &str) -> Vec<String> {
    let mut owner = Owner::default();
    lines
        .into_iter()
        .map(|line| {
            if owner.of(&line) == Some(prefix) && pattern.is_match(&line) {
                log::trace!("normalize: {}", line);
                pattern.replace_all(&line, replacement).into_owned()
            } else {
                line
            }
        })
        .collect()
}

/// `sqrt(<var>)` becomes `sqrt(mult)`; the subcircuit then declares `mult=1`
fn sqrt_multiplicity(lines: Vec<String>, var: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    let mut header: Option<(usize, usize)> = None;
    let mut in_header = false;
    let mut fired = false;

    for line in lines {
        let trimmed = line.trim_start();

        if SUBCKT.is_match(trimmed) {
            header = Some((out.len(), out.len() + 1));
            out.push(line);
            in_header = true;
            fired = false;
            continue;
        }

        let Some((start, end)) = header else {
            out.push(line);
            continue;
        };

        if ENDS.is_match(trimmed) {
            if fired && !out[start..end].iter().any(|l| MULT_DECL.is_match(l)) {
                out.insert(end, "+ mult=1".to_string());
            }
            out.push(line);
            header = None;
            continue;
        }

        if in_header && trimmed.starts_with('+') {
            header = Some((start, end + 1));
        } else {
            in_header = false;
        }

        let mut replaced = false;
        let line = if is_passive(&line) {
            line
        } else {
            SQRT_CALL
                .replace_all(&line, |caps: &Captures| {
                    if &caps[1] == var {
                        replaced = true;
                        "sqrt(mult)".to_string()
                    } else {
                        caps[0].to_string()
                    }
                })
                .into_owned()
        };
        fired |= replaced;
        out.push(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    fn run(text: &str) -> Vec<String> {
        normalize(lines(text), "m")
    }

    #[test]
    fn test_diode_perimeter() {
        assert_eq!(
            run("d1 a b dn area=1p\n+ perim=4u\nr1 a b perim=1"),
            lines("d1 a b dn area=1p\n+ pj=4u\nr1 a b perim=1")
        );
    }

    #[test]
    fn test_resistor_temperature_coefficients() {
        assert_eq!(
            run("r1 a b rp tc1r=1e-3 tc2r=2e-6\n* tc1r=1\nc1 a b 1p tc1r=1"),
            lines("r1 a b rp tc1=1e-3 tc2=2e-6\n* tc1r=1\nc1 a b 1p tc1r=1")
        );
    }

    #[test]
    fn test_sqrt_multiplicity_adds_header() {
        let input = ".subckt cell a b\n+ w=1u\nr1 a b {1k/sqrt(m)}\n\n.ends cell";
        let expected = ".subckt cell a b\n+ w=1u\n+ mult=1\nr1 a b {1k/sqrt(mult)}\n\n.ends cell";
        assert_eq!(run(input), lines(expected));
        // second run changes nothing
        assert_eq!(run(expected), lines(expected));
    }

    #[test]
    fn test_sqrt_multiplicity_header_declared() {
        let input = ".subckt cell a b mult=2\nr1 a b {1k/sqrt(m)}\n.ends cell";
        assert_eq!(
            run(input),
            lines(".subckt cell a b mult=2\nr1 a b {1k/sqrt(mult)}\n.ends cell")
        );
    }

    #[test]
    fn test_sqrt_other_identifier_untouched() {
        let input = ".subckt cell a\nr1 a 0 {sqrt(mm)}\n.ends cell\nr2 a 0 {sqrt(m)}";
        assert_eq!(run(input), lines(input));
    }
}
