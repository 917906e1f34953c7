//! Version constraint expressions
//!
//! Supported syntax:
//! - `1.16.2` or `=1.16.2` - exact match
//! - `1.x`, `1.16.x`, `1`, `1.16`, `*` - wildcards (missing components match anything)
//! - `!=1.16` - anything outside the line
//! - `>=1.16`, `>1.16`, `<=1.16`, `<1.16` - comparison operators
//! - `~1.15.2` - same minor (>=1.15.2 <1.16)
//! - `^1.15.2` - same major (>=1.15.2 <2)
//! - `>=1.14, <1.16` or `>=1.14 <1.16` - AND (comma or space separated)
//! - `1.14.x || 1.16.x` - OR
//!
//! Pre-release versions only satisfy terms that name a pre-release
//! themselves, so `1.x` never selects `1.17rc1` but `>=1.17beta1` does.

use std::fmt;
use std::str::FromStr;

use crate::config::DEFAULT_CONSTRAINT;
use crate::version::error::ParseError;
use crate::version::goversion::Version;

/// Comparison operator of a single term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Tilde,
    Caret,
}

/// Operators ordered so two-character prefixes are tried first
const OPERATORS: &[(&str, Op)] = &[
    ("!=", Op::Ne),
    (">=", Op::Gte),
    ("<=", Op::Lte),
    ("=>", Op::Gte),
    ("=<", Op::Lte),
    (">", Op::Gt),
    ("<", Op::Lt),
    ("=", Op::Eq),
    ("~", Op::Tilde),
    ("^", Op::Caret),
];

/// Version operand of a term.
///
/// `specified` counts the numeric components the expression spelled out
/// (0 for `*`). Unspecified components are zero in `version` and act as
/// wildcards for `=`, `!=`, `>` and `<=`.
#[derive(Debug, Clone)]
struct Bound {
    version: Version,
    specified: usize,
}

impl Bound {
    fn any() -> Self {
        Self {
            version: Version::from_parts(0, 0, 0),
            specified: 0,
        }
    }

    fn parse(expr: &str, operand: &str) -> Result<Self, ParseError> {
        let operand = operand.trim();
        if operand.is_empty() {
            return Err(ParseError::constraint(expr, "missing version after operator"));
        }

        let bare = operand.strip_prefix("go").unwrap_or(operand);
        let parts: Vec<&str> = bare.split('.').collect();

        if parts.iter().any(|p| is_wildcard(p)) {
            return Self::parse_wildcard(expr, &parts);
        }

        let version = Version::parse(operand).map_err(|e| ParseError::constraint(expr, e.to_string()))?;
        let specified = if version.is_prerelease() { 3 } else { parts.len() };
        Ok(Self { version, specified })
    }

    /// Parse `1.x`, `1.16.*`, `x` and friends
    fn parse_wildcard(expr: &str, parts: &[&str]) -> Result<Self, ParseError> {
        if parts.len() > 3 {
            return Err(ParseError::constraint(expr, "too many version components"));
        }

        let mut numbers = Vec::with_capacity(3);
        let mut seen_wildcard = false;
        for part in parts {
            if is_wildcard(part) {
                seen_wildcard = true;
                continue;
            }
            if seen_wildcard {
                return Err(ParseError::constraint(
                    expr,
                    format!("component {part:?} follows a wildcard"),
                ));
            }
            numbers.push(parse_component(expr, part)?);
        }

        if numbers.is_empty() {
            return Ok(Self::any());
        }

        let specified = numbers.len();
        numbers.resize(3, 0);
        Ok(Self {
            version: Version::from_parts(numbers[0], numbers[1], numbers[2]),
            specified,
        })
    }

    /// True when `v` falls inside the line this bound names
    fn contains(&self, v: &Version) -> bool {
        match self.specified {
            0 => true,
            1 => v.major() == self.version.major(),
            2 => v.major() == self.version.major() && v.minor() == self.version.minor(),
            _ => *v == self.version,
        }
    }

    /// First release past the wildcard line (`1.x` -> `2.0.0`, `1.16` -> `1.17.0`).
    /// `None` when the line ends at the top of the version space.
    fn line_end(&self) -> Option<Version> {
        let b = &self.version;
        match self.specified {
            1 => next_major(b),
            _ => next_minor(b),
        }
    }

    fn is_partial(&self) -> bool {
        self.specified < 3
    }
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "x" | "X" | "*")
}

/// Numeric component with the same rules as a version literal: digits
/// only, no leading zeros
fn parse_component(expr: &str, part: &str) -> Result<u64, ParseError> {
    let invalid = || ParseError::constraint(expr, format!("invalid version component {part:?}"));

    let digits_only = !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits_only || (part.len() > 1 && part.starts_with('0')) {
        return Err(invalid());
    }
    part.parse().map_err(|_| invalid())
}

// Successors of a release line. A component at u64::MAX carries into the
// one above it; `None` means nothing lies past the line.

fn next_major(v: &Version) -> Option<Version> {
    v.major()
        .checked_add(1)
        .map(|major| Version::from_parts(major, 0, 0))
}

fn next_minor(v: &Version) -> Option<Version> {
    v.minor()
        .checked_add(1)
        .map(|minor| Version::from_parts(v.major(), minor, 0))
        .or_else(|| next_major(v))
}

fn next_patch(v: &Version) -> Option<Version> {
    v.patch()
        .checked_add(1)
        .map(|patch| Version::from_parts(v.major(), v.minor(), patch))
        .or_else(|| next_minor(v))
}

/// `v` is at or past `base` and below `end`; a missing `end` is unbounded
fn in_range(v: &Version, base: &Version, end: Option<Version>) -> bool {
    v >= base && end.is_none_or(|end| *v < end)
}

#[derive(Debug, Clone)]
struct Term {
    op: Op,
    bound: Bound,
}

impl Term {
    fn parse(expr: &str, term: &str) -> Result<Self, ParseError> {
        let (op, operand) = OPERATORS
            .iter()
            .find_map(|(prefix, op)| term.strip_prefix(prefix).map(|rest| (*op, rest)))
            .unwrap_or((Op::Eq, term));

        Ok(Self {
            op,
            bound: Bound::parse(expr, operand)?,
        })
    }

    fn check(&self, v: &Version) -> bool {
        if v.is_prerelease() && !self.bound.version.is_prerelease() {
            return false;
        }

        let bound = &self.bound;
        let base = &bound.version;

        if bound.specified == 0 {
            return matches!(self.op, Op::Eq | Op::Gte | Op::Lte | Op::Tilde | Op::Caret);
        }

        match self.op {
            Op::Eq => bound.contains(v),
            Op::Ne => !bound.contains(v),
            Op::Gt if bound.is_partial() => bound.line_end().is_some_and(|end| *v >= end),
            Op::Gt => v > base,
            Op::Gte => v >= base,
            Op::Lt => v < base,
            Op::Lte if bound.is_partial() => bound.line_end().is_none_or(|end| *v < end),
            Op::Lte => v <= base,
            Op::Tilde => {
                let end = if bound.specified == 1 {
                    next_major(base)
                } else {
                    next_minor(base)
                };
                in_range(v, base, end)
            }
            Op::Caret => {
                // ^1.2.3 -> <2.0.0, ^0.2.3 -> <0.3.0, ^0.0.3 -> <0.0.4
                let end = if base.major() > 0 || bound.specified == 1 {
                    next_major(base)
                } else if base.minor() > 0 || bound.specified == 2 {
                    next_minor(base)
                } else {
                    next_patch(base)
                };
                in_range(v, base, end)
            }
        }
    }
}

/// A parsed constraint: OR of groups, each group an AND of terms
#[derive(Debug, Clone)]
pub struct Constraint {
    expr: String,
    groups: Vec<Vec<Term>>,
}

impl Constraint {
    /// Parse a constraint expression. An empty expression means `1.x`.
    pub fn parse(expr: &str) -> Result<Self, ParseError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Self::parse(DEFAULT_CONSTRAINT);
        }

        let groups = trimmed
            .split("||")
            .map(|group| parse_group(trimmed, group))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            expr: trimmed.to_string(),
            groups,
        })
    }

    /// Report whether `v` satisfies the constraint
    pub fn check(&self, v: &Version) -> bool {
        self.groups
            .iter()
            .any(|terms| terms.iter().all(|term| term.check(v)))
    }

    pub fn as_str(&self) -> &str {
        &self.expr
    }
}

impl Default for Constraint {
    fn default() -> Self {
        Self {
            expr: DEFAULT_CONSTRAINT.to_string(),
            groups: vec![vec![Term {
                op: Op::Eq,
                bound: Bound {
                    version: Version::from_parts(1, 0, 0),
                    specified: 1,
                },
            }]],
        }
    }
}

impl FromStr for Constraint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expr)
    }
}

/// Parse one `||` branch: comma- or space-separated terms, where an
/// operator may be split from its version by spaces (`>= 1.16`).
fn parse_group(expr: &str, group: &str) -> Result<Vec<Term>, ParseError> {
    let mut terms = Vec::new();

    for chunk in group.split(',') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            return Err(ParseError::constraint(expr, "empty term"));
        }

        let mut pending_op: Option<&str> = None;
        for token in chunk.split_whitespace() {
            if OPERATORS.iter().any(|(op, _)| *op == token) {
                if pending_op.is_some() {
                    return Err(ParseError::constraint(expr, "consecutive operators"));
                }
                pending_op = Some(token);
                continue;
            }

            let term = match pending_op.take() {
                Some(op) => format!("{op}{token}"),
                None => token.to_string(),
            };
            terms.push(Term::parse(expr, &term)?);
        }

        if pending_op.is_some() {
            return Err(ParseError::constraint(expr, "missing version after operator"));
        }
    }

    Ok(terms)
}
