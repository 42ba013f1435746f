//! Per-directive record of what a merge did.
//!
//! Unmatched directives are normal (a mark document may introduce structure
//! the value document does not have yet), so they are recorded here rather
//! than reported as errors.

use std::fmt;
use std::io::Write;

/// What happened to one directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A counterpart was found; `updated` lists the attributes written.
    Applied {
        /// Attribute names whose values were copied.
        updated: Vec<String>,
    },
    /// No counterpart element exists in the value document.
    Unmatched,
    /// The directive is keyed by an attribute the mark element does not carry.
    MissingKey {
        /// The missing key attribute.
        attr: String,
    },
}

impl MergeOutcome {
    /// Returns a short label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            MergeOutcome::Applied { .. } => "applied",
            MergeOutcome::Unmatched => "unmatched",
            MergeOutcome::MissingKey { .. } => "missing-key",
        }
    }
}

/// A single directive's entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeEntry {
    /// Path used to look up the counterpart (positional when no key was usable).
    pub path: String,
    /// Attributes the directive asked for.
    pub requested: Vec<String>,
    /// Result of applying the directive.
    pub outcome: MergeOutcome,
}

impl fmt::Display for MergeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<11} {}", self.outcome.label(), self.path)?;
        match &self.outcome {
            MergeOutcome::Applied { updated } if !updated.is_empty() => {
                write!(f, " ({})", updated.join(", "))
            }
            MergeOutcome::MissingKey { attr } => write!(f, " (no @{} on mark element)", attr),
            _ => Ok(()),
        }
    }
}

/// Log of every directive processed by a merge, in document order.
#[derive(Debug, Default, Clone)]
pub struct MergeLog {
    entries: Vec<MergeEntry>,
}

impl MergeLog {
    /// Creates a new empty merge log.
    pub fn new() -> Self {
        MergeLog {
            entries: Vec::new(),
        }
    }

    /// Records one directive.
    pub fn record(&mut self, entry: MergeEntry) {
        self.entries.push(entry);
    }

    /// Returns the entries.
    pub fn entries(&self) -> &[MergeEntry] {
        &self.entries
    }

    /// Returns the number of directives processed.
    pub fn directive_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of directives that found a counterpart.
    pub fn applied_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, MergeOutcome::Applied { .. }))
            .count()
    }

    /// Returns the number of directives that did not find a counterpart.
    pub fn unmatched_count(&self) -> usize {
        self.directive_count() - self.applied_count()
    }

    /// Returns the total number of attribute values written.
    pub fn updated_attribute_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| match &e.outcome {
                MergeOutcome::Applied { updated } => updated.len(),
                _ => 0,
            })
            .sum()
    }

    /// Writes one line per directive followed by a summary line.
    pub fn write_report<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for entry in &self.entries {
            writeln!(writer, "{}", entry)?;
        }
        writeln!(writer, "{}", self)
    }
}

impl fmt::Display for MergeLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} directive(s): {} applied, {} unmatched, {} attribute value(s) updated",
            self.directive_count(),
            self.applied_count(),
            self.unmatched_count(),
            self.updated_attribute_count()
        )
    }
}
