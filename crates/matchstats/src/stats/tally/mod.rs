//! Offline import of per-action counts from a CSV tally sheet.
//!
//! The sheet has an `action` column (catalog name or numeric id) and a `count`
//! column. Repeated rows for one action accumulate.

mod parser;

use crate::stats::catalog::Catalog;
use crate::stats::domain::{ActionCounts, ActionId};
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug)]
pub enum TallyImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for TallyImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyImportError::Io(err) => write!(f, "failed to read tally sheet: {}", err),
            TallyImportError::Csv(err) => write!(f, "invalid tally CSV data: {}", err),
        }
    }
}

impl std::error::Error for TallyImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TallyImportError::Io(err) => Some(err),
            TallyImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for TallyImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for TallyImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Counts read from a tally sheet plus the action labels that matched nothing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TallySheet {
    pub counts: ActionCounts,
    pub unknown_actions: Vec<String>,
}

pub struct TallyImporter;

impl TallyImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        catalog: &Catalog,
    ) -> Result<TallySheet, TallyImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, catalog)
    }

    pub fn from_reader<R: Read>(reader: R, catalog: &Catalog) -> Result<TallySheet, TallyImportError> {
        let mut sheet = TallySheet::default();

        for record in parser::parse_records(reader)? {
            match resolve_action(&record.action, catalog) {
                Some(action) => sheet.counts.add(action, record.count),
                None => {
                    debug!(action = %record.action, "tally row does not match a catalog action");
                    if !sheet.unknown_actions.contains(&record.action) {
                        sheet.unknown_actions.push(record.action);
                    }
                }
            }
        }

        Ok(sheet)
    }
}

fn resolve_action(label: &str, catalog: &Catalog) -> Option<ActionId> {
    if let Ok(raw) = label.trim().parse::<u32>() {
        let id = ActionId(raw);
        if catalog.contains_action(id) {
            return Some(id);
        }
    }

    catalog.action_by_name(label).map(|action| action.id)
}
