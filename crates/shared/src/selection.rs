use tracing::debug;

use crate::{
    catalog::Catalog,
    domain::{Category, KeyEvent, LogRecord, Selection, Slot, RETURN_SLOT},
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    CategoryChosen(Category),
}

/// Result of feeding one press into the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Ignored,
    CategorySelected(Category),
    Cancelled,
    Completed(Selection),
}

/// Persists completed selections.
pub trait SelectionSink {
    fn append(&mut self, selection: &Selection) -> anyhow::Result<LogRecord>;
}

#[derive(Debug)]
pub enum Outcome {
    Ignored,
    CategorySelected(Category),
    Cancelled,
    Logged(LogRecord),
    LogFailed {
        selection: Selection,
        error: anyhow::Error,
    },
}

#[derive(Debug, Clone)]
pub struct SelectionMachine {
    catalog: Catalog,
    state: SelectionState,
}

impl SelectionMachine {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            state: SelectionState::Idle,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Applies a pressed slot to the current state. Touches nothing outside
    /// the machine; a `Completed` result leaves the machine in `Idle`.
    pub fn handle_press(&mut self, slot: Slot) -> Transition {
        match &self.state {
            SelectionState::Idle => match self.catalog.category_for_slot(slot) {
                Some(category) => {
                    let category = category.clone();
                    self.state = SelectionState::CategoryChosen(category.clone());
                    Transition::CategorySelected(category)
                }
                None => {
                    debug!(%slot, "unmapped category slot ignored");
                    Transition::Ignored
                }
            },
            SelectionState::CategoryChosen(_) if slot == RETURN_SLOT => {
                self.state = SelectionState::Idle;
                Transition::Cancelled
            }
            SelectionState::CategoryChosen(category) => {
                match self.catalog.issue_for_slot(category, slot) {
                    Some(issue) => {
                        let selection = Selection::new(category.clone(), issue.clone());
                        self.state = SelectionState::Idle;
                        Transition::Completed(selection)
                    }
                    None => {
                        debug!(%slot, %category, "unmapped issue slot ignored");
                        Transition::Ignored
                    }
                }
            }
        }
    }

    /// Handles one device event end to end. Released keys are dropped and a
    /// completed selection is handed to `sink`; a failing sink still leaves
    /// the machine in `Idle`.
    pub fn process(&mut self, event: KeyEvent, sink: &mut dyn SelectionSink) -> Outcome {
        if !event.is_pressed() {
            return Outcome::Ignored;
        }

        match self.handle_press(event.slot) {
            Transition::Ignored => Outcome::Ignored,
            Transition::CategorySelected(category) => Outcome::CategorySelected(category),
            Transition::Cancelled => Outcome::Cancelled,
            Transition::Completed(selection) => match sink.append(&selection) {
                Ok(record) => Outcome::Logged(record),
                Err(error) => Outcome::LogFailed { selection, error },
            },
        }
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
