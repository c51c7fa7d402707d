//! Snapshot based undo/redo

use tracing::debug;

/// Manages undo/redo stacks of full snapshots.
///
/// The first snapshot pushed is the baseline and is never undone past.
#[derive(Debug, Clone)]
pub struct UndoRedoManager<T> {
    undo_stack: Vec<T>,
    redo_stack: Vec<T>,
    last_redo: Option<T>,
    max_depth: Option<usize>,
}

impl<T: Clone + PartialEq> UndoRedoManager<T> {
    /// Create an unbounded manager
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            last_redo: None,
            max_depth: None,
        }
    }

    /// Create with a maximum undo depth, baseline included
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth.max(2)),
            ..Self::new()
        }
    }

    /// Push a snapshot. Returns false when it equals the current top.
    pub fn add_undo_step(&mut self, step: T) -> bool {
        if self.undo_stack.last() == Some(&step) {
            return false;
        }
        // pushing back what was just redone keeps the redo branch
        if self.last_redo.as_ref() != Some(&step) {
            self.redo_stack.clear();
            self.last_redo = None;
        }
        self.undo_stack.push(step);

        if let Some(max) = self.max_depth {
            if self.undo_stack.len() > max {
                self.undo_stack.remove(1);
                debug!("Undo stack at depth {}, evicted oldest step", max);
            }
        }
        true
    }

    /// Substitute the top snapshot, or push it onto an empty stack
    pub fn replace_last_undo_step(&mut self, step: T) {
        match self.undo_stack.last_mut() {
            Some(last) => *last = step,
            None => self.undo_stack.push(step),
        }
    }

    /// Current top snapshot
    pub fn get_last_undo_step(&self) -> Option<&T> {
        self.undo_stack.last()
    }

    /// Step back. Returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<&T> {
        if self.undo_stack.len() <= 1 {
            return None;
        }
        let step = self.undo_stack.pop()?;
        self.redo_stack.push(step);
        self.undo_stack.last()
    }

    /// Step forward. Returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<&T> {
        let step = self.redo_stack.pop()?;
        self.last_redo = Some(step.clone());
        self.undo_stack.push(step);
        self.undo_stack.last()
    }

    pub fn is_undo_possible(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn is_redo_possible(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}

impl<T: Clone + PartialEq> Default for UndoRedoManager<T> {
    fn default() -> Self {
        Self::new()
    }
}
