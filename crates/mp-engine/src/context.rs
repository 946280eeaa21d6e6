//! Per-run execution state

use crate::cursor::DataCursor;
use crate::policy::ReactionTable;
use mp_script::ScriptDocument;
use tracing::warn;

/// Entry on the call/loop stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Pushed by `Cycle`
    LoopCount { ret: usize, remaining: u32 },
    /// Pushed by `CycleOverField`
    LoopField { ret: usize, field: String },
    /// Pushed by `Run` on a block
    Call { ret: usize },
}

impl Frame {
    /// Index of the command that pushed the frame
    pub fn ret(&self) -> usize {
        match self {
            Frame::LoopCount { ret, .. } | Frame::LoopField { ret, .. } | Frame::Call { ret } => {
                *ret
            }
        }
    }
}

/// Everything a run reads and writes
///
/// The context owns the document for the length of the run, so the editor
/// cannot change it underneath the engine. [`ExecutionContext::into_document`]
/// hands it back.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub document: ScriptDocument,
    /// Index of the current command; `None` is before the first one.
    /// May equal the queue length once execution runs off the end.
    pub pointer: Option<usize>,
    pub stack: Vec<Frame>,
    pub cursor: DataCursor,
    pub reactions: ReactionTable,
}

impl ExecutionContext {
    /// Take over a document, starting from its editor pointer
    pub fn new(document: ScriptDocument) -> Self {
        let pointer = document.pointer();
        Self {
            document,
            pointer,
            stack: Vec::new(),
            cursor: DataCursor::new(),
            reactions: ReactionTable::new(),
        }
    }

    /// Clear the stack, cursors and reactions of a previous run
    pub fn reset(&mut self) {
        self.stack.clear();
        self.cursor.reset();
        self.reactions.reset();
    }

    /// Give the document back, with its pointer on the last command reached
    pub fn into_document(self) -> ScriptDocument {
        let mut document = self.document;
        let pointer = match (self.pointer, document.len()) {
            (_, 0) => None,
            (Some(p), len) => Some(p.min(len - 1)),
            (None, _) => None,
        };
        if let Err(e) = document.set_pointer(pointer) {
            warn!("Could not restore editor pointer: {}", e);
        }
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::{Command, CommandKind};

    fn document(n: usize) -> ScriptDocument {
        let mut doc = ScriptDocument::new();
        for i in 0..n {
            doc.insert_after_pointer(Command::new(CommandKind::Pause(i as u64)))
                .unwrap();
        }
        doc
    }

    #[test]
    fn test_new_takes_editor_pointer() {
        let ctx = ExecutionContext::new(document(3));
        assert_eq!(ctx.pointer, Some(2));
        assert!(ctx.stack.is_empty());
    }

    #[test]
    fn test_into_document_clamps_pointer() {
        let mut ctx = ExecutionContext::new(document(3));
        ctx.pointer = Some(3);
        assert_eq!(ctx.into_document().pointer(), Some(2));

        let mut ctx = ExecutionContext::new(document(3));
        ctx.pointer = Some(1);
        assert_eq!(ctx.into_document().pointer(), Some(1));

        let mut ctx = ExecutionContext::new(document(0));
        ctx.pointer = Some(0);
        assert_eq!(ctx.into_document().pointer(), None);
    }

    #[test]
    fn test_frame_ret() {
        assert_eq!(Frame::Call { ret: 4 }.ret(), 4);
        assert_eq!(
            Frame::LoopCount {
                ret: 1,
                remaining: 2
            }
            .ret(),
            1
        );
    }
}
