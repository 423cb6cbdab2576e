//! Call frame management
//!
//! Every host call made through the VM pushes a [`Frame`]. Member calls carry
//! the receiver they were dispatched on; that receiver is the caller identity
//! used for in-class access checks and for `METHODINIT`.
//!
//! ```text
//! ┌─────────────────────────────┐
//! │ Frame N (current)           │  ← receiver decides access
//! │   function, receiver        │
//! ├─────────────────────────────┤
//! │ Frame N-1                   │
//! │   ...                       │
//! └─────────────────────────────┘
//! ```

use std::rc::Rc;

use crate::object::RecordRef;
use crate::{VmError, VmResult};

/// One activation
#[derive(Debug, Clone)]
pub struct Frame {
    /// Name of the running function
    pub function: Rc<str>,

    /// Record the call was dispatched on, for member calls
    pub receiver: Option<RecordRef>,
}

impl Frame {
    /// Frame for a plain function call
    pub fn plain(function: Rc<str>) -> Self {
        Self {
            function,
            receiver: None,
        }
    }

    /// Frame for a member call bound to `receiver`
    pub fn member(function: Rc<str>, receiver: RecordRef) -> Self {
        Self {
            function,
            receiver: Some(receiver),
        }
    }
}

/// Bounded stack of call frames
#[derive(Debug)]
pub struct CallStack {
    frames: Vec<Frame>,
    max_depth: usize,
}

impl CallStack {
    /// Create a stack that refuses to grow beyond `max_depth` frames
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::with_capacity(max_depth.min(256)),
            max_depth,
        }
    }

    /// Push a frame
    ///
    /// # Errors
    ///
    /// Returns `VmError::StackOverflow` if the depth limit is reached.
    pub fn push(&mut self, frame: Frame) -> VmResult<()> {
        if self.frames.len() >= self.max_depth {
            return Err(VmError::StackOverflow {
                limit: self.max_depth,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the current frame
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Innermost frame
    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Receiver of the innermost frame
    pub fn receiver(&self) -> Option<&RecordRef> {
        self.current().and_then(|frame| frame.receiver.as_ref())
    }

    /// Number of active frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Configured depth limit
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether no frame is active
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Record;

    #[test]
    fn test_push_pop() {
        let mut stack = CallStack::new(4);
        stack.push(Frame::plain("main".into())).unwrap();
        assert_eq!(stack.depth(), 1);
        assert!(stack.receiver().is_none());

        let class = Record::new_class(None, None);
        stack.push(Frame::member("m".into(), class.clone())).unwrap();
        assert!(Rc::ptr_eq(stack.receiver().unwrap(), &class));

        stack.pop();
        assert!(stack.receiver().is_none());
        stack.pop();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_overflow() {
        let mut stack = CallStack::new(2);
        stack.push(Frame::plain("a".into())).unwrap();
        stack.push(Frame::plain("b".into())).unwrap();
        assert_eq!(
            stack.push(Frame::plain("c".into())),
            Err(VmError::StackOverflow { limit: 2 })
        );
        assert_eq!(stack.depth(), 2);
    }
}
