//! Frames, Scopes and the Scope Stack.
//!
//! A Frame is a LIFO stack of Steps for one block. A Scope is one
//! language-level namespace plus its Frames. The Scope Stack nests Scopes,
//! one per call or entry point; it is empty exactly when the run is over.

use std::sync::Arc;

use pyr_object::Object;

use crate::errors::Fault;
use crate::step::Step;

#[derive(Default)]
pub(crate) struct Frame {
    steps: Vec<Step>,
}

impl Frame {
    fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    fn pop(&mut self) -> Option<Step> {
        self.steps.pop()
    }
}

pub(crate) struct Scope {
    /// Created on first access when the Scope was entered without an owner.
    self_: Option<Object>,
    /// Enclosing namespaces searched after `self`, innermost first.
    outer: Arc<[Object]>,
    /// Qualified name of the function this Scope runs, if any.
    qualname: Option<Arc<str>>,
    frames: Vec<Frame>,
}

impl Scope {
    /// A Scope bound to an existing namespace.
    pub(crate) fn owned(self_: Object) -> Self {
        Scope {
            self_: Some(self_),
            outer: Arc::from([]),
            qualname: None,
            frames: Vec::new(),
        }
    }

    /// A Scope whose namespace is created on first use.
    pub(crate) fn unowned() -> Self {
        Scope {
            self_: None,
            outer: Arc::from([]),
            qualname: None,
            frames: Vec::new(),
        }
    }

    /// A function call's Scope; its namespace is created on first use.
    pub(crate) fn function(outer: Arc<[Object]>, qualname: Arc<str>) -> Self {
        Scope {
            self_: None,
            outer,
            qualname: Some(qualname),
            frames: Vec::new(),
        }
    }

    /// A Scope over the same namespaces, with no Frames of its own.
    pub(crate) fn share(&mut self) -> Self {
        Scope {
            self_: Some(self.self_object()),
            outer: Arc::clone(&self.outer),
            qualname: self.qualname.clone(),
            frames: Vec::new(),
        }
    }

    /// The namespace owner, created lazily.
    pub(crate) fn self_object(&mut self) -> Object {
        self.self_.get_or_insert_with(Object::namespace).clone()
    }

    pub(crate) fn outer(&self) -> &[Object] {
        &self.outer
    }

    pub(crate) fn qualname(&self) -> Option<&str> {
        self.qualname.as_deref()
    }
}

/// What one dispatch step found.
pub(crate) enum Next {
    /// The Scope Stack is empty.
    Idle,
    /// A Scope with no Frames was popped.
    ScopeDone,
    /// A Frame with no Steps was popped.
    FrameDone,
    Step(Step),
}

#[derive(Default)]
pub(crate) struct Scopes {
    stack: Vec<Scope>,
}

impl Scopes {
    pub(crate) fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut Scope> {
        self.stack.last_mut()
    }

    pub(crate) fn enter_scope(&mut self, scope: Scope) {
        self.stack.push(scope);
    }

    /// Pop the current Scope, discarding any Frames it still has.
    pub(crate) fn exit_scope(&mut self) {
        self.stack.pop();
    }

    /// Push an empty Frame onto the current Scope.
    pub(crate) fn enter(&mut self) -> Result<(), Fault> {
        let scope = self.stack.last_mut().ok_or(Fault::NoActiveScope)?;
        scope.frames.push(Frame::default());
        Ok(())
    }

    /// Pop the current Frame if there is one.
    pub(crate) fn exit(&mut self) {
        if let Some(scope) = self.stack.last_mut() {
            scope.frames.pop();
        }
    }

    pub(crate) fn push(&mut self, step: Step) -> Result<(), Fault> {
        let scope = self.stack.last_mut().ok_or(Fault::NoActiveScope)?;
        let frame = scope.frames.last_mut().ok_or(Fault::NoActiveFrame)?;
        frame.push(step);
        Ok(())
    }

    /// One step of the dispatch loop: pop a finished Scope or Frame, or
    /// take the next Step.
    pub(crate) fn next(&mut self) -> Next {
        let Some(scope) = self.stack.last_mut() else {
            return Next::Idle;
        };
        let Some(frame) = scope.frames.last_mut() else {
            self.stack.pop();
            return Next::ScopeDone;
        };
        match frame.pop() {
            Some(step) => Next::Step(step),
            None => {
                scope.frames.pop();
                Next::FrameDone
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.stack.clear();
    }

    /// Frames in the current Scope.
    pub(crate) fn frame_count(&self) -> usize {
        self.stack.last().map_or(0, |scope| scope.frames.len())
    }
}

#[cfg(test)]
mod tests;
