//! Runtime environments: one frame per static scope.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::value::{StructInstance, Value};

pub type Env = Rc<Environment>;

pub struct Environment {
    parent: Option<Env>,
    /// Set for the frame that holds a method's receiver.
    receiver: Option<Rc<StructInstance>>,
    slots: RefCell<Vec<Value>>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("slots", &self.slots.borrow().len())
            .field("receiver", &self.receiver.is_some())
            .finish()
    }
}

impl Environment {
    pub fn root(slots: usize) -> Env {
        Rc::new(Environment {
            parent: None,
            receiver: None,
            slots: RefCell::new(vec![Value::Null; slots]),
        })
    }

    /// A block frame with `slots` unset variables.
    pub fn child(parent: &Env, slots: usize) -> Env {
        Self::with_values(parent, vec![Value::Null; slots])
    }

    /// A frame whose slots start out holding `values`, e.g. call arguments.
    pub fn with_values(parent: &Env, values: Vec<Value>) -> Env {
        Rc::new(Environment {
            parent: Some(Rc::clone(parent)),
            receiver: None,
            slots: RefCell::new(values),
        })
    }

    /// The frame a method body sees its receiver's fields through.
    pub fn receiver(parent: &Env, receiver: Rc<StructInstance>) -> Env {
        Rc::new(Environment {
            parent: Some(Rc::clone(parent)),
            receiver: Some(receiver),
            slots: RefCell::new(Vec::new()),
        })
    }

    pub fn ancestor(self: &Rc<Self>, hops: usize) -> Result<Env, RuntimeError> {
        let mut env = Rc::clone(self);
        for _ in 0..hops {
            let parent = env
                .parent
                .clone()
                .ok_or(RuntimeError::Internal("scope chain is shorter than expected"))?;
            env = parent;
        }
        Ok(env)
    }

    pub fn get(&self, slot: usize) -> Result<Value, RuntimeError> {
        self.slots
            .borrow()
            .get(slot)
            .cloned()
            .ok_or(RuntimeError::Internal("variable slot out of range"))
    }

    pub fn set(&self, slot: usize, value: Value) -> Result<(), RuntimeError> {
        let mut slots = self.slots.borrow_mut();
        let target = slots
            .get_mut(slot)
            .ok_or(RuntimeError::Internal("variable slot out of range"))?;
        *target = value;
        Ok(())
    }

    pub fn receiver_instance(&self) -> Result<Rc<StructInstance>, RuntimeError> {
        self.receiver
            .clone()
            .ok_or(RuntimeError::Internal("method frame without a receiver"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_writes_through_ancestors() {
        let root = Environment::root(1);
        root.set(0, Value::Int(7)).expect("set");
        let block = Environment::child(&root, 2);
        let inner = Environment::child(&block, 0);

        let found = inner.ancestor(2).expect("ancestor");
        assert_eq!(found.get(0).expect("get"), Value::Int(7));
        assert_eq!(inner.ancestor(1).expect("ancestor").get(1).expect("get"), Value::Null);
        assert!(inner.ancestor(3).is_err());
    }

    #[test]
    fn rejects_unknown_slots() {
        let root = Environment::root(0);
        assert!(root.get(0).is_err());
        assert!(root.set(0, Value::Null).is_err());
    }
}
