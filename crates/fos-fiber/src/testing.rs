//! Recording host for unit tests

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::element::PropValue;
use crate::event::{Event, EventHandler};
use crate::host::{Host, HostError, HostResult};

/// Host that records every call as a short string
#[derive(Default)]
pub(crate) struct RecordingHost {
    next_id: u32,
    /// Shared so that effects under test can append to the same log
    log: Rc<RefCell<Vec<String>>>,
    children: HashMap<u32, Vec<u32>>,
    listeners: HashMap<u32, Vec<(String, EventHandler)>>,
    fail_writes: bool,
    fail_creates: bool,
}

impl RecordingHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn take_log(&mut self) -> Vec<String> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    pub(crate) fn shared_log(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.log)
    }

    pub(crate) fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Reject element creation
    pub(crate) fn fail_creates(&mut self, fail: bool) {
        self.fail_creates = fail;
    }

    /// Allocate a detached container node
    pub(crate) fn container(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn children_of(&self, node: u32) -> Vec<u32> {
        self.children.get(&node).cloned().unwrap_or_default()
    }

    pub(crate) fn dispatch(&self, node: u32, event_type: &str) {
        let handlers: Vec<EventHandler> = self
            .listeners
            .get(&node)
            .into_iter()
            .flatten()
            .filter(|(t, _)| t == event_type)
            .map(|(_, h)| h.clone())
            .collect();
        let event = Event::new(event_type);
        for handler in handlers {
            handler.call(&event);
        }
    }

    fn write(&mut self, entry: String) -> HostResult<()> {
        if self.fail_writes {
            return Err(HostError::Other("write rejected".into()));
        }
        self.log.borrow_mut().push(entry);
        Ok(())
    }
}

impl Host for RecordingHost {
    type Node = u32;

    fn create_element(&mut self, tag: &str) -> HostResult<u32> {
        if self.fail_creates {
            return Err(HostError::Other(format!("cannot create <{tag}>")));
        }
        self.next_id += 1;
        self.log.borrow_mut().push(format!("element {} {}", self.next_id, tag));
        Ok(self.next_id)
    }

    fn create_text_node(&mut self, _text: &str) -> HostResult<u32> {
        self.next_id += 1;
        self.log.borrow_mut().push(format!("text {}", self.next_id));
        Ok(self.next_id)
    }

    fn set_property(&mut self, node: &u32, name: &str, value: &PropValue) -> HostResult<()> {
        let value = value.to_attribute().unwrap_or_default();
        self.write(format!("set {node} {name}={value}"))
    }

    fn clear_property(&mut self, node: &u32, name: &str) -> HostResult<()> {
        self.write(format!("clear {node} {name}"))
    }

    fn add_event_listener(&mut self, node: &u32, event_type: &str, handler: &EventHandler) -> HostResult<()> {
        self.write(format!("listen {node} {event_type}"))?;
        self.listeners
            .entry(*node)
            .or_default()
            .push((event_type.to_string(), handler.clone()));
        Ok(())
    }

    fn remove_event_listener(&mut self, node: &u32, event_type: &str, handler: &EventHandler) -> HostResult<()> {
        self.write(format!("unlisten {node} {event_type}"))?;
        if let Some(list) = self.listeners.get_mut(node) {
            list.retain(|(t, h)| !(t == event_type && h.ptr_eq(handler)));
        }
        Ok(())
    }

    fn append_child(&mut self, parent: &u32, child: &u32) -> HostResult<()> {
        self.write(format!("append {parent} {child}"))?;
        self.children.entry(*parent).or_default().push(*child);
        Ok(())
    }

    fn remove_child(&mut self, parent: &u32, child: &u32) -> HostResult<()> {
        let list = self.children.entry(*parent).or_default();
        let Some(pos) = list.iter().position(|c| c == child) else {
            return Err(HostError::NotAChild);
        };
        list.remove(pos);
        self.write(format!("remove {parent} {child}"))
    }
}
