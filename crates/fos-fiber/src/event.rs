//! Host events and listener handles

use std::fmt;
use std::rc::Rc;

/// Event delivered to a listener
#[derive(Debug, Clone)]
pub struct Event {
    event_type: Rc<str>,
    value: Option<String>,
}

impl Event {
    /// Create an event of the given lowercase type (`click`, `input`, ...)
    pub fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.into(),
            value: None,
        }
    }

    /// Attach a value payload (e.g. the new text of an input)
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Shared event listener.
///
/// Two handlers are equal only if they are clones of the same handler, so a
/// closure rebuilt on every render counts as a changed prop.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the listener
    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &EventHandler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}
