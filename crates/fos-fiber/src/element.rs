//! Element Model
//!
//! Immutable node descriptions produced by the authoring layer.
//! Elements are cheap to clone: props and children live behind an `Rc`.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::event::EventHandler;
use crate::hooks::Hooks;

/// Reserved type marker for text leaves
pub const TEXT_ELEMENT: &str = "TEXT_ELEMENT";

/// Prop holding the content of a text leaf
pub const NODE_VALUE: &str = "nodeValue";

/// Reserved prop key for the ordered child list
pub const CHILDREN: &str = "children";

/// A single prop value
#[derive(Clone, PartialEq)]
pub enum PropValue {
    Str(Rc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Event listener, compared by identity
    Handler(EventHandler),
}

impl PropValue {
    /// String form written to a host attribute. Handlers have none.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            PropValue::Str(s) => Some(s.to_string()),
            PropValue::Int(i) => Some(i.to_string()),
            PropValue::Float(f) => Some(f.to_string()),
            PropValue::Bool(b) => Some(b.to_string()),
            PropValue::Handler(_) => None,
        }
    }

    /// Get the handler if this value is one
    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Get the string if this value is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(s) => write!(f, "{s:?}"),
            PropValue::Int(i) => write!(f, "{i}"),
            PropValue::Float(x) => write!(f, "{x}"),
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Handler(h) => write!(f, "{h:?}"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Str(s.into())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Str(s.into())
    }
}

impl From<i64> for PropValue {
    fn from(i: i64) -> Self {
        PropValue::Int(i)
    }
}

impl From<i32> for PropValue {
    fn from(i: i32) -> Self {
        PropValue::Int(i.into())
    }
}

impl From<f64> for PropValue {
    fn from(f: f64) -> Self {
        PropValue::Float(f)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<EventHandler> for PropValue {
    fn from(h: EventHandler) -> Self {
        PropValue::Handler(h)
    }
}

/// Prop mapping of an element.
///
/// The `children` entry is kept apart from the keyed values so that it can
/// never be mistaken for an attribute; [`Props::iter`] yields keyed values only.
#[derive(Clone, Default)]
pub struct Props {
    values: BTreeMap<Rc<str>, PropValue>,
    children: Vec<Element>,
}

impl Props {
    /// Create an empty prop set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<PropValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a keyed value. The reserved `children` key is ignored.
    pub fn insert(&mut self, key: &str, value: impl Into<PropValue>) {
        if key == CHILDREN {
            tracing::debug!("ignoring keyed value for reserved prop `children`");
            return;
        }
        self.values.insert(key.into(), value.into());
    }

    /// Get a keyed value
    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    /// Check if a keyed value exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate keyed values in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Number of keyed values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Ordered child elements
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub(crate) fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.values.iter())
            .entry(&CHILDREN, &self.children)
            .finish()
    }
}

/// Render function signature of a function component
pub type RenderFn = dyn Fn(&Props, &mut Hooks<'_>) -> Element;

/// Function component.
///
/// Components built from a zero-sized callable (a function item, or a closure
/// that captures nothing) are identified by its type, so rebuilding one each
/// render keeps its state. Any other callable (function pointers, boxed or
/// capturing closures) is identified by the allocation made in
/// [`Component::new`]: keep one `Component` and clone it to preserve identity.
#[derive(Clone)]
pub struct Component {
    name: &'static str,
    id: TypeId,
    by_type: bool,
    render: Rc<RenderFn>,
}

impl Component {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&Props, &mut Hooks<'_>) -> Element + 'static,
    {
        Self {
            name: std::any::type_name::<F>(),
            id: TypeId::of::<F>(),
            by_type: std::mem::size_of::<F>() == 0,
            render: Rc::new(render),
        }
    }

    /// Type name of the render callable (for logging)
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, props: &Props, hooks: &mut Hooks<'_>) -> Element {
        (self.render)(props, hooks)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && (self.by_type || Rc::ptr_eq(&self.render, &other.render))
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

/// Element type
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    /// Host tag name, e.g. `div`
    Host(Rc<str>),
    /// Text leaf
    Text,
    /// Function component
    Component(Component),
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        if tag == TEXT_ELEMENT {
            ElementType::Text
        } else {
            ElementType::Host(tag.into())
        }
    }
}

impl From<Component> for ElementType {
    fn from(c: Component) -> Self {
        ElementType::Component(c)
    }
}

/// Immutable element description
#[derive(Clone)]
pub struct Element {
    ty: ElementType,
    props: Rc<Props>,
}

impl Element {
    /// Element for a function component
    pub fn component(component: Component, props: Props) -> Self {
        Self {
            ty: ElementType::Component(component),
            props: Rc::new(props),
        }
    }

    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn shared_props(&self) -> Rc<Props> {
        Rc::clone(&self.props)
    }

    pub fn children(&self) -> &[Element] {
        self.props.children()
    }

    /// Host tag, if this is a host element
    pub fn tag(&self) -> Option<&str> {
        match &self.ty {
            ElementType::Host(tag) => Some(tag),
            _ => None,
        }
    }

    /// Text content, if this is a text leaf
    pub fn text(&self) -> Option<&str> {
        match self.ty {
            ElementType::Text => self.props.get(NODE_VALUE).and_then(PropValue::as_str),
            _ => None,
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ty {
            ElementType::Text => write!(f, "{:?}", self.text().unwrap_or_default()),
            ty => f
                .debug_struct("Element")
                .field("type", ty)
                .field("props", &self.props)
                .finish(),
        }
    }
}

/// Raw child accepted by [`create_element`]: an element, or a primitive that
/// gets wrapped into a text leaf.
#[derive(Debug, Clone)]
pub enum Child {
    Element(Element),
    Text(String),
}

impl From<Element> for Child {
    fn from(e: Element) -> Self {
        Child::Element(e)
    }
}

impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Child::Text(s.to_string())
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Child::Text(s)
    }
}

impl From<i64> for Child {
    fn from(i: i64) -> Self {
        Child::Text(i.to_string())
    }
}

/// Build an element, coercing primitive children into text leaves
pub fn create_element<C>(
    ty: impl Into<ElementType>,
    props: Props,
    children: impl IntoIterator<Item = C>,
) -> Element
where
    C: Into<Child>,
{
    let children = children
        .into_iter()
        .map(|child| match child.into() {
            Child::Element(e) => e,
            Child::Text(text) => create_text_element(&text),
        })
        .collect();

    Element {
        ty: ty.into(),
        props: Rc::new(props.with_children(children)),
    }
}

/// Build a text leaf
pub fn create_text_element(text: &str) -> Element {
    Element {
        ty: ElementType::Text,
        props: Rc::new(Props::new().with(NODE_VALUE, text)),
    }
}
