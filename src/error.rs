use crate::element::ElementId;
use crate::event::EventRef;

/// Errors returned by the recoverable parts of the dispatch API.
///
/// Contract violations (dispatching an event that is already being dispatched)
/// panic instead, and self-healing degradations such as a stale pointer capture
/// are logged rather than returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("event handle {0:?} does not refer to a live event")]
    StaleEvent(EventRef),
    #[error("element {0:?} does not exist")]
    UnknownElement(ElementId),
    #[error("element {0:?} is not attached to the panel")]
    DetachedElement(ElementId),
    #[error("element {0:?} cannot receive focus")]
    NotFocusable(ElementId),
    #[error("pointer id {0} is outside the tracked range")]
    InvalidPointerId(u32),
    #[error("making {child:?} a child of {parent:?} would create a cycle")]
    Cycle {
        parent: ElementId,
        child: ElementId,
    },
    #[error("the root element cannot be detached or removed")]
    RootElement,
}

pub type Result<T, E = EventError> = std::result::Result<T, E>;
