//! # `ElementId`s
//!
//! [`ElementId`]s are generational handles into an [`ElementTree`](super::ElementTree).
//! A removed element's id never aliases a later element, so handles held by
//! events, captures or hover state go stale instead of pointing somewhere else.

use slotmap::new_key_type;

new_key_type! {
    /// A small unique identifier for an element of an [`ElementTree`](super::ElementTree).
    pub struct ElementId;
}
