//! Slot names and small value types shared across the planner.
//!
//! A [`Slot`] names one end of a resource link: the attachment a pass writes
//! (`COLOR`, `DEPTH`, `CUBEMAP`), the presentation surface (`SCREEN`), the
//! `NONE` sentinel, or a [`Sampler`] uniform the consumer reads from.

mod common;
mod slot;

pub use common::{Extent2d, TextureFilter};
pub use slot::{Sampler, Slot};
