//! Notification delivery port trait.
//!
//! Live mode sends exactly one message per outcome (a recommendation or a
//! failure reason). Delivery itself is an external collaborator's concern.

use crate::domain::error::PairtraderError;

pub trait NotifyPort {
    fn send(&self, message: &str) -> Result<(), PairtraderError>;
}
