/*!
 * Signal Traits
 * Type-erased view of a signal as seen from a slot owner
 */

use super::slots::OwnerInner;
use crate::core::id::{OwnerId, SignalId};
use std::sync::{Arc, Weak};

/// Operations a slot owner may invoke on a signal it is connected to
///
/// Slot owners hold these as `Weak<dyn SignalLink>`, so the payload type of
/// the signal is erased and the owner never keeps a signal alive.
pub(crate) trait SignalLink: Send + Sync {
    /// Identity of the signal
    fn signal_id(&self) -> SignalId;

    /// Drop every connection targeting `owner` and its back-reference
    fn slot_disconnect(&self, owner: &OwnerInner) -> usize;

    /// Give `new` a copy of every live connection targeting `old`
    ///
    /// `link` is this signal as recorded in `old`'s back-reference set. It is
    /// registered on `new` only if at least one connection was copied.
    fn slot_duplicate(
        &self,
        old: OwnerId,
        new: &Arc<OwnerInner>,
        link: Weak<dyn SignalLink>,
    ) -> usize;
}
