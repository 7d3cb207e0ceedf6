// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::fmt::{Debug, Formatter};

/// An opaque, pointer-sized handle to a backend object (buffer, view, or sampler).
///
/// The crate never dereferences or releases a handle; ownership of the underlying
/// GPU object stays with whoever created it.  [`NativeHandle::NULL`] marks an
/// unoccupied slot, and binding it detaches whatever was in that slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeHandle(usize);

impl NativeHandle {
    pub const NULL: NativeHandle = NativeHandle(0);

    pub const fn new(raw: usize) -> Self {
        NativeHandle(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Debug for NativeHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "NativeHandle(null)")
        } else {
            write!(f, "NativeHandle({:#x})", self.0)
        }
    }
}

impl From<usize> for NativeHandle {
    fn from(raw: usize) -> Self {
        NativeHandle(raw)
    }
}
