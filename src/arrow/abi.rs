use std::os::raw::c_void;
use std::ptr;

/// The Arrow C data interface array descriptor
///
/// This struct layout is a stable ABI shared across the analytics
/// ecosystem; any consumer library can read exported data through it
/// without knowledge of this crate. Field order and widths must not
/// change
#[repr(C)]
#[derive(Debug)]
pub struct ArrowArray {
    pub length: i64,
    pub null_count: i64,
    pub offset: i64,
    pub n_buffers: i64,
    pub n_children: i64,
    pub buffers: *mut *const c_void,
    pub children: *mut *mut ArrowArray,
    pub dictionary: *mut ArrowArray,
    pub release: Option<unsafe extern "C" fn(*mut ArrowArray)>,
    pub private_data: *mut c_void,
}

impl ArrowArray {
    /// An empty, released descriptor ready to be filled by an export
    pub fn empty() -> Self {
        Self {
            length: 0,
            null_count: 0,
            offset: 0,
            n_buffers: 0,
            n_children: 0,
            buffers: ptr::null_mut(),
            children: ptr::null_mut(),
            dictionary: ptr::null_mut(),
            release: None,
            private_data: ptr::null_mut(),
        }
    }

    /// True once the release callback ran (or never armed)
    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }

    /// Invoke the release callback, handing every export-owned
    /// allocation back. Idempotent: a second call is a no-op
    ///
    /// # Safety
    /// The descriptor must either be unarmed or point at a live
    /// export whose holder has not been freed through another alias
    pub unsafe fn release(&mut self) {
        if let Some(release) = self.release {
            release(self as *mut ArrowArray);
        }
    }
}

impl Default for ArrowArray {
    fn default() -> Self {
        Self::empty()
    }
}
