//! Purpose: Convert Rust caller values into the provider's flat C calling convention.
//! Exports: `c_path`, `c_string`, `page_index`, path/page arrays, `OutSlot`, `borrowed_str`.
//! Role: Marshaling layer between the facade and raw provider calls.
//! Invariants: Every buffer is owned by a Rust value scoped to one call.
//! Invariants: Page numbers cross the boundary 1-based and as positive `i32`.
use crate::core::error::{Error, ErrorKind};
use libc::c_char;
use std::ffi::{CStr, CString};
use std::path::Path;

pub fn c_string(value: &str, what: &str) -> Result<CString, Error> {
    CString::new(value).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("{what} contains a NUL byte"))
            .with_source(err)
    })
}

pub fn c_path(path: &Path) -> Result<CString, Error> {
    #[cfg(unix)]
    let bytes = {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    };
    #[cfg(not(unix))]
    let bytes = path
        .to_str()
        .ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("path is not valid UTF-8")
                .with_path(path)
        })?
        .as_bytes()
        .to_vec();
    if bytes.is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("path is empty"));
    }
    CString::new(bytes).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("path contains a NUL byte")
            .with_path(path)
            .with_source(err)
    })
}

/// Converts a 1-based page number into the provider's `int32_t` form.
pub fn page_index(page: u32, what: &str) -> Result<i32, Error> {
    if page == 0 {
        return Err(Error::new(ErrorKind::Usage).with_message(format!("{what} must be 1-based")));
    }
    i32::try_from(page).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("{what} {page} is out of range"))
            .with_source(err)
    })
}

/// Contiguous `const char*` array over call-scoped path buffers.
pub struct CPathArray {
    // Heap buffers do not move when the Vec is moved, so `ptrs` stays valid.
    _owned: Vec<CString>,
    ptrs: Vec<*const c_char>,
}

impl CPathArray {
    pub fn new<P: AsRef<Path>>(paths: &[P]) -> Result<Self, Error> {
        if paths.is_empty() {
            return Err(
                Error::new(ErrorKind::Usage).with_message("at least one input path is required")
            );
        }
        let owned = paths
            .iter()
            .map(|path| c_path(path.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let ptrs = owned.iter().map(|path| path.as_ptr()).collect();
        Ok(Self { _owned: owned, ptrs })
    }

    pub fn as_ptr(&self) -> *const *const c_char {
        self.ptrs.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.ptrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ptrs.is_empty()
    }
}

pub struct CPageArray {
    pages: Vec<i32>,
}

impl CPageArray {
    pub fn new(pages: &[u32]) -> Result<Self, Error> {
        if pages.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("at least one page is required"));
        }
        let pages = pages
            .iter()
            .map(|page| page_index(*page, "page"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pages })
    }

    pub fn as_ptr(&self) -> *const i32 {
        self.pages.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Scalar output parameter, read back right after the call returns.
#[derive(Debug)]
pub struct OutSlot<T> {
    value: T,
}

impl<T: Copy> OutSlot<T> {
    pub fn new(initial: T) -> Self {
        Self { value: initial }
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        &mut self.value
    }

    pub fn get(&self) -> T {
        self.value
    }
}

/// Views a provider-owned static string without taking ownership.
///
/// # Safety
///
/// `ptr` must be null or point at a NUL-terminated string that outlives `'a`.
pub unsafe fn borrowed_str<'a>(ptr: *const c_char) -> Option<&'a CStr> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) })
}

#[cfg(test)]
mod tests {
    use super::{CPageArray, CPathArray, OutSlot, borrowed_str, c_path, c_string, page_index};
    use crate::core::error::{ErrorCode, ErrorKind};
    use std::ffi::CStr;
    use std::path::{Path, PathBuf};

    #[test]
    fn path_array_preserves_order() {
        let paths = [PathBuf::from("/a.pdf"), PathBuf::from("/b.pdf"), PathBuf::from("/c.pdf")];
        let array = CPathArray::new(&paths).expect("array");
        assert_eq!(array.len(), 3);
        let seen: Vec<String> = (0..array.len())
            .map(|i| unsafe {
                CStr::from_ptr(*array.as_ptr().add(i))
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(seen, vec!["/a.pdf", "/b.pdf", "/c.pdf"]);
    }

    #[test]
    fn empty_path_list_is_rejected() {
        let paths: [&Path; 0] = [];
        let err = CPathArray::new(&paths).err().expect("empty");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
    }

    #[test]
    fn interior_nul_is_rejected() {
        assert!(c_string("a\0b", "prefix").is_err());
        let err = c_path(Path::new("bad\0path.pdf")).expect_err("nul");
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
        assert!(c_path(Path::new("")).is_err());
    }

    #[test]
    fn page_numbers_are_one_based_and_bounded() {
        assert_eq!(page_index(1, "page").unwrap(), 1);
        assert!(page_index(0, "page").is_err());
        assert!(page_index(u32::MAX, "page").is_err());
        assert!(CPageArray::new(&[]).is_err());
        assert!(CPageArray::new(&[2, 0]).is_err());
        let pages = CPageArray::new(&[3, 1]).expect("pages");
        assert_eq!(pages.len(), 2);
        assert_eq!(unsafe { *pages.as_ptr().add(1) }, 1);
    }

    #[test]
    fn out_slot_reads_back_written_value() {
        let mut slot = OutSlot::new(0u64);
        unsafe { *slot.as_mut_ptr() = 42 };
        assert_eq!(slot.get(), 42);
    }

    #[test]
    fn borrowed_str_handles_null() {
        assert!(unsafe { borrowed_str(std::ptr::null()) }.is_none());
        let text = c"3.2.1";
        assert_eq!(unsafe { borrowed_str(text.as_ptr()) }.unwrap().to_str().unwrap(), "3.2.1");
    }
}
