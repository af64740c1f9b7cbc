// SPDX-License-Identifier: AGPL-3.0-only

//! Memory-mapped windows onto PRU-ICSS memory
//!
//! Every memory kind of an instance is reached through a [`Mmio`] window.
//! Two windows are provided:
//!
//! - [`MappedRegion`]: a shared mapping of a file range (`/dev/mem`, a UIO
//!   map, or any regular file) via rustix `mmap`.
//! - [`SoftwareRegion`]: plain process memory, for CI and simulation
//!   without hardware.
//!
//! A [`RegionMapper`] turns the physical resources handed over at attach
//! time into windows.

// MMIO registers are naturally aligned by hardware, so pointer casts are safe
#![allow(clippy::cast_ptr_alignment)]
#![allow(clippy::cast_possible_truncation)]

use crate::error::{PrussError, Result};
use crate::region::MemResource;
use pruss_chip::mem::MemKind;
use rustix::fs::OFlags;
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsFd;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

/// 32-bit register access to a mapped window.
///
/// Offsets are relative to the start of the window and must be 4-byte
/// aligned and inside [`Mmio::size`]; implementations panic otherwise.
pub trait Mmio: Send + Sync + std::fmt::Debug {
    /// Read a 32-bit register
    fn read32(&self, offset: usize) -> u32;

    /// Write a 32-bit register
    fn write32(&self, offset: usize, value: u32);

    /// Window size in bytes
    fn size(&self) -> usize;

    /// Address of the first byte of the window in this process
    fn mapped_base(&self) -> usize;
}

fn check_bounds(offset: usize, size: usize) {
    assert!(offset % 4 == 0, "Register offset {offset:#x} not word aligned");
    assert!(
        offset.checked_add(4).is_some_and(|end| end <= size),
        "Register offset {offset:#x} out of bounds (window {size:#x})"
    );
}

/// Mapped file range for MMIO access
pub struct MappedRegion {
    /// Start of the page-aligned mapping
    ptr: *mut u8,
    /// Length of the page-aligned mapping
    map_len: usize,
    /// Distance from `ptr` to the requested offset
    delta: usize,
    /// Requested window size
    size: usize,
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("base", &format_args!("{:#x}", self.mapped_base()))
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

// SAFETY: Send - MappedRegion owns its mapping exclusively. Moving between threads
// doesn't invalidate the mapping (mmap'd memory is process-wide). No thread-local state.
unsafe impl Send for MappedRegion {}

// SAFETY: Sync - every access is a single bounds-checked volatile load or store of
// an aligned word. Read-modify-write sequences are serialized by the caller.
unsafe impl Sync for MappedRegion {}

impl MappedRegion {
    /// Map `size` bytes of `file` starting at `offset`.
    ///
    /// `offset` need not be page aligned; the mapping is widened to the
    /// enclosing pages and the window starts at the requested byte. It must
    /// be word aligned so every register access stays aligned.
    ///
    /// # Errors
    ///
    /// Returns `MapFailed` if `size` is zero, `offset` is not word aligned,
    /// or the mmap call fails.
    pub fn map(file: &File, offset: u64, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(PrussError::map_failed(format!(
                "empty window at {offset:#x}"
            )));
        }
        if offset % 4 != 0 {
            return Err(PrussError::map_failed(format!(
                "window at {offset:#x} is not word aligned"
            )));
        }

        let page = rustix::param::page_size() as u64;
        let aligned = offset & !(page - 1);
        let delta = (offset - aligned) as usize;
        let map_len = delta + size;

        // SAFETY: mmap necessary for MMIO - maps the window into process address space.
        // Invariants: (1) file is open for read/write; (2) aligned is a page multiple;
        // (3) ptr is valid for map_len bytes or Err. The mapping is released in Drop.
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                map_len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                aligned,
            )
            .map_err(|e| {
                PrussError::map_failed(format!("mmap {size:#x} bytes at {offset:#x}: {e}"))
            })?
        };

        tracing::debug!("Mapped {:#x} bytes at {:#x} -> {:p}", size, offset, ptr);

        Ok(Self {
            ptr: ptr.cast(),
            map_len,
            delta,
            size,
        })
    }
}

impl Mmio for MappedRegion {
    fn read32(&self, offset: usize) -> u32 {
        check_bounds(offset, self.size);
        // SAFETY: read_volatile necessary for MMIO - hardware can change value.
        // Invariants: (1) ptr from mmap, valid for map_len; (2) delta+offset+4 <= map_len;
        // (3) u32 aligned (page-aligned base, word-aligned offset and delta).
        unsafe { std::ptr::read_volatile(self.ptr.add(self.delta + offset).cast::<u32>()) }
    }

    fn write32(&self, offset: usize, value: u32) {
        check_bounds(offset, self.size);
        // SAFETY: write_volatile necessary for MMIO - triggers hardware side effects.
        // Invariants: (1) ptr from mmap; (2) delta+offset+4 <= map_len; (3) u32 aligned.
        unsafe {
            std::ptr::write_volatile(self.ptr.add(self.delta + offset).cast::<u32>(), value);
        }
    }

    fn size(&self) -> usize {
        self.size
    }

    fn mapped_base(&self) -> usize {
        self.ptr as usize + self.delta
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // SAFETY: munmap of exactly the range returned by mmap in map(); Drop runs
        // at most once and no references into the window outlive self.
        unsafe {
            // Ignore error in Drop (can't propagate)
            let _ = munmap(self.ptr.cast(), self.map_len);
        }
        tracing::debug!("Unmapped window at {:#x}", self.mapped_base());
    }
}

/// Window backed by process memory.
///
/// Behaves like device memory for register traffic; contents start zeroed.
#[derive(Debug)]
pub struct SoftwareRegion {
    words: Box<[AtomicU32]>,
    size: usize,
}

impl SoftwareRegion {
    /// Allocate a zeroed window of `size` bytes
    pub fn new(size: usize) -> Self {
        let words = (0..size.div_ceil(4)).map(|_| AtomicU32::new(0)).collect();
        Self { words, size }
    }
}

impl Mmio for SoftwareRegion {
    fn read32(&self, offset: usize) -> u32 {
        check_bounds(offset, self.size);
        self.words[offset / 4].load(Ordering::Relaxed)
    }

    fn write32(&self, offset: usize, value: u32) {
        check_bounds(offset, self.size);
        self.words[offset / 4].store(value, Ordering::Relaxed);
    }

    fn size(&self) -> usize {
        self.size
    }

    fn mapped_base(&self) -> usize {
        self.words.as_ptr() as usize
    }
}

/// Maps the physical memory resources of an instance into windows.
pub trait RegionMapper {
    /// Map one resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be mapped.
    fn map(&self, kind: MemKind, resource: &MemResource) -> Result<Box<dyn Mmio>>;
}

/// Maps physical addresses through a memory device file such as `/dev/mem`.
///
/// The physical base of each resource is used as the file offset.
#[derive(Debug)]
pub struct DevMemMapper {
    file: File,
}

impl DevMemMapper {
    /// Open the memory device.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened read/write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // SAFETY: OFlags::SYNC.bits() is always a valid i32 value (flag bits are small positive values)
        #[allow(clippy::cast_possible_wrap)]
        let sync_flag = OFlags::SYNC.bits() as i32;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(sync_flag) // uncached access for register windows
            .open(path)?;

        tracing::debug!("Opened memory source {}", path.display());
        Ok(Self { file })
    }
}

impl RegionMapper for DevMemMapper {
    fn map(&self, kind: MemKind, resource: &MemResource) -> Result<Box<dyn Mmio>> {
        let region = MappedRegion::map(&self.file, resource.physical_base, resource.size)
            .map_err(|e| PrussError::map_failed(format!("{kind}: {e}")))?;
        Ok(Box::new(region))
    }
}

/// Backs every resource with a fresh [`SoftwareRegion`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareMapper;

impl RegionMapper for SoftwareMapper {
    fn map(&self, kind: MemKind, resource: &MemResource) -> Result<Box<dyn Mmio>> {
        if resource.size == 0 {
            return Err(PrussError::map_failed(format!("{kind}: empty window")));
        }
        Ok(Box::new(SoftwareRegion::new(resource.size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn software_region_starts_zeroed() {
        let region = SoftwareRegion::new(0x44);
        assert_eq!(region.size(), 0x44);
        assert_eq!(region.read32(0x40), 0);
        region.write32(0x40, 0xdead_beef);
        assert_eq!(region.read32(0x40), 0xdead_beef);
        assert_eq!(region.read32(0x3c), 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn software_region_rejects_offset_past_end() {
        SoftwareRegion::new(8).read32(8);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn offset_near_usize_max_does_not_wrap_past_bounds_check() {
        SoftwareRegion::new(0x100).read32(usize::MAX - 3);
    }

    #[test]
    #[should_panic(expected = "not word aligned")]
    fn unaligned_offset_panics() {
        SoftwareRegion::new(16).write32(2, 1);
    }

    #[test]
    fn mapped_file_window_sees_file_contents() {
        let mut file = tempfile::tempfile().unwrap();
        let mut contents = vec![0u8; 0x2000];
        contents[0x1008..0x100c].copy_from_slice(&0x1234_5678u32.to_ne_bytes());
        file.write_all(&contents).unwrap();

        let region = MappedRegion::map(&file, 0x1000, 0x100).unwrap();
        assert_eq!(region.size(), 0x100);
        assert_eq!(region.read32(0x8), 0x1234_5678);

        region.write32(0xc, 0xa5a5_a5a5);
        assert_eq!(region.read32(0xc), 0xa5a5_a5a5);
    }

    #[test]
    fn unaligned_file_offset_keeps_window_start() {
        let mut file = tempfile::tempfile().unwrap();
        let mut contents = vec![0u8; 0x2000];
        contents[0x40..0x44].copy_from_slice(&0xcafe_f00du32.to_ne_bytes());
        file.write_all(&contents).unwrap();

        let region = MappedRegion::map(&file, 0x40, 0x10).unwrap();
        assert_eq!(region.read32(0), 0xcafe_f00d);
    }

    #[test]
    fn empty_window_is_refused() {
        let file = tempfile::tempfile().unwrap();
        let err = MappedRegion::map(&file, 0, 0).unwrap_err();
        assert!(matches!(err, PrussError::MapFailed { .. }));
    }

    #[test]
    fn misaligned_window_is_refused() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&[0u8; 0x100]).unwrap();
        let err = MappedRegion::map(&file, 0x42, 0x10).unwrap_err();
        assert!(matches!(err, PrussError::MapFailed { .. }));
    }

    #[test]
    fn dev_mem_mapper_refuses_misaligned_resource() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 0x1000]).unwrap();
        let mapper = DevMemMapper::open(file.path()).unwrap();

        let err = mapper
            .map(MemKind::Cfg, &MemResource::new(0x2, 0x44))
            .unwrap_err();
        assert!(matches!(err, PrussError::MapFailed { .. }));

        let window = mapper
            .map(MemKind::Cfg, &MemResource::new(0x40, 0x44))
            .unwrap();
        assert_eq!(window.mapped_base() % 4, 0);
    }

    #[test]
    fn software_mapper_sizes_windows_from_resources() {
        let res = MemResource::new(0x4a32_6000, 0x2000);
        let window = SoftwareMapper.map(MemKind::Cfg, &res).unwrap();
        assert_eq!(window.size(), 0x2000);
    }
}
