//! # Translation Lookaside Buffers
//!
//! Two TLB organizations in front of the [page walker](memsim_vmem), both
//! caching virtual-page-number → physical-page-number mappings:
//!
//! - [`fa::FaTlb`]: a single 128-entry **fully-associative** TLB tagged
//!   with the full 36-bit VPN, with LRU replacement driven by a
//!   caller-owned [`list::IndexList`] of line indices (least recently used
//!   at the front, most recently used at the back).
//! - [`hierarchy::TlbHierarchy`]: two 16-entry **direct-mapped** L1 TLBs
//!   (one for instruction fetches, one for data accesses) backed by a
//!   64-entry direct-mapped L2 TLB, with the stale-line invalidation
//!   discipline described on [`hierarchy::TlbHierarchy::translate`].
//!
//! Both variants fall back to the page walk on miss and propagate its
//! errors unchanged; neither ever consults the caches.

pub mod fa;
pub mod hierarchy;
pub mod list;
