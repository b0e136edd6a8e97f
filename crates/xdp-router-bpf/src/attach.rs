//! Per-interface attachment lifecycle.
//!
//! The loaded program is attached once per interface. Each attachment is a
//! kernel resource that must be released exactly once, and the program
//! must outlive every attachment. [`AttachmentManager`] owns both: it holds
//! the [`Attacher`] (and with it the program) and the list of live
//! attachments, releases them in reverse acquisition order, and does so on
//! drop for anything still held.

use crate::error::{BpfError, BpfResult};
use crate::program::XdpMode;
use crate::types::PROGRAM_NAME;
use aya::programs::xdp::XdpLinkId;
use aya::programs::{ProgramError, Xdp};
use aya::Ebpf;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// An interface resolved to its OS index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceRef {
    pub name: String,
    pub ifindex: u32,
}

impl InterfaceRef {
    pub fn new(name: impl Into<String>, ifindex: u32) -> Self {
        Self {
            name: name.into(),
            ifindex,
        }
    }
}

impl fmt::Display for InterfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ifindex {})", self.name, self.ifindex)
    }
}

/// Attaches the loaded program to interfaces.
///
/// Implementations own the loaded program. `detach` is called exactly once
/// for every successful `attach`.
pub trait Attacher {
    fn attach(&mut self, iface: &InterfaceRef) -> BpfResult<()>;
    fn detach(&mut self, iface: &InterfaceRef) -> BpfResult<()>;
}

/// Attacher for the kernel, backed by aya.
pub struct XdpAttacher {
    links: HashMap<u32, XdpLinkId>,
    ebpf: Ebpf,
    mode: XdpMode,
}

impl XdpAttacher {
    pub fn new(ebpf: Ebpf, mode: XdpMode) -> Self {
        Self {
            links: HashMap::new(),
            ebpf,
            mode,
        }
    }

    fn program(&mut self, iface: &InterfaceRef) -> BpfResult<&mut Xdp> {
        self.ebpf
            .program_mut(PROGRAM_NAME)
            .ok_or_else(|| {
                BpfError::attach(&iface.name, format!("program {PROGRAM_NAME} not found"))
            })?
            .try_into()
            .map_err(|e: ProgramError| BpfError::attach(&iface.name, e.to_string()))
    }
}

impl Attacher for XdpAttacher {
    fn attach(&mut self, iface: &InterfaceRef) -> BpfResult<()> {
        let flags = self.mode.flags();
        let link_id = self
            .program(iface)?
            .attach_to_if_index(iface.ifindex, flags)
            .map_err(|e| BpfError::attach(&iface.name, e.to_string()))?;
        self.links.insert(iface.ifindex, link_id);
        Ok(())
    }

    fn detach(&mut self, iface: &InterfaceRef) -> BpfResult<()> {
        let link_id = self
            .links
            .remove(&iface.ifindex)
            .ok_or_else(|| BpfError::detach(&iface.name, "not attached"))?;
        self.program(iface)?
            .detach(link_id)
            .map_err(|e| BpfError::detach(&iface.name, e.to_string()))
    }
}

/// Proof of one live attachment.
///
/// Handles are not `Clone`: passing one to
/// [`AttachmentManager::release`] consumes it, so an attachment cannot be
/// released twice through its handle.
#[derive(Debug, PartialEq, Eq)]
pub struct AttachmentHandle {
    interface: InterfaceRef,
}

impl AttachmentHandle {
    pub fn interface(&self) -> &InterfaceRef {
        &self.interface
    }
}

/// Owns the program and every attachment made with it.
pub struct AttachmentManager {
    // Acquisition order.
    attached: Vec<InterfaceRef>,
    attacher: Box<dyn Attacher>,
}

impl AttachmentManager {
    pub fn new(attacher: Box<dyn Attacher>) -> Self {
        Self {
            attached: Vec::new(),
            attacher,
        }
    }

    /// Attaches the program to `iface`.
    ///
    /// A second attach to an ifindex that is already attached is rejected
    /// with [`BpfError::AlreadyAttached`]. A failure leaves earlier
    /// attachments untouched.
    pub fn attach(&mut self, iface: &InterfaceRef) -> BpfResult<AttachmentHandle> {
        if self.is_attached(iface.ifindex) {
            return Err(BpfError::AlreadyAttached {
                interface: iface.name.clone(),
                ifindex: iface.ifindex,
            });
        }

        self.attacher.attach(iface)?;
        self.attached.push(iface.clone());
        info!(interface = %iface.name, ifindex = iface.ifindex, "Attached XDP program");

        Ok(AttachmentHandle {
            interface: iface.clone(),
        })
    }

    /// Releases one attachment.
    pub fn release(&mut self, handle: AttachmentHandle) -> BpfResult<()> {
        let position = self
            .attached
            .iter()
            .position(|i| i.ifindex == handle.interface.ifindex)
            .ok_or_else(|| BpfError::detach(&handle.interface.name, "not attached"))?;
        let iface = self.attached.remove(position);
        self.detach(&iface)
    }

    /// Releases every attachment in reverse acquisition order.
    ///
    /// Every attachment is attempted even if an earlier one fails; the first
    /// failure is returned.
    pub fn release_all(&mut self) -> BpfResult<()> {
        let mut first_error = None;
        while let Some(iface) = self.attached.pop() {
            if let Err(e) = self.detach(&iface) {
                warn!(interface = %iface.name, error = %e, "Failed to detach XDP program");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn is_attached(&self, ifindex: u32) -> bool {
        self.attached.iter().any(|i| i.ifindex == ifindex)
    }

    /// Returns the attached interfaces in acquisition order.
    pub fn attached(&self) -> &[InterfaceRef] {
        &self.attached
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    fn detach(&mut self, iface: &InterfaceRef) -> BpfResult<()> {
        self.attacher.detach(iface)?;
        debug!(interface = %iface.name, ifindex = iface.ifindex, "Detached XDP program");
        Ok(())
    }
}

impl Drop for AttachmentManager {
    fn drop(&mut self) {
        if !self.attached.is_empty() {
            let _ = self.release_all();
        }
    }
}

impl fmt::Debug for AttachmentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentManager")
            .field("attached", &self.attached)
            .finish_non_exhaustive()
    }
}
