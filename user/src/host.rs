//! The kernel contract the reporter runs against.
//!
//! On the bare target the contract is met by real system calls ([`Kernel`]).
//! On a hosted target there is no kernel to fork us, so [`ThreadHost`] plays
//! the kernel with one OS thread per simulated process.

use core::time::Duration;
use crate::error::SyscallResult;

#[cfg(target_os = "none")]
pub use crate::kernel::Kernel;
#[cfg(not(target_os = "none"))]
pub use crate::sim::ThreadHost;

pub type Pid = usize;

/// Where execution continues after a successful duplication.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Forked {
    /// The original context; `child` names the new process.
    Parent { child: Pid },
    /// The new context.
    Child,
}

pub trait Host {
    /// Creates an independently scheduled copy of the calling context.
    ///
    /// A kernel that copies the whole address space returns twice and never
    /// calls `resume`: the copy simply continues after this call. A host that
    /// cannot copy a running context instead starts `resume` in a new context
    /// with its own identity and returns once, in the original.
    ///
    /// Either way the caller should carry on from the call site as if nothing
    /// distinguished the two.
    fn duplicate<F>(&self, resume: F) -> SyscallResult<Forked>
    where
        F: FnOnce(&Self) + Send + 'static;

    fn pid(&self) -> Pid;

    /// Suspends the caller for at least `duration`, yielding the processor.
    fn sleep(&self, duration: Duration) -> SyscallResult;

    /// Writes `buf` to standard output.
    fn write(&self, buf: &[u8]) -> SyscallResult<usize>;
}
