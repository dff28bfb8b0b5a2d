use core::time::Duration;
use crate::error::{Errno, SyscallResult};
use crate::host::{Forked, Host, Pid};
use crate::syscall::{STDOUT, sys_fork, sys_getpid, sys_nanosleep, sys_write, TimeSpec};

/// The real kernel, reached through `ecall`.
pub struct Kernel;

impl Host for Kernel {
    fn duplicate<F>(&self, _resume: F) -> SyscallResult<Forked>
    where
        F: FnOnce(&Self) + Send + 'static,
    {
        match Errno::check(sys_fork())? {
            0 => Ok(Forked::Child),
            child => Ok(Forked::Parent { child }),
        }
    }

    fn pid(&self) -> Pid {
        sys_getpid() as Pid
    }

    fn sleep(&self, duration: Duration) -> SyscallResult {
        let req = TimeSpec::from(duration);
        Errno::check(sys_nanosleep(&req, None))?;
        Ok(())
    }

    fn write(&self, buf: &[u8]) -> SyscallResult<usize> {
        Errno::check(sys_write(STDOUT, buf))
    }
}
