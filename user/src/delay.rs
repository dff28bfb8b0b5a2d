use core::hint;
use core::time::Duration;
use crate::error::SyscallResult;
use crate::host::Host;

/// How a reporter waits between two reports.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Delay {
    /// Burn this many no-op iterations without ever entering the kernel.
    Spin(usize),
    /// Ask the kernel to suspend us.
    Sleep(Duration),
}

impl Delay {
    pub fn wait<H: Host>(&self, host: &H) -> SyscallResult {
        match *self {
            Delay::Spin(cycles) => {
                spin(cycles);
                Ok(())
            }
            Delay::Sleep(duration) => host.sleep(duration),
        }
    }
}

fn spin(cycles: usize) {
    for i in 0..cycles {
        nop();
        hint::black_box(i);
    }
}

#[cfg(target_arch = "riscv64")]
#[inline(always)]
fn nop() {
    unsafe { core::arch::asm!("nop") }
}

#[cfg(not(target_arch = "riscv64"))]
#[inline(always)]
fn nop() {
    hint::spin_loop();
}
