use core::arch::asm;
use core::time::Duration;
use crate::syscall::SyscallCode::*;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(usize)]
pub enum SyscallCode {
    Write = 64,
    Exit = 93,
    Nanosleep = 101,
    Getpid = 172,
    Clone = 220,
}

pub const STDOUT: i32 = 1;

pub const SIGCHLD: u32 = 17;

#[derive(Copy, Clone, Debug, Default)]
#[repr(C)]
pub struct TimeSpec {
    pub sec: i64,
    pub nsec: i64,
}

impl From<Duration> for TimeSpec {
    fn from(d: Duration) -> Self {
        let sec = d.as_secs() as i64;
        let nsec = d.subsec_nanos() as i64;
        Self { sec, nsec }
    }
}

macro_rules! syscall {
    ($code:expr $(, $args:expr)*) => {
        unsafe {
            syscall_asm!($code as usize $(, $args)*)
        }
    };
}

macro_rules! syscall_asm {
    ($code:expr) => {{
        let result: isize;
        asm!("ecall", in("a7") $code, lateout("a0") result);
        result
    }};
    ($code:expr, $arg0: expr) => {{
        let result: isize;
        asm!("ecall", in("a7") $code, inlateout("a0") $arg0 => result);
        result
    }};
    ($code: expr, $arg0: expr, $arg1: expr) => {{
        let result: isize;
        asm!("ecall", in("a7") $code, inlateout("a0") $arg0 => result, in("a1") $arg1);
        result
    }};
    ($code: expr, $arg0: expr, $arg1: expr, $arg2: expr) => {{
        let result: isize;
        asm!("ecall", in("a7") $code, inlateout("a0") $arg0 => result, in("a1") $arg1, in("a2") $arg2);
        result
    }};
    ($code: expr, $arg0: expr, $arg1: expr, $arg2: expr, $arg3: expr, $arg4: expr) => {{
        let result: isize;
        asm!("ecall", in("a7") $code, inlateout("a0") $arg0 => result, in("a1") $arg1, in("a2") $arg2, in("a3") $arg3, in("a4") $arg4);
        result
    }};
}

pub fn sys_write(fd: i32, buf: &[u8]) -> isize {
    syscall!(Write, fd as usize, buf.as_ptr() as usize, buf.len())
}

pub fn sys_exit(exit_code: i32) -> isize {
    let exit_code = exit_code as usize;
    syscall!(Exit, exit_code)
}

pub fn sys_getpid() -> isize {
    syscall!(Getpid)
}

/// Plain fork: no sharing flags, `SIGCHLD` delivered to the parent on exit.
pub fn sys_fork() -> isize {
    syscall!(Clone, SIGCHLD as usize, 0usize, 0usize, 0usize, 0usize)
}

pub fn sys_nanosleep(req: &TimeSpec, rem: Option<&mut TimeSpec>) -> isize {
    let rem = rem.map_or(0, |rem| rem as *mut TimeSpec as usize);
    syscall!(Nanosleep, req as *const TimeSpec as usize, rem)
}
