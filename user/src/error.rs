use core::fmt;
use num_enum::FromPrimitive;

pub type SyscallResult<T = ()> = Result<T, Errno>;

#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(i32)]
pub enum Errno {
    EPERM = 1,
    ESRCH = 3,
    EINTR = 4,
    EIO = 5,
    EBADF = 9,
    EAGAIN = 11,
    ENOMEM = 12,
    EFAULT = 14,
    EINVAL = 22,
    ENOSYS = 38,
    #[num_enum(default)]
    Unknown,
}

impl Errno {
    /// Splits a raw system call return into a value or the negated errno.
    pub fn check(ret: isize) -> SyscallResult<usize> {
        if ret < 0 {
            Err(i32::try_from(ret.unsigned_abs()).map_or(Errno::Unknown, Errno::from))
        } else {
            Ok(ret as usize)
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = match self {
            Errno::EPERM => "operation not permitted",
            Errno::ESRCH => "no such process",
            Errno::EINTR => "interrupted system call",
            Errno::EIO => "input/output error",
            Errno::EBADF => "bad file descriptor",
            Errno::EAGAIN => "resource temporarily unavailable",
            Errno::ENOMEM => "out of memory",
            Errno::EFAULT => "bad address",
            Errno::EINVAL => "invalid argument",
            Errno::ENOSYS => "function not implemented",
            Errno::Unknown => "unknown error",
        };
        write!(f, "{:?} ({})", self, desc)
    }
}
