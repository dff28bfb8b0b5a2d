use core::fmt;

#[cfg(target_os = "none")]
pub fn print(args: fmt::Arguments) {
    use crate::syscall::{STDOUT, sys_write};
    let fmt = alloc::fmt::format(args);
    sys_write(STDOUT, fmt.as_bytes());
}

#[cfg(not(target_os = "none"))]
pub fn print(args: fmt::Arguments) {
    use std::io::Write;
    let _ = std::io::stdout().lock().write_fmt(args);
}

#[macro_export]
macro_rules! print {
    ($fmt: literal $(, $($arg: tt)+)?) => {
        $crate::console::print(format_args!($fmt $(, $($arg)+)?));
    }
}

#[macro_export]
macro_rules! println {
    ($fmt: literal $(, $($arg: tt)+)?) => {
        $crate::console::print(format_args!(concat!($fmt, "\n") $(, $($arg)+)?));
    }
}
