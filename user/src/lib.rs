#![no_std]
#![cfg_attr(target_os = "none", feature(linkage))]

extern crate alloc;
#[cfg(not(target_os = "none"))]
extern crate std;

pub mod config;
#[macro_use]
pub mod console;
pub mod delay;
pub mod error;
pub mod host;
#[cfg(target_os = "none")]
pub mod kernel;
pub mod logger;
pub mod reporter;
#[cfg(not(target_os = "none"))]
pub mod sim;
#[cfg(target_os = "none")]
pub mod syscall;

use crate::reporter::{Reporter, Variant};

/// Entry point shared by the programs in `src/bin`.
#[cfg(target_os = "none")]
pub fn launch(variant: Variant) {
    Reporter::new(&host::Kernel, variant.plan()).run();
}

/// Entry point shared by the programs in `src/bin`.
#[cfg(not(target_os = "none"))]
pub fn launch(variant: Variant) {
    logger::init();
    host::ThreadHost::new().exec(|host| Reporter::new(host, variant.plan()).run());
}

#[cfg(target_os = "none")]
mod runtime {
    use buddy_system_allocator::LockedHeap;
    use log::error;
    use crate::config::USER_HEAP_SIZE;
    use crate::syscall::sys_exit;

    static mut HEAP_SPACE: [u8; USER_HEAP_SIZE] = [0; USER_HEAP_SIZE];

    #[global_allocator]
    static HEAP: LockedHeap<32> = LockedHeap::<32>::empty();

    #[no_mangle]
    #[link_section = ".text.entry"]
    pub extern "C" fn _start() -> ! {
        unsafe {
            HEAP.lock().init(core::ptr::addr_of_mut!(HEAP_SPACE) as usize, USER_HEAP_SIZE);
        }
        crate::logger::init();
        main();
        sys_exit(0);
        loop {}
    }

    #[linkage = "weak"]
    #[no_mangle]
    fn main() {
        panic!("Cannot find main!");
    }

    #[panic_handler]
    fn panic_handler(panic_info: &core::panic::PanicInfo) -> ! {
        error!("{}", panic_info);
        sys_exit(-1);
        loop {}
    }
}
