#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

use pidprobe::reporter::Variant;

#[cfg_attr(target_os = "none", no_mangle)]
fn main() {
    pidprobe::launch(Variant::Sleep);
}
