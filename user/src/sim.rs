//! A stand-in kernel for hosted targets.
//!
//! Every simulated process is an OS thread. Duplication cannot copy a running
//! thread, so it starts the caller-supplied continuation in a fresh thread
//! with a fresh pid instead.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::mem;
use core::sync::atomic::{AtomicUsize, Ordering};
use core::time::Duration;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use log::{debug, info, warn};
use spin::Mutex;
use crate::error::{Errno, SyscallResult};
use crate::host::{Forked, Host, Pid};

/// One write seen by a capturing [`ThreadHost`].
#[derive(Debug, Clone)]
pub struct Record {
    pub at: Instant,
    pub pid: Pid,
    pub text: String,
}

enum Output {
    Stdout,
    Capture(Mutex<Vec<Record>>),
}

struct Machine {
    /// 下一个分配的 pid
    next_pid: AtomicUsize,
    /// 存活的进程数
    live: AtomicUsize,
    /// 进程数上限，0 表示不限
    limit: AtomicUsize,
    /// 已被终止、尚未退出的进程
    doomed: Mutex<Vec<Pid>>,
    output: Output,
}

struct Process {
    pid: Pid,
    /// 由本进程复制出的子进程
    children: Mutex<Vec<JoinHandle<()>>>,
}

/// Unwinds a process out of its program once it has been killed.
struct Killed(Pid);

/// Handle to one simulated process. Clones refer to the same process.
#[derive(Clone)]
pub struct ThreadHost {
    proc: Arc<Process>,
    machine: Arc<Machine>,
}

impl ThreadHost {
    /// Boots a machine whose processes write to the real stdout.
    pub fn new() -> Self {
        Self::boot(Output::Stdout)
    }

    /// Boots a machine that keeps every write in memory.
    pub fn capture() -> Self {
        Self::boot(Output::Capture(Mutex::new(Vec::new())))
    }

    fn boot(output: Output) -> Self {
        let machine = Machine {
            next_pid: AtomicUsize::new(1),
            live: AtomicUsize::new(1),
            limit: AtomicUsize::new(0),
            doomed: Mutex::new(Vec::new()),
            output,
        };
        let pid = machine.next_pid.fetch_add(1, Ordering::SeqCst);
        Self {
            proc: Arc::new(Process::new(pid)),
            machine: Arc::new(machine),
        }
    }

    /// Caps the number of live processes; `0` removes the cap.
    pub fn set_process_limit(&self, limit: usize) {
        self.machine.limit.store(limit, Ordering::SeqCst);
    }

    /// Terminates `pid` the next time it enters the kernel.
    pub fn kill(&self, pid: Pid) {
        debug!("[kill] pid {}", pid);
        self.machine.doomed.lock().push(pid);
    }

    /// Runs `program` as this process, then waits for every process it
    /// duplicated. A killed process is not waited on; its children are
    /// orphaned and keep running.
    pub fn exec<F>(&self, program: F)
    where
        F: FnOnce(&Self),
    {
        match panic::catch_unwind(AssertUnwindSafe(|| program(self))) {
            Ok(()) => self.reap(),
            Err(payload) => match payload.downcast::<Killed>() {
                Ok(killed) => {
                    self.machine.doomed.lock().retain(|&pid| pid != killed.0);
                    info!("pid {} terminated", killed.0);
                }
                Err(payload) => panic::resume_unwind(payload),
            },
        }
    }

    /// Everything written so far, in write order. Empty unless capturing.
    pub fn records(&self) -> Vec<Record> {
        match &self.machine.output {
            Output::Stdout => Vec::new(),
            Output::Capture(records) => records.lock().clone(),
        }
    }

    pub fn output(&self) -> String {
        self.records().into_iter().map(|record| record.text).collect()
    }

    fn reap(&self) {
        loop {
            let children = mem::take(&mut *self.proc.children.lock());
            if children.is_empty() {
                break;
            }
            for child in children {
                if let Err(payload) = child.join() {
                    panic::resume_unwind(payload);
                }
            }
        }
    }

    fn enter(&self) {
        let pid = self.proc.pid;
        let doomed = self.machine.doomed.lock().contains(&pid);
        if doomed {
            panic::resume_unwind(Box::new(Killed(pid)));
        }
    }
}

impl Process {
    fn new(pid: Pid) -> Self {
        Self { pid, children: Mutex::new(Vec::new()) }
    }
}

impl Host for ThreadHost {
    fn duplicate<F>(&self, resume: F) -> SyscallResult<Forked>
    where
        F: FnOnce(&Self) + Send + 'static,
    {
        self.enter();
        let machine = &self.machine;
        let limit = machine.limit.load(Ordering::SeqCst);
        let live = machine.live.fetch_add(1, Ordering::SeqCst);
        if limit != 0 && live >= limit {
            machine.live.fetch_sub(1, Ordering::SeqCst);
            return Err(Errno::EAGAIN);
        }

        let pid = machine.next_pid.fetch_add(1, Ordering::SeqCst);
        let child = ThreadHost {
            proc: Arc::new(Process::new(pid)),
            machine: machine.clone(),
        };
        let spawned = thread::Builder::new()
            .name(format!("pid-{}", pid))
            .spawn(move || {
                child.exec(resume);
                child.machine.live.fetch_sub(1, Ordering::SeqCst);
            });
        match spawned {
            Ok(handle) => {
                self.proc.children.lock().push(handle);
                Ok(Forked::Parent { child: pid })
            }
            Err(err) => {
                warn!("[duplicate] cannot start pid {}: {}", pid, err);
                machine.live.fetch_sub(1, Ordering::SeqCst);
                Err(Errno::EAGAIN)
            }
        }
    }

    fn pid(&self) -> Pid {
        self.enter();
        self.proc.pid
    }

    fn sleep(&self, duration: Duration) -> SyscallResult {
        self.enter();
        thread::sleep(duration);
        self.enter();
        Ok(())
    }

    fn write(&self, buf: &[u8]) -> SyscallResult<usize> {
        self.enter();
        match &self.machine.output {
            Output::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(buf).map_err(|_| Errno::EIO)?;
                stdout.flush().map_err(|_| Errno::EIO)?;
            }
            Output::Capture(records) => records.lock().push(Record {
                at: Instant::now(),
                pid: self.proc.pid,
                text: String::from_utf8_lossy(buf).into_owned(),
            }),
        }
        Ok(buf.len())
    }
}
