//! Duplicate once, then keep telling everyone who we are.

use alloc::format;
use core::fmt;
use core::str::FromStr;
use log::{debug, info, warn};
use crate::config::{REPORT_ROUNDS, SLEEP_INTERVAL, SPIN_CYCLES};
use crate::delay::Delay;
use crate::host::{Forked, Host, Pid};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Rounds {
    Bounded(usize),
    /// Until someone kills us.
    Forever,
}

/// Everything a reporter needs. Copied into the duplicated context as-is.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Plan {
    pub rounds: Rounds,
    pub delay: Delay,
}

/// The programs shipped in `src/bin`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Variant {
    /// `hello`: duplicate, five rounds, busy-spin.
    Spin,
    /// `hello_sleep`: duplicate, five rounds, kernel sleep.
    Sleep,
    /// `hello_forever`: duplicate, report until killed, kernel sleep.
    Forever,
}

impl Variant {
    pub fn plan(self) -> Plan {
        match self {
            Variant::Spin => Plan {
                rounds: Rounds::Bounded(REPORT_ROUNDS),
                delay: Delay::Spin(SPIN_CYCLES),
            },
            Variant::Sleep => Plan {
                rounds: Rounds::Bounded(REPORT_ROUNDS),
                delay: Delay::Sleep(SLEEP_INTERVAL),
            },
            Variant::Forever => Plan {
                rounds: Rounds::Forever,
                delay: Delay::Sleep(SLEEP_INTERVAL),
            },
        }
    }
}

/// One line of output: `<round>: mypid: <pid>`, or `mypid: <pid>` without a
/// round counter.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Report {
    pub round: Option<usize>,
    pub pid: Pid,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.round {
            Some(round) => write!(f, "{}: mypid: {}", round, self.pid),
            None => write!(f, "mypid: {}", self.pid),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ParseReportError;

impl fmt::Display for ParseReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("malformed report line")
    }
}

impl FromStr for Report {
    type Err = ParseReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_end();
        let (round, pid) = match s.split_once(": mypid: ") {
            Some((round, pid)) => (Some(round.parse().map_err(|_| ParseReportError)?), pid),
            None => (None, s.strip_prefix("mypid: ").ok_or(ParseReportError)?),
        };
        let pid = pid.parse().map_err(|_| ParseReportError)?;
        Ok(Self { round, pid })
    }
}

pub struct Reporter<'a, H: Host> {
    host: &'a H,
    plan: Plan,
}

impl<'a, H: Host> Reporter<'a, H> {
    pub fn new(host: &'a H, plan: Plan) -> Self {
        Self { host, plan }
    }

    pub fn run(&self) {
        self.duplicate();
        self.report_loop();
    }

    /// A failed duplication is logged and otherwise ignored: we just carry on
    /// as the only reporter.
    fn duplicate(&self) {
        let plan = self.plan;
        match self.host.duplicate(move |host| Reporter::new(host, plan).report_loop()) {
            Ok(Forked::Parent { child }) => debug!("[duplicate] child pid {}", child),
            Ok(Forked::Child) => debug!("[duplicate] resumed in child"),
            Err(err) => warn!("[duplicate] failed: {}, continuing alone", err),
        }
    }

    fn report_loop(&self) {
        match self.plan.rounds {
            Rounds::Bounded(rounds) => {
                for round in 0..rounds {
                    self.report(Some(round));
                    self.delay();
                }
                info!("pid {} finished {} rounds", self.host.pid(), rounds);
            }
            Rounds::Forever => loop {
                self.report(None);
                self.delay();
            },
        }
    }

    fn report(&self, round: Option<usize>) {
        let report = Report { round, pid: self.host.pid() };
        // one write per line so concurrent reporters interleave whole lines
        let line = format!("{}\n", report);
        if let Err(err) = self.host.write(line.as_bytes()) {
            debug!("[report] write failed: {}", err);
        }
    }

    fn delay(&self) {
        if let Err(err) = self.plan.delay.wait(self.host) {
            warn!("[delay] {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::vec::Vec;
    use core::time::Duration;
    use std::thread;
    use std::time::Instant;
    use crate::host::ThreadHost;

    fn streams(host: &ThreadHost) -> BTreeMap<Pid, Vec<(Instant, Report)>> {
        let mut streams: BTreeMap<Pid, Vec<(Instant, Report)>> = BTreeMap::new();
        for record in host.records() {
            let report: Report = record.text.parse().unwrap();
            assert_eq!(report.pid, record.pid, "reported pid differs from writer");
            streams.entry(record.pid).or_default().push((record.at, report));
        }
        streams
    }

    fn assert_rounds(stream: &[(Instant, Report)], rounds: usize) {
        let seen: Vec<_> = stream.iter().map(|(_, report)| report.round).collect();
        let expected: Vec<_> = (0..rounds).map(Some).collect();
        assert_eq!(seen, expected);
    }

    fn assert_spacing(stream: &[(Instant, Report)], at_least: Duration) {
        for pair in stream.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= at_least);
        }
    }

    #[test]
    fn report_lines_round_trip() {
        let counted = Report { round: Some(3), pid: 7 };
        assert_eq!(format!("{}", counted), "3: mypid: 7");
        assert_eq!("3: mypid: 7\n".parse::<Report>(), Ok(counted));

        let bare = Report { round: None, pid: 12 };
        assert_eq!(format!("{}", bare), "mypid: 12");
        assert_eq!("mypid: 12".parse::<Report>(), Ok(bare));
    }

    #[test]
    fn malformed_report_lines_are_rejected() {
        assert_eq!("pid: 3".parse::<Report>(), Err(ParseReportError));
        assert_eq!("x: mypid: 3".parse::<Report>(), Err(ParseReportError));
        assert_eq!("mypid: three".parse::<Report>(), Err(ParseReportError));
    }

    #[test]
    fn variants_match_the_shipped_programs() {
        let spin = Variant::Spin.plan();
        assert_eq!(spin.rounds, Rounds::Bounded(5));
        assert_eq!(spin.delay, Delay::Spin(1_000_000_000));

        let sleep = Variant::Sleep.plan();
        assert_eq!(sleep.rounds, Rounds::Bounded(5));
        assert_eq!(sleep.delay, Delay::Sleep(Duration::from_millis(500)));

        let forever = Variant::Forever.plan();
        assert_eq!(forever.rounds, Rounds::Forever);
        assert_eq!(forever.delay, Delay::Sleep(Duration::from_millis(500)));
    }

    #[test]
    fn bounded_spin_reports_from_both_processes() {
        let host = ThreadHost::capture();
        let plan = Plan {
            rounds: Rounds::Bounded(REPORT_ROUNDS),
            delay: Delay::Spin(100_000),
        };
        host.exec(|h| Reporter::new(h, plan).run());

        let streams = streams(&host);
        assert_eq!(streams.keys().copied().collect::<Vec<_>>(), [1, 2]);
        for stream in streams.values() {
            assert_rounds(stream, REPORT_ROUNDS);
            assert_spacing(stream, Duration::from_nanos(1));
        }
    }

    #[test]
    fn sleep_variant_spaces_reports_by_the_interval() {
        let host = ThreadHost::capture();
        host.exec(|h| Reporter::new(h, Variant::Sleep.plan()).run());

        let streams = streams(&host);
        assert_eq!(streams.len(), 2);
        for stream in streams.values() {
            assert_rounds(stream, REPORT_ROUNDS);
            assert_spacing(stream, SLEEP_INTERVAL);
        }
    }

    #[test]
    fn failed_duplication_leaves_a_single_complete_stream() {
        let host = ThreadHost::capture();
        host.set_process_limit(1);
        let plan = Plan {
            rounds: Rounds::Bounded(REPORT_ROUNDS),
            delay: Delay::Sleep(Duration::from_millis(2)),
        };
        host.exec(|h| Reporter::new(h, plan).run());

        let streams = streams(&host);
        assert_eq!(streams.len(), 1);
        assert_rounds(&streams[&1], REPORT_ROUNDS);
    }

    fn run_forever(host: &ThreadHost, interval: Duration) -> thread::JoinHandle<()> {
        let plan = Plan { rounds: Rounds::Forever, delay: Delay::Sleep(interval) };
        let host = host.clone();
        thread::spawn(move || host.exec(|h| Reporter::new(h, plan).run()))
    }

    fn wait_for_lines(host: &ThreadHost, pids: &[Pid], lines: usize) {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let streams = streams(host);
            if pids.iter().all(|pid| streams.get(pid).map_or(false, |s| s.len() >= lines)) {
                return;
            }
            assert!(Instant::now() < deadline, "reporter went quiet");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn wait_until_quiet(host: &ThreadHost, interval: Duration) {
        loop {
            let before = host.records().len();
            thread::sleep(interval * 4);
            if host.records().len() == before {
                return;
            }
        }
    }

    #[test]
    fn forever_reports_from_both_processes_until_killed() {
        let host = ThreadHost::capture();
        let interval = Duration::from_millis(5);
        let runner = run_forever(&host, interval);

        wait_for_lines(&host, &[1, 2], 4);
        host.kill(1);
        host.kill(2);
        runner.join().unwrap();
        wait_until_quiet(&host, interval);

        let streams = streams(&host);
        assert_eq!(streams.keys().copied().collect::<Vec<_>>(), [1, 2]);
        for stream in streams.values() {
            assert!(stream.len() >= 4);
            assert!(stream.iter().all(|(_, report)| report.round.is_none()));
            assert_spacing(stream, interval);
        }
    }

    #[test]
    fn forever_without_duplication_reports_alone() {
        let host = ThreadHost::capture();
        host.set_process_limit(1);
        let interval = Duration::from_millis(5);
        let runner = run_forever(&host, interval);

        wait_for_lines(&host, &[1], 4);
        host.kill(1);
        runner.join().unwrap();

        let streams = streams(&host);
        assert_eq!(streams.len(), 1);
        let stream = &streams[&1];
        assert!(stream.iter().all(|(_, report)| report.round.is_none()));
        assert_spacing(stream, interval);
    }
}
