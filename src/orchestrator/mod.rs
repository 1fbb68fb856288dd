//! # Reduction orchestrator
//!
//! Every core runs the same body over one shared run context. The core
//! index picks the role; core 0 leads. Five full-cluster barriers split the
//! run into phases:
//!
//! 1. setup and load (leader): allocate A, B and the partial table in
//!    scratchpad, DMA the padded inputs in, wait for both copies
//! 2. partition (all): derive this core's slice
//! 3. timed compute (all): local kernel, publish into the core's own slot
//! 4. reduction (leader): fold slots `1..n` into core 0's sum in core order
//! 5. report (leader): stop the timer, derive metrics, check the result
//!
//! The barrier after step 3 is the only thing that makes other cores' partial
//! sums visible to the leader. No locks are taken on the hot path.
//!
//! A core that hits an error records it and keeps going through every
//! barrier, skipping its work, so the cluster always reaches the end.

pub mod partition;
pub mod report;

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{debug, info, trace, warn};

use crate::cluster::{
    self, ClusterBarrier, DmaEngine, EventLog, KernelMarker, NoopMarker, Phase, Region,
    Scratchpad, TraceKind,
};
use crate::config::RunConfig;
use crate::dataset::Dataset;
use crate::error::{FdotpError, Result};
use crate::math::dot_product::DotProductFn;
use crate::utils::{CycleCounter, CycleStats, HardwareCounter};

pub use partition::{OffsetTable, Partition};
pub use report::{fp_mismatch, Metrics, RunReport, GOLDEN_THRESHOLD};

/// One slot per core, each written at most once per run.
///
/// The region holds the table's place in scratchpad for the whole run; the
/// values themselves live in the write-once slots, one per region element.
#[derive(Debug)]
struct PartialTable {
    region: Region,
    slots: Box<[OnceLock<f64>]>,
}

impl PartialTable {
    fn from_region(region: Region) -> Self {
        let slots = (0..region.len()).map(|_| OnceLock::new()).collect();
        Self { region, slots }
    }

    fn base(&self) -> usize {
        self.region.base()
    }

    fn publish(&self, cid: usize, value: f64) -> Result<()> {
        self.slots
            .get(cid)
            .ok_or_else(|| FdotpError::Protocol(format!("core {cid} has no result slot")))?
            .set(value)
            .map_err(|_| FdotpError::Protocol(format!("slot {cid} written twice")))
    }

    fn read(&self, cid: usize) -> Result<f64> {
        self.slots
            .get(cid)
            .and_then(|slot| slot.get().copied())
            .ok_or_else(|| FdotpError::Protocol(format!("slot {cid} read before it was published")))
    }
}

/// Scratchpad state created by the leader and shared after the first barrier.
#[derive(Debug)]
struct Scratch {
    a: Region,
    b: Region,
    partials: PartialTable,
}

/// State shared by every core of one run.
struct RunContext<'a> {
    config: &'a RunConfig,
    partition: Partition,
    m: usize,
    golden: f64,
    backing_a: Arc<[f64]>,
    backing_b: Arc<[f64]>,
    kernel: DotProductFn,
    kernel_name: &'static str,
    counter: &'a dyn CycleCounter,
    marker: &'a dyn KernelMarker,
    barrier: ClusterBarrier,
    log: Option<EventLog>,
    scratch: OnceLock<Scratch>,
    failure: Mutex<Option<FdotpError>>,
    failed: AtomicBool,
}

impl<'a> RunContext<'a> {
    fn new(
        dataset: &Dataset,
        config: &'a RunConfig,
        counter: &'a dyn CycleCounter,
        marker: &'a dyn KernelMarker,
    ) -> Result<Self> {
        let partition = config.validate(dataset.m())?;
        let kernel = config.kernel_variant()?;

        Ok(Self {
            backing_a: Arc::from(partition.pad_image(dataset.a())?),
            backing_b: Arc::from(partition.pad_image(dataset.b())?),
            m: dataset.m(),
            golden: dataset.golden(),
            kernel: kernel.function,
            kernel_name: kernel.name,
            counter,
            marker,
            barrier: ClusterBarrier::new(config.num_cores),
            log: config.record_trace.then(EventLog::new),
            scratch: OnceLock::new(),
            failure: Mutex::new(None),
            failed: AtomicBool::new(false),
            partition,
            config,
        })
    }

    fn record(&self, cid: usize, kind: TraceKind) {
        if let Some(log) = &self.log {
            log.record(cid, kind);
        }
    }

    fn rendezvous(&self, cid: usize, phase: Phase) {
        self.record(cid, TraceKind::Arrive(phase));
        self.barrier.wait();
        self.record(cid, TraceKind::Depart(phase));
        trace!(cid, %phase, "barrier passed");
    }

    /// Keep the first error; later ones are usually fallout from it.
    fn fail(&self, cid: usize, err: FdotpError) {
        warn!(cid, error = %err, "core failed");
        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        failure.get_or_insert(err);
        self.failed.store(true, Ordering::Release);
    }

    /// Lock-free check, safe inside the timed region.
    fn failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Phases 1 and 2, leader only.
    fn setup_and_load(&self) -> Result<Scratch> {
        let total = self.partition.total_elements();
        let mut l1 = Scratchpad::new(self.config.scratchpad_bytes);
        let a = l1.allocate(total)?;
        let b = l1.allocate(total)?;
        let partials = l1.allocate(self.config.num_cores)?;
        debug!(
            a = a.base(),
            b = b.base(),
            partials = partials.base(),
            used = l1.used_bytes(),
            "scratchpad allocated"
        );

        let mut dma = DmaEngine::new();
        dma.start_1d(a, Arc::clone(&self.backing_a), total)?;
        dma.start_1d(b, Arc::clone(&self.backing_b), total)?;
        let mut loaded = dma.wait_all()?.into_iter();
        let (Some(a), Some(b)) = (loaded.next(), loaded.next()) else {
            return Err(FdotpError::Dma("fewer regions returned than issued".into()));
        };
        debug!(bytes = dma.bytes_issued(), "inputs loaded");

        Ok(Scratch {
            a,
            b,
            partials: PartialTable::from_region(partials),
        })
    }

    /// Phase 5 reduction: core 0's own sum is the running accumulator.
    fn reduce(&self, scratch: &Scratch, own: f64) -> Result<(f64, Vec<f64>)> {
        let mut acc = own;
        let mut partials = Vec::with_capacity(self.config.num_cores);
        partials.push(own);
        for cid in 1..self.config.num_cores {
            self.record(cluster::LEADER, TraceKind::SlotRead { slot: cid });
            let partial = scratch.partials.read(cid)?;
            acc += partial;
            partials.push(partial);
        }
        Ok((acc, partials))
    }
}

/// Per-core view of one slice.
struct Slice<'s> {
    a: &'s [f64],
    b: &'s [f64],
}

fn slice_of<'s>(scratch: &'s Scratch, range: Range<usize>) -> Slice<'s> {
    Slice {
        a: &scratch.a.as_slice()[range.clone()],
        b: &scratch.b.as_slice()[range],
    }
}

/// Body executed by every core. Returns the report on the leader.
fn core_main(ctx: &RunContext<'_>, cid: usize) -> Option<Result<RunReport>> {
    let leader = cluster::is_leader(cid);

    // Setup and load
    if leader {
        let published = ctx.setup_and_load().and_then(|scratch| {
            ctx.scratch
                .set(scratch)
                .map_err(|_| FdotpError::Protocol("scratchpad published twice".into()))
        });
        if let Err(e) = published {
            ctx.fail(cid, e);
        }
    }
    ctx.rendezvous(cid, Phase::Loaded);

    // Partition
    let scratch = ctx.scratch.get();
    if scratch.is_none() && !ctx.failed() {
        ctx.fail(cid, FdotpError::Protocol("scratchpad missing after load".into()));
    }
    let range = ctx.partition.range(cid);
    let slice = scratch.map(|s| slice_of(s, range.clone()));
    trace!(cid, start = range.start, end = range.end, "slice");
    ctx.rendezvous(cid, Phase::Partitioned);

    // Timed compute
    let start = leader.then(|| {
        ctx.marker.start();
        ctx.counter.now()
    });

    let own = slice.map(|s| (ctx.kernel)(s.a, s.b));
    if let (Some(scratch), Some(acc)) = (scratch, own) {
        ctx.record(cid, TraceKind::SlotWrite { slot: cid });
        if let Err(e) = scratch.partials.publish(cid, acc) {
            ctx.fail(cid, e);
        }
    }
    ctx.rendezvous(cid, Phase::Published);

    // Reduction
    let reduced = match (leader, scratch, own) {
        (true, Some(scratch), Some(own)) if !ctx.failed() => match ctx.reduce(scratch, own) {
            Ok(r) => Some(r),
            Err(e) => {
                ctx.fail(cid, e);
                None
            }
        },
        _ => None,
    };
    ctx.rendezvous(cid, Phase::Reduced);

    // Report
    let outcome = start.map(|start| {
        ctx.marker.stop();
        let cycles = ctx.counter.now().saturating_sub(start);
        reduced.map(|(result, partials)| {
            let metrics = Metrics::derive(
                ctx.m,
                cycles,
                ctx.config.num_cores,
                ctx.config.fpus_per_core,
            );
            debug!(
                table = ?scratch.map(|s| s.partials.base()),
                result,
                cycles = metrics.cycles,
                "reduced"
            );
            let report = RunReport {
                m: ctx.m,
                num_cores: ctx.config.num_cores,
                kernel: ctx.kernel_name,
                metrics,
                partials,
                result,
                golden: ctx.golden,
                trace: None,
            };
            let verdict = report.into_verdict(ctx.config.threshold);
            if let Err(e) = &verdict {
                warn!(error = %e, "result mismatch");
            }
            verdict
        })
    });
    ctx.rendezvous(cid, Phase::Done);

    outcome.flatten()
}

/// Run the protocol once with the host cycle counter and no dump markers.
pub fn run(dataset: &Dataset, config: &RunConfig) -> Result<RunReport> {
    run_with(dataset, config, &HardwareCounter, &NoopMarker)
}

/// Run the protocol once.
///
/// Returns the leader's report, or [`FdotpError::ResultMismatch`] carrying it
/// when the result misses the golden value.
pub fn run_with(
    dataset: &Dataset,
    config: &RunConfig,
    counter: &dyn CycleCounter,
    marker: &dyn KernelMarker,
) -> Result<RunReport> {
    let ctx = RunContext::new(dataset, config, counter, marker)?;
    debug!(
        m = ctx.m,
        cores = config.num_cores,
        dim = ctx.partition.dim(),
        padding = ctx.partition.padding(),
        kernel = ctx.kernel_name,
        "starting run"
    );

    let mut outcomes = cluster::launch(config.num_cores, config.pin_cores, |cid| {
        core_main(&ctx, cid)
    })?;
    let leader_outcome = outcomes.swap_remove(cluster::LEADER);
    let completed = ctx.barrier.completed();

    let RunContext { failure, log, .. } = ctx;
    if let Some(err) = failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
        return Err(err);
    }
    if completed != Phase::ALL.len() {
        return Err(FdotpError::Protocol(format!(
            "{completed} barriers completed, expected {}",
            Phase::ALL.len()
        )));
    }

    let mut outcome = leader_outcome
        .ok_or_else(|| FdotpError::Protocol("leader produced no report".into()))?;

    let trace = log.map(EventLog::into_events);
    match &mut outcome {
        Ok(report) => report.trace = trace,
        Err(e) => {
            if let Some(report) = e.report_mut() {
                report.trace = trace;
            }
        }
    }

    if let Ok(report) = &outcome {
        info!(
            result = report.result,
            cycles = report.metrics.cycles,
            performance = report.metrics.performance,
            "run complete"
        );
    }
    outcome
}

/// Outcome of several back-to-back runs on the same input.
#[derive(Clone, Debug)]
pub struct RepeatedRun {
    pub reports: Vec<RunReport>,
    pub stats: CycleStats,
    /// All reduced results were bit-identical.
    pub deterministic: bool,
}

/// Run the protocol `runs` times, stopping at the first error.
pub fn run_repeated(dataset: &Dataset, config: &RunConfig, runs: usize) -> Result<RepeatedRun> {
    run_repeated_with(dataset, config, runs, &HardwareCounter, &NoopMarker)
}

pub fn run_repeated_with(
    dataset: &Dataset,
    config: &RunConfig,
    runs: usize,
    counter: &dyn CycleCounter,
    marker: &dyn KernelMarker,
) -> Result<RepeatedRun> {
    if runs == 0 {
        return Err(FdotpError::Config("runs must be > 0".into()));
    }

    let reports = (0..runs)
        .map(|_| run_with(dataset, config, counter, marker))
        .collect::<Result<Vec<_>>>()?;

    let cycles: Vec<u64> = reports.iter().map(|r| r.metrics.cycles).collect();
    let stats = CycleStats::from_samples(&cycles)
        .ok_or_else(|| FdotpError::Protocol("no samples collected".into()))?;

    let first = reports[0].result.to_bits();
    let deterministic = reports.iter().all(|r| r.result.to_bits() == first);
    if !deterministic {
        warn!(runs, "reduced results differ between runs");
    }

    Ok(RepeatedRun {
        reports,
        stats,
        deterministic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    /// Counter that advances by a fixed step per read.
    struct StepCounter {
        next: AtomicU64,
        step: u64,
    }

    impl StepCounter {
        fn new(step: u64) -> Self {
            Self {
                next: AtomicU64::new(1000),
                step,
            }
        }
    }

    impl CycleCounter for StepCounter {
        fn now(&self) -> u64 {
            self.next.fetch_add(self.step, Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct CountingMarker {
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    impl KernelMarker for CountingMarker {
        fn start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn small() -> Dataset {
        Dataset::new(vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0], 70.0).unwrap()
    }

    #[test]
    fn test_partials_in_core_order() {
        let report = run(&small(), &RunConfig::new(2)).unwrap();
        assert_eq!(report.partials, vec![17.0, 53.0]);
        assert_eq!(report.result, 70.0);
        assert_eq!(report.kernel, "original");
    }

    #[test]
    fn test_cycles_from_counter() {
        let counter = StepCounter::new(250);
        let marker = CountingMarker::default();
        let report = run_with(&small(), &RunConfig::new(2), &counter, &marker).unwrap();

        // Exactly two reads, both on the leader
        assert_eq!(report.metrics.cycles, 250);
        assert_eq!(report.metrics.performance, 1000 * 2 * 4 / 250);
        assert_eq!(marker.starts.load(Ordering::SeqCst), 1);
        assert_eq!(marker.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_elapsed_is_one_cycle() {
        let counter = StepCounter::new(0);
        let report = run_with(&small(), &RunConfig::new(2), &counter, &NoopMarker).unwrap();
        assert_eq!(report.metrics.cycles, 1);
        assert_eq!(report.metrics.performance, 8000);
    }

    #[test]
    fn test_validation_happens_before_launch() {
        let err = run(&small(), &RunConfig::new(3)).unwrap_err();
        assert!(matches!(err, FdotpError::IndivisibleLength { m: 4, num_cores: 3 }));
    }

    #[test]
    fn test_single_core() {
        let report = run(&small(), &RunConfig::new(1)).unwrap();
        assert_eq!(report.partials, vec![70.0]);
    }

    #[test]
    fn test_padding_on_core_one() {
        let report = run(&small(), &RunConfig::new(2).with_padding(1, 3)).unwrap();
        assert_eq!(report.partials, vec![17.0, 53.0]);
    }

    #[test]
    fn test_partial_table_write_once() {
        let mut l1 = Scratchpad::new(64);
        let table = PartialTable::from_region(l1.allocate(2).unwrap());
        assert!(table.read(1).is_err());
        table.publish(1, 3.0).unwrap();
        assert_eq!(table.read(1).unwrap(), 3.0);
        assert!(table.publish(1, 4.0).is_err());
        assert!(table.publish(2, 1.0).is_err());
        assert_eq!(table.base(), 0);
    }

    #[test]
    fn test_failure_flag_follows_first_error() {
        let data = small();
        let config = RunConfig::new(2);
        let ctx = RunContext::new(&data, &config, &HardwareCounter, &NoopMarker).unwrap();
        assert!(!ctx.failed());

        ctx.fail(1, FdotpError::Protocol("first".into()));
        ctx.fail(0, FdotpError::Protocol("second".into()));
        assert!(ctx.failed());

        let kept = ctx.failure.into_inner().unwrap();
        assert!(matches!(kept, Some(FdotpError::Protocol(msg)) if msg == "first"));
    }

    #[test]
    fn test_repeated_runs() {
        let d = Dataset::random(256, 3);
        let counter = StepCounter::new(10);
        let rep = run_repeated_with(&d, &RunConfig::new(4), 3, &counter, &NoopMarker).unwrap();
        assert_eq!(rep.reports.len(), 3);
        assert!(rep.deterministic);
        assert_eq!(rep.stats.samples, 3);
        assert_eq!(rep.stats.median, 10);
    }

    #[test]
    fn test_zero_runs_rejected() {
        assert!(run_repeated(&small(), &RunConfig::new(2), 0).is_err());
    }
}
