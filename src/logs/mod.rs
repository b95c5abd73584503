//! `tridentctl logs`: fetch Trident container logs to the console or a
//! support archive.
//!
//! A run resolves a [`FetchPlan`] up front and feeds every target through one
//! fetch loop. Per-log failures go to the run's [`ErrorBuffer`] and never stop
//! the loop; enumeration failures become the run's terminal error and only
//! drop the targets they were enumerating.

pub mod buffer;
pub mod plan;
pub mod request;
pub mod sink;

#[cfg(test)]
pub(crate) mod testing;

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

pub use buffer::ErrorBuffer;
pub use plan::FetchPlan;
pub use request::LogRequest;
pub use sink::{ArchiveSink, ConsoleSink, LogSink};

use crate::error::LogsError;
use crate::local_k8s::kubectl::LogFetcher;
use crate::local_k8s::pods::ClusterQuery;
use crate::mode::TunnelTarget;

/// State of one run.
struct RunContext<'s> {
    sink: &'s mut dyn LogSink,
    errors: ErrorBuffer,
    terminal: Option<LogsError>,
}

impl<'s> RunContext<'s> {
    fn new(sink: &'s mut dyn LogSink) -> Self {
        Self {
            sink,
            errors: ErrorBuffer::new(),
            terminal: None,
        }
    }

    fn write(&mut self, name: &str, content: &[u8]) {
        if let Err(e) = self.sink.write_log(name, content) {
            warn!("could not write log {}: {}", name, e);
            self.errors
                .append(format!("could not write log {}; {}", name, e).as_bytes());
        }
    }

    /// Keeps the first enumeration error as terminal; later ones are buffered.
    fn fail(&mut self, err: LogsError) {
        warn!("{}", err);
        if self.terminal.is_none() {
            self.terminal = Some(err);
        } else {
            self.errors.append(err.to_string().as_bytes());
        }
    }
}

pub struct Collector<'a> {
    target: &'a TunnelTarget,
    cluster: &'a dyn ClusterQuery,
    fetcher: &'a dyn LogFetcher,
}

impl<'a> Collector<'a> {
    pub fn new(
        target: &'a TunnelTarget,
        cluster: &'a dyn ClusterQuery,
        fetcher: &'a dyn LogFetcher,
    ) -> Self {
        Self {
            target,
            cluster,
            fetcher,
        }
    }

    /// Archives into `dir` when the request asks for it, otherwise prints to
    /// stdout.
    pub async fn run(&self, request: &LogRequest, dir: &Path) -> Result<(), LogsError> {
        if request.archive {
            self.to_archive(request, dir, Utc::now()).await.map(|_| ())
        } else {
            self.to_console(request, std::io::stdout()).await
        }
    }

    /// Any failure, buffered or terminal, fails the run with one combined
    /// message.
    pub async fn to_console<W: Write>(&self, request: &LogRequest, out: W) -> Result<(), LogsError> {
        let mut sink = ConsoleSink::new(out);
        let mut ctx = RunContext::new(&mut sink);
        self.collect(request, &mut ctx).await;

        let RunContext {
            errors, terminal, ..
        } = ctx;
        match terminal {
            Some(err) => Err(err.combine(&errors.to_text())),
            None if errors.is_empty() => Ok(()),
            None => Err(LogsError::Fetch(errors.to_text())),
        }
    }

    /// Writes every fetched log into a new support archive under `dir`.
    ///
    /// Every failure after the archive exists, enumeration included, lands in
    /// the archive's `errors` entry. Only creating or closing the archive can
    /// fail the run.
    pub async fn to_archive(
        &self,
        request: &LogRequest,
        dir: &Path,
        now: DateTime<Utc>,
    ) -> Result<PathBuf, LogsError> {
        let request = request.effective();
        let mut sink = ArchiveSink::create(dir, now)?;
        debug!("writing support archive {}", sink.path().display());
        let mut ctx = RunContext::new(&mut sink);
        self.collect(&request, &mut ctx).await;

        let RunContext {
            mut errors,
            terminal,
            ..
        } = ctx;
        if let Some(err) = terminal {
            errors.append(err.to_string().as_bytes());
        }
        sink.finish(&errors)
    }

    async fn collect(&self, request: &LogRequest, ctx: &mut RunContext<'_>) {
        let (plan, failure) = FetchPlan::resolve(request, self.target, self.cluster).await;
        if let Some(err) = failure {
            ctx.fail(err);
        }
        if plan.is_empty() {
            warn!("no Trident logs matched the request");
        }

        for target in plan.targets() {
            self.fetch_into(ctx, &target.name, &target.pod, &target.container, target.previous)
                .await;

            if !target.sidecars {
                continue;
            }
            let sidecars = match self
                .cluster
                .list_sidecars(&target.pod, &self.target.namespace)
                .await
            {
                Ok(sidecars) => sidecars,
                Err(e) => {
                    ctx.fail(LogsError::ListSidecars(e));
                    continue;
                }
            };
            for sidecar in &sidecars {
                let name = target.sidecar_name(sidecar);
                self.fetch_into(ctx, &name, &target.pod, sidecar, target.previous)
                    .await;
            }
        }

        debug!("fetched {} planned log(s)", plan.len());
    }

    async fn fetch_into(
        &self,
        ctx: &mut RunContext<'_>,
        name: &str,
        pod: &str,
        container: &str,
        previous: bool,
    ) {
        match self
            .fetcher
            .fetch(pod, &self.target.namespace, container, previous)
            .await
        {
            Ok(log) => ctx.write(name, &log),
            Err(e) => {
                warn!("could not fetch {} log: {}", name, e.to_string().trim());
                ctx.errors.append(&e.output);
            }
        }
    }
}
